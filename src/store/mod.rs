//! Tracking Store Module
//!
//! Provides the metadata storage layer for experiment tracking:
//! - `TrackingStore` trait, the seam every backend implements
//! - `MemoryStore`, a `DashMap`-backed ephemeral store
//! - `FileStore`, a directory-backed persistent store
//!
//! # Example
//!
//! ```rust
//! use bitacora::store::{MemoryStore, TrackingStore};
//! use bitacora::record::{MetricRecord, RunSource, RunStatus};
//!
//! # fn example() -> bitacora::Result<()> {
//! let store = MemoryStore::new();
//!
//! let experiment = store.create_experiment("quickstart", None)?;
//! let run = store.create_run(experiment.experiment_id(), RunSource::Unknown, None)?;
//!
//! store.log_param(run.run_id(), "learning_rate", "0.001")?;
//! store.log_metric(&MetricRecord::new(run.run_id(), "loss", 0, 0.5))?;
//! store.update_run_status(run.run_id(), RunStatus::Finished)?;
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;

pub use file::{FileStore, DEFAULT_EXPERIMENT_ID};
pub use memory::MemoryStore;

use crate::record::{ExperimentRecord, MetricRecord, ParamRecord, RunRecord, RunSource, RunStatus, TagRecord};
use crate::{Error, Result};

/// Metadata store trait for experiment tracking backends.
///
/// All methods take `&self`; implementations use interior mutability so
/// a store can be shared across threads behind an `Arc`.
pub trait TrackingStore: Send + Sync {
    /// Create a new experiment with a unique name.
    ///
    /// When `artifact_location` is `None` the store picks a default
    /// location under its own root.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` if the name is taken.
    fn create_experiment(
        &self,
        name: &str,
        artifact_location: Option<&str>,
    ) -> Result<ExperimentRecord>;

    /// Get an experiment by ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the experiment does not exist.
    fn get_experiment(&self, experiment_id: &str) -> Result<ExperimentRecord>;

    /// Look up an experiment by name.
    ///
    /// # Errors
    ///
    /// Returns an error only on store I/O failures; an unknown name is `Ok(None)`.
    fn get_experiment_by_name(&self, name: &str) -> Result<Option<ExperimentRecord>>;

    /// List all active experiments, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns an error on store I/O failures.
    fn list_experiments(&self) -> Result<Vec<ExperimentRecord>>;

    /// Create a run under an experiment.
    ///
    /// The returned run is already in `Running` status with its start
    /// timestamp set and an artifact URI derived from the experiment's
    /// artifact location.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the experiment does not exist.
    fn create_run(
        &self,
        experiment_id: &str,
        source: RunSource,
        source_version: Option<&str>,
    ) -> Result<RunRecord>;

    /// Get a run by ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the run does not exist.
    fn get_run(&self, run_id: &str) -> Result<RunRecord>;

    /// List all runs of an experiment, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the experiment does not exist.
    fn list_runs(&self, experiment_id: &str) -> Result<Vec<RunRecord>>;

    /// Set a run's status, recording the end timestamp on terminal
    /// transitions. Returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns `Error::RunNotActive` if the run already terminated.
    fn update_run_status(&self, run_id: &str, status: RunStatus) -> Result<RunRecord>;

    /// Log a set-once string parameter against a run.
    ///
    /// Re-logging the identical value is a no-op, which keeps retried
    /// training loops idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParamConflict` if the key holds a different value,
    /// `Error::RunNotActive` if the run terminated.
    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()>;

    /// Get all params of a run, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the run does not exist.
    fn get_params(&self, run_id: &str) -> Result<Vec<ParamRecord>>;

    /// Append a metric point to a run's time series.
    ///
    /// # Errors
    ///
    /// Returns `Error::RunNotActive` if the run terminated.
    fn log_metric(&self, metric: &MetricRecord) -> Result<()>;

    /// Get the full logged history for one metric key of a run, ordered
    /// by step, then timestamp.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the run does not exist. An unknown
    /// key yields an empty history.
    fn get_metric_history(&self, run_id: &str, key: &str) -> Result<Vec<MetricRecord>>;

    /// Set (or overwrite) a tag on a run.
    ///
    /// # Errors
    ///
    /// Returns `Error::RunNotActive` if the run terminated.
    fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<()>;

    /// Get all tags of a run, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the run does not exist.
    fn get_tags(&self, run_id: &str) -> Result<Vec<TagRecord>>;

    /// Log a batch of metrics, params and tags in one call.
    ///
    /// The default implementation loops over the singular operations;
    /// backends with cheaper bulk paths may override it.
    ///
    /// # Errors
    ///
    /// Stops at the first failing entry and returns its error.
    fn log_batch(
        &self,
        run_id: &str,
        metrics: &[MetricRecord],
        params: &[ParamRecord],
        tags: &[TagRecord],
    ) -> Result<()> {
        for param in params {
            self.log_param(run_id, param.key(), param.value())?;
        }
        for metric in metrics {
            self.log_metric(metric)?;
        }
        for tag in tags {
            self.set_tag(run_id, tag.key(), tag.value())?;
        }
        Ok(())
    }
}

/// Maximum accepted key length for params, metrics and tags.
pub const MAX_KEY_LEN: usize = 250;

/// Validate a param/metric/tag key before it touches storage.
///
/// Keys become file names in the `FileStore` layout, so path separators,
/// leading dots and control characters are rejected up front. Reserving
/// dotfile names for the store keeps user keys and internal temp files
/// in disjoint namespaces.
///
/// # Errors
///
/// Returns `Error::InvalidKey` describing the offending key.
pub fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && !key.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

/// Generate a fresh run/experiment identifier (UUID v4, simple hex).
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Shared guard: resolve a run and confirm it still accepts writes.
pub(crate) fn ensure_active(run: &RunRecord) -> Result<()> {
    if run.is_active() {
        Ok(())
    } else {
        Err(Error::RunNotActive(run.run_id().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_common_names() {
        for key in ["loss", "val_accuracy", "f1.macro", "lr-schedule", "epoch 3"] {
            assert!(validate_key(key).is_ok(), "{key} should be valid");
        }
    }

    #[test]
    fn test_validate_key_rejects_path_tricks() {
        for key in ["", ".", "..", ".hidden", ".tmp-x", "a/b", "a\\b", "line\nbreak"] {
            assert!(validate_key(key).is_err(), "{key:?} should be invalid");
        }
    }

    #[test]
    fn test_validate_key_rejects_oversized() {
        let long = "k".repeat(MAX_KEY_LEN + 1);
        assert!(validate_key(&long).is_err());
        let max = "k".repeat(MAX_KEY_LEN);
        assert!(validate_key(&max).is_ok());
    }

    #[test]
    fn test_new_id_unique_and_hex() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
