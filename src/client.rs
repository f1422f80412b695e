//! High-level tracking client.
//!
//! `TrackingClient` wraps a metadata store and hands out [`ActiveRun`]
//! guards. A guard that goes out of scope without an explicit `end`
//! terminates its run automatically: `Failed` when the thread is
//! unwinding, `Finished` otherwise, so a run closes on both normal and
//! exceptional exit.
//!
//! # Example
//!
//! ```rust
//! use bitacora::client::TrackingClient;
//! use bitacora::store::MemoryStore;
//!
//! # fn example() -> bitacora::Result<()> {
//! let client = TrackingClient::new(MemoryStore::new());
//! let experiment = client.get_or_create_experiment("demo")?;
//!
//! let mut run = client.start_run(experiment.experiment_id())?;
//! run.log_param("learning_rate", "0.001")?;
//! run.log_metric("loss", 0.7)?;
//! run.log_metric("loss", 0.4)?;
//! // dropping `run` here ends it as Finished
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::artifact::{store_for_uri, FileInfo};
use crate::config::Config;
use crate::record::{ExperimentRecord, MetricRecord, RunRecord, RunSource, RunStatus};
use crate::store::TrackingStore;
use crate::uri::TrackingUri;
use crate::Result;

/// Client facade over a tracking store.
#[derive(Clone)]
pub struct TrackingClient {
    store: Arc<dyn TrackingStore>,
}

impl TrackingClient {
    /// Create a client owning the given store.
    #[must_use]
    pub fn new(store: impl TrackingStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a client sharing an existing store handle.
    #[must_use]
    pub fn from_store(store: Arc<dyn TrackingStore>) -> Self {
        Self { store }
    }

    /// Create a client by resolving a tracking URI.
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedUri` for non-local URIs.
    pub fn from_uri(uri: &TrackingUri) -> Result<Self> {
        Ok(Self::new(uri.resolve_store()?))
    }

    /// Create a client from the `BITACORA_*` environment configuration.
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedUri` if the configured URI cannot be parsed or
    /// does not resolve to a local store.
    pub fn from_env() -> Result<Self> {
        Self::from_uri(Config::from_env()?.tracking_uri())
    }

    /// Access the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn TrackingStore {
        self.store.as_ref()
    }

    /// Create an experiment, or return the existing one with this name.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn get_or_create_experiment(&self, name: &str) -> Result<ExperimentRecord> {
        if let Some(existing) = self.store.get_experiment_by_name(name)? {
            return Ok(existing);
        }
        self.store.create_experiment(name, None)
    }

    /// Start a run with an unknown source.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the experiment does not exist.
    pub fn start_run(&self, experiment_id: &str) -> Result<ActiveRun> {
        self.start_run_with(experiment_id, RunSource::Unknown, None)
    }

    /// Start a run with a source descriptor and optional commit hash.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the experiment does not exist.
    pub fn start_run_with(
        &self,
        experiment_id: &str,
        source: RunSource,
        source_version: Option<&str>,
    ) -> Result<ActiveRun> {
        let run = self.store.create_run(experiment_id, source, source_version)?;
        tracing::debug!(run_id = run.run_id(), experiment_id, "started run");
        Ok(ActiveRun {
            store: Arc::clone(&self.store),
            run,
            next_steps: HashMap::new(),
            ended: false,
        })
    }

    /// Run `f` inside a scoped run.
    ///
    /// The run ends `Finished` when `f` returns `Ok` and `Failed` when it
    /// returns `Err`; the original error is propagated either way.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error, or the store error from ending
    /// the run.
    pub fn with_run<T, F>(&self, experiment_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut ActiveRun) -> Result<T>,
    {
        let mut run = self.start_run(experiment_id)?;
        match f(&mut run) {
            Ok(value) => {
                run.end(RunStatus::Finished)?;
                Ok(value)
            }
            Err(err) => {
                // the closure's failure is the interesting error
                if let Err(end_err) = run.end(RunStatus::Failed) {
                    tracing::warn!(error = %end_err, "failed to mark run as failed");
                }
                Err(err)
            }
        }
    }
}

/// RAII guard for a running run.
///
/// All logging goes through the guard; once the guard ends (explicitly
/// or by drop) the run is terminal and rejects further writes.
pub struct ActiveRun {
    store: Arc<dyn TrackingStore>,
    run: RunRecord,
    // per-key auto-increment for step-less metric logging
    next_steps: HashMap<String, i64>,
    ended: bool,
}

impl ActiveRun {
    /// ID of the underlying run.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.run.run_id()
    }

    /// Snapshot of the run record as created.
    #[must_use]
    pub const fn record(&self) -> &RunRecord {
        &self.run
    }

    /// Log a set-once string parameter.
    ///
    /// # Errors
    ///
    /// `Error::ParamConflict` on conflicting re-log.
    pub fn log_param(&self, key: &str, value: &str) -> Result<()> {
        self.store.log_param(self.run.run_id(), key, value)
    }

    /// Log a metric point, auto-incrementing the step for this key.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn log_metric(&mut self, key: &str, value: f64) -> Result<()> {
        let step = self.next_steps.entry(key.to_string()).or_insert(0);
        let metric = MetricRecord::new(self.run.run_id(), key, *step, value);
        self.store.log_metric(&metric)?;
        *step += 1;
        Ok(())
    }

    /// Log a metric point at an explicit step.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn log_metric_at(&self, key: &str, step: i64, value: f64) -> Result<()> {
        self.store
            .log_metric(&MetricRecord::new(self.run.run_id(), key, step, value))
    }

    /// Set (or overwrite) a tag.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn set_tag(&self, key: &str, value: &str) -> Result<()> {
        self.store.set_tag(self.run.run_id(), key, value)
    }

    /// Copy a local file into the run's artifact location, optionally
    /// under a relative directory.
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedScheme` if the run's artifact URI is not
    /// local; path and I/O errors otherwise.
    pub fn log_artifact(&self, local_file: &Path, artifact_path: Option<&str>) -> Result<()> {
        store_for_uri(self.run.artifact_uri())?.log_artifact(local_file, artifact_path)
    }

    /// Copy a local directory tree into the run's artifact location.
    ///
    /// # Errors
    ///
    /// Same as [`ActiveRun::log_artifact`].
    pub fn log_artifacts(&self, local_dir: &Path, artifact_path: Option<&str>) -> Result<()> {
        store_for_uri(self.run.artifact_uri())?.log_artifacts(local_dir, artifact_path)
    }

    /// List artifacts logged so far.
    ///
    /// # Errors
    ///
    /// Same as [`ActiveRun::log_artifact`].
    pub fn list_artifacts(&self, path: Option<&str>) -> Result<Vec<FileInfo>> {
        store_for_uri(self.run.artifact_uri())?.list_artifacts(path)
    }

    /// Fetch an artifact back to the local filesystem.
    ///
    /// # Errors
    ///
    /// Same as [`ActiveRun::log_artifact`].
    pub fn download_artifact(&self, artifact_path: &str) -> Result<PathBuf> {
        store_for_uri(self.run.artifact_uri())?.download_artifact(artifact_path)
    }

    /// End the run with an explicit terminal status.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn end(mut self, status: RunStatus) -> Result<RunRecord> {
        self.ended = true;
        let run = self.store.update_run_status(self.run.run_id(), status)?;
        self.run = run.clone();
        Ok(run)
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        let status = if std::thread::panicking() {
            RunStatus::Failed
        } else {
            RunStatus::Finished
        };
        if let Err(err) = self.store.update_run_status(self.run.run_id(), status) {
            tracing::warn!(
                run_id = self.run.run_id(),
                error = %err,
                "failed to terminate run on drop"
            );
        }
    }
}
