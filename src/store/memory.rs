//! In-memory tracking store implementation using `DashMap`.
//!
//! This is the default backend for tests and ephemeral tracking - data
//! is lost on process exit. For persistence, use `FileStore`.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ensure_active, new_id, validate_key, TrackingStore};
use crate::record::{
    ExperimentRecord, MetricRecord, ParamRecord, RunRecord, RunSource, RunStatus, TagRecord,
};
use crate::{Error, Result};

/// In-memory tracking store backed by lock-free concurrent hashmaps.
///
/// Thread-safe; a single `MemoryStore` can serve many concurrent
/// logging threads without external locking.
///
/// # Example
///
/// ```rust
/// use bitacora::store::{MemoryStore, TrackingStore};
///
/// # fn example() -> bitacora::Result<()> {
/// let store = MemoryStore::new();
/// let exp = store.create_experiment("demo", None)?;
/// assert_eq!(store.list_experiments()?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    experiments: DashMap<String, ExperimentRecord>,
    // name -> experiment_id index, also the uniqueness guard
    names: DashMap<String, String>,
    runs: DashMap<String, RunRecord>,
    // params, metrics and tags are keyed by run id, outside the run
    // record itself, matching the FileStore layout
    params: DashMap<String, Vec<ParamRecord>>,
    metrics: DashMap<String, Vec<MetricRecord>>,
    tags: DashMap<String, Vec<TagRecord>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no experiments or runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.runs.is_empty()
    }

    /// Number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

impl TrackingStore for MemoryStore {
    fn create_experiment(
        &self,
        name: &str,
        artifact_location: Option<&str>,
    ) -> Result<ExperimentRecord> {
        if name.trim().is_empty() {
            return Err(Error::InvalidKey(name.to_string()));
        }
        let experiment_id = new_id();
        // entry() makes the name index the atomic uniqueness guard
        match self.names.entry(name.to_string()) {
            Entry::Occupied(_) => return Err(Error::AlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(experiment_id.clone());
            }
        }
        let location = artifact_location
            .map_or_else(|| format!("mem://{experiment_id}"), ToString::to_string);
        let experiment = ExperimentRecord::new(experiment_id.clone(), name, location);
        self.experiments.insert(experiment_id, experiment.clone());
        tracing::debug!(experiment_id = experiment.experiment_id(), name, "created experiment");
        Ok(experiment)
    }

    fn get_experiment(&self, experiment_id: &str) -> Result<ExperimentRecord> {
        self.experiments
            .get(experiment_id)
            .map(|e| e.clone())
            .ok_or_else(|| Error::experiment_not_found(experiment_id))
    }

    fn get_experiment_by_name(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        let Some(id) = self.names.get(name).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.experiments.get(&id).map(|e| e.clone()))
    }

    fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let mut experiments: Vec<ExperimentRecord> = self
            .experiments
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.clone())
            .collect();
        experiments.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(experiments)
    }

    fn create_run(
        &self,
        experiment_id: &str,
        source: RunSource,
        source_version: Option<&str>,
    ) -> Result<RunRecord> {
        let experiment = self.get_experiment(experiment_id)?;
        let run_id = new_id();
        let mut builder = RunRecord::builder(run_id.clone(), experiment_id)
            .source(source)
            .artifact_uri(format!(
                "{}/{run_id}/artifacts",
                experiment.artifact_location()
            ));
        if let Some(version) = source_version {
            builder = builder.source_version(version);
        }
        let mut run = builder.build();
        run.start();
        self.runs.insert(run_id, run.clone());
        tracing::debug!(run_id = run.run_id(), experiment_id, "created run");
        Ok(run)
    }

    fn get_run(&self, run_id: &str) -> Result<RunRecord> {
        self.runs
            .get(run_id)
            .map(|r| r.clone())
            .ok_or_else(|| Error::run_not_found(run_id))
    }

    fn list_runs(&self, experiment_id: &str) -> Result<Vec<RunRecord>> {
        // NotFound beats an empty listing for a bogus experiment id
        self.get_experiment(experiment_id)?;
        let mut runs: Vec<RunRecord> = self
            .runs
            .iter()
            .filter(|r| r.experiment_id() == experiment_id)
            .map(|r| r.clone())
            .collect();
        runs.sort_by(|a, b| {
            a.started_at()
                .cmp(&b.started_at())
                .then_with(|| a.run_id().cmp(b.run_id()))
        });
        Ok(runs)
    }

    fn update_run_status(&self, run_id: &str, status: RunStatus) -> Result<RunRecord> {
        let mut run = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::run_not_found(run_id))?;
        ensure_active(&run)?;
        run.terminate(status);
        Ok(run.clone())
    }

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let run = self.get_run(run_id)?;
        ensure_active(&run)?;
        let mut params = self.params.entry(run_id.to_string()).or_default();
        if let Some(existing) = params.iter().find(|p| p.key() == key) {
            if existing.value() == value {
                return Ok(());
            }
            return Err(Error::ParamConflict {
                key: key.to_string(),
                old: existing.value().to_string(),
                new: value.to_string(),
            });
        }
        params.push(ParamRecord::new(run_id, key, value));
        Ok(())
    }

    fn get_params(&self, run_id: &str) -> Result<Vec<ParamRecord>> {
        self.get_run(run_id)?;
        let mut params = self
            .params
            .get(run_id)
            .map(|p| p.clone())
            .unwrap_or_default();
        params.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(params)
    }

    fn log_metric(&self, metric: &MetricRecord) -> Result<()> {
        validate_key(metric.key())?;
        // the active check and the append are separate map operations;
        // a terminate racing between them may admit one in-flight point
        let run = self.get_run(metric.run_id())?;
        ensure_active(&run)?;
        self.metrics
            .entry(metric.run_id().to_string())
            .or_default()
            .push(metric.clone());
        Ok(())
    }

    fn get_metric_history(&self, run_id: &str, key: &str) -> Result<Vec<MetricRecord>> {
        validate_key(key)?;
        self.get_run(run_id)?;
        let mut history: Vec<MetricRecord> = self
            .metrics
            .get(run_id)
            .map(|m| m.iter().filter(|m| m.key() == key).cloned().collect())
            .unwrap_or_default();
        history.sort_by_key(|m| (m.step(), m.timestamp()));
        Ok(history)
    }

    fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let run = self.get_run(run_id)?;
        ensure_active(&run)?;
        let mut tags = self.tags.entry(run_id.to_string()).or_default();
        if let Some(existing) = tags.iter_mut().find(|t| t.key() == key) {
            *existing = TagRecord::new(key, value);
        } else {
            tags.push(TagRecord::new(key, value));
        }
        Ok(())
    }

    fn get_tags(&self, run_id: &str) -> Result<Vec<TagRecord>> {
        self.get_run(run_id)?;
        let mut tags = self.tags.get(run_id).map(|t| t.clone()).unwrap_or_default();
        tags.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_memory_store_default() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.experiment_count(), 0);
        assert_eq!(store.run_count(), 0);
    }

    #[test]
    fn test_duplicate_experiment_name_rejected() {
        let store = MemoryStore::new();
        store.create_experiment("dup", None).unwrap();
        let err = store.create_experiment("dup", None).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_param_conflict() {
        let store = MemoryStore::new();
        let exp = store.create_experiment("exp", None).unwrap();
        let run = store
            .create_run(exp.experiment_id(), RunSource::Unknown, None)
            .unwrap();

        store.log_param(run.run_id(), "lr", "0.01").unwrap();
        // identical value is a no-op
        store.log_param(run.run_id(), "lr", "0.01").unwrap();
        let err = store.log_param(run.run_id(), "lr", "0.02").unwrap_err();
        assert!(matches!(err, Error::ParamConflict { .. }));
        assert_eq!(store.get_params(run.run_id()).unwrap().len(), 1);
    }

    #[test]
    fn test_terminated_run_rejects_writes() {
        let store = MemoryStore::new();
        let exp = store.create_experiment("exp", None).unwrap();
        let run = store
            .create_run(exp.experiment_id(), RunSource::Unknown, None)
            .unwrap();
        store
            .update_run_status(run.run_id(), RunStatus::Finished)
            .unwrap();

        let metric = MetricRecord::new(run.run_id(), "loss", 0, 0.5);
        assert!(matches!(
            store.log_metric(&metric),
            Err(Error::RunNotActive(_))
        ));
        assert!(matches!(
            store.log_param(run.run_id(), "lr", "0.1"),
            Err(Error::RunNotActive(_))
        ));
        assert!(matches!(
            store.update_run_status(run.run_id(), RunStatus::Killed),
            Err(Error::RunNotActive(_))
        ));
    }

    #[test]
    fn test_metric_history_ordering() {
        let store = MemoryStore::new();
        let exp = store.create_experiment("exp", None).unwrap();
        let run = store
            .create_run(exp.experiment_id(), RunSource::Unknown, None)
            .unwrap();

        // log out of step order
        for step in [2, 0, 1] {
            store
                .log_metric(&MetricRecord::new(run.run_id(), "loss", step, step as f64))
                .unwrap();
        }

        let history = store.get_metric_history(run.run_id(), "loss").unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].step(), 0);
        assert_eq!(history[2].step(), 2);
    }

    #[test]
    fn test_set_tag_kept_outside_run_record() {
        let store = MemoryStore::new();
        let exp = store.create_experiment("exp", None).unwrap();
        let run = store
            .create_run(exp.experiment_id(), RunSource::Unknown, None)
            .unwrap();

        store.set_tag(run.run_id(), "stage", "warmup").unwrap();
        store.set_tag(run.run_id(), "stage", "train").unwrap();

        // tags live beside the run, matching the file backend's layout
        assert!(store.get_run(run.run_id()).unwrap().tags().is_empty());
        let tags = store.get_tags(run.run_id()).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value(), "train");
    }

    #[test]
    fn test_metric_history_rejects_invalid_key() {
        let store = MemoryStore::new();
        let exp = store.create_experiment("exp", None).unwrap();
        let run = store
            .create_run(exp.experiment_id(), RunSource::Unknown, None)
            .unwrap();

        assert!(matches!(
            store.get_metric_history(run.run_id(), "../escape"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_concurrent_metric_writers() {
        let store = Arc::new(MemoryStore::new());
        let exp = store.create_experiment("exp", None).unwrap();
        let run = store
            .create_run(exp.experiment_id(), RunSource::Unknown, None)
            .unwrap();
        let run_id = run.run_id().to_string();

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                let run_id = run_id.clone();
                std::thread::spawn(move || {
                    for step in 0..100 {
                        store
                            .log_metric(&MetricRecord::new(
                                &run_id,
                                "loss",
                                step,
                                f64::from(worker),
                            ))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = store.get_metric_history(&run_id, "loss").unwrap();
        assert_eq!(history.len(), 800);
    }

    #[test]
    fn test_run_artifact_uri_derived_from_experiment() {
        let store = MemoryStore::new();
        let exp = store
            .create_experiment("exp", Some("/tmp/artifacts"))
            .unwrap();
        let run = store
            .create_run(exp.experiment_id(), RunSource::Unknown, None)
            .unwrap();
        assert_eq!(
            run.artifact_uri(),
            format!("/tmp/artifacts/{}/artifacts", run.run_id())
        );
    }
}
