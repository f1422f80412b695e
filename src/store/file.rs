//! Directory-backed tracking store.
//!
//! Layout (one directory per experiment, one per run):
//!
//! ```text
//! <root>/
//!   <experiment_id>/
//!     meta.json
//!     <run_id>/
//!       meta.json
//!       params/<key>      file body = value string
//!       tags/<key>        file body = value string
//!       metrics/<key>     one line per point: "<ts_millis> <value> <step>"
//!       artifacts/
//! ```
//!
//! Write pattern mirrors the append-only design of the schema:
//! - `meta.json` is replaced atomically (temp file + rename)
//! - metric points are single `O_APPEND` writes, so concurrent loggers
//!   interleave lines instead of corrupting each other

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;

use super::{ensure_active, new_id, validate_key, TrackingStore};
use crate::record::{
    ExperimentRecord, MetricRecord, ParamRecord, RunRecord, RunSource, RunStatus, TagRecord,
};
use crate::{Error, Result};

/// ID of the default experiment every file store starts with.
pub const DEFAULT_EXPERIMENT_ID: &str = "0";

const DEFAULT_EXPERIMENT_NAME: &str = "Default";
const META_FILE: &str = "meta.json";

/// Persistent tracking store rooted at a local directory.
///
/// `FileStore::open` is idempotent: it creates the root and a `Default`
/// experiment (id `0`) on first use and simply attaches afterwards.
///
/// # Example
///
/// ```rust,no_run
/// use bitacora::store::{FileStore, TrackingStore};
///
/// # fn example() -> bitacora::Result<()> {
/// let store = FileStore::open("./bitruns")?;
/// let experiment = store.get_experiment("0")?;
/// assert_eq!(experiment.name(), "Default");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    // run_id -> experiment_id, filled lazily to avoid directory scans
    run_index: DashMap<String, String>,
    // serializes read-modify-write cycles on meta.json and param files
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a file store at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the
    /// default experiment cannot be written.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let store = Self {
            root,
            run_index: DashMap::new(),
            write_lock: Mutex::new(()),
        };
        if !store.experiment_dir(DEFAULT_EXPERIMENT_ID).join(META_FILE).exists() {
            let location = store.default_artifact_location(DEFAULT_EXPERIMENT_ID);
            let experiment = ExperimentRecord::new(
                DEFAULT_EXPERIMENT_ID,
                DEFAULT_EXPERIMENT_NAME,
                location,
            );
            store.write_experiment_meta(&experiment)?;
            tracing::debug!(root = %store.root.display(), "initialized file store");
        }
        Ok(store)
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn experiment_dir(&self, experiment_id: &str) -> PathBuf {
        self.root.join(experiment_id)
    }

    fn default_artifact_location(&self, experiment_id: &str) -> String {
        self.experiment_dir(experiment_id).display().to_string()
    }

    fn run_dir(&self, experiment_id: &str, run_id: &str) -> PathBuf {
        self.experiment_dir(experiment_id).join(run_id)
    }

    /// Take the write lock, recovering from a poisoned mutex so a
    /// panicked writer does not cascade into every later caller (or
    /// into a run guard's drop during unwinding).
    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sibling temp-file name for an atomic key write. Valid keys never
    /// start with '.', so this cannot collide with another key's file.
    fn tmp_key_path(path: &Path, key: &str) -> PathBuf {
        path.with_file_name(format!(".tmp-{key}"))
    }

    /// Locate the directory of a run, consulting the lazy index first.
    fn find_run_dir(&self, run_id: &str) -> Result<PathBuf> {
        if let Some(experiment_id) = self.run_index.get(run_id) {
            let dir = self.run_dir(&experiment_id, run_id);
            if dir.join(META_FILE).exists() {
                return Ok(dir);
            }
        }
        for experiment in self.read_experiments()? {
            let dir = self.run_dir(experiment.experiment_id(), run_id);
            if dir.join(META_FILE).exists() {
                self.run_index
                    .insert(run_id.to_string(), experiment.experiment_id().to_string());
                return Ok(dir);
            }
        }
        Err(Error::run_not_found(run_id))
    }

    fn read_meta<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
        let body = fs::read_to_string(path)?;
        serde_json::from_str(&body).map_err(|e| Error::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Atomic JSON write: temp file in the same directory, then rename.
    fn write_meta<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn write_experiment_meta(&self, experiment: &ExperimentRecord) -> Result<()> {
        let dir = self.experiment_dir(experiment.experiment_id());
        fs::create_dir_all(&dir)?;
        Self::write_meta(&dir.join(META_FILE), experiment)
    }

    fn write_run_meta(&self, run: &RunRecord) -> Result<()> {
        let dir = self.run_dir(run.experiment_id(), run.run_id());
        Self::write_meta(&dir.join(META_FILE), run)
    }

    fn read_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let mut experiments = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = entry.path().join(META_FILE);
            if entry.file_type()?.is_dir() && meta.exists() {
                experiments.push(Self::read_meta(&meta)?);
            }
        }
        Ok(experiments)
    }

    fn read_run(&self, run_id: &str) -> Result<RunRecord> {
        let dir = self.find_run_dir(run_id)?;
        Self::read_meta(&dir.join(META_FILE))
    }

    fn parse_metric_line(path: &Path, run_id: &str, key: &str, line: &str) -> Result<MetricRecord> {
        let malformed = |reason: &str| Error::Malformed {
            path: path.display().to_string(),
            reason: format!("bad metric line '{line}': {reason}"),
        };
        let mut fields = line.split_whitespace();
        let ts_millis: i64 = fields
            .next()
            .ok_or_else(|| malformed("missing timestamp"))?
            .parse()
            .map_err(|_| malformed("unparseable timestamp"))?;
        let value: f64 = fields
            .next()
            .ok_or_else(|| malformed("missing value"))?
            .parse()
            .map_err(|_| malformed("unparseable value"))?;
        let step: i64 = fields
            .next()
            .ok_or_else(|| malformed("missing step"))?
            .parse()
            .map_err(|_| malformed("unparseable step"))?;
        let timestamp: DateTime<Utc> = Utc
            .timestamp_millis_opt(ts_millis)
            .single()
            .ok_or_else(|| malformed("timestamp out of range"))?;
        Ok(MetricRecord::builder(run_id, key, step, value)
            .timestamp(timestamp)
            .build())
    }
}

impl TrackingStore for FileStore {
    fn create_experiment(
        &self,
        name: &str,
        artifact_location: Option<&str>,
    ) -> Result<ExperimentRecord> {
        if name.trim().is_empty() {
            return Err(Error::InvalidKey(name.to_string()));
        }
        let _guard = self.write_guard();
        if self
            .read_experiments()?
            .iter()
            .any(|e| e.name() == name)
        {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        let experiment_id = new_id();
        let location = artifact_location.map_or_else(
            || self.default_artifact_location(&experiment_id),
            ToString::to_string,
        );
        let experiment = ExperimentRecord::new(experiment_id, name, location);
        self.write_experiment_meta(&experiment)?;
        tracing::debug!(
            experiment_id = experiment.experiment_id(),
            name,
            "created experiment"
        );
        Ok(experiment)
    }

    fn get_experiment(&self, experiment_id: &str) -> Result<ExperimentRecord> {
        let meta = self.experiment_dir(experiment_id).join(META_FILE);
        if !meta.exists() {
            return Err(Error::experiment_not_found(experiment_id));
        }
        Self::read_meta(&meta)
    }

    fn get_experiment_by_name(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        Ok(self
            .read_experiments()?
            .into_iter()
            .find(|e| e.name() == name))
    }

    fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let mut experiments: Vec<ExperimentRecord> = self
            .read_experiments()?
            .into_iter()
            .filter(ExperimentRecord::is_active)
            .collect();
        experiments.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.experiment_id().cmp(b.experiment_id()))
        });
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
        let dir = self.run_dir(experiment_id, &run_id);
        fs::create_dir_all(dir.join("params"))?;
        fs::create_dir_all(dir.join("metrics"))?;
        fs::create_dir_all(dir.join("tags"))?;
        fs::create_dir_all(dir.join("artifacts"))?;

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
        self.write_run_meta(&run)?;
        self.run_index
            .insert(run_id, experiment_id.to_string());
        tracing::debug!(run_id = run.run_id(), experiment_id, "created run");
        Ok(run)
    }

    fn get_run(&self, run_id: &str) -> Result<RunRecord> {
        self.read_run(run_id)
    }

    fn list_runs(&self, experiment_id: &str) -> Result<Vec<RunRecord>> {
        self.get_experiment(experiment_id)?;
        let mut runs = Vec::new();
        for entry in fs::read_dir(self.experiment_dir(experiment_id))? {
            let entry = entry?;
            let meta = entry.path().join(META_FILE);
            if entry.file_type()?.is_dir() && meta.exists() {
                runs.push(Self::read_meta(&meta)?);
            }
        }
        runs.sort_by(|a: &RunRecord, b: &RunRecord| {
            a.started_at()
                .cmp(&b.started_at())
                .then_with(|| a.run_id().cmp(b.run_id()))
        });
        Ok(runs)
    }

    fn update_run_status(&self, run_id: &str, status: RunStatus) -> Result<RunRecord> {
        let _guard = self.write_guard();
        let mut run = self.read_run(run_id)?;
        ensure_active(&run)?;
        run.terminate(status);
        self.write_run_meta(&run)?;
        Ok(run)
    }

    fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let _guard = self.write_guard();
        let run = self.read_run(run_id)?;
        ensure_active(&run)?;
        let path = self
            .run_dir(run.experiment_id(), run_id)
            .join("params")
            .join(key);
        if path.exists() {
            let old = fs::read_to_string(&path)?;
            if old == value {
                return Ok(());
            }
            return Err(Error::ParamConflict {
                key: key.to_string(),
                old,
                new: value.to_string(),
            });
        }
        let tmp = Self::tmp_key_path(&path, key);
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn get_params(&self, run_id: &str) -> Result<Vec<ParamRecord>> {
        let run = self.read_run(run_id)?;
        let dir = self.run_dir(run.experiment_id(), run_id).join("params");
        let mut params = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let key = entry.file_name().to_string_lossy().into_owned();
            // keys never start with '.'; dotfiles here are leftover
            // temp files from a crashed writer
            if key.starts_with('.') {
                continue;
            }
            let value = fs::read_to_string(entry.path())?;
            params.push(ParamRecord::new(run_id, key, value));
        }
        params.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(params)
    }

    fn log_metric(&self, metric: &MetricRecord) -> Result<()> {
        validate_key(metric.key())?;
        // the lock closes the gap between the active check and the
        // append: update_run_status holds it while terminating
        let _guard = self.write_guard();
        let run = self.read_run(metric.run_id())?;
        ensure_active(&run)?;
        let path = self
            .run_dir(run.experiment_id(), metric.run_id())
            .join("metrics")
            .join(metric.key());
        let line = format!(
            "{} {:?} {}\n",
            metric.timestamp().timestamp_millis(),
            metric.value(),
            metric.step()
        );
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        // a single append write keeps concurrent loggers line-atomic
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn get_metric_history(&self, run_id: &str, key: &str) -> Result<Vec<MetricRecord>> {
        validate_key(key)?;
        let run = self.read_run(run_id)?;
        let path = self
            .run_dir(run.experiment_id(), run_id)
            .join("metrics")
            .join(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let body = fs::read_to_string(&path)?;
        let mut history = Vec::new();
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            history.push(Self::parse_metric_line(&path, run_id, key, line)?);
        }
        history.sort_by_key(|m| (m.step(), m.timestamp()));
        Ok(history)
    }

    fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let _guard = self.write_guard();
        let run = self.read_run(run_id)?;
        ensure_active(&run)?;
        let path = self
            .run_dir(run.experiment_id(), run_id)
            .join("tags")
            .join(key);
        let tmp = Self::tmp_key_path(&path, key);
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn get_tags(&self, run_id: &str) -> Result<Vec<TagRecord>> {
        let run = self.read_run(run_id)?;
        let dir = self.run_dir(run.experiment_id(), run_id).join("tags");
        let mut tags = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let key = entry.file_name().to_string_lossy().into_owned();
            if key.starts_with('.') {
                continue;
            }
            let value = fs::read_to_string(entry.path())?;
            tags.push(TagRecord::new(key, value));
        }
        tags.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(tags)
    }
}
