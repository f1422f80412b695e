//! Run Record - a single tracked execution within an experiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TagRecord;

/// Status of a run.
///
/// `Finished`, `Failed` and `Killed` are terminal: once a run reaches
/// one of them no further params, metrics or tags may be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Run is currently executing.
    Running,
    /// Run completed normally.
    Finished,
    /// Run ended with an error.
    Failed,
    /// Run was terminated by user or system.
    Killed,
}

impl RunStatus {
    /// Whether this status ends the run's lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Killed)
    }
}

/// Descriptor of the code a run executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunSource {
    /// A single script or notebook file.
    File {
        /// Path to the executed file
        path: String,
    },
    /// A packaged project invoked through a named entry point.
    Project {
        /// Project location URI
        uri: String,
        /// Entry point name within the project
        entry_point: String,
    },
    /// Source is unknown or was not reported.
    #[default]
    Unknown,
}

/// Run Record represents a single execution within an experiment.
///
/// A run tracks the execution lifecycle from start to termination, plus
/// where its code came from and where its artifacts go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    experiment_id: String,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    source: RunSource,
    source_version: Option<String>,
    artifact_uri: String,
    tags: Vec<TagRecord>,
}

impl RunRecord {
    /// Create a new run record in Pending status.
    ///
    /// # Arguments
    ///
    /// * `run_id` - Unique identifier for the run
    /// * `experiment_id` - ID of the parent experiment
    #[must_use]
    pub fn new(run_id: impl Into<String>, experiment_id: impl Into<String>) -> Self {
        RunRecordBuilder::new(run_id, experiment_id).build()
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(
        run_id: impl Into<String>,
        experiment_id: impl Into<String>,
    ) -> RunRecordBuilder {
        RunRecordBuilder::new(run_id, experiment_id)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Whether the run is still accepting writes.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has terminated.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the source descriptor.
    #[must_use]
    pub const fn source(&self) -> &RunSource {
        &self.source
    }

    /// Get the code version (commit hash), if recorded.
    #[must_use]
    pub fn source_version(&self) -> Option<&str> {
        self.source_version.as_deref()
    }

    /// Get the artifact location URI for this run.
    #[must_use]
    pub fn artifact_uri(&self) -> &str {
        &self.artifact_uri
    }

    /// Get the run tags.
    #[must_use]
    pub fn tags(&self) -> &[TagRecord] {
        &self.tags
    }

    /// Attach or replace a tag on the run.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let tag = TagRecord::new(key, value);
        if let Some(existing) = self.tags.iter_mut().find(|t| t.key() == tag.key()) {
            *existing = tag;
        } else {
            self.tags.push(tag);
        }
    }

    /// Start the run, transitioning from Pending to Running.
    ///
    /// Sets the `started_at` timestamp to now.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Terminate the run with the given final status.
    ///
    /// Sets the `ended_at` timestamp to now. Non-terminal statuses are
    /// recorded without an end timestamp so a run can move back to
    /// Running only while it has never terminated.
    pub fn terminate(&mut self, status: RunStatus) {
        self.status = status;
        if status.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    run_id: String,
    experiment_id: String,
    source: RunSource,
    source_version: Option<String>,
    artifact_uri: Option<String>,
    tags: Vec<TagRecord>,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(run_id: impl Into<String>, experiment_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            experiment_id: experiment_id.into(),
            source: RunSource::Unknown,
            source_version: None,
            artifact_uri: None,
            tags: Vec::new(),
        }
    }

    /// Set the source descriptor.
    #[must_use]
    pub fn source(mut self, source: RunSource) -> Self {
        self.source = source;
        self
    }

    /// Set the code version (commit hash).
    #[must_use]
    pub fn source_version(mut self, version: impl Into<String>) -> Self {
        self.source_version = Some(version.into());
        self
    }

    /// Set the artifact location URI.
    ///
    /// Defaults to `<experiment artifact location>/<run_id>/artifacts`
    /// when the store creates the run; the builder default is a relative
    /// placeholder used by tests.
    #[must_use]
    pub fn artifact_uri(mut self, uri: impl Into<String>) -> Self {
        self.artifact_uri = Some(uri.into());
        self
    }

    /// Attach a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(TagRecord::new(key, value));
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        let artifact_uri = self
            .artifact_uri
            .unwrap_or_else(|| format!("./{}/artifacts", self.run_id));
        RunRecord {
            run_id: self.run_id,
            experiment_id: self.experiment_id,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            source: self.source,
            source_version: self.source_version,
            artifact_uri,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_default() {
        let run = RunRecord::new("run-1", "exp-1");
        assert_eq!(run.status(), RunStatus::Pending);
        assert!(run.is_active());
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = RunRecord::new("run-1", "exp-1");
        run.start();
        assert_eq!(run.status(), RunStatus::Running);
        assert!(run.started_at().is_some());
        run.terminate(RunStatus::Finished);
        assert_eq!(run.status(), RunStatus::Finished);
        assert!(!run.is_active());
        assert!(run.ended_at().is_some());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Finished.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Killed.is_terminal());
    }

    #[test]
    fn test_run_builder_source() {
        let run = RunRecord::builder("run-2", "exp-1")
            .source(RunSource::Project {
                uri: "git://models/vision".to_string(),
                entry_point: "train".to_string(),
            })
            .source_version("4f2a91c")
            .build();

        assert_eq!(run.source_version(), Some("4f2a91c"));
        match run.source() {
            RunSource::Project { entry_point, .. } => assert_eq!(entry_point, "train"),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_set_tag_replaces() {
        let mut run = RunRecord::new("run-3", "exp-1");
        run.set_tag("stage", "warmup");
        run.set_tag("stage", "train");
        assert_eq!(run.tags().len(), 1);
        assert_eq!(run.tags()[0].value(), "train");
    }
}
