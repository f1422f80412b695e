//! Experiment Record - root entity of the tracking schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TagRecord;

/// Lifecycle stage of an experiment.
///
/// Deleted experiments are retained in the store but hidden from
/// default listings, so run history is never destroyed by a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    /// Experiment is visible and accepts new runs.
    #[default]
    Active,
    /// Experiment is soft-deleted.
    Deleted,
}

/// Experiment Record represents a named grouping of runs.
///
/// Each experiment carries the default artifact-storage location that
/// runs created under it inherit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    experiment_id: String,
    name: String,
    artifact_location: String,
    lifecycle_stage: LifecycleStage,
    created_at: DateTime<Utc>,
    tags: Vec<TagRecord>,
}

impl ExperimentRecord {
    /// Create a new active experiment record.
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - Unique identifier for the experiment
    /// * `name` - Human-readable name (unique per store)
    /// * `artifact_location` - Default artifact root URI for this experiment's runs
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        artifact_location: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            artifact_location: artifact_location.into(),
            lifecycle_stage: LifecycleStage::Active,
            created_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    /// Create a builder for constructing an experiment record with optional fields.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        artifact_location: impl Into<String>,
    ) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(experiment_id, name, artifact_location)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the default artifact location URI.
    #[must_use]
    pub fn artifact_location(&self) -> &str {
        &self.artifact_location
    }

    /// Get the lifecycle stage.
    #[must_use]
    pub const fn lifecycle_stage(&self) -> LifecycleStage {
        self.lifecycle_stage
    }

    /// Check whether the experiment is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle_stage == LifecycleStage::Active
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the experiment tags.
    #[must_use]
    pub fn tags(&self) -> &[TagRecord] {
        &self.tags
    }

    /// Soft-delete the experiment.
    pub fn mark_deleted(&mut self) {
        self.lifecycle_stage = LifecycleStage::Deleted;
    }

    /// Restore a soft-deleted experiment.
    pub fn restore(&mut self) {
        self.lifecycle_stage = LifecycleStage::Active;
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    experiment_id: String,
    name: String,
    artifact_location: String,
    created_at: DateTime<Utc>,
    tags: Vec<TagRecord>,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        artifact_location: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            artifact_location: artifact_location.into(),
            created_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    /// Attach a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(TagRecord::new(key, value));
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        ExperimentRecord {
            experiment_id: self.experiment_id,
            name: self.name,
            artifact_location: self.artifact_location,
            lifecycle_stage: LifecycleStage::Active,
            created_at: self.created_at,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_record_new() {
        let record = ExperimentRecord::new("exp-1", "test", "./artifacts/exp-1");
        assert_eq!(record.experiment_id(), "exp-1");
        assert_eq!(record.name(), "test");
        assert_eq!(record.artifact_location(), "./artifacts/exp-1");
        assert!(record.is_active());
        assert!(record.tags().is_empty());
    }

    #[test]
    fn test_experiment_lifecycle_stage() {
        let mut record = ExperimentRecord::new("exp-1", "test", "loc");
        record.mark_deleted();
        assert_eq!(record.lifecycle_stage(), LifecycleStage::Deleted);
        record.restore();
        assert!(record.is_active());
    }

    #[test]
    fn test_experiment_record_builder_tags() {
        let record = ExperimentRecord::builder("exp-2", "tagged", "loc")
            .tag("team", "vision")
            .tag("priority", "high")
            .build();

        assert_eq!(record.tags().len(), 2);
        assert_eq!(record.tags()[0].key(), "team");
        assert_eq!(record.tags()[1].value(), "high");
    }
}
