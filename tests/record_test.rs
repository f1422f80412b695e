//! Tracking record schema tests.

use bitacora::record::{
    ExperimentRecord, LifecycleStage, MetricRecord, ParamRecord, RunRecord, RunSource, RunStatus,
};

// =============================================================================
// ExperimentRecord Tests
// =============================================================================

#[test]
fn test_experiment_record_creation() {
    let record = ExperimentRecord::new("exp-001", "My Experiment", "/tmp/artifacts/exp-001");

    assert_eq!(record.experiment_id(), "exp-001");
    assert_eq!(record.name(), "My Experiment");
    assert_eq!(record.artifact_location(), "/tmp/artifacts/exp-001");
    assert_eq!(record.lifecycle_stage(), LifecycleStage::Active);
    assert!(record.created_at().timestamp() > 0);
}

#[test]
fn test_experiment_record_serialization() {
    let record = ExperimentRecord::builder("exp-003", "Serialization Test", "loc")
        .tag("team", "vision")
        .build();

    let json = serde_json::to_string(&record).expect("serialization failed");
    let deserialized: ExperimentRecord =
        serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(record, deserialized);
}

#[test]
fn test_experiment_soft_delete_round_trip() {
    let mut record = ExperimentRecord::new("exp-004", "Test", "loc");
    record.mark_deleted();

    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"deleted\""));
    let back: ExperimentRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back.lifecycle_stage(), LifecycleStage::Deleted);
}

// =============================================================================
// RunRecord Tests
// =============================================================================

#[test]
fn test_run_record_creation() {
    let run = RunRecord::new("run-001", "exp-001");

    assert_eq!(run.run_id(), "run-001");
    assert_eq!(run.experiment_id(), "exp-001");
    assert_eq!(run.status(), RunStatus::Pending);
    assert!(run.started_at().is_none());
    assert!(run.ended_at().is_none());
    assert_eq!(run.source(), &RunSource::Unknown);
    assert!(run.source_version().is_none());
}

#[test]
fn test_run_record_lifecycle_timestamps() {
    let mut run = RunRecord::new("run-003", "exp-001");
    run.start();
    run.terminate(RunStatus::Finished);

    assert_eq!(run.status(), RunStatus::Finished);
    assert!(run.ended_at().unwrap() >= run.started_at().unwrap());
}

#[test]
fn test_run_record_sources() {
    let file_run = RunRecord::builder("run-004", "exp-001")
        .source(RunSource::File {
            path: "train.py".to_string(),
        })
        .build();
    let project_run = RunRecord::builder("run-005", "exp-001")
        .source(RunSource::Project {
            uri: "git://models/vision".to_string(),
            entry_point: "main".to_string(),
        })
        .source_version("abc123")
        .build();

    assert!(matches!(file_run.source(), RunSource::File { .. }));
    assert!(matches!(project_run.source(), RunSource::Project { .. }));
    assert_eq!(project_run.source_version(), Some("abc123"));
}

#[test]
fn test_run_record_serialization() {
    let mut run = RunRecord::builder("run-006", "exp-001")
        .source(RunSource::File {
            path: "train.py".to_string(),
        })
        .artifact_uri("/tmp/a/run-006/artifacts")
        .tag("stage", "train")
        .build();
    run.start();

    let json = serde_json::to_string(&run).expect("serialization failed");
    let deserialized: RunRecord = serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(run, deserialized);
}

#[test]
fn test_run_status_serde_names() {
    // wire names are stable snake_case
    assert_eq!(
        serde_json::to_string(&RunStatus::Finished).unwrap(),
        "\"finished\""
    );
    assert_eq!(
        serde_json::from_str::<RunStatus>("\"killed\"").unwrap(),
        RunStatus::Killed
    );
}

// =============================================================================
// MetricRecord / ParamRecord Tests
// =============================================================================

#[test]
fn test_metric_record_time_series_batch() {
    let metrics: Vec<MetricRecord> = (0..100)
        .map(|step| {
            let loss = 1.0 / (step as f64 + 1.0);
            MetricRecord::new("run-001", "loss", step, loss)
        })
        .collect();

    assert_eq!(metrics.len(), 100);
    assert_eq!(metrics[0].step(), 0);
    assert_eq!(metrics[99].step(), 99);
    assert!(metrics[0].value() > metrics[99].value());
}

#[test]
fn test_metric_record_serialization() {
    let metric = MetricRecord::new("run-001", "loss", 50, 0.25);

    let json = serde_json::to_string(&metric).expect("serialization failed");
    let deserialized: MetricRecord = serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(metric.run_id(), deserialized.run_id());
    assert_eq!(metric.key(), deserialized.key());
    assert_eq!(metric.step(), deserialized.step());
    assert!((metric.value() - deserialized.value()).abs() < f64::EPSILON);
}

#[test]
fn test_param_record_fields() {
    let param = ParamRecord::new("run-001", "optimizer", "adam");
    assert_eq!(param.run_id(), "run-001");
    assert_eq!(param.key(), "optimizer");
    assert_eq!(param.value(), "adam");
}

// =============================================================================
// Cross-Record Integration
// =============================================================================

#[test]
fn test_experiment_run_metric_relationship() {
    let experiment = ExperimentRecord::new("exp-001", "Integration Test", "loc");
    let run = RunRecord::new("run-001", experiment.experiment_id());
    let metric = MetricRecord::new(run.run_id(), "accuracy", 0, 0.95);
    let param = ParamRecord::new(run.run_id(), "lr", "0.01");

    assert_eq!(run.experiment_id(), experiment.experiment_id());
    assert_eq!(metric.run_id(), run.run_id());
    assert_eq!(param.run_id(), run.run_id());
}

#[test]
fn test_full_run_lifecycle() {
    let experiment = ExperimentRecord::new("exp-lifecycle", "Full Test", "/tmp/a");

    let mut run = RunRecord::builder("run-lifecycle", experiment.experiment_id())
        .source(RunSource::File {
            path: "train.py".to_string(),
        })
        .source_version("4f2a91c")
        .build();
    run.start();

    let metrics: Vec<MetricRecord> = (0..10)
        .map(|epoch| {
            MetricRecord::new(
                run.run_id(),
                "epoch_loss",
                epoch,
                1.0 / (epoch as f64 + 1.0),
            )
        })
        .collect();

    run.terminate(RunStatus::Finished);

    assert_eq!(run.status(), RunStatus::Finished);
    assert_eq!(metrics.len(), 10);
    assert!(!run.is_active());
}
