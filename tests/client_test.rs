//! End-to-end client tests against a FileStore: scoped runs, artifact
//! logging, and the full track-then-query loop.

use std::fs;

use bitacora::client::TrackingClient;
use bitacora::record::{RunSource, RunStatus};
use bitacora::store::FileStore;
use tempfile::TempDir;

fn client() -> (TempDir, TrackingClient) {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path().join("store")).unwrap();
    (dir, TrackingClient::new(store))
}

#[test]
fn test_training_loop_end_to_end() {
    let (_dir, client) = client();
    let experiment = client.get_or_create_experiment("e2e").unwrap();

    let run_id = {
        let mut run = client
            .start_run_with(
                experiment.experiment_id(),
                RunSource::File {
                    path: "train.py".to_string(),
                },
                Some("deadbeef"),
            )
            .unwrap();

        run.log_param("optimizer", "adam").unwrap();
        run.log_param("lr", "0.001").unwrap();
        for epoch in 0..10 {
            run.log_metric("loss", 2.5 / (epoch as f64 + 1.0)).unwrap();
            run.log_metric("accuracy", 0.5 + 0.05 * epoch as f64).unwrap();
        }
        run.set_tag("host", "trainer-01").unwrap();
        run.run_id().to_string()
    };

    let run = client.store().get_run(&run_id).unwrap();
    assert_eq!(run.status(), RunStatus::Finished);
    assert_eq!(run.source_version(), Some("deadbeef"));

    let loss = client.store().get_metric_history(&run_id, "loss").unwrap();
    assert_eq!(loss.len(), 10);
    assert!(loss.first().unwrap().value() > loss.last().unwrap().value());

    let params = client.store().get_params(&run_id).unwrap();
    assert_eq!(params.len(), 2);

    let runs = client.store().list_runs(experiment.experiment_id()).unwrap();
    assert_eq!(runs.len(), 1);
}

#[test]
fn test_artifact_logging_through_guard() {
    let (dir, client) = client();
    let experiment = client.get_or_create_experiment("artifacts").unwrap();

    let model = dir.path().join("model.pt");
    fs::write(&model, b"weights").unwrap();

    let run = client.start_run(experiment.experiment_id()).unwrap();
    run.log_artifact(&model, None).unwrap();
    run.log_artifact(&model, Some("checkpoints/epoch-1")).unwrap();

    let listing = run.list_artifacts(None).unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].path(), "checkpoints");
    assert_eq!(listing[1].path(), "model.pt");
    assert_eq!(listing[1].file_size(), Some(7));

    let fetched = run.download_artifact("checkpoints/epoch-1/model.pt").unwrap();
    assert_eq!(fs::read(fetched).unwrap(), b"weights");

    // artifacts live under the run's artifact URI inside the store root
    let record = run.record().clone();
    drop(run);
    assert!(record.artifact_uri().ends_with("artifacts"));
}

#[test]
fn test_with_run_success_and_failure() {
    let (_dir, client) = client();
    let experiment = client.get_or_create_experiment("scoped").unwrap();
    let exp_id = experiment.experiment_id().to_string();

    let mut ok_run_id = String::new();
    let value = client
        .with_run(&exp_id, |run| {
            ok_run_id = run.run_id().to_string();
            run.log_metric("loss", 0.1)?;
            Ok(42)
        })
        .unwrap();
    assert_eq!(value, 42);
    assert_eq!(
        client.store().get_run(&ok_run_id).unwrap().status(),
        RunStatus::Finished
    );

    let mut bad_run_id = String::new();
    let result: bitacora::Result<()> = client.with_run(&exp_id, |run| {
        bad_run_id = run.run_id().to_string();
        Err(bitacora::Error::InvalidKey("boom".to_string()))
    });
    assert!(result.is_err());
    assert_eq!(
        client.store().get_run(&bad_run_id).unwrap().status(),
        RunStatus::Failed
    );
}

#[test]
fn test_clients_share_store() {
    let (_dir, client) = client();
    let experiment = client.get_or_create_experiment("shared").unwrap();

    let second = client.clone();
    let run = client.start_run(experiment.experiment_id()).unwrap();
    let run_id = run.run_id().to_string();
    drop(run);

    // the cloned client sees the run through the shared store handle
    let seen = second.store().get_run(&run_id).unwrap();
    assert_eq!(seen.status(), RunStatus::Finished);
}
