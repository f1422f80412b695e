//! Tracking Record Schema
//!
//! Data structures for experiment tracking. The schema forms a shallow
//! tree rooted at the experiment:
//!
//! ```text
//! ExperimentRecord (1) ──< RunRecord (N)
//!                              │
//!                              ├──< ParamRecord (N)  [set-once]
//!                              ├──< MetricRecord (N) [time-series]
//!                              └──< TagRecord (N)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use bitacora::record::{ExperimentRecord, MetricRecord, RunRecord, RunStatus};
//!
//! let experiment = ExperimentRecord::new("exp-001", "My Experiment", "./bitruns/exp-001");
//!
//! let mut run = RunRecord::new("run-001", experiment.experiment_id());
//! run.start();
//!
//! let metric = MetricRecord::new(run.run_id(), "loss", 0, 0.5);
//!
//! run.terminate(RunStatus::Finished);
//! ```

mod experiment;
mod metric;
mod param;
mod run;
mod tag;

pub use experiment::{ExperimentRecord, ExperimentRecordBuilder, LifecycleStage};
pub use metric::{MetricRecord, MetricRecordBuilder};
pub use param::ParamRecord;
pub use run::{RunRecord, RunRecordBuilder, RunSource, RunStatus};
pub use tag::TagRecord;
