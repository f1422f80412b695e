//! # Bitacora: Embedded ML Experiment Tracking Store
//!
//! Bitacora records machine-learning experiments as they run: named
//! experiments group runs, runs carry set-once parameters, append-only
//! metric time series, free-form tags, and artifact files.
//!
//! ## Design
//!
//! - **Embedded-first**: callers link the crate and write to a local
//!   store directly; no server round-trips on the logging hot path.
//! - **Append-only history**: metric logging never overwrites; the full
//!   sequence of values per `(run, key)` is retained and queryable.
//! - **Scoped runs**: an [`client::ActiveRun`] guard terminates its run
//!   on scope exit, `Failed` when unwinding, so no run is left dangling.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bitacora::client::TrackingClient;
//! use bitacora::store::FileStore;
//!
//! # fn main() -> bitacora::Result<()> {
//! let client = TrackingClient::new(FileStore::open("./bitruns")?);
//! let experiment = client.get_or_create_experiment("resnet-sweep")?;
//!
//! let mut run = client.start_run(experiment.experiment_id())?;
//! run.log_param("batch_size", "32")?;
//! for epoch in 0..3 {
//!     run.log_metric_at("loss", epoch, 1.0 / (epoch as f64 + 1.0))?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod artifact;
pub mod client;
pub mod config;
pub mod error;
pub mod record;
pub mod store;
pub mod uri;

pub use error::{Error, Result};
