//! Environment configuration for the tracking client and CLI.
//!
//! Recognized variables:
//! - `BITACORA_TRACKING_URI` - tracking backend location (default `./bitruns`)
//! - `BITACORA_EXPERIMENT_ID` - experiment to log new runs under
//! - `BITACORA_EXPERIMENT_NAME` - experiment selection by name
//!   (created on demand; the ID variable wins when both are set)
//! - `BITACORA_ARTIFACT_ROOT` - default artifact root for new experiments
//!
//! Values are trimmed; empty strings count as unset.

use std::str::FromStr;

use crate::record::ExperimentRecord;
use crate::store::TrackingStore;
use crate::uri::TrackingUri;
use crate::Result;

/// Default local tracking root used when nothing is configured.
pub const DEFAULT_TRACKING_DIR: &str = "./bitruns";

/// Environment variable naming the tracking URI.
pub const ENV_TRACKING_URI: &str = "BITACORA_TRACKING_URI";
/// Environment variable naming the target experiment ID.
pub const ENV_EXPERIMENT_ID: &str = "BITACORA_EXPERIMENT_ID";
/// Environment variable naming the target experiment by name.
pub const ENV_EXPERIMENT_NAME: &str = "BITACORA_EXPERIMENT_NAME";
/// Environment variable overriding the default artifact root.
pub const ENV_ARTIFACT_ROOT: &str = "BITACORA_ARTIFACT_ROOT";

/// Resolved environment configuration.
#[derive(Debug, Clone)]
pub struct Config {
    tracking_uri: TrackingUri,
    experiment_id: Option<String>,
    experiment_name: Option<String>,
    artifact_root: Option<String>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedUri` if `BITACORA_TRACKING_URI` holds
    /// a URI that cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let tracking_uri = match env_var(ENV_TRACKING_URI) {
            Some(raw) => TrackingUri::from_str(&raw)?,
            None => TrackingUri::from_str(DEFAULT_TRACKING_DIR)?,
        };
        Ok(Self {
            tracking_uri,
            experiment_id: env_var(ENV_EXPERIMENT_ID),
            experiment_name: env_var(ENV_EXPERIMENT_NAME),
            artifact_root: env_var(ENV_ARTIFACT_ROOT),
        })
    }

    /// Build a configuration from explicit values (CLI overrides).
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedUri` if the URI cannot be parsed.
    pub fn with_tracking_uri(raw: &str) -> Result<Self> {
        Ok(Self {
            tracking_uri: TrackingUri::from_str(raw)?,
            experiment_id: env_var(ENV_EXPERIMENT_ID),
            experiment_name: env_var(ENV_EXPERIMENT_NAME),
            artifact_root: env_var(ENV_ARTIFACT_ROOT),
        })
    }

    /// The configured tracking URI.
    #[must_use]
    pub const fn tracking_uri(&self) -> &TrackingUri {
        &self.tracking_uri
    }

    /// Configured experiment ID, if any.
    #[must_use]
    pub fn experiment_id(&self) -> Option<&str> {
        self.experiment_id.as_deref()
    }

    /// Configured experiment name, if any.
    #[must_use]
    pub fn experiment_name(&self) -> Option<&str> {
        self.experiment_name.as_deref()
    }

    /// Configured artifact root override, if any.
    #[must_use]
    pub fn artifact_root(&self) -> Option<&str> {
        self.artifact_root.as_deref()
    }

    /// Resolve the configured experiment against a store.
    ///
    /// Selection order: explicit ID, then name (creating the experiment
    /// if the name is unknown), then the store's first listed
    /// experiment.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the configured ID does not exist, or if the
    /// store has no experiments at all.
    pub fn resolve_experiment(&self, store: &dyn TrackingStore) -> Result<ExperimentRecord> {
        if let Some(id) = &self.experiment_id {
            return store.get_experiment(id);
        }
        if let Some(name) = &self.experiment_name {
            if let Some(existing) = store.get_experiment_by_name(name)? {
                return Ok(existing);
            }
            return store.create_experiment(name, self.artifact_root.as_deref());
        }
        store
            .list_experiments()?
            .into_iter()
            .next()
            .ok_or_else(|| crate::Error::experiment_not_found("<default>"))
    }
}
