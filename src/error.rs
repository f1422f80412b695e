//! Error types for Bitacora
//!
//! Clear error messages with actionable guidance.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Bitacora error types
#[derive(Error, Debug)]
pub enum Error {
    /// Requested experiment or run does not exist
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity kind ("experiment" or "run")
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// Experiment name already taken
    #[error("experiment '{0}' already exists")]
    AlreadyExists(String),

    /// Parameter re-logged with a different value (params are set-once)
    #[error("param '{key}' already logged with value '{old}', refusing new value '{new}'")]
    ParamConflict {
        /// Parameter key
        key: String,
        /// Value already stored
        old: String,
        /// Conflicting value the caller tried to log
        new: String,
    },

    /// Write attempted against a run in a terminal status
    #[error("run '{0}' is not active; params, metrics and tags can only be logged to a running run")]
    RunNotActive(String),

    /// Key failed validation (empty, path separators, leading dot, control chars)
    #[error("invalid key '{0}': keys must be non-empty, printable, free of path separators, and must not start with '.'")]
    InvalidKey(String),

    /// Artifact path escapes the artifact root
    #[error("invalid artifact path '{0}': path must be relative and must not traverse upward")]
    InvalidPath(String),

    /// Tracking URI cannot be resolved to a store in this build
    #[error("unsupported tracking URI '{0}': only local paths and file:// URIs resolve to a store")]
    UnsupportedUri(String),

    /// Artifact URI scheme has no registered store implementation
    #[error("unsupported artifact scheme '{0}': only local filesystem artifact stores are available")]
    UnsupportedScheme(String),

    /// Store contents could not be parsed
    #[error("malformed store data at {path}: {reason}")]
    Malformed {
        /// Location of the offending file
        path: String,
        /// What failed to parse
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a `NotFound` error about an experiment.
    #[must_use]
    pub fn experiment_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "experiment",
            id: id.into(),
        }
    }

    /// Shorthand for a `NotFound` error about a run.
    #[must_use]
    pub fn run_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "run",
            id: id.into(),
        }
    }
}
