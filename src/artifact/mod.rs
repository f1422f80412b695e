//! Artifact Storage Module
//!
//! Artifacts are opaque files or directories logged against a run's
//! artifact location. The `ArtifactStore` trait is the seam for the
//! storage backends; URIs are dispatched by scheme through
//! [`store_for_uri`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bitacora::artifact::{store_for_uri, ArtifactStore};
//! use std::path::Path;
//!
//! # fn example() -> bitacora::Result<()> {
//! let store = store_for_uri("/tmp/run-artifacts")?;
//! store.log_artifact(Path::new("model.pt"), Some("checkpoints"))?;
//! for info in store.list_artifacts(Some("checkpoints"))? {
//!     println!("{} ({:?} bytes)", info.path(), info.file_size());
//! }
//! # Ok(())
//! # }
//! ```

mod local;

pub use local::LocalArtifactStore;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::uri::{local_path_of, ArtifactScheme};
use crate::{Error, Result};

/// Listing entry for an artifact file or directory.
///
/// Paths are relative to the artifact root and `/`-separated regardless
/// of platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    path: String,
    is_dir: bool,
    file_size: Option<u64>,
}

impl FileInfo {
    /// Create a new listing entry.
    #[must_use]
    pub fn new(path: impl Into<String>, is_dir: bool, file_size: Option<u64>) -> Self {
        Self {
            path: path.into(),
            is_dir,
            file_size,
        }
    }

    /// Relative path of the entry.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the entry is a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// File size in bytes; `None` for directories.
    #[must_use]
    pub const fn file_size(&self) -> Option<u64> {
        self.file_size
    }
}

/// Storage backend for run artifacts.
pub trait ArtifactStore: Send + Sync + std::fmt::Debug {
    /// Root URI of this artifact store.
    fn artifact_uri(&self) -> String;

    /// Store a single local file under the artifact root, optionally
    /// below a relative `artifact_path` directory.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPath` for traversal attempts, I/O errors otherwise.
    fn log_artifact(&self, local_file: &Path, artifact_path: Option<&str>) -> Result<()>;

    /// Store a local directory tree under the artifact root, optionally
    /// below a relative `artifact_path` directory.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPath` for traversal attempts, I/O errors otherwise.
    fn log_artifacts(&self, local_dir: &Path, artifact_path: Option<&str>) -> Result<()>;

    /// List artifacts directly under `path` (the root when `None`),
    /// ordered by path.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPath` for traversal attempts, I/O errors otherwise.
    fn list_artifacts(&self, path: Option<&str>) -> Result<Vec<FileInfo>>;

    /// Fetch an artifact to the local filesystem and return its path.
    /// Local stores return the stored file's path without copying.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPath` if the artifact does not exist or escapes
    /// the root.
    fn download_artifact(&self, artifact_path: &str) -> Result<PathBuf>;
}

/// Resolve an artifact-location URI to a store implementation.
///
/// Only the local filesystem scheme is backed by an implementation;
/// cloud schemes (`s3`, `gs`, `wasbs`, `sftp`, ...) are recognized and
/// rejected with `Error::UnsupportedScheme`.
///
/// # Errors
///
/// `Error::UnsupportedScheme` for non-local URIs, I/O errors from
/// creating the local root.
pub fn store_for_uri(uri: &str) -> Result<Box<dyn ArtifactStore>> {
    match ArtifactScheme::of(uri) {
        ArtifactScheme::Local => Ok(Box::new(LocalArtifactStore::new(local_path_of(uri))?)),
        scheme => Err(Error::UnsupportedScheme(scheme.name().to_string())),
    }
}

/// Validate a caller-supplied relative artifact path.
///
/// # Errors
///
/// `Error::InvalidPath` for absolute paths, `..` components, or empty
/// components.
pub(crate) fn validate_artifact_path(path: &str) -> Result<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        Err(Error::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}
