//! Tracking and artifact URI handling.
//!
//! The tracking URI selects where run metadata lives: a local directory
//! (plain path or `file://`), a remote tracking server (`http(s)://`),
//! or a managed workspace (`workspace://<name>`). Artifact locations use
//! a wider set of schemes covering the cloud object stores.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::store::FileStore;
use crate::{Error, Result};

/// Parsed tracking URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingUri {
    /// Local directory, from a plain path or a `file://` URI.
    LocalPath(PathBuf),
    /// Remote tracking server; the raw `http(s)://` URI is kept verbatim.
    Remote(String),
    /// Managed workspace identifier (`workspace://<name>`).
    Workspace(String),
}

impl TrackingUri {
    /// Resolve the URI to a metadata store.
    ///
    /// Only local paths resolve in this build; remote and workspace URIs
    /// are parsed so callers can round-trip configuration, but opening a
    /// store for them returns `Error::UnsupportedUri`.
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedUri` for non-local URIs; I/O errors from
    /// `FileStore::open` otherwise.
    pub fn resolve_store(&self) -> Result<FileStore> {
        match self {
            Self::LocalPath(path) => FileStore::open(path),
            Self::Remote(uri) => Err(Error::UnsupportedUri(uri.clone())),
            Self::Workspace(name) => Err(Error::UnsupportedUri(format!("workspace://{name}"))),
        }
    }

    /// Whether the URI points at the local filesystem.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::LocalPath(_))
    }
}

impl FromStr for TrackingUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::UnsupportedUri(String::new()));
        }
        if let Some(rest) = s.strip_prefix("file://") {
            return Ok(Self::LocalPath(PathBuf::from(rest)));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Remote(s.to_string()));
        }
        if let Some(name) = s.strip_prefix("workspace://") {
            if name.is_empty() {
                return Err(Error::UnsupportedUri(s.to_string()));
            }
            return Ok(Self::Workspace(name.to_string()));
        }
        // any other "<scheme>://" form is foreign here
        if let Some(pos) = s.find("://") {
            let scheme = &s[..pos];
            if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
                return Err(Error::UnsupportedUri(s.to_string()));
            }
        }
        Ok(Self::LocalPath(PathBuf::from(s)))
    }
}

impl fmt::Display for TrackingUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::Remote(uri) => write!(f, "{uri}"),
            Self::Workspace(name) => write!(f, "workspace://{name}"),
        }
    }
}

/// Scheme classification for artifact-location URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactScheme {
    /// Local filesystem (plain path or `file://`).
    Local,
    /// Amazon S3 (`s3://bucket/path`).
    S3,
    /// Google Cloud Storage (`gs://bucket/path`).
    Gcs,
    /// Azure Blob Storage (`wasbs://container@account/path`).
    AzureBlob,
    /// SFTP remote filesystem (`sftp://host/path`).
    Sftp,
    /// Plain HTTP(S) locations.
    Http,
    /// Anything else with an explicit scheme.
    Other(String),
}

impl ArtifactScheme {
    /// Classify an artifact-location URI by scheme.
    #[must_use]
    pub fn of(uri: &str) -> Self {
        let Some(pos) = uri.find("://") else {
            return Self::Local;
        };
        match &uri[..pos] {
            "file" => Self::Local,
            "s3" => Self::S3,
            "gs" => Self::Gcs,
            "wasbs" | "wasb" => Self::AzureBlob,
            "sftp" => Self::Sftp,
            "http" | "https" => Self::Http,
            other => Self::Other(other.to_string()),
        }
    }

    /// Scheme name for error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Local => "file",
            Self::S3 => "s3",
            Self::Gcs => "gs",
            Self::AzureBlob => "wasbs",
            Self::Sftp => "sftp",
            Self::Http => "http",
            Self::Other(name) => name,
        }
    }
}

/// Strip a `file://` prefix from a local artifact URI, leaving plain
/// paths untouched.
#[must_use]
pub fn local_path_of(uri: &str) -> &Path {
    Path::new(uri.strip_prefix("file://").unwrap_or(uri))
}
