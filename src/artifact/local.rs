//! Local filesystem artifact store.

use std::fs;
use std::path::{Path, PathBuf};

use super::{validate_artifact_path, ArtifactStore, FileInfo};
use crate::{Error, Result};

/// Artifact store rooted at a local directory.
///
/// Files are copied under the root; directory trees are copied
/// recursively. Listings are non-recursive and sorted by path.
#[derive(Debug)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, artifact_path: Option<&str>) -> Result<PathBuf> {
        match artifact_path {
            None => Ok(self.root.clone()),
            Some(path) => {
                validate_artifact_path(path)?;
                Ok(self.root.join(path))
            }
        }
    }

    fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            let target = dst.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                Self::copy_tree(&entry.path(), &target)?;
            } else {
                fs::copy(entry.path(), target)?;
            }
        }
        Ok(())
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn artifact_uri(&self) -> String {
        self.root.display().to_string()
    }

    fn log_artifact(&self, local_file: &Path, artifact_path: Option<&str>) -> Result<()> {
        let file_name = local_file
            .file_name()
            .ok_or_else(|| Error::InvalidPath(local_file.display().to_string()))?;
        let dest_dir = self.resolve(artifact_path)?;
        fs::create_dir_all(&dest_dir)?;
        fs::copy(local_file, dest_dir.join(file_name))?;
        tracing::debug!(
            file = %local_file.display(),
            dest = %dest_dir.display(),
            "logged artifact"
        );
        Ok(())
    }

    fn log_artifacts(&self, local_dir: &Path, artifact_path: Option<&str>) -> Result<()> {
        if !local_dir.is_dir() {
            return Err(Error::InvalidPath(local_dir.display().to_string()));
        }
        let dest_dir = self.resolve(artifact_path)?;
        Self::copy_tree(local_dir, &dest_dir)?;
        tracing::debug!(
            dir = %local_dir.display(),
            dest = %dest_dir.display(),
            "logged artifact directory"
        );
        Ok(())
    }

    fn list_artifacts(&self, path: Option<&str>) -> Result<Vec<FileInfo>> {
        let dir = self.resolve(path)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = path.map(|p| format!("{p}/")).unwrap_or_default();
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata()?;
            let info = if meta.is_dir() {
                FileInfo::new(format!("{prefix}{name}"), true, None)
            } else {
                FileInfo::new(format!("{prefix}{name}"), false, Some(meta.len()))
            };
            entries.push(info);
        }
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }

    fn download_artifact(&self, artifact_path: &str) -> Result<PathBuf> {
        validate_artifact_path(artifact_path)?;
        let path = self.root.join(artifact_path);
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::InvalidPath(artifact_path.to_string()))
        }
    }
}
