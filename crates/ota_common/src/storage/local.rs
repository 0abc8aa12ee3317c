//! Filesystem object store
//!
//! Keys map to files under a root directory. Used for staging a release
//! tree before syncing it to a bucket, and for offline runs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::{public_url, ObjectStore};
use crate::error::{ReleaseError, Result};

pub struct LocalStore {
    root: PathBuf,
    cdn_base: Option<String>,
}

impl LocalStore {
    pub fn new(root: PathBuf, cdn_base: Option<String>) -> Self {
        Self { root, cdn_base }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key, refusing anything that would escape the root
    fn path_for(&self, key: &str) -> std::result::Result<PathBuf, String> {
        let relative = Path::new(key.trim_start_matches('/'));
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !clean || relative.as_os_str().is_empty() {
            return Err(format!("key '{}' is not a plain relative path", key));
        }
        Ok(self.root.join(relative))
    }

    fn file_url_base(&self) -> String {
        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        format!("file://{}", root.display())
    }
}

impl ObjectStore for LocalStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self
            .path_for(key)
            .map_err(|e| ReleaseError::read_failed(key, e))?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ReleaseError::read_failed(key, e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let path = self
            .path_for(key)
            .map_err(|e| ReleaseError::write_failed(key, e))?;
        debug!("Writing {} ({} bytes, {})", path.display(), bytes.len(), content_type);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReleaseError::write_failed(key, e))?;
        }

        // Rename over the target so readers never see a partial object
        let tmp = path.with_extension("otactl-tmp");
        fs::write(&tmp, bytes).map_err(|e| ReleaseError::write_failed(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ReleaseError::write_failed(key, e)
        })?;

        Ok(public_url(self.cdn_base.as_deref(), &self.file_url_base(), key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self
            .path_for(key)
            .map_err(|e| ReleaseError::read_failed(key, e))?;
        Ok(path.is_file())
    }

    fn describe(&self) -> String {
        format!("local {}", self.root.display())
    }
}
