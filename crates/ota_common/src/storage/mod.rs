//! Object storage
//!
//! Everything the release tool persists goes through [`ObjectStore`]: read a
//! blob by key, replace a blob by key, check that a key exists. Writes are
//! whole-object replaces, so a failed write leaves the previous version in
//! place.

mod local;
mod memory;
mod s3;
mod sigv4;

pub use local::LocalStore;
pub use memory::{MemoryStore, StoreCall, StoredObject};
pub use s3::S3Store;

use std::fs;
use std::path::Path;

use crate::config::{Settings, StorageKind};
use crate::error::{ReleaseError, Result};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const JSON_CONTENT_TYPE: &str = "application/json";
const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

pub trait ObjectStore {
    /// Fetch an object; `Ok(None)` when the key does not exist
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace an object and return its public URL
    fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Upload a local file
    fn write_file(&self, key: &str, path: &Path, content_type: &str) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| ReleaseError::write_failed(key, e))?;
        self.write(key, &bytes, content_type)
    }

    /// Human-readable backend description for status output
    fn describe(&self) -> String;
}

impl<S: ObjectStore + ?Sized> ObjectStore for Box<S> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        (**self).write(key, bytes, content_type)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key)
    }

    fn write_file(&self, key: &str, path: &Path, content_type: &str) -> Result<String> {
        (**self).write_file(key, path, content_type)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build the configured store
pub fn open_store(settings: &Settings) -> Result<Box<dyn ObjectStore>> {
    match settings.storage {
        StorageKind::S3 => Ok(Box::new(S3Store::from_settings(settings)?)),
        StorageKind::Local => Ok(Box::new(LocalStore::new(
            settings.local_root.clone(),
            cdn_base(settings),
        ))),
    }
}

fn cdn_base(settings: &Settings) -> Option<String> {
    let base = settings.cdn_base_url.trim_end_matches('/');
    (!base.is_empty()).then(|| base.to_string())
}

/// `{cdn}/{key}` when a CDN is configured, else `{fallback_base}/{key}`
pub fn public_url(cdn_base: Option<&str>, fallback_base: &str, key: &str) -> String {
    let base = cdn_base.unwrap_or(fallback_base).trim_end_matches('/');
    format!("{}/{}", base, key.trim_start_matches('/'))
}

/// Content type from the file extension
pub fn content_type_for(file_name: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if ext.as_deref() == Some("apk") {
        return APK_CONTENT_TYPE.to_string();
    }

    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}
