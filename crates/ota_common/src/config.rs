//! otactl settings
//!
//! Sources, highest priority first:
//! 1. Environment variables (`S3_*`, `CDN_BASE_URL`, `OTACTL_*`)
//! 2. Config file: `--config`, else `$OTACTL_CONFIG`, else `<config_dir>/otactl/config.toml`
//! 3. Built-in defaults
//!
//! A missing config file is not an error; a malformed one is.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ReleaseError, Result};

const CONFIG_DIR: &str = "otactl";
const CONFIG_FILE: &str = "config.toml";

/// Which object store backs the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    S3,
    Local,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::S3 => "s3",
            StorageKind::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageKind,

    #[serde(default = "default_s3_endpoint")]
    pub s3_endpoint: String,

    #[serde(default)]
    pub s3_access_key: String,

    #[serde(default)]
    pub s3_secret_key: String,

    #[serde(default)]
    pub s3_bucket: String,

    #[serde(default = "default_s3_region")]
    pub s3_region: String,

    /// Public base URL for uploaded objects; empty means bucket URLs
    #[serde(default)]
    pub cdn_base_url: String,

    /// Root directory for the local store
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// Key prefix for every object this tool writes
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Refuse to overwrite a manifest that fails to parse
    #[serde(default)]
    pub strict_manifest: bool,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_s3_endpoint() -> String {
    "https://s3.amazonaws.com".to_string()
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from("ota-store")
}

fn default_prefix() -> String {
    "app".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: StorageKind::default(),
            s3_endpoint: default_s3_endpoint(),
            s3_access_key: String::new(),
            s3_secret_key: String::new(),
            s3_bucket: String::new(),
            s3_region: default_s3_region(),
            cdn_base_url: String::new(),
            local_root: default_local_root(),
            prefix: default_prefix(),
            strict_manifest: false,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Settings {
    /// Load settings from file and process environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os("OTACTL_CONFIG")
                .map(PathBuf::from)
                .or_else(Self::default_path),
        };

        let mut settings = match path {
            Some(p) if p.exists() => Self::from_file(&p)?,
            Some(p) if explicit.is_some() => {
                return Err(ReleaseError::Config(format!(
                    "config file {} does not exist",
                    p.display()
                )));
            }
            _ => Self::default(),
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// `<config_dir>/otactl/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| ReleaseError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay environment values; `lookup` is `std::env::var` outside tests
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_vars: [(&str, &mut String); 7] = [
            ("S3_ENDPOINT", &mut self.s3_endpoint),
            ("S3_ACCESS_KEY", &mut self.s3_access_key),
            ("S3_SECRET_KEY", &mut self.s3_secret_key),
            ("S3_BUCKET", &mut self.s3_bucket),
            ("S3_REGION", &mut self.s3_region),
            ("CDN_BASE_URL", &mut self.cdn_base_url),
            ("OTACTL_PREFIX", &mut self.prefix),
        ];
        for (key, slot) in string_vars {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }

        if let Some(root) = lookup("OTACTL_LOCAL_ROOT") {
            self.local_root = PathBuf::from(root);
        }

        if let Some(kind) = lookup("OTACTL_STORAGE") {
            self.storage = match kind.to_lowercase().as_str() {
                "s3" => StorageKind::S3,
                "local" => StorageKind::Local,
                other => {
                    return Err(ReleaseError::Config(format!(
                        "OTACTL_STORAGE must be 's3' or 'local', got '{}'",
                        other
                    )))
                }
            };
        }

        if let Some(strict) = lookup("OTACTL_STRICT_MANIFEST") {
            self.strict_manifest = matches!(strict.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim_matches('/').is_empty() {
            return Err(ReleaseError::Config("prefix must not be empty".to_string()));
        }
        if self.storage == StorageKind::S3 && self.s3_bucket.is_empty() {
            return Err(ReleaseError::Config(
                "s3_bucket is required for S3 storage (set S3_BUCKET)".to_string(),
            ));
        }
        Ok(())
    }
}
