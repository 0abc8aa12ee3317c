//! Error types for release operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::platform::{Platform, PLATFORM_NAMES};

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Unsupported platform '{0}' (supported: {})", PLATFORM_NAMES.join(", "))]
    InvalidPlatform(String),

    #[error("Invalid version '{0}' (must be a single non-empty path segment)")]
    InvalidVersion(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No OTA configuration published yet")]
    NoOtaConfigured,

    #[error("Platform {0} has no release yet")]
    PlatformNotReleased(Platform),

    #[error("Failed to read '{key}' from storage: {reason}")]
    StorageReadFailed { key: String, reason: String },

    #[error("Failed to write '{key}' to storage: {reason}")]
    StorageWriteFailed { key: String, reason: String },

    #[error("Manifest at '{key}' is malformed: {reason}")]
    ManifestMalformed { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReleaseError {
    /// Stable short code, used in the invocation log
    pub fn code(&self) -> &'static str {
        match self {
            ReleaseError::InvalidPlatform(_) => "invalid_platform",
            ReleaseError::InvalidVersion(_) => "invalid_version",
            ReleaseError::FileNotFound(_) => "file_not_found",
            ReleaseError::NoOtaConfigured => "no_ota_configured",
            ReleaseError::PlatformNotReleased(_) => "platform_not_released",
            ReleaseError::StorageReadFailed { .. } => "storage_read_failed",
            ReleaseError::StorageWriteFailed { .. } => "storage_write_failed",
            ReleaseError::ManifestMalformed { .. } => "manifest_malformed",
            ReleaseError::Config(_) => "config",
            ReleaseError::Io(_) => "io",
            ReleaseError::Json(_) => "json",
        }
    }

    pub fn read_failed(key: &str, reason: impl ToString) -> Self {
        ReleaseError::StorageReadFailed {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(key: &str, reason: impl ToString) -> Self {
        ReleaseError::StorageWriteFailed {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReleaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_platform_message_lists_supported() {
        let err = ReleaseError::InvalidPlatform("symbian".to_string());
        let msg = err.to_string();
        assert!(msg.contains("symbian"));
        assert!(msg.contains("android, ios, windows, macos, linux"));
    }

    #[test]
    fn test_codes_are_distinct_for_preconditions() {
        assert_ne!(
            ReleaseError::NoOtaConfigured.code(),
            ReleaseError::PlatformNotReleased(Platform::Ios).code()
        );
    }
}
