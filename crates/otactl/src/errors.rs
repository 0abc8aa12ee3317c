//! Error codes and exit status for otactl

use ota_common::ReleaseError;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Bad platform name or version, or missing local file
pub const EXIT_INVALID_INPUT: i32 = 64;

/// The manifest is not in a state the command can act on
pub const EXIT_PRECONDITION: i32 = 65;

/// Stored manifest does not match the schema, or is not JSON in strict mode
pub const EXIT_MANIFEST_MALFORMED: i32 = 66;

/// Object storage unreachable or refused the request
pub const EXIT_STORAGE_UNAVAILABLE: i32 = 70;

pub const EXIT_CONFIG_ERROR: i32 = 78;

pub fn exit_code_for(err: &ReleaseError) -> i32 {
    match err {
        ReleaseError::InvalidPlatform(_)
        | ReleaseError::InvalidVersion(_)
        | ReleaseError::FileNotFound(_) => EXIT_INVALID_INPUT,
        ReleaseError::NoOtaConfigured | ReleaseError::PlatformNotReleased(_) => EXIT_PRECONDITION,
        ReleaseError::ManifestMalformed { .. } => EXIT_MANIFEST_MALFORMED,
        ReleaseError::StorageReadFailed { .. } | ReleaseError::StorageWriteFailed { .. } => {
            EXIT_STORAGE_UNAVAILABLE
        }
        ReleaseError::Config(_) => EXIT_CONFIG_ERROR,
        ReleaseError::Io(_) | ReleaseError::Json(_) => EXIT_GENERAL_ERROR,
    }
}

/// Exit code and log code for a top-level failure
pub fn classify(err: &anyhow::Error) -> (i32, String) {
    match err.downcast_ref::<ReleaseError>() {
        Some(release_err) => (exit_code_for(release_err), release_err.code().to_string()),
        None => (EXIT_GENERAL_ERROR, "general".to_string()),
    }
}
