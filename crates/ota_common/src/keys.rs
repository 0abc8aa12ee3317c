//! Object key layout under the configured prefix
//!
//! ```text
//! {prefix}/manifest.json
//! {prefix}/download.html
//! {prefix}/favicon.png
//! {prefix}/releases/{platform}/{version}/{file_name}
//! ```

use crate::error::{ReleaseError, Result};
use crate::platform::Platform;

const MANIFEST_FILE: &str = "manifest.json";
const DOWNLOAD_PAGE_FILE: &str = "download.html";
const ICON_FILE: &str = "favicon.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl KeyLayout {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn manifest(&self) -> String {
        format!("{}/{}", self.prefix, MANIFEST_FILE)
    }

    pub fn download_page(&self) -> String {
        format!("{}/{}", self.prefix, DOWNLOAD_PAGE_FILE)
    }

    pub fn icon(&self) -> String {
        format!("{}/{}", self.prefix, ICON_FILE)
    }

    /// Callers validate `version` with [`validate_version`] first
    pub fn artifact(&self, platform: Platform, version: &str, file_name: &str) -> String {
        format!(
            "{}/releases/{}/{}/{}",
            self.prefix, platform, version, file_name
        )
    }
}

/// A version must be exactly one key segment
pub fn validate_version(version: &str) -> Result<()> {
    let bad = version.trim().is_empty()
        || version.contains('/')
        || version.contains('\\')
        || version == "."
        || version == "..";
    if bad {
        return Err(ReleaseError::InvalidVersion(version.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let keys = KeyLayout::new("loveace");
        assert_eq!(keys.manifest(), "loveace/manifest.json");
        assert_eq!(keys.download_page(), "loveace/download.html");
        assert_eq!(keys.icon(), "loveace/favicon.png");
        assert_eq!(
            keys.artifact(Platform::Android, "1.0.2", "app-release.apk"),
            "loveace/releases/android/1.0.2/app-release.apk"
        );
    }

    #[test]
    fn test_validate_version() {
        for ok in ["1.0.2", "2024.03-beta", "v1"] {
            assert!(validate_version(ok).is_ok(), "{}", ok);
        }
        for bad in ["", "  ", ".", "..", "../..", "1.0/x", "1.0\\x"] {
            assert!(
                matches!(validate_version(bad), Err(ReleaseError::InvalidVersion(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_prefix_slashes_trimmed() {
        assert_eq!(KeyLayout::new("/apps/demo/").manifest(), "apps/demo/manifest.json");
    }
}
