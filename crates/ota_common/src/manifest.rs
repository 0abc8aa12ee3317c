//! Release manifest model
//!
//! The manifest is the single JSON document clients poll: an optional
//! announcement plus optional OTA metadata with one record per platform.
//! Every update here is a pure function from one manifest to the next; the
//! orchestrator owns reading and writing it.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "announcement": {"title": "...", "content": "...", "confirm_require": true, "md5": "..."},
//!   "ota": {
//!     "content": "...",
//!     "changelog": [{"version": "1.0.2", "changes": "..."}],
//!     "android": {"version": "1.0.2", "force_ota": false, "url": "...", "md5": "..."}
//!   }
//! }
//! ```
//!
//! Absent values are omitted from the document, never written as `null`.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::checksum::md5_hex;
use crate::error::{ReleaseError, Result};
use crate::platform::Platform;

/// Maximum number of changelog entries kept in the manifest
pub const CHANGELOG_LIMIT: usize = 10;

/// App-wide announcement shown by clients
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Announcement {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub confirm_require: bool,
}

impl Announcement {
    pub fn new(title: impl Into<String>, content: impl Into<String>, confirm_require: bool) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            confirm_require,
        }
    }

    /// MD5 of title followed by content.
    ///
    /// Always derived, so it cannot disagree with the text it describes.
    pub fn digest(&self) -> String {
        md5_hex(format!("{}{}", self.title, self.content).as_bytes())
    }
}

// The digest goes out with the document so clients can detect a changed
// announcement; a stored value is ignored on read.
impl Serialize for Announcement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Announcement", 4)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("confirm_require", &self.confirm_require)?;
        state.serialize_field("md5", &self.digest())?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub changes: String,
}

/// Published build for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRelease {
    pub version: String,
    #[serde(rename = "force_ota", default)]
    pub force_update: bool,
    pub url: String,
    #[serde(rename = "md5")]
    pub checksum: String,
}

/// OTA metadata: shared popup text and changelog, per-platform releases
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "OtaDocument", into = "OtaDocument")]
pub struct Ota {
    pub content: String,
    pub changelog: Vec<ChangelogEntry>,
    releases: BTreeMap<Platform, PlatformRelease>,
}

impl Ota {
    pub fn new(content: impl Into<String>, changelog: Vec<ChangelogEntry>) -> Self {
        Self {
            content: content.into(),
            changelog,
            releases: BTreeMap::new(),
        }
    }

    pub fn release(&self, platform: Platform) -> Option<&PlatformRelease> {
        self.releases.get(&platform)
    }

    /// Released platforms in display order
    pub fn releases(&self) -> impl Iterator<Item = (Platform, &PlatformRelease)> {
        Platform::ALL
            .into_iter()
            .filter_map(|p| self.releases.get(&p).map(|r| (p, r)))
    }

    /// Replace the record for one platform, leaving the others alone
    pub fn set_release(&mut self, platform: Platform, release: PlatformRelease) {
        self.releases.insert(platform, release);
    }
}

/// On-disk form of [`Ota`]: one optional key per platform.
#[derive(Serialize, Deserialize, Default)]
struct OtaDocument {
    #[serde(default)]
    content: String,
    #[serde(default)]
    changelog: Vec<ChangelogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    android: Option<PlatformRelease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ios: Option<PlatformRelease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    windows: Option<PlatformRelease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    macos: Option<PlatformRelease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    linux: Option<PlatformRelease>,
}

impl TryFrom<OtaDocument> for Ota {
    type Error = String;

    fn try_from(doc: OtaDocument) -> std::result::Result<Self, Self::Error> {
        if doc.changelog.len() > CHANGELOG_LIMIT {
            return Err(format!(
                "changelog has {} entries, at most {} allowed",
                doc.changelog.len(),
                CHANGELOG_LIMIT
            ));
        }

        let releases = [
            (Platform::Android, doc.android),
            (Platform::Ios, doc.ios),
            (Platform::Windows, doc.windows),
            (Platform::Macos, doc.macos),
            (Platform::Linux, doc.linux),
        ]
        .into_iter()
        .filter_map(|(p, r)| r.map(|r| (p, r)))
        .collect();

        Ok(Ota {
            content: doc.content,
            changelog: doc.changelog,
            releases,
        })
    }
}

impl From<Ota> for OtaDocument {
    fn from(mut ota: Ota) -> Self {
        OtaDocument {
            content: ota.content,
            changelog: ota.changelog,
            android: ota.releases.remove(&Platform::Android),
            ios: ota.releases.remove(&Platform::Ios),
            windows: ota.releases.remove(&Platform::Windows),
            macos: ota.releases.remove(&Platform::Macos),
            linux: ota.releases.remove(&Platform::Linux),
        }
    }
}

/// A release being published to one platform
#[derive(Debug, Clone)]
pub struct ReleaseUpdate {
    pub platform: Platform,
    pub version: String,
    pub force_update: bool,
    pub url: String,
    pub checksum: String,
    /// Popup text for all platforms; empty keeps the current text
    pub shared_content: String,
    /// Changelog line for this version; empty adds none
    pub changelog: String,
}

/// Root persisted document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement: Option<Announcement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ota: Option<Ota>,
}

impl Manifest {
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Pretty-printed document as stored
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn set_announcement(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        confirm_require: bool,
    ) -> Manifest {
        Manifest {
            announcement: Some(Announcement::new(title, content, confirm_require)),
            ota: self.ota.clone(),
        }
    }

    pub fn clear_announcement(&self) -> Manifest {
        Manifest {
            announcement: None,
            ota: self.ota.clone(),
        }
    }

    /// Publish a build for one platform.
    ///
    /// Rewrites the shared changelog (new line first, any older line for the
    /// same version dropped, capped at [`CHANGELOG_LIMIT`]) and replaces the
    /// platform's record wholesale.
    pub fn publish_release(&self, update: &ReleaseUpdate) -> Manifest {
        let prior = self
            .ota
            .as_ref()
            .map(|ota| ota.changelog.as_slice())
            .unwrap_or_default();
        let changelog = merge_changelog(prior, &update.version, &update.changelog);

        let mut ota = match &self.ota {
            Some(existing) => {
                let mut ota = existing.clone();
                ota.changelog = changelog;
                if !update.shared_content.is_empty() {
                    ota.content = update.shared_content.clone();
                }
                ota
            }
            None => Ota::new(update.shared_content.clone(), changelog),
        };

        ota.set_release(
            update.platform,
            PlatformRelease {
                version: update.version.clone(),
                force_update: update.force_update,
                url: update.url.clone(),
                checksum: update.checksum.clone(),
            },
        );

        Manifest {
            announcement: self.announcement.clone(),
            ota: Some(ota),
        }
    }

    /// Flip the force-update flag on an already released platform
    pub fn set_force_update(&self, platform: Platform, force_update: bool) -> Result<Manifest> {
        let ota = self.ota.as_ref().ok_or(ReleaseError::NoOtaConfigured)?;
        let current = ota
            .release(platform)
            .ok_or(ReleaseError::PlatformNotReleased(platform))?;

        let mut ota = ota.clone();
        ota.set_release(
            platform,
            PlatformRelease {
                force_update,
                ..current.clone()
            },
        );

        Ok(Manifest {
            announcement: self.announcement.clone(),
            ota: Some(ota),
        })
    }
}

/// Newest-first changelog with at most one entry per version
pub fn merge_changelog(prior: &[ChangelogEntry], version: &str, changes: &str) -> Vec<ChangelogEntry> {
    let mut merged = Vec::with_capacity(CHANGELOG_LIMIT);
    if !changes.is_empty() {
        merged.push(ChangelogEntry {
            version: version.to_string(),
            changes: changes.to_string(),
        });
    }

    merged.extend(prior.iter().filter(|e| e.version != version).cloned());
    merged.truncate(CHANGELOG_LIMIT);
    merged
}
