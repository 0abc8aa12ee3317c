//! Release orchestration
//!
//! Sequences storage I/O around the pure manifest operations. Every command
//! is one read-modify-write of the manifest:
//!
//! 1. Validate local inputs (platform name, artifact path) - no remote calls yet
//! 2. Upload the artifact, if any
//! 3. Read the manifest (missing key = empty manifest)
//! 4. Apply the manifest operation; precondition failures stop here
//! 5. Write the whole manifest back
//!
//! There is no locking and no conditional write: two concurrent runs against
//! the same manifest resolve as last writer wins. A conditional PUT on the
//! manifest's ETag would be the place to add that.

use serde_json::error::Category;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::checksum::file_md5;
use crate::error::{ReleaseError, Result};
use crate::keys::{validate_version, KeyLayout};
use crate::manifest::{Announcement, Manifest, PlatformRelease, ReleaseUpdate};
use crate::platform::Platform;
use crate::storage::{content_type_for, ObjectStore, JSON_CONTENT_TYPE};

/// Input for publishing a build to one platform
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub version: String,
    /// Raw platform name as typed by the operator
    pub platform: String,
    pub file: PathBuf,
    pub force_update: bool,
    pub shared_content: String,
    pub changelog: String,
}

/// Progress notifications emitted while a release runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStage<'a> {
    Checksummed { checksum: &'a str },
    Uploading { key: &'a str, file_name: &'a str },
    Uploaded { url: &'a str },
    WritingManifest,
}

#[derive(Debug, Clone)]
pub struct AnnounceOutcome {
    pub announcement: Announcement,
    pub manifest_url: String,
}

#[derive(Debug, Clone)]
pub struct ClearOutcome {
    /// False when there was nothing to clear
    pub had_announcement: bool,
    pub manifest_url: String,
}

#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub platform: Platform,
    pub release: PlatformRelease,
    pub artifact_key: String,
    pub manifest_url: String,
}

#[derive(Debug, Clone)]
pub struct ForceOutcome {
    pub platform: Platform,
    pub release: PlatformRelease,
    pub manifest_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconDeployment {
    Uploaded { url: String },
    /// No local icon, but one is already deployed at this key
    KeptRemote { key: String },
    Missing,
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub page_url: String,
    pub icon: IconDeployment,
}

pub struct Orchestrator<S: ObjectStore> {
    store: S,
    keys: KeyLayout,
    strict_manifest: bool,
}

impl<S: ObjectStore> Orchestrator<S> {
    pub fn new(store: S, keys: KeyLayout) -> Self {
        Self {
            store,
            keys,
            strict_manifest: false,
        }
    }

    /// Fail instead of starting over when the stored manifest does not parse
    pub fn with_strict_manifest(mut self, strict: bool) -> Self {
        self.strict_manifest = strict;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    /// Current manifest; a missing key is the empty manifest.
    ///
    /// Bytes that are not JSON at all (corrupt or truncated upload) are
    /// treated as empty unless strict mode is on. Well-formed JSON that does
    /// not match the manifest schema is always an error: it still holds
    /// release records, and starting over would overwrite them.
    /// Transport failures always propagate.
    pub fn load_manifest(&self) -> Result<Manifest> {
        let key = self.keys.manifest();
        let Some(bytes) = self.store.read(&key)? else {
            debug!("No manifest at {}, starting empty", key);
            return Ok(Manifest::default());
        };

        let err = match Manifest::from_json(&bytes) {
            Ok(manifest) => return Ok(manifest),
            Err(e) => e,
        };

        match err.classify() {
            Category::Syntax | Category::Eof if !self.strict_manifest => {
                warn!("Manifest at {} is not valid JSON ({}); starting from empty", key, err);
                Ok(Manifest::default())
            }
            _ => Err(ReleaseError::ManifestMalformed {
                key,
                reason: err.to_string(),
            }),
        }
    }

    fn save_manifest(&self, manifest: &Manifest) -> Result<String> {
        let key = self.keys.manifest();
        let body = manifest.to_json()?;
        let url = self.store.write(&key, &body, JSON_CONTENT_TYPE)?;
        info!("Manifest written to {}", key);
        Ok(url)
    }

    pub fn announce(
        &self,
        title: &str,
        content: &str,
        confirm_require: bool,
    ) -> Result<AnnounceOutcome> {
        let manifest = self
            .load_manifest()?
            .set_announcement(title, content, confirm_require);
        let manifest_url = self.save_manifest(&manifest)?;

        Ok(AnnounceOutcome {
            announcement: Announcement::new(title, content, confirm_require),
            manifest_url,
        })
    }

    pub fn clear_announce(&self) -> Result<ClearOutcome> {
        let current = self.load_manifest()?;
        let had_announcement = current.announcement.is_some();
        let manifest_url = self.save_manifest(&current.clear_announcement())?;
        Ok(ClearOutcome {
            had_announcement,
            manifest_url,
        })
    }

    pub fn release(&self, request: &ReleaseRequest) -> Result<ReleaseOutcome> {
        self.release_with_progress(request, &mut |_| {})
    }

    pub fn release_with_progress(
        &self,
        request: &ReleaseRequest,
        progress: &mut dyn FnMut(ReleaseStage<'_>),
    ) -> Result<ReleaseOutcome> {
        let platform: Platform = request.platform.parse()?;
        validate_version(&request.version)?;
        let file_name = artifact_file_name(&request.file)?;

        let checksum = file_md5(&request.file)?;
        progress(ReleaseStage::Checksummed { checksum: &checksum });

        let artifact_key = self.keys.artifact(platform, &request.version, &file_name);
        progress(ReleaseStage::Uploading {
            key: &artifact_key,
            file_name: &file_name,
        });
        let download_url = self.store.write_file(
            &artifact_key,
            &request.file,
            &content_type_for(&file_name),
        )?;
        info!("Uploaded {} to {}", request.file.display(), artifact_key);
        progress(ReleaseStage::Uploaded { url: &download_url });

        let release = PlatformRelease {
            version: request.version.clone(),
            force_update: request.force_update,
            url: download_url,
            checksum,
        };
        let update = ReleaseUpdate {
            platform,
            version: release.version.clone(),
            force_update: release.force_update,
            url: release.url.clone(),
            checksum: release.checksum.clone(),
            shared_content: request.shared_content.clone(),
            changelog: request.changelog.clone(),
        };
        let manifest = self.load_manifest()?.publish_release(&update);

        progress(ReleaseStage::WritingManifest);
        let manifest_url = self.save_manifest(&manifest)?;

        Ok(ReleaseOutcome {
            platform,
            release,
            artifact_key,
            manifest_url,
        })
    }

    pub fn set_force(&self, platform: &str, force_update: bool) -> Result<ForceOutcome> {
        let platform: Platform = platform.parse()?;
        let manifest = self
            .load_manifest()?
            .set_force_update(platform, force_update)?;
        let manifest_url = self.save_manifest(&manifest)?;

        let release = manifest
            .ota
            .as_ref()
            .and_then(|ota| ota.release(platform))
            .cloned()
            .ok_or(ReleaseError::PlatformNotReleased(platform))?;
        Ok(ForceOutcome {
            platform,
            release,
            manifest_url,
        })
    }

    /// Read-only view of the manifest
    pub fn status(&self) -> Result<Manifest> {
        self.load_manifest()
    }

    /// Publish the static download page and, if present, its icon
    pub fn deploy_page(&self, page: &Path, icon: &Path) -> Result<DeployOutcome> {
        if !page.is_file() {
            return Err(ReleaseError::FileNotFound(page.to_path_buf()));
        }

        let page_key = self.keys.download_page();
        let page_url = self
            .store
            .write_file(&page_key, page, &content_type_for(&page_key))?;
        info!("Download page deployed to {}", page_key);

        let icon_key = self.keys.icon();
        let icon = if icon.is_file() {
            let url = self
                .store
                .write_file(&icon_key, icon, &content_type_for(&icon_key))?;
            IconDeployment::Uploaded { url }
        } else if self.store.exists(&icon_key)? {
            IconDeployment::KeptRemote { key: icon_key }
        } else {
            IconDeployment::Missing
        };

        Ok(DeployOutcome { page_url, icon })
    }
}

/// File name used in the artifact key; the path must be an existing file
fn artifact_file_name(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(ReleaseError::FileNotFound(path.to_path_buf()));
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ReleaseError::FileNotFound(path.to_path_buf()))
}
