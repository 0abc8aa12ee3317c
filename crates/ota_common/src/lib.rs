//! OTA Common - manifest model, storage and release orchestration for otactl
//!
//! The manifest model is pure; all I/O lives in `storage` and is sequenced
//! by `orchestrator`.

pub mod checksum;
pub mod config;
pub mod error;
pub mod keys;
pub mod manifest;
pub mod orchestrator;
pub mod platform;
pub mod storage;

pub use error::{ReleaseError, Result};
pub use manifest::{Announcement, ChangelogEntry, Manifest, Ota, PlatformRelease, ReleaseUpdate};
pub use platform::Platform;
