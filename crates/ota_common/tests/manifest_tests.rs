//! Manifest document tests: wire shape, round trips and release scenarios

use ota_common::manifest::CHANGELOG_LIMIT;
use ota_common::{Manifest, Platform, ReleaseError, ReleaseUpdate};
use serde_json::{json, Value};

fn android(version: &str, changelog: &str) -> ReleaseUpdate {
    ReleaseUpdate {
        platform: Platform::Android,
        version: version.to_string(),
        force_update: false,
        url: format!("https://cdn.example.com/app/releases/android/{}/app.apk", version),
        checksum: "0cc175b9c0f1b6a831c399e269772661".to_string(),
        shared_content: String::new(),
        changelog: changelog.to_string(),
    }
}

fn to_value(manifest: &Manifest) -> Value {
    serde_json::from_slice(&manifest.to_json().unwrap()).unwrap()
}

#[test]
fn test_empty_manifest_serializes_to_empty_object() {
    assert_eq!(to_value(&Manifest::default()), json!({}));
}

#[test]
fn test_wire_shape() {
    let manifest = Manifest::default()
        .set_announcement("Maintenance", "Tonight", true)
        .publish_release(&ReleaseUpdate {
            shared_content: "Improvements included".to_string(),
            ..android("1.0.2", "Fixed bugs")
        });

    let value = to_value(&manifest);
    assert_eq!(
        value,
        json!({
            "announcement": {
                "title": "Maintenance",
                "content": "Tonight",
                "confirm_require": true,
                "md5": manifest.announcement.as_ref().unwrap().digest()
            },
            "ota": {
                "content": "Improvements included",
                "changelog": [{"version": "1.0.2", "changes": "Fixed bugs"}],
                "android": {
                    "version": "1.0.2",
                    "force_ota": false,
                    "url": "https://cdn.example.com/app/releases/android/1.0.2/app.apk",
                    "md5": "0cc175b9c0f1b6a831c399e269772661"
                }
            }
        })
    );

    // Unreleased platforms are omitted, not null
    let ota = value.get("ota").unwrap().as_object().unwrap();
    for absent in ["ios", "windows", "macos", "linux"] {
        assert!(!ota.contains_key(absent), "{} should be absent", absent);
    }
}

#[test]
fn test_round_trip_preserves_absence() {
    let cases = vec![
        Manifest::default(),
        Manifest::default().set_announcement("t", "c", false),
        Manifest::default().publish_release(&android("1.0.0", "")),
        Manifest::default()
            .set_announcement("", "", true)
            .publish_release(&android("1.0.0", "Initial"))
            .set_force_update(Platform::Android, true)
            .unwrap(),
    ];

    for manifest in cases {
        let bytes = manifest.to_json().unwrap();
        let parsed = Manifest::from_json(&bytes).unwrap();
        assert_eq!(parsed, manifest);
        assert!(!String::from_utf8(bytes).unwrap().contains("null"));
    }
}

#[test]
fn test_reads_document_written_by_older_tooling() {
    let doc = br#"{
        "announcement": {"title": "Hi", "content": "There", "md5": "stale-value"},
        "ota": {
            "changelog": [{"version": "1.0.1", "changes": "First"}],
            "windows": {"version": "1.0.1", "url": "https://x/y.exe", "md5": "abc"}
        }
    }"#;

    let manifest = Manifest::from_json(doc).unwrap();
    let announcement = manifest.announcement.as_ref().unwrap();
    assert!(!announcement.confirm_require);
    assert_ne!(announcement.digest(), "stale-value");

    let ota = manifest.ota.as_ref().unwrap();
    assert_eq!(ota.content, "");
    let windows = ota.release(Platform::Windows).unwrap();
    assert!(!windows.force_update);
    assert_eq!(windows.checksum, "abc");
}

#[test]
fn test_oversized_changelog_is_rejected() {
    let entries: Vec<Value> = (0..CHANGELOG_LIMIT + 1)
        .map(|i| json!({"version": format!("1.0.{}", i), "changes": "x"}))
        .collect();
    let doc = json!({"ota": {"content": "", "changelog": entries}});
    let bytes = serde_json::to_vec(&doc).unwrap();
    assert!(Manifest::from_json(&bytes).is_err());
}

#[test]
fn test_first_release_scenario() {
    let manifest = Manifest::default().publish_release(&android("1.0.0", "Initial"));
    let ota = manifest.ota.as_ref().unwrap();

    assert_eq!(ota.release(Platform::Android).unwrap().version, "1.0.0");
    assert_eq!(ota.changelog.len(), 1);
    assert_eq!(ota.changelog[0].version, "1.0.0");
    assert_eq!(ota.changelog[0].changes, "Initial");
}

#[test]
fn test_rerelease_same_version_supersedes_changelog() {
    let manifest = Manifest::default()
        .publish_release(&android("1.0.0", "Initial"))
        .publish_release(&android("1.0.0", "Initial fix"));
    let ota = manifest.ota.as_ref().unwrap();

    assert_eq!(ota.changelog.len(), 1);
    assert_eq!(ota.changelog[0].changes, "Initial fix");
}

#[test]
fn test_force_update_scenario() {
    let released = Manifest::default()
        .publish_release(&android("1.0.0", "Initial"))
        .publish_release(&android("1.0.0", "Initial fix"));
    let before = released
        .ota
        .as_ref()
        .unwrap()
        .release(Platform::Android)
        .cloned()
        .unwrap();

    let forced = released.set_force_update(Platform::Android, true).unwrap();
    let after = forced.ota.as_ref().unwrap().release(Platform::Android).unwrap();

    assert!(after.force_update);
    assert_eq!(after.version, before.version);
    assert_eq!(after.url, before.url);
    assert_eq!(after.checksum, before.checksum);
}

#[test]
fn test_set_force_on_unreleased_platform_leaves_manifest_unchanged() {
    let manifest = Manifest::default().publish_release(&android("1.0.0", "Initial"));
    let snapshot = manifest.clone();

    let err = manifest.set_force_update(Platform::Ios, true).unwrap_err();
    assert!(matches!(err, ReleaseError::PlatformNotReleased(Platform::Ios)));
    assert_eq!(manifest, snapshot);
}

#[test]
fn test_changelog_invariants_over_mixed_history() {
    let versions = [
        "1.0", "1.1", "1.0", "1.2", "1.3", "1.1", "1.4", "1.5", "1.6", "1.7", "1.8", "1.9",
        "2.0", "2.1", "1.9",
    ];
    let mut manifest = Manifest::default();
    for (i, version) in versions.iter().enumerate() {
        let platform = Platform::ALL[i % Platform::ALL.len()];
        manifest = manifest.publish_release(&ReleaseUpdate {
            platform,
            ..android(version, &format!("notes {}", i))
        });
    }

    let changelog = &manifest.ota.as_ref().unwrap().changelog;
    assert!(changelog.len() <= CHANGELOG_LIMIT);

    let mut seen = std::collections::HashSet::new();
    for entry in changelog {
        assert!(seen.insert(entry.version.clone()), "duplicate {}", entry.version);
    }

    assert_eq!(changelog[0].version, "1.9");
    assert_eq!(changelog[0].changes, "notes 14");
    assert_eq!(changelog[1].version, "2.1");
}
