//! CLI parsing and end-to-end command runs against an in-memory store

use std::path::PathBuf;

use clap::Parser;
use ota_common::keys::KeyLayout;
use ota_common::orchestrator::{Orchestrator, ReleaseRequest};
use ota_common::storage::MemoryStore;
use ota_common::{Manifest, ReleaseError};
use otactl::cli::{Cli, Commands};
use otactl::commands::execute;
use otactl::errors::{classify, EXIT_INVALID_INPUT, EXIT_PRECONDITION};
use otactl::progress::ReleaseProgress;
use otactl::status_display::{render_status, StatusSource};
use otactl::terminal_format::Styler;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

fn run(orch: &Orchestrator<MemoryStore>, args: &[&str]) -> anyhow::Result<String> {
    let cli = parse(args);
    let mut out = Vec::new();
    execute(&cli.command, orch, &mut out, &Styler::plain())?;
    Ok(String::from_utf8(out).unwrap())
}

fn orchestrator() -> Orchestrator<MemoryStore> {
    Orchestrator::new(MemoryStore::new(), KeyLayout::new("loveace"))
}

#[test]
fn test_parse_release_short_flags() {
    let cli = parse(&[
        "otactl", "release", "-v", "1.0.2", "-p", "android", "-f", "app.apk", "--force", "-c",
        "Improvements", "--changelog", "Fixed bugs",
    ]);
    assert_eq!(
        cli.command,
        Commands::Release {
            version: "1.0.2".to_string(),
            platform: "android".to_string(),
            file: PathBuf::from("app.apk"),
            force: true,
            content: "Improvements".to_string(),
            changelog: "Fixed bugs".to_string(),
        }
    );
}

#[test]
fn test_parse_release_defaults() {
    let cli = parse(&["otactl", "release", "--version", "1.0.0", "--platform", "ios", "--file", "a.ipa"]);
    match cli.command {
        Commands::Release {
            force,
            content,
            changelog,
            ..
        } => {
            assert!(!force);
            assert!(content.is_empty());
            assert!(changelog.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_release_requires_file() {
    assert!(Cli::try_parse_from(["otactl", "release", "-v", "1", "-p", "android"]).is_err());
}

#[test]
fn test_parse_set_force_takes_value() {
    let cli = parse(&["otactl", "set-force", "-p", "ios", "-f", "false"]);
    assert_eq!(
        cli.command,
        Commands::SetForce {
            platform: "ios".to_string(),
            force: false,
        }
    );
    assert!(Cli::try_parse_from(["otactl", "set-force", "-p", "ios", "-f", "maybe"]).is_err());
    assert!(Cli::try_parse_from(["otactl", "set-force", "-p", "ios"]).is_err());
}

#[test]
fn test_parse_announce_and_globals() {
    let cli = parse(&[
        "otactl", "announce", "-t", "Maintenance", "-c", "Tonight", "--confirm", "--prefix",
        "loveace", "--config", "/etc/otactl.toml", "--verbose",
    ]);
    assert_eq!(cli.prefix.as_deref(), Some("loveace"));
    assert_eq!(cli.config, Some(PathBuf::from("/etc/otactl.toml")));
    assert!(cli.verbose);
    assert_eq!(
        cli.command,
        Commands::Announce {
            title: "Maintenance".to_string(),
            content: "Tonight".to_string(),
            confirm: true,
        }
    );
}

#[test]
fn test_parse_deploy_page_defaults() {
    let cli = parse(&["otactl", "deploy-page"]);
    assert_eq!(
        cli.command,
        Commands::DeployPage {
            page: PathBuf::from("web/download.html"),
            icon: PathBuf::from("web/favicon.png"),
        }
    );
    assert_eq!(cli.command.name(), "deploy-page");
}

#[test]
fn test_release_then_status_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("app.apk");
    std::fs::write(&file, b"apk").unwrap();
    let file = file.to_str().unwrap();
    let orch = orchestrator();

    let out = run(
        &orch,
        &["otactl", "release", "-v", "1.0.0", "-p", "android", "-f", file, "--changelog", "Initial"],
    )
    .unwrap();
    assert!(out.contains("Released ANDROID 1.0.0"));

    let json = run(&orch, &["otactl", "status", "--json"]).unwrap();
    let manifest = Manifest::from_json(json.as_bytes()).unwrap();
    let ota = manifest.ota.unwrap();
    assert_eq!(ota.changelog[0].changes, "Initial");
}

#[test]
fn test_errors_map_to_exit_codes() {
    let orch = orchestrator();

    let err = run(&orch, &["otactl", "set-force", "-p", "android", "-f", "true"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReleaseError>(),
        Some(ReleaseError::NoOtaConfigured)
    ));
    assert_eq!(classify(&err).0, EXIT_PRECONDITION);

    let err = run(
        &orch,
        &["otactl", "release", "-v", "1", "-p", "beos", "-f", "missing.bin"],
    )
    .unwrap_err();
    assert_eq!(classify(&err).0, EXIT_INVALID_INPUT);
    assert!(err.to_string().contains("beos"));
}

#[test]
fn test_rejected_release_never_starts_progress() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("app.apk");
    std::fs::write(&file, b"apk").unwrap();
    let orch = orchestrator();

    let mut request = ReleaseRequest {
        version: "1.0.0".to_string(),
        platform: "beos".to_string(),
        file: file.clone(),
        force_update: false,
        shared_content: String::new(),
        changelog: String::new(),
    };
    let mut progress = ReleaseProgress::hidden();
    assert!(orch
        .release_with_progress(&request, &mut |stage| progress.on_stage(&stage))
        .is_err());
    assert!(!progress.started());

    request.platform = "android".to_string();
    request.version = "../..".to_string();
    assert!(orch
        .release_with_progress(&request, &mut |stage| progress.on_stage(&stage))
        .is_err());
    assert!(!progress.started());

    request.version = "1.0.0".to_string();
    orch.release_with_progress(&request, &mut |stage| progress.on_stage(&stage))
        .unwrap();
    assert!(progress.started());
    assert_eq!(progress.message(), Some("Updating manifest"));
}

#[test]
fn test_clear_announce_reports_state() {
    let orch = orchestrator();
    run(&orch, &["otactl", "announce", "-t", "Hi", "-c", "There"]).unwrap();

    let out = run(&orch, &["otactl", "clear-announce"]).unwrap();
    assert!(out.contains("Announcement cleared"));
    let out = run(&orch, &["otactl", "clear-announce"]).unwrap();
    assert!(out.contains("No announcement was set"));
}

#[test]
fn test_status_rendering() {
    let manifest = Manifest::default()
        .set_announcement("Maintenance", "Tonight", true)
        .publish_release(&ota_common::ReleaseUpdate {
            platform: ota_common::Platform::Android,
            version: "1.0.2".to_string(),
            force_update: true,
            url: "https://cdn.example.com/app.apk".to_string(),
            checksum: "0cc175b9c0f1b6a831c399e269772661".to_string(),
            shared_content: "Improvements".to_string(),
            changelog: "Fixed bugs".to_string(),
        });
    let source = StatusSource {
        backend: "memory",
        manifest_key: "loveace/manifest.json",
    };

    let text = render_status(&manifest, &source, &Styler::plain());

    assert!(text.contains("loveace/manifest.json (memory)"));
    assert!(text.contains("Title:    Maintenance"));
    assert!(text.contains("Confirm:  yes"));
    assert!(text.contains("Content:  Improvements"));
    assert!(text.contains("0cc175b9c0f1b6a8..."));
    assert!(!text.contains("0cc175b9c0f1b6a831"));
    assert!(text.contains("Fixed bugs"));

    let android = text.lines().position(|l| l.trim_start().starts_with("ANDROID")).unwrap();
    let linux = text.lines().position(|l| l.trim_start().starts_with("LINUX")).unwrap();
    assert!(android < linux);
}

#[test]
fn test_status_rendering_empty_manifest() {
    let source = StatusSource {
        backend: "memory",
        manifest_key: "app/manifest.json",
    };
    let text = render_status(&Manifest::default(), &source, &Styler::plain());
    assert!(text.contains("Announcement"));
    assert!(text.contains("no release published"));
    assert!(!text.contains("Changelog"));
}
