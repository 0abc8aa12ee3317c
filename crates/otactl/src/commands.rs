//! Command execution
//!
//! Each subcommand is one call into the orchestrator followed by a short
//! report on `out`. Errors are returned untouched so `main` can map them to
//! exit codes.

use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use ota_common::config::Settings;
use ota_common::keys::KeyLayout;
use ota_common::orchestrator::{IconDeployment, Orchestrator, ReleaseRequest};
use ota_common::storage::{open_store, ObjectStore};

use crate::cli::Commands;
use crate::progress::ReleaseProgress;
use crate::status_display::{render_status, short_checksum, StatusSource};
use crate::terminal_format::Styler;

/// Settings from file and environment, with the `--prefix` override applied
pub fn load_settings(config: Option<&Path>, prefix: Option<&str>) -> ota_common::Result<Settings> {
    let mut settings = Settings::load(config)?;
    if let Some(prefix) = prefix {
        settings.prefix = prefix.to_string();
        settings.validate()?;
    }
    debug!(
        "storage={} prefix={} strict_manifest={}",
        settings.storage.as_str(),
        settings.prefix,
        settings.strict_manifest
    );
    Ok(settings)
}

/// Orchestrator over the configured backend
pub fn connect(settings: &Settings) -> ota_common::Result<Orchestrator<Box<dyn ObjectStore>>> {
    let store = open_store(settings)?;
    Ok(Orchestrator::new(store, KeyLayout::new(&settings.prefix))
        .with_strict_manifest(settings.strict_manifest))
}

pub fn execute<S: ObjectStore>(
    command: &Commands,
    orch: &Orchestrator<S>,
    out: &mut dyn Write,
    s: &Styler,
) -> Result<()> {
    match command {
        Commands::Announce {
            title,
            content,
            confirm,
        } => announce(orch, out, s, title, content, *confirm),
        Commands::ClearAnnounce => clear_announce(orch, out, s),
        Commands::Release {
            version,
            platform,
            file,
            force,
            content,
            changelog,
        } => {
            let request = ReleaseRequest {
                version: version.clone(),
                platform: platform.clone(),
                file: file.clone(),
                force_update: *force,
                shared_content: content.clone(),
                changelog: changelog.clone(),
            };
            release(orch, out, s, &request)
        }
        Commands::Status { json } => status(orch, out, s, *json),
        Commands::SetForce { platform, force } => set_force(orch, out, s, platform, *force),
        Commands::DeployPage { page, icon } => deploy_page(orch, out, s, page, icon),
    }
}

fn announce<S: ObjectStore>(
    orch: &Orchestrator<S>,
    out: &mut dyn Write,
    s: &Styler,
    title: &str,
    content: &str,
    confirm: bool,
) -> Result<()> {
    let outcome = orch.announce(title, content, confirm)?;
    writeln!(out, "{}", s.success("Announcement published"))?;
    writeln!(out, "  Title:    {}", outcome.announcement.title)?;
    writeln!(out, "  Confirm:  {}", confirm)?;
    writeln!(out, "  MD5:      {}", outcome.announcement.digest())?;
    writeln!(out, "{}", s.arrow(&outcome.manifest_url))?;
    Ok(())
}

fn clear_announce<S: ObjectStore>(
    orch: &Orchestrator<S>,
    out: &mut dyn Write,
    s: &Styler,
) -> Result<()> {
    let outcome = orch.clear_announce()?;
    if outcome.had_announcement {
        writeln!(out, "{}", s.success("Announcement cleared"))?;
    } else {
        writeln!(out, "{}", s.success("No announcement was set"))?;
    }
    writeln!(out, "{}", s.arrow(&outcome.manifest_url))?;
    Ok(())
}

fn release<S: ObjectStore>(
    orch: &Orchestrator<S>,
    out: &mut dyn Write,
    s: &Styler,
    request: &ReleaseRequest,
) -> Result<()> {
    let mut progress = ReleaseProgress::new();
    let outcome = orch.release_with_progress(request, &mut |stage| progress.on_stage(&stage));
    let elapsed = progress.finish();
    let outcome = outcome?;

    writeln!(
        out,
        "{}",
        s.success(&format!(
            "Released {} {} ({:.1}s)",
            outcome.platform.as_str().to_uppercase(),
            outcome.release.version,
            elapsed.as_secs_f64()
        ))
    )?;
    writeln!(out, "  Force:    {}", outcome.release.force_update)?;
    writeln!(out, "  MD5:      {}", short_checksum(&outcome.release.checksum))?;
    writeln!(out, "  URL:      {}", outcome.release.url)?;
    writeln!(out, "{}", s.arrow(&outcome.manifest_url))?;
    Ok(())
}

fn status<S: ObjectStore>(
    orch: &Orchestrator<S>,
    out: &mut dyn Write,
    s: &Styler,
    json: bool,
) -> Result<()> {
    let manifest = orch.status()?;
    if json {
        out.write_all(&manifest.to_json()?)?;
        writeln!(out)?;
        return Ok(());
    }

    let backend = orch.store().describe();
    let manifest_key = orch.keys().manifest();
    let source = StatusSource {
        backend: &backend,
        manifest_key: &manifest_key,
    };
    write!(out, "{}", render_status(&manifest, &source, s))?;
    Ok(())
}

fn set_force<S: ObjectStore>(
    orch: &Orchestrator<S>,
    out: &mut dyn Write,
    s: &Styler,
    platform: &str,
    force: bool,
) -> Result<()> {
    let outcome = orch.set_force(platform, force)?;
    writeln!(
        out,
        "{}",
        s.success(&format!(
            "Force update for {} {} set to {}",
            outcome.platform.as_str().to_uppercase(),
            outcome.release.version,
            outcome.release.force_update
        ))
    )?;
    writeln!(out, "{}", s.arrow(&outcome.manifest_url))?;
    Ok(())
}

fn deploy_page<S: ObjectStore>(
    orch: &Orchestrator<S>,
    out: &mut dyn Write,
    s: &Styler,
    page: &Path,
    icon: &Path,
) -> Result<()> {
    let outcome = orch.deploy_page(page, icon)?;
    writeln!(out, "{}", s.success("Download page deployed"))?;
    writeln!(out, "{}", s.arrow(&outcome.page_url))?;

    match outcome.icon {
        IconDeployment::Uploaded { url } => {
            writeln!(out, "{}", s.success("Icon deployed"))?;
            writeln!(out, "{}", s.arrow(&url))?;
        }
        IconDeployment::KeptRemote { key } => writeln!(
            out,
            "{}",
            s.warning(&format!(
                "{} not found locally; keeping deployed {}",
                icon.display(),
                key
            ))
        )?,
        IconDeployment::Missing => writeln!(
            out,
            "{}",
            s.warning(&format!(
                "{} not found and no icon is deployed; the page will show a broken icon",
                icon.display()
            ))
        )?,
    }
    Ok(())
}
