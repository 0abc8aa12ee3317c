//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap. Execution lives in `commands`.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// otactl - publish app releases and announcements to object storage
#[derive(Parser, Debug)]
#[command(name = "otactl")]
#[command(about = "Publish OTA releases, announcements and the download page", long_about = None)]
#[command(version = env!("OTACTL_VERSION"))]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (overrides $OTACTL_CONFIG and the default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Key prefix for every object written (overrides config and $OTACTL_PREFIX)
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Debug-level diagnostics on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Publish an announcement shown to every client
    Announce {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        /// Clients must acknowledge the announcement
        #[arg(long)]
        confirm: bool,
    },

    /// Remove the current announcement
    ClearAnnounce,

    /// Upload a build and publish it for one platform
    Release {
        #[arg(short, long)]
        version: String,

        /// android, ios, windows, macos or linux
        #[arg(short, long)]
        platform: String,

        /// Build artifact to upload
        #[arg(short, long)]
        file: PathBuf,

        /// Require clients to install this release
        #[arg(long)]
        force: bool,

        /// Update text shared by all platforms (kept when empty)
        #[arg(short, long, default_value = "")]
        content: String,

        /// Changelog entry for this version
        #[arg(long, default_value = "")]
        changelog: String,
    },

    /// Show the published manifest
    Status {
        /// Print the manifest JSON only
        #[arg(long)]
        json: bool,
    },

    /// Change the force-update flag of a released platform
    SetForce {
        #[arg(short, long)]
        platform: String,

        #[arg(short, long, action = ArgAction::Set, value_name = "true|false")]
        force: bool,
    },

    /// Upload the static download page and its icon
    DeployPage {
        #[arg(long, default_value = "web/download.html")]
        page: PathBuf,

        #[arg(long, default_value = "web/favicon.png")]
        icon: PathBuf,
    },
}

impl Commands {
    /// Name recorded in the invocation log
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Announce { .. } => "announce",
            Commands::ClearAnnounce => "clear-announce",
            Commands::Release { .. } => "release",
            Commands::Status { .. } => "status",
            Commands::SetForce { .. } => "set-force",
            Commands::DeployPage { .. } => "deploy-page",
        }
    }
}
