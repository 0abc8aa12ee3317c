//! Logging for otactl
//!
//! Two channels: `tracing` diagnostics on stderr, and one JSON line per
//! invocation appended to an XDG state file.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostic filter
pub const LOG_FILTER_ENV: &str = "OTACTL_LOG";

/// Install the stderr subscriber. `--verbose` wins over `OTACTL_LOG`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log entry for each otactl invocation
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Storage backend the command ran against, when one was opened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    pub exit_code: i32,

    pub duration_ms: u64,

    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEntry {
    /// Log file path
    ///
    /// Priority:
    /// 1. $OTACTL_LOG_FILE
    /// 2. $XDG_STATE_HOME/otactl/ctl.jsonl
    /// 3. ~/.local/state/otactl/ctl.jsonl
    pub fn discover_log_path<F>(lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("OTACTL_LOG_FILE") {
            return Some(PathBuf::from(path));
        }

        if let Some(xdg_state) = lookup("XDG_STATE_HOME") {
            return Some(Path::new(&xdg_state).join("otactl/ctl.jsonl"));
        }

        lookup("HOME").map(|home| Path::new(&home).join(".local/state/otactl/ctl.jsonl"))
    }

    /// Append to the log file. Failures are reported at debug level only;
    /// stdout is reserved for command output.
    pub fn write(&self) {
        let Some(path) = Self::discover_log_path(|key| std::env::var(key).ok()) else {
            debug!("No invocation log location available");
            return;
        };

        if let Err(e) = self.write_to_file(&path) {
            debug!("Could not write invocation log {}: {}", path.display(), e);
        }
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    pub fn generate_req_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}
