//! Upload spinner
//!
//! Only drawn when stderr is a TTY and NO_COLOR is unset; otherwise every
//! call is a no-op apart from timing.

use indicatif::{ProgressBar, ProgressStyle};
use ota_common::orchestrator::ReleaseStage;
use std::io::IsTerminal;
use std::time::{Duration, Instant};
use tracing::debug;

const TICK_MS: u64 = 80;

pub struct ProgressIndicator {
    spinner: Option<ProgressBar>,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(message: &str) -> Self {
        let enabled =
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::with_enabled(message, enabled)
    }

    pub fn hidden() -> Self {
        Self::with_enabled("", false)
    }

    fn with_enabled(message: &str, enabled: bool) -> Self {
        let spinner = enabled.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
                .template("{spinner} {msg} {elapsed:.dim}")
            {
                pb.set_style(style);
            }
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(TICK_MS));
            pb
        });

        Self {
            spinner,
            start_time: Instant::now(),
        }
    }

    pub fn update_message(&self, message: &str) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Clear the spinner line and return the elapsed time
    pub fn finish(&mut self) -> Duration {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.start_time.elapsed()
    }

    pub fn is_enabled(&self) -> bool {
        self.spinner.is_some()
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Spinner driven by release stages. Nothing is drawn until the first
/// stage arrives, so input validation failures never show one.
pub struct ReleaseProgress {
    indicator: Option<ProgressIndicator>,
    message: Option<String>,
    visible: bool,
}

impl ReleaseProgress {
    pub fn new() -> Self {
        Self {
            indicator: None,
            message: None,
            visible: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::new()
        }
    }

    pub fn on_stage(&mut self, stage: &ReleaseStage<'_>) {
        let message = match stage {
            ReleaseStage::Checksummed { checksum } => {
                debug!("md5 {}", checksum);
                "Preparing upload".to_string()
            }
            ReleaseStage::Uploading { file_name, .. } => format!("Uploading {}", file_name),
            ReleaseStage::Uploaded { url } => {
                debug!("uploaded to {}", url);
                "Reading manifest".to_string()
            }
            ReleaseStage::WritingManifest => "Updating manifest".to_string(),
        };

        if let Some(indicator) = &self.indicator {
            indicator.update_message(&message);
        } else if self.visible {
            self.indicator = Some(ProgressIndicator::new(&message));
        } else {
            self.indicator = Some(ProgressIndicator::hidden());
        }
        self.message = Some(message);
    }

    pub fn started(&self) -> bool {
        self.indicator.is_some()
    }

    /// Last stage message shown
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Clear the spinner; elapsed time since the first stage
    pub fn finish(&mut self) -> Duration {
        self.indicator
            .as_mut()
            .map(ProgressIndicator::finish)
            .unwrap_or_default()
    }
}

impl Default for ReleaseProgress {
    fn default() -> Self {
        Self::new()
    }
}
