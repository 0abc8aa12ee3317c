//! Terminal formatting helpers
//!
//! All colour goes through [`Styler`] so output is plain when stdout is not a
//! terminal or `NO_COLOR` is set.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

pub mod symbols {
    pub const CHECK: &str = "✓";
    pub const CROSS: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const ARROW: &str = "→";
    pub const BOX_H: &str = "─";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styler {
    color: bool,
}

impl Styler {
    /// Colour on a TTY unless NO_COLOR is set
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some();
        Self {
            color: !no_color && std::io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    pub fn is_colored(&self) -> bool {
        self.color
    }

    pub fn success(&self, text: &str) -> String {
        let line = format!("{} {}", symbols::CHECK, text);
        if self.color {
            line.green().to_string()
        } else {
            line
        }
    }

    pub fn error(&self, text: &str) -> String {
        let line = format!("{} {}", symbols::CROSS, text);
        if self.color {
            line.red().to_string()
        } else {
            line
        }
    }

    pub fn warning(&self, text: &str) -> String {
        let line = format!("{} {}", symbols::WARNING, text);
        if self.color {
            line.yellow().to_string()
        } else {
            line
        }
    }

    pub fn arrow(&self, text: &str) -> String {
        if self.color {
            format!("{} {}", symbols::ARROW.cyan(), text)
        } else {
            format!("{} {}", symbols::ARROW, text)
        }
    }

    pub fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dimmed(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn section_title(&self, text: &str) -> String {
        if self.color {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn separator(&self, width: usize) -> String {
        self.dimmed(&symbols::BOX_H.repeat(width))
    }
}
