//! # Output Configuration
//!
//! Controls how `h5p-deps` decorates its reports: colors and emoji status
//! markers when the terminal supports them, plain bracketed labels otherwise.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even in non-TTY
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! use h5p_deps::output::{status, OutputConfig, Status};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} H5P.Foo is not in the registry", status(&out, Status::Warn));
//! ```

use std::env;
use std::fmt::Display;

use console::style;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    ///
    /// In auto mode colors are disabled when `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Severity of one report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Info,
    Warn,
    Error,
}

/// Leading marker for a report line.
pub fn status(config: &OutputConfig, status: Status) -> &'static str {
    match status {
        Status::Ok => emoji(config, "✅", "[OK]"),
        Status::Info => emoji(config, "📦", "[INFO]"),
        Status::Warn => emoji(config, "⚠️", "[WARN]"),
        Status::Error => emoji(config, "❌", "[ERR]"),
    }
}

/// Bracketed annotation such as `[optional]`, dimmed when colors are on.
pub fn tag(config: &OutputConfig, text: impl Display) -> String {
    style(format!("[{}]", text))
        .dim()
        .force_styling(config.use_color)
        .to_string()
}

/// A library name, bold when colors are on.
pub fn name(config: &OutputConfig, text: impl Display) -> String {
    style(text).bold().force_styling(config.use_color).to_string()
}
