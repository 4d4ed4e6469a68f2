//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents console verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::{HIDDEN_MARKER_DEFAULT, SETTLE_DELAY_DEFAULT};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Warnings and errors (default)
    #[default]
    Normal,
    /// Every move and decision (`--verbose`)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" | "warn" | "warning" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one sorting run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Names starting with this char are never listed, moved or recursed into
    pub hidden_marker: char,
    /// Pause after every flush
    pub settle_delay: Duration,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file (always at least info level)
    pub log_file: Option<PathBuf>,
    /// If true, report what would be reordered but do not modify anything
    pub dry_run: bool,
    /// Emit JSON log records
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hidden_marker: HIDDEN_MARKER_DEFAULT,
            settle_delay: SETTLE_DELAY_DEFAULT,
            log_level: LogLevel::Normal,
            log_file: None,
            dry_run: false,
            json: false,
        }
    }
}
