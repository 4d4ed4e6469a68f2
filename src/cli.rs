//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug wins over --verbose.
//! - Flags only ever override; unset flags leave config-file values alone.

use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::types::{Config, LogLevel};

/// Sort directory entries on FAT-formatted media by name.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Sort FAT directory entries so devices play files in name order"
)]
pub struct Args {
    /// Root directory to sort (recursively).
    #[arg(
        value_name = "DIRECTORY",
        value_hint = ValueHint::DirPath,
        required_unless_present = "print_config"
    )]
    pub directory: Option<PathBuf>,

    /// Log every move, not just warnings.
    #[arg(short = 'v', long, help = "Enable verbose (info level) output")]
    pub verbose: bool,

    /// Additionally write info-level log lines to this file.
    #[arg(
        short = 'l',
        long,
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        help = "Also write log lines to this file"
    )]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short = 'd', long, help = "Enable debug (trace level) output")]
    pub debug: bool,

    /// Report which directories would be reordered without moving anything.
    #[arg(long, help = "Show which directories would be reordered, but do not move anything")]
    pub dry_run: bool,

    /// Emit logs in structured JSON.
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Milliseconds to wait after each flush.
    #[arg(long, value_name = "N", help = "Pause after each flush, in milliseconds (default 100)")]
    pub settle_ms: Option<u64>,

    /// Print where fat_sort will look for the config file, then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --verbose > None (use config value).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            Some(LogLevel::Debug)
        } else if self.verbose {
            Some(LogLevel::Info)
        } else {
            None
        }
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        if let Some(ms) = self.settle_ms {
            cfg.settle_delay = Duration::from_millis(ms);
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.json {
            cfg.json = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
