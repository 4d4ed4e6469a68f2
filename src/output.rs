//! User-facing lines: banner, completion summary and colored notices.
//! Colors are enabled only when stdout is a TTY.

use owo_colors::OwoColorize;
use std::path::Path;

use crate::config::{Config, LogLevel};
use crate::walk::WalkSummary;

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

/// Plain line without prefix; the banner and summary go through here so
/// scripts can grep them.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

pub fn print_banner(root: &Path) {
    print_user(&format!("FAT Sorter - Sorting directory: {}", root.display()));
}

/// Lines printed under the banner describing how this run is set up.
pub fn run_notes(cfg: &Config) -> Vec<String> {
    let mut notes = Vec::new();
    if matches!(cfg.log_level, LogLevel::Info | LogLevel::Debug) {
        notes.push("Verbose mode enabled".to_string());
    }
    if let Some(p) = &cfg.log_file {
        notes.push(format!("Logging to: {}", p.display()));
    }
    if cfg.dry_run {
        notes.push("Dry-run: nothing will be moved".to_string());
    }
    notes
}

pub fn print_run_notes(cfg: &Config) {
    for note in run_notes(cfg) {
        print_user(&note);
    }
}

/// Lines of the completion summary. `dry_run` changes the wording only.
pub fn summary_lines(summary: &WalkSummary, dry_run: bool) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "Operation completed:".to_string(),
        format!("- Directories processed: {}", summary.processed),
        if dry_run {
            format!("- Directories that would be sorted: {}", summary.changed)
        } else {
            format!("- Directories sorted: {}", summary.changed)
        },
        format!("- Directories already sorted: {}", summary.unchanged),
    ];
    if summary.failed > 0 {
        lines.push(format!("- Directories failed: {}", summary.failed));
    }
    if summary.interrupted {
        lines.push("- Stopped early: interrupted".to_string());
    }
    if !dry_run && summary.changed > 0 {
        lines.push(String::new());
        lines.push("Files have been reordered. The changes should be visible on".to_string());
        lines.push("embedded devices that read files in filesystem order.".to_string());
    }
    if !summary.leftover_scratch.is_empty() {
        lines.push(
            "Scratch directories left behind (move their contents back, then delete):".to_string(),
        );
        lines.extend(
            summary
                .leftover_scratch
                .iter()
                .map(|p| format!("  {}", p.display())),
        );
    }
    lines
}

pub fn print_summary(summary: &WalkSummary, dry_run: bool) {
    for line in summary_lines(summary, dry_run) {
        print_user(&line);
    }
    if summary.failed > 0 || summary.interrupted {
        print_warn("Some directories were not fully sorted; see the log for details.");
    }
}
