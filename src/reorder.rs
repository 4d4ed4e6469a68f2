//! Reorder engine.
//!
//! FAT-style directory tables hand out entries in slot order, and the only way
//! to rewrite that order from userspace is to move things. For one directory:
//!
//! 1. list the non-hidden entries in enumeration order;
//! 2. stop if they already are in case-insensitive order;
//! 3. create a hidden scratch directory next to them;
//! 4. drain: move every entry into scratch, in sorted order;
//! 5. refill: move each drained entry back, in the same order;
//! 6. remove the scratch directory.
//!
//! Every move is followed by a flush and a settle delay so the device sees the
//! writes in program order. Per-entry failures never abort the directory; they
//! are collected and returned as data in [`ReorderOutcome::Failed`].

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::errors::{Result, SortError};
use crate::fs_ops::{DirFs, Entry, is_hidden, scratch_name};
use crate::log_sink::LogSink;
use crate::shutdown;

/// Attempts at finding an unused scratch name before giving up.
const SCRATCH_ATTEMPTS: u32 = 4;

/// Knobs for the engine, usually derived from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptions {
    /// Names starting with this are never listed, moved or descended into.
    pub hidden_marker: char,
    /// Pause after every flush.
    pub settle_delay: Duration,
    /// Only report which directories would be reordered.
    pub dry_run: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            hidden_marker: crate::config::HIDDEN_MARKER_DEFAULT,
            settle_delay: crate::config::SETTLE_DELAY_DEFAULT,
            dry_run: false,
        }
    }
}

impl From<&Config> for SortOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            hidden_marker: cfg.hidden_marker,
            settle_delay: cfg.settle_delay,
            dry_run: cfg.dry_run,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Directory -> scratch.
    Drain,
    /// Scratch -> directory.
    Refill,
}

#[derive(Debug)]
pub struct MoveFailure {
    pub name: OsString,
    pub phase: Phase,
    pub error: SortError,
}

/// A reorder that ran to completion.
#[derive(Debug, Default)]
pub struct ReorderReport {
    /// Entries drained and restored, in their new order.
    pub moved: Vec<OsString>,
    /// Entries that vanished between listing and their move.
    pub skipped: Vec<OsString>,
    /// Scratch directory that could not be removed afterwards.
    pub scratch_left: Option<PathBuf>,
}

/// What is left after a reorder that did not fully succeed.
#[derive(Debug, Default)]
pub struct PartialState {
    /// Scratch directory used for this attempt.
    pub scratch: PathBuf,
    /// Entries drained and restored.
    pub restored: Vec<OsString>,
    pub skipped: Vec<OsString>,
    pub failures: Vec<MoveFailure>,
    /// Entries still sitting in `scratch`.
    pub stranded: Vec<OsString>,
    /// Whether `scratch` still exists on disk.
    pub scratch_left: bool,
    /// Draining stopped early because shutdown was requested.
    pub interrupted: bool,
}

impl PartialState {
    /// Full paths of the stranded entries.
    pub fn stranded_paths(&self) -> Vec<PathBuf> {
        self.stranded.iter().map(|n| self.scratch.join(n)).collect()
    }
}

#[derive(Debug)]
pub enum ReorderOutcome {
    /// Already in order; nothing was touched.
    Unchanged,
    /// Dry run: not in order, would be reordered.
    WouldChange,
    Changed(ReorderReport),
    Failed(PartialState),
}

impl ReorderOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, ReorderOutcome::Changed(_))
    }
}

/// Case-folded comparison key. Paths always keep the original name.
pub fn sort_key(name: &OsStr) -> String {
    name.to_string_lossy().to_lowercase()
}

/// Stable case-insensitive sort: names equal under case folding keep their
/// relative order.
pub fn sorted_names(names: &[OsString]) -> Vec<OsString> {
    let mut sorted = names.to_vec();
    sorted.sort_by_cached_key(|n| sort_key(n));
    sorted
}

/// Whether `names` already enumerate in [`sorted_names`] order.
pub fn is_sorted(names: &[OsString]) -> bool {
    names.len() <= 1 || sorted_names(names) == names
}

fn show(name: &OsStr) -> Cow<'_, str> {
    name.to_string_lossy()
}

/// Per-entry results collected while the two phases run.
#[derive(Default)]
struct MoveTally {
    drained: Vec<OsString>,
    restored: Vec<OsString>,
    skipped: Vec<OsString>,
    failures: Vec<MoveFailure>,
    stranded: Vec<OsString>,
    interrupted: bool,
}

/// Reorders one directory at a time through a [`DirFs`], logging to a [`LogSink`].
pub struct ReorderEngine<F, L> {
    fs: F,
    log: L,
    opts: SortOptions,
}

impl<F: DirFs, L: LogSink> ReorderEngine<F, L> {
    pub fn new(fs: F, log: L, opts: SortOptions) -> Self {
        Self { fs, log, opts }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Live enumeration of `dir` without hidden names.
    pub fn list(&self, dir: &Path) -> Result<Vec<Entry>> {
        let entries = self.fs.list(dir).map_err(|source| SortError::List {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(entries
            .into_iter()
            .filter(|e| !is_hidden(&e.name, self.opts.hidden_marker))
            .collect())
    }

    /// List `dir` and reorder it.
    pub fn reorder(&self, dir: &Path) -> Result<ReorderOutcome> {
        let entries = self.list(dir)?;
        self.reorder_listed(dir, &entries)
    }

    /// Reorder `dir` given a fresh listing from [`Self::list`].
    ///
    /// Errors are `ScratchCreate` only; per-entry move problems end up in the
    /// returned outcome instead.
    pub fn reorder_listed(&self, dir: &Path, entries: &[Entry]) -> Result<ReorderOutcome> {
        let current: Vec<OsString> = entries.iter().map(|e| e.name.clone()).collect();
        if is_sorted(&current) {
            self.log.info(&format!(
                "Directory already sorted ({} entries): {}",
                current.len(),
                dir.display()
            ));
            return Ok(ReorderOutcome::Unchanged);
        }
        self.log.info(&format!(
            "Directory needs sorting ({} entries): {}",
            current.len(),
            dir.display()
        ));

        if self.opts.dry_run {
            self.log.info(&format!("dry-run: would reorder {}", dir.display()));
            return Ok(ReorderOutcome::WouldChange);
        }

        let sorted = sorted_names(&current);
        let scratch = self.create_scratch(dir)?;
        let mut tally = MoveTally::default();

        self.log.info("Phase 1: moving entries to scratch directory");
        self.drain(dir, &scratch, &sorted, &mut tally);

        self.log.info("Phase 2: moving entries back");
        self.refill(dir, &scratch, &mut tally);

        let scratch_left = self.cleanup(&scratch);

        if !tally.stranded.is_empty() {
            let names: Vec<Cow<'_, str>> = tally.stranded.iter().map(|n| show(n)).collect();
            self.log.error(&format!(
                "{} entries remain in scratch directory {}: {}. Move them back by hand.",
                tally.stranded.len(),
                scratch.display(),
                names.join(", ")
            ));
        }

        if tally.failures.is_empty() && !tally.interrupted {
            self.log.info(&format!("Successfully sorted directory: {}", dir.display()));
            return Ok(ReorderOutcome::Changed(ReorderReport {
                moved: tally.restored,
                skipped: tally.skipped,
                scratch_left: scratch_left.then_some(scratch),
            }));
        }

        self.log.error(&format!(
            "Directory only partially sorted ({} failed moves{}): {}",
            tally.failures.len(),
            if tally.interrupted { ", interrupted" } else { "" },
            dir.display()
        ));
        Ok(ReorderOutcome::Failed(PartialState {
            scratch,
            restored: tally.restored,
            skipped: tally.skipped,
            failures: tally.failures,
            stranded: tally.stranded,
            scratch_left,
            interrupted: tally.interrupted,
        }))
    }

    fn create_scratch(&self, dir: &Path) -> Result<PathBuf> {
        let mut attempt = 0;
        loop {
            let scratch = dir.join(scratch_name(self.opts.hidden_marker, attempt));
            match self.fs.create_dir(&scratch) {
                Ok(()) => {
                    self.log.info(&format!("Created scratch directory: {}", scratch.display()));
                    return Ok(scratch);
                }
                Err(e)
                    if e.kind() == io::ErrorKind::AlreadyExists
                        && attempt + 1 < SCRATCH_ATTEMPTS =>
                {
                    self.log.debug(&format!("Scratch name taken, retrying: {}", scratch.display()));
                    attempt += 1;
                }
                Err(source) => {
                    let err = SortError::ScratchCreate {
                        path: scratch,
                        source,
                    };
                    self.log.error(&format!("{err}; leaving {} untouched", dir.display()));
                    return Err(err);
                }
            }
        }
    }

    fn drain(&self, dir: &Path, scratch: &Path, sorted: &[OsString], tally: &mut MoveTally) {
        for name in sorted {
            if shutdown::is_requested() {
                self.log.warn(&format!(
                    "Interrupted; not draining remaining entries of {}",
                    dir.display()
                ));
                tally.interrupted = true;
                break;
            }
            let src = dir.join(name);
            if !self.fs.exists(&src) {
                self.log.warn(&format!("Entry disappeared during operation: {}", show(name)));
                tally.skipped.push(name.clone());
                continue;
            }
            match self.move_entry(&src, &scratch.join(name), scratch) {
                Ok(()) => {
                    self.log.info(&format!("Moved to scratch: {}", show(name)));
                    tally.drained.push(name.clone());
                }
                Err(e) if e.is_not_found() => {
                    self.log.warn(&format!("Entry disappeared during operation: {}", show(name)));
                    tally.skipped.push(name.clone());
                }
                Err(e) => {
                    self.log.error(&format!("Failed to move {} to scratch: {e}", show(name)));
                    tally.failures.push(MoveFailure {
                        name: name.clone(),
                        phase: Phase::Drain,
                        error: e,
                    });
                }
            }
        }
    }

    fn refill(&self, dir: &Path, scratch: &Path, tally: &mut MoveTally) {
        for name in std::mem::take(&mut tally.drained) {
            match self.move_entry(&scratch.join(&name), &dir.join(&name), dir) {
                Ok(()) => {
                    self.log.info(&format!("Moved back: {}", show(&name)));
                    tally.restored.push(name);
                }
                Err(e) => {
                    self.log.error(&format!("Failed to move {} back: {e}", show(&name)));
                    tally.stranded.push(name.clone());
                    tally.failures.push(MoveFailure {
                        name,
                        phase: Phase::Refill,
                        error: e,
                    });
                }
            }
        }
    }

    /// Returns true when the scratch directory is still on disk.
    fn cleanup(&self, scratch: &Path) -> bool {
        match self.fs.remove_dir(scratch) {
            Ok(()) => {
                self.log.info(&format!("Removed scratch directory: {}", scratch.display()));
                false
            }
            Err(source) => {
                let err = SortError::Cleanup {
                    path: scratch.to_path_buf(),
                    source,
                };
                self.log.warn(&err.to_string());
                self.log.warn(&format!(
                    "Please remove {} manually once it is empty",
                    scratch.display()
                ));
                true
            }
        }
    }

    /// Rename, then flush `flush_dir` and let the device settle.
    fn move_entry(&self, from: &Path, to: &Path, flush_dir: &Path) -> Result<()> {
        self.fs.rename(from, to).map_err(|source| SortError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
        if let Err(e) = self.fs.flush(flush_dir) {
            self.log.debug(&format!("flush of {} failed: {e}", flush_dir.display()));
        }
        if !self.opts.settle_delay.is_zero() {
            std::thread::sleep(self.opts.settle_delay);
        }
        Ok(())
    }
}
