//! Tree walker: runs the reorder engine on a directory, then on every
//! subdirectory beneath it (pre-order).
//!
//! Children come from the listing taken for the parent's reorder decision, so
//! the scratch directory (hidden) and anything added meanwhile are never
//! visited. A failure in one directory is counted and logged; its siblings and
//! the rest of the tree are still processed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::errors::SortError;
use crate::fs_ops::{DirFs, Entry};
use crate::log_sink::LogSink;
use crate::reorder::{ReorderEngine, ReorderOutcome};
use crate::shutdown;

/// Totals for one walk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    /// Directories visited, whether or not they could be sorted.
    pub processed: usize,
    /// Directories reordered (or, in a dry run, that would be).
    pub changed: usize,
    /// Directories found already in order.
    pub unchanged: usize,
    /// Directories that could not be listed or were only partially sorted.
    pub failed: usize,
    /// Entries left inside a scratch directory after a failed refill.
    pub stranded: Vec<PathBuf>,
    /// Scratch directories that are still on disk.
    pub leftover_scratch: Vec<PathBuf>,
    /// Stopped early because shutdown was requested.
    pub interrupted: bool,
}

impl WalkSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }
}

pub struct TreeWalker<F, L> {
    engine: ReorderEngine<F, L>,
}

impl<F: DirFs, L: LogSink> TreeWalker<F, L> {
    pub fn new(engine: ReorderEngine<F, L>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ReorderEngine<F, L> {
        &self.engine
    }

    /// Sort `root` and everything below it.
    pub fn walk(&self, root: &Path) -> WalkSummary {
        let mut summary = WalkSummary::default();
        self.visit(root, &mut summary);
        summary
    }

    fn visit(&self, dir: &Path, summary: &mut WalkSummary) {
        if shutdown::is_requested() {
            if !summary.interrupted {
                self.engine
                    .log()
                    .warn("Interrupted; remaining directories were not processed");
            }
            summary.interrupted = true;
            return;
        }

        summary.processed += 1;
        self.engine
            .log()
            .info(&format!("Processing directory: {}", dir.display()));

        let entries = match self.engine.list(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.engine
                    .log()
                    .error(&format!("Skipping directory: {e}"));
                summary.failed += 1;
                return;
            }
        };

        let mut stranded: Vec<OsString> = Vec::new();
        let mut vanished: Vec<OsString> = Vec::new();
        match self.engine.reorder_listed(dir, &entries) {
            Ok(ReorderOutcome::Unchanged) => summary.unchanged += 1,
            Ok(ReorderOutcome::WouldChange) => summary.changed += 1,
            Ok(ReorderOutcome::Changed(report)) => {
                summary.changed += 1;
                summary.leftover_scratch.extend(report.scratch_left);
                vanished = report.skipped;
            }
            Ok(ReorderOutcome::Failed(state)) => {
                summary.failed += 1;
                summary.stranded.extend(state.stranded_paths());
                if state.scratch_left {
                    summary.leftover_scratch.push(state.scratch.clone());
                }
                if state.interrupted {
                    summary.interrupted = true;
                }
                stranded = state.stranded;
                vanished = state.skipped;
            }
            // Only ScratchCreate reaches here; the directory is untouched, so
            // its children are still where the listing says.
            Err(e) => {
                debug_assert!(matches!(e, SortError::ScratchCreate { .. }));
                summary.failed += 1;
            }
        }

        for child in subdirectories(&entries) {
            // Already warned about by the engine.
            if vanished.contains(&child.name) {
                continue;
            }
            if stranded.contains(&child.name) {
                self.engine.log().warn(&format!(
                    "Not descending into {}: it is still in the scratch directory",
                    dir.join(&child.name).display()
                ));
                continue;
            }
            let path = dir.join(&child.name);
            if !self.engine.fs().exists(&path) {
                self.engine.log().warn(&format!(
                    "Directory disappeared during operation: {}",
                    path.display()
                ));
                continue;
            }
            self.visit(&path, summary);
        }
    }
}

fn subdirectories(entries: &[Entry]) -> impl Iterator<Item = &Entry> {
    entries.iter().filter(|e| e.is_dir)
}
