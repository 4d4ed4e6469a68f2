//! Core library for `fat_sort`.
//!
//! Rewrites the enumeration order of directories on FAT-style media so that
//! devices which play files "in the order they appear" see them sorted
//! case-insensitively by name. The only primitive used is rename: entries are
//! drained into a hidden scratch directory in sorted order and moved back.
//!
//! - [`reorder::ReorderEngine`] handles one directory.
//! - [`walk::TreeWalker`] applies it to a whole tree.
//! - Both talk to disk through [`fs_ops::DirFs`] and log through
//!   [`log_sink::LogSink`], so they run unchanged against the in-memory fakes
//!   in `testutil`.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod log_sink;
pub mod output;
pub mod platform;
pub mod reorder;
pub mod shutdown;
pub mod walk;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testutil;

pub use config::{Config, LogLevel, default_config_path};
pub use errors::SortError;
pub use fs_ops::{DirFs, Entry, RealFs};
pub use log_sink::{Level, LogSink, NullSink, TracingSink};
pub use reorder::{ReorderEngine, ReorderOutcome, SortOptions};
pub use walk::{TreeWalker, WalkSummary};

/// Build a walker over the host filesystem that logs through `tracing`.
pub fn real_walker(cfg: &Config) -> TreeWalker<RealFs, TracingSink> {
    TreeWalker::new(ReorderEngine::new(RealFs, TracingSink, SortOptions::from(cfg)))
}

pub mod prelude {
    pub use crate::config::{Config, LogLevel};
    pub use crate::errors::{Result, SortError};
    pub use crate::fs_ops::{DirFs, Entry, RealFs};
    pub use crate::log_sink::{LogSink, TracingSink};
    pub use crate::reorder::{ReorderEngine, ReorderOutcome, SortOptions};
    pub use crate::walk::{TreeWalker, WalkSummary};
}
