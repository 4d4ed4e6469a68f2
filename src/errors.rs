//! Typed error definitions for fat_sort.
//! One variant per failure mode of the reorder protocol, plus the few the
//! binary needs to validate its target.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::fs_ops::{describe_io_error, io_hint};

#[derive(Debug, Error)]
pub enum SortError {
    /// Directory could not be enumerated; the walk skips it.
    #[error("{}", describe_io_error("read directory", .path, .source))]
    List { path: PathBuf, source: io::Error },

    /// Scratch directory could not be created; nothing was moved.
    #[error("{}", describe_io_error("create scratch directory", .path, .source))]
    ScratchCreate { path: PathBuf, source: io::Error },

    #[error("move '{}' -> '{}': {}", .from.display(), .to.display(), io_hint(.source))]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("{}", describe_io_error("remove scratch directory", .path, .source))]
    Cleanup { path: PathBuf, source: io::Error },

    #[error("Directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl SortError {
    /// Stable numeric code, emitted as a structured log field.
    pub fn code(&self) -> u16 {
        match self {
            SortError::List { .. } => 10,
            SortError::ScratchCreate { .. } => 11,
            SortError::Move { .. } => 12,
            SortError::Cleanup { .. } => 13,
            SortError::NotFound(_) => 20,
            SortError::NotADirectory(_) => 21,
            SortError::Interrupted => 130,
        }
    }

    /// True when the underlying io error says the path vanished.
    pub fn is_not_found(&self) -> bool {
        match self {
            SortError::List { source, .. }
            | SortError::ScratchCreate { source, .. }
            | SortError::Move { source, .. }
            | SortError::Cleanup { source, .. } => source.kind() == io::ErrorKind::NotFound,
            SortError::NotFound(_) => true,
            _ => false,
        }
    }
}

pub type Result<T, E = SortError> = std::result::Result<T, E>;
