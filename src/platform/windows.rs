//! Windows (and other non-Unix) implementations of platform helpers.
//!
//! Notes:
//! - There is no global sync; per-directory flushing is a no-op here and the
//!   settle delay after each move is all we can offer.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// Open log file for appending (best-effort; no POSIX modes on Windows).
pub fn open_log_file_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn sync_filesystems() {}
