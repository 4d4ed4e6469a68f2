//! Filesystem capability used by the reorder engine and tree walker.
//!
//! Everything the engine does to disk goes through [`DirFs`]: enumerate, test,
//! rename, mkdir, rmdir and flush. [`RealFs`] maps these onto `std::fs`; tests
//! substitute the in-memory fake from `testutil`.

mod helpers;
mod util;

pub use helpers::{describe_io_error, io_hint};
pub use util::{is_hidden, scratch_name};

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use tracing::trace;

use crate::platform;

/// One name as reported by directory enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,
    /// True only for real directories; symlinks to directories are not followed.
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Narrow filesystem interface. Every call is blocking and sequential.
pub trait DirFs {
    /// Entries of `dir` in the order the filesystem enumerates them.
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>>;

    /// Whether anything (file, dir, dangling symlink) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create exactly one directory; fails if `path` already exists.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Durability hint after a rename into `dir`.
    fn flush(&self, dir: &Path) -> io::Result<()>;
}

impl<T: DirFs + ?Sized> DirFs for &T {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        (**self).list(dir)
    }
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
    fn create_dir(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir(path)
    }
    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir(path)
    }
    fn flush(&self, dir: &Path) -> io::Result<()> {
        (**self).flush(dir)
    }
}

/// The host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl DirFs for RealFs {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        let mut out = Vec::new();
        for ent in fs::read_dir(dir)? {
            let ent = ent?;
            // DirEntry::file_type does not follow symlinks.
            let is_dir = ent.file_type()?.is_dir();
            out.push(Entry {
                name: ent.file_name(),
                is_dir,
            });
        }
        Ok(out)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        // Windows: rename onto an existing name fails; never clobber.
        // Unix: rename(2) would replace, so refuse explicitly.
        if self.exists(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("destination already exists: {}", to.display()),
            ));
        }
        fs::rename(from, to)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn flush(&self, dir: &Path) -> io::Result<()> {
        let synced = util::fsync_dir(dir);
        platform::sync_filesystems();
        trace!(dir = %dir.display(), "flushed");
        synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn real_fs_lists_files_and_dirs() {
        let td = assert_fs::TempDir::new().unwrap();
        td.child("song.mp3").touch().unwrap();
        td.child("album").create_dir_all().unwrap();

        let mut got = RealFs.list(td.path()).unwrap();
        got.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(got, vec![Entry::dir("album"), Entry::file("song.mp3")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dir_is_not_a_dir() {
        let td = assert_fs::TempDir::new().unwrap();
        td.child("real").create_dir_all().unwrap();
        std::os::unix::fs::symlink(td.path().join("real"), td.path().join("link")).unwrap();

        let got = RealFs.list(td.path()).unwrap();
        let link = got.iter().find(|e| e.name == "link").unwrap();
        assert!(!link.is_dir);
    }

    #[test]
    fn rename_refuses_to_clobber() {
        let td = assert_fs::TempDir::new().unwrap();
        td.child("a").write_str("a").unwrap();
        td.child("b").write_str("b").unwrap();

        let err = RealFs
            .rename(&td.path().join("a"), &td.path().join("b"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        td.child("b").assert("b");
    }

    #[test]
    fn flush_on_existing_dir_is_ok() {
        let td = assert_fs::TempDir::new().unwrap();
        RealFs.flush(td.path()).unwrap();
    }
}
