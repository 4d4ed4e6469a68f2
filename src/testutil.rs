//! In-memory stand-ins for the filesystem and the log, used by unit tests.
//!
//! `MemoryFs` keeps every directory's children in a Vec, so enumeration order
//! is exactly insertion order: a rename removes the name from the source list
//! and appends it to the destination list. That is how a FAT directory table
//! behaves once the two-phase move has freed every slot, and it lets tests
//! assert on order, which a real host filesystem would not guarantee.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use crate::fs_ops::{DirFs, Entry};
use crate::log_sink::{Level, LogSink};
use crate::shutdown;

#[derive(Default)]
struct State {
    /// Directory path -> children in enumeration order.
    dirs: HashMap<PathBuf, Vec<OsString>>,
    /// Paths that are regular files.
    files: HashSet<PathBuf>,
}

impl State {
    fn exists(&self, path: &Path) -> bool {
        self.dirs.contains_key(path) || self.files.contains(path)
    }

    fn ensure_dir(&mut self, path: &Path) {
        if self.dirs.contains_key(path) {
            return;
        }
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.ensure_dir(parent);
            push_child(&mut self.dirs, parent, name);
        }
        self.dirs.insert(path.to_path_buf(), Vec::new());
    }
}

fn push_child(dirs: &mut HashMap<PathBuf, Vec<OsString>>, parent: &Path, name: &OsStr) {
    if let Some(children) = dirs.get_mut(parent) {
        children.push(name.to_os_string());
    }
}

/// `p` (at or under `from`) re-rooted at `to`.
fn rebase(p: &Path, from: &Path, to: &Path) -> PathBuf {
    match p.strip_prefix(from) {
        Ok(rel) if !rel.as_os_str().is_empty() => to.join(rel),
        _ => to.to_path_buf(),
    }
}

fn err(kind: io::ErrorKind, what: &str, path: &Path) -> io::Error {
    io::Error::new(kind, format!("{what}: {}", path.display()))
}

/// Deterministic fake filesystem with failure injection.
#[derive(Default)]
pub struct MemoryFs {
    state: RefCell<State>,
    fail_list: RefCell<HashSet<PathBuf>>,
    fail_rename_from: RefCell<HashSet<PathBuf>>,
    fail_rename_to: RefCell<HashSet<PathBuf>>,
    fail_create_in: RefCell<HashSet<PathBuf>>,
    fail_remove: Cell<bool>,
    create_collisions: Cell<usize>,
    vanish_after_list: RefCell<Vec<PathBuf>>,
    interrupt_after: Cell<Option<usize>>,
    renames: RefCell<Vec<(PathBuf, PathBuf)>>,
    flushes: Cell<usize>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` (and missing parents) as a directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        self.state.borrow_mut().ensure_dir(path.as_ref());
        self
    }

    /// Append a file at `path`; parent directories are created as needed.
    pub fn add_file(&self, path: impl AsRef<Path>) -> &Self {
        let path = path.as_ref();
        let mut st = self.state.borrow_mut();
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            st.ensure_dir(parent);
            push_child(&mut st.dirs, parent, name);
        }
        st.files.insert(path.to_path_buf());
        self
    }

    /// Raw enumeration of `dir`, hidden names included.
    pub fn names(&self, dir: impl AsRef<Path>) -> Vec<String> {
        self.state
            .borrow()
            .dirs
            .get(dir.as_ref())
            .map(|c| c.iter().map(|n| n.to_string_lossy().into_owned()).collect())
            .unwrap_or_default()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state.borrow().dirs.contains_key(path.as_ref())
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.state.borrow().files.contains(path.as_ref())
    }

    /// Every path in the tree, sorted, for set comparisons.
    pub fn all_paths(&self) -> Vec<PathBuf> {
        let st = self.state.borrow();
        let mut all: Vec<PathBuf> = st.dirs.keys().chain(st.files.iter()).cloned().collect();
        all.sort();
        all
    }

    pub fn fail_list(&self, dir: impl Into<PathBuf>) {
        self.fail_list.borrow_mut().insert(dir.into());
    }

    /// Fail any rename whose source is `path` (a drain-phase failure).
    pub fn fail_rename_from(&self, path: impl Into<PathBuf>) {
        self.fail_rename_from.borrow_mut().insert(path.into());
    }

    /// Fail any rename whose destination is `path` (a refill-phase failure).
    pub fn fail_rename_to(&self, path: impl Into<PathBuf>) {
        self.fail_rename_to.borrow_mut().insert(path.into());
    }

    /// Fail `create_dir` for any new directory directly inside `dir`.
    pub fn fail_create_in(&self, dir: impl Into<PathBuf>) {
        self.fail_create_in.borrow_mut().insert(dir.into());
    }

    /// Fail the next `n` `create_dir` calls with AlreadyExists.
    pub fn collide_create_dir(&self, n: usize) {
        self.create_collisions.set(n);
    }

    pub fn fail_remove_dir(&self) {
        self.fail_remove.set(true);
    }

    /// Delete `path` right after its parent is next listed, as a racing
    /// process would.
    pub fn vanish_after_list(&self, path: impl Into<PathBuf>) {
        self.vanish_after_list.borrow_mut().push(path.into());
    }

    /// Raise the global shutdown flag once `n` renames have completed.
    pub fn interrupt_after_renames(&self, n: usize) {
        self.interrupt_after.set(Some(n));
    }

    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.renames.borrow().clone()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.get()
    }

    fn remove_path(st: &mut State, path: &Path) {
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
            && let Some(children) = st.dirs.get_mut(parent)
        {
            children.retain(|c| c != name);
        }
        st.files.remove(path);
        let doomed: Vec<PathBuf> = st
            .dirs
            .keys()
            .chain(st.files.iter())
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();
        for p in doomed {
            st.dirs.remove(&p);
            st.files.remove(&p);
        }
    }
}

impl DirFs for MemoryFs {
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        if self.fail_list.borrow().contains(dir) {
            return Err(err(io::ErrorKind::PermissionDenied, "permission denied", dir));
        }
        let mut st = self.state.borrow_mut();
        let children = st
            .dirs
            .get(dir)
            .ok_or_else(|| err(io::ErrorKind::NotFound, "no such directory", dir))?;
        let out: Vec<Entry> = children
            .iter()
            .map(|name| Entry {
                name: name.clone(),
                is_dir: st.dirs.contains_key(&dir.join(name)),
            })
            .collect();

        let mut pending = self.vanish_after_list.borrow_mut();
        let (now, later): (Vec<PathBuf>, Vec<PathBuf>) =
            pending.drain(..).partition(|p| p.parent() == Some(dir));
        *pending = later;
        for p in now {
            Self::remove_path(&mut st, &p);
        }
        Ok(out)
    }

    fn exists(&self, path: &Path) -> bool {
        self.state.borrow().exists(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.fail_rename_from.borrow().contains(from)
            || self.fail_rename_to.borrow().contains(to)
        {
            return Err(err(io::ErrorKind::PermissionDenied, "injected rename failure", from));
        }
        let mut st = self.state.borrow_mut();
        if !st.exists(from) {
            return Err(err(io::ErrorKind::NotFound, "no such entry", from));
        }
        if st.exists(to) {
            return Err(err(io::ErrorKind::AlreadyExists, "destination exists", to));
        }
        let (Some(to_parent), Some(to_name)) = (to.parent(), to.file_name()) else {
            return Err(err(io::ErrorKind::InvalidInput, "bad destination", to));
        };
        if !st.dirs.contains_key(to_parent) {
            return Err(err(io::ErrorKind::NotFound, "no such directory", to_parent));
        }

        // Re-key the moved node and, for a directory, its whole subtree.
        let moved_dirs: Vec<(PathBuf, Vec<OsString>)> = st
            .dirs
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect();
        let moved_files: Vec<PathBuf> = st
            .files
            .iter()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        Self::remove_path(&mut st, from);
        for (p, children) in moved_dirs {
            st.dirs.insert(rebase(&p, from, to), children);
        }
        for p in moved_files {
            st.files.insert(rebase(&p, from, to));
        }
        push_child(&mut st.dirs, to_parent, to_name);
        drop(st);

        let mut renames = self.renames.borrow_mut();
        renames.push((from.to_path_buf(), to.to_path_buf()));
        if let Some(n) = self.interrupt_after.get()
            && renames.len() >= n
        {
            shutdown::request();
        }
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| err(io::ErrorKind::InvalidInput, "no parent", path))?;
        if self.fail_create_in.borrow().contains(parent) {
            return Err(err(io::ErrorKind::PermissionDenied, "read-only directory", parent));
        }
        let collisions = self.create_collisions.get();
        if collisions > 0 {
            self.create_collisions.set(collisions - 1);
            return Err(err(io::ErrorKind::AlreadyExists, "already exists", path));
        }
        let mut st = self.state.borrow_mut();
        if st.exists(path) {
            return Err(err(io::ErrorKind::AlreadyExists, "already exists", path));
        }
        if !st.dirs.contains_key(parent) {
            return Err(err(io::ErrorKind::NotFound, "no such directory", parent));
        }
        st.ensure_dir(path);
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        if self.fail_remove.get() {
            return Err(err(io::ErrorKind::PermissionDenied, "injected rmdir failure", path));
        }
        let mut st = self.state.borrow_mut();
        match st.dirs.get(path) {
            None => Err(err(io::ErrorKind::NotFound, "no such directory", path)),
            Some(children) if !children.is_empty() => {
                Err(err(io::ErrorKind::Other, "directory not empty", path))
            }
            Some(_) => {
                Self::remove_path(&mut st, path);
                Ok(())
            }
        }
    }

    fn flush(&self, _dir: &Path) -> io::Result<()> {
        self.flushes.set(self.flushes.get() + 1);
        Ok(())
    }
}

/// Captures every record for later assertions.
#[derive(Default)]
pub struct MemoryLog {
    records: RefCell<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.borrow().clone()
    }

    /// Messages logged at exactly `level`.
    pub fn at(&self, level: Level) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.at(level).iter().any(|m| m.contains(needle))
    }
}

impl LogSink for MemoryLog {
    fn log(&self, level: Level, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}
