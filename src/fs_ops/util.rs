use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Scratch directory name for one reorder attempt.
/// Starts with the hidden marker so later listings never see it.
/// Format: "<marker>fat_sort.<pid>.<nanos>[.<attempt>]"
pub fn scratch_name(hidden_marker: char, attempt: u32) -> OsString {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = if attempt == 0 {
        format!("{hidden_marker}fat_sort.{pid}.{nanos}")
    } else {
        format!("{hidden_marker}fat_sort.{pid}.{nanos}.{attempt}")
    };
    OsString::from(name)
}

/// Whether `name` is excluded from listing because of the hidden marker.
pub fn is_hidden(name: &OsStr, hidden_marker: char) -> bool {
    name.to_string_lossy().starts_with(hidden_marker)
}

#[cfg(unix)]
pub(super) fn fsync_dir(dir: &Path) -> io::Result<()> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[cfg(not(unix))]
pub(super) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_name_is_hidden() {
        let n = scratch_name('.', 0);
        assert!(is_hidden(&n, '.'));
        let n = scratch_name('_', 3);
        assert!(is_hidden(&n, '_'));
        assert!(n.to_string_lossy().ends_with(".3"));
    }

    #[test]
    fn hidden_check_uses_first_char_only() {
        assert!(is_hidden(OsStr::new(".Trashes"), '.'));
        assert!(!is_hidden(OsStr::new("a.mp3"), '.'));
        assert!(!is_hidden(OsStr::new(""), '.'));
    }
}
