//! I/O error rendering.
//!
//! Turns an io::Error into a one-line message with an actionable hint and the raw
//! OS code, so log lines about a failed move tell the operator what to check.
//!
//! Usage:
//!   warn!("{}", describe_io_error("read directory", dir, &e));

use std::io;
use std::path::Path;

/// Hint for a raw OS error code, if we know one.
fn os_hint(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => {
                Some("permission denied; check ownership and write permissions")
            }
            libc::EXDEV => Some("cross-filesystem; entries must stay on the same volume"),
            libc::EBUSY => Some("resource busy; close any player or program using the card"),
            libc::ENOENT => Some("path not found; it may have been moved by another process"),
            libc::EEXIST | libc::ENOTEMPTY => {
                Some("already exists; a leftover scratch directory may need manual cleanup")
            }
            libc::ENOSPC => Some("no space left on device or directory table is full"),
            libc::EROFS => Some("read-only filesystem; remount the card read-write"),
            libc::ENAMETOOLONG => Some("filename or path too long for this filesystem"),
            libc::EIO => Some("I/O error; the card may be failing or was removed"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        match code {
            5 => Some("access denied; check permissions"),
            17 => Some("not same device; entries must stay on the same volume"),
            32 => Some("sharing violation; file is in use"),
            2 | 3 => Some("path not found; it may have been moved by another process"),
            80 | 183 => {
                Some("already exists; a leftover scratch directory may need manual cleanup")
            }
            112 => Some("insufficient disk space"),
            19 => Some("write protected media"),
            206 => Some("filename or path too long"),
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => {
            Some("permission denied; check ownership and write permissions")
        }
        io::ErrorKind::NotFound => {
            Some("path not found; it may have been moved by another process")
        }
        io::ErrorKind::AlreadyExists => {
            Some("already exists; a leftover scratch directory may need manual cleanup")
        }
        _ => None,
    }
}

/// Render `e` with a hint and, when present, the OS error code.
pub fn io_hint(e: &io::Error) -> String {
    let mut msg = e.to_string();
    let hint = match e.raw_os_error() {
        Some(code) => os_hint(code),
        None => kind_hint(e.kind()),
    };
    if let Some(h) = hint {
        msg.push_str(" (");
        msg.push_str(h);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// `"<op> '<path>': <error> (<hint>) [os code: N]"`.
pub fn describe_io_error(op: &str, path: &Path, e: &io::Error) -> String {
    format!("{} '{}': {}", op, path.display(), io_hint(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_only_errors_get_kind_hint() {
        let e = io::Error::from(io::ErrorKind::PermissionDenied);
        let msg = describe_io_error("read directory", Path::new("/card"), &e);
        assert!(msg.starts_with("read directory '/card':"), "{msg}");
        assert!(msg.contains("check ownership"), "{msg}");
        assert!(!msg.contains("os code"), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn raw_os_errors_carry_code() {
        let e = io::Error::from_raw_os_error(libc::EXDEV);
        let msg = io_hint(&e);
        assert!(msg.contains("same volume"), "{msg}");
        assert!(msg.contains(&format!("[os code: {}]", libc::EXDEV)), "{msg}");
    }
}
