//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the interrupt handler,
//! validates the target and runs the tree walker.

use anyhow::Result;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use fat_sort::cli::Args;
use fat_sort::config::{CONFIG_ENV_VAR, load_config_from_xml};
use fat_sort::output as out;
use fat_sort::{Config, SortError, default_config_path, real_walker, shutdown};

use crate::logging::init_tracing;

fn print_config_location() {
    if let Some(p) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        out::print_info(&format!(
            "Using {CONFIG_ENV_VAR} (explicit):\n  {}",
            Path::new(&p).display()
        ));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default fat_sort config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there; built-in defaults are used.");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}

/// CLI flags > config file > defaults.
fn build_config(args: &Args) -> Result<Config> {
    let mut cfg = Config::default();
    match load_config_from_xml() {
        Ok(Some((_, settings))) => settings.apply(&mut cfg),
        Ok(None) => {}
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            return Err(e);
        }
    }
    args.apply_overrides(&mut cfg);
    Ok(cfg)
}

/// Absolute path of the target, which must be a directory (a symlink to one is
/// followed here, never below).
fn resolve_target(root: &Path) -> Result<PathBuf, SortError> {
    let unreadable = |source: io::Error| SortError::List {
        path: root.to_path_buf(),
        source,
    };
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(SortError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SortError::NotFound(root.to_path_buf()));
        }
        Err(e) => return Err(unreadable(e)),
    }
    dunce::canonicalize(root).map_err(unreadable)
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location();
        return Ok(());
    }

    let cfg = build_config(&args)?;

    let guard_opt = init_tracing(cfg.log_level, cfg.log_file.as_deref(), cfg.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Dropped on SIGINT so the file writer flushes.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; finishing the current move and restoring entries");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .expect("failed to install signal handler");
    }

    debug!(?cfg, "Starting fat_sort");

    let result = (|| -> Result<()> {
        let Some(target) = args.directory.as_deref() else {
            return Err(anyhow::anyhow!("no directory given"));
        };

        let root = match resolve_target(target) {
            Ok(root) => root,
            Err(e) => {
                let code = e.code();
                error!(code, path = %target.display(), "{e}");
                out::print_error(&e.to_string());
                return Err(e.into());
            }
        };

        out::print_banner(&root);
        out::print_run_notes(&cfg);

        let summary = real_walker(&cfg).walk(&root);

        for path in &summary.stranded {
            error!(path = %path.display(), "Entry left in scratch directory");
        }
        for path in &summary.leftover_scratch {
            warn!(path = %path.display(), "Scratch directory left behind");
        }
        info!(
            processed = summary.processed,
            changed = summary.changed,
            unchanged = summary.unchanged,
            failed = summary.failed,
            "Walk finished"
        );
        out::print_summary(&summary, cfg.dry_run);

        if summary.interrupted || shutdown::is_requested() {
            let e = SortError::Interrupted;
            error!(code = e.code(), "Sort aborted by user");
            return Err(e.into());
        }
        Ok(())
    })();

    // Flush logs before exit.
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn target_checks() {
        let td = tempdir().unwrap();
        let missing = td.path().join("nope");
        assert!(matches!(resolve_target(&missing), Err(SortError::NotFound(_))));

        let file = td.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(resolve_target(&file), Err(SortError::NotADirectory(_))));
    }

    #[test]
    fn target_is_made_absolute() {
        let td = tempdir().unwrap();
        std::fs::create_dir(td.path().join("card")).unwrap();
        let root = resolve_target(&td.path().join("card/../card")).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("card"));
        assert!(!root.to_string_lossy().contains(".."));
    }

    #[cfg(unix)]
    #[test]
    fn non_missing_errors_keep_their_cause() {
        let td = tempdir().unwrap();
        let file = td.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        // ENOTDIR, not ENOENT: the parent component is a regular file.
        let err = resolve_target(&file.join("sub")).unwrap_err();
        assert!(matches!(err, SortError::List { .. }), "{err:?}");
        assert!(!err.to_string().contains("does not exist"), "{err}");
    }
}
