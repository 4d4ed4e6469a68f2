//! Reorder engine against a real temp directory. Host filesystems may
//! enumerate in hash order, so only sets, contents and leftovers are checked.

use assert_fs::prelude::*;
use fat_sort::{NullSink, RealFs, ReorderEngine, ReorderOutcome, SortOptions};
use serial_test::serial;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

fn opts() -> SortOptions {
    SortOptions {
        settle_delay: Duration::ZERO,
        ..SortOptions::default()
    }
}

fn names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
#[serial]
fn entries_and_contents_survive() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("Zebra.mp3").write_str("z").unwrap();
    td.child("apple.mp3").write_str("a").unwrap();
    td.child("Mango").create_dir_all().unwrap();
    td.child("Mango/track.mp3").write_str("m").unwrap();
    td.child(".hidden").write_str("h").unwrap();
    let before = names(td.path());

    let engine = ReorderEngine::new(RealFs, NullSink, opts());
    let listed = engine.list(td.path()).unwrap();
    assert_eq!(listed.len(), 3, "hidden entry must not be listed");

    match engine.reorder_listed(td.path(), &listed).unwrap() {
        ReorderOutcome::Unchanged => {}
        ReorderOutcome::Changed(report) => {
            assert_eq!(report.moved.len(), 3);
            assert!(report.scratch_left.is_none());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(names(td.path()), before);
    td.child("Zebra.mp3").assert("z");
    td.child("apple.mp3").assert("a");
    td.child("Mango/track.mp3").assert("m");
    td.child(".hidden").assert("h");
}

#[test]
#[serial]
fn dry_run_leaves_no_trace() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("b").touch().unwrap();
    td.child("a").touch().unwrap();
    let before = names(td.path());

    let engine = ReorderEngine::new(
        RealFs,
        NullSink,
        SortOptions {
            dry_run: true,
            ..opts()
        },
    );
    let out = engine.reorder(td.path()).unwrap();
    assert!(!out.is_changed());
    assert_eq!(names(td.path()), before);
}

#[test]
fn unreadable_directory_is_a_list_error() {
    let td = assert_fs::TempDir::new().unwrap();
    let engine = ReorderEngine::new(RealFs, NullSink, opts());
    let err = engine.reorder(&td.path().join("missing")).unwrap_err();
    assert_eq!(err.code(), 10);
    assert!(err.to_string().contains("read directory"), "{err}");
}
