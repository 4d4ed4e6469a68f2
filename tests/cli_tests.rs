use assert_cmd::cargo;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Binary with settle delay off and a config path that does not exist.
fn fat_sort(cfg: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("fat_sort"));
    cmd.env("FAT_SORT_CONFIG", cfg).arg("--settle-ms").arg("0");
    cmd
}

#[test]
fn sorts_tree_and_prints_summary() {
    let td = tempdir().unwrap();
    let root = td.path().join("card");
    fs::create_dir_all(root.join("Album")).unwrap();
    fs::write(root.join("b.mp3"), b"b").unwrap();
    fs::write(root.join("A.mp3"), b"a").unwrap();
    fs::write(root.join("Album/02.mp3"), b"2").unwrap();
    fs::write(root.join("Album/01.mp3"), b"1").unwrap();

    let out = fat_sort(&td.path().join("none.xml"))
        .arg(&root)
        .output()
        .expect("spawn binary");
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("FAT Sorter - Sorting directory:"), "{stdout}");
    assert!(stdout.contains("Directories processed: 2"), "{stdout}");
    assert_eq!(fs::read(root.join("Album/01.mp3")).unwrap(), b"1");
    assert_eq!(fs::read_dir(&root).unwrap().count(), 3, "scratch directory left behind");
}

#[test]
fn missing_directory_exits_1() {
    let td = tempdir().unwrap();
    let out = fat_sort(&td.path().join("none.xml"))
        .arg(td.path().join("does-not-exist"))
        .output()
        .expect("spawn binary");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("does not exist"), "{stderr}");
}

#[test]
fn file_target_exits_1() {
    let td = tempdir().unwrap();
    let file = td.path().join("song.mp3");
    fs::write(&file, b"x").unwrap();
    let out = fat_sort(&td.path().join("none.xml"))
        .arg(&file)
        .output()
        .expect("spawn binary");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("not a directory"), "{stderr}");
}

#[test]
fn dry_run_moves_nothing() {
    let td = tempdir().unwrap();
    let root = td.path().join("card");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("b"), b"b").unwrap();
    fs::write(root.join("a"), b"a").unwrap();

    let out = fat_sort(&td.path().join("none.xml"))
        .arg(&root)
        .arg("--dry-run")
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Directories processed: 1"), "{stdout}");
    assert_eq!(fs::read_dir(&root).unwrap().count(), 2);
}

#[test]
fn log_file_receives_info_lines() {
    let td = tempdir().unwrap();
    let root = td.path().join("card");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("x"), b"x").unwrap();
    let log = td.path().join("logs/fat_sort.log");

    let out = fat_sort(&td.path().join("none.xml"))
        .arg(&root)
        .arg("-l")
        .arg(&log)
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("Processing directory"), "{text}");
    assert!(text.contains("INFO"), "{text}");
}

#[test]
fn malformed_config_is_an_error() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("config.xml");
    fs::write(&cfg, "<config><settle_ms>soon</settle_ms></config>").unwrap();

    let out = fat_sort(&cfg).arg(td.path()).output().expect("spawn binary");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("config.xml"), "{stderr}");
}

#[test]
fn print_config_shows_env_path() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("custom.xml");
    let out = Command::new(cargo::cargo_bin!("fat_sort"))
        .env("FAT_SORT_CONFIG", &cfg)
        .arg("--print-config")
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("custom.xml"), "{stdout}");
}

#[test]
fn unopenable_log_file_is_only_a_warning() {
    let td = tempdir().unwrap();
    let root = td.path().join("card");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("b"), b"b").unwrap();
    fs::write(root.join("a"), b"a").unwrap();

    // A directory cannot be opened for appending.
    let out = fat_sort(&td.path().join("none.xml"))
        .arg(&root)
        .arg("-l")
        .arg(td.path())
        .output()
        .expect("spawn binary");
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(out.status.code(), Some(0), "stderr: {stderr}");
    assert!(stdout.contains("Directories processed: 1"), "{stdout}");
    assert!(stderr.contains("Could not open log file"), "{stderr}");
    assert_eq!(fs::read_dir(&root).unwrap().count(), 2);
}

#[test]
fn relative_target_is_shown_absolute_with_run_notes() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    fs::create_dir_all(base.join("card")).unwrap();
    fs::write(base.join("card/x"), b"x").unwrap();
    let log = base.join("fat_sort.log");

    let out = fat_sort(&base.join("none.xml"))
        .current_dir(&base)
        .arg("card")
        .arg("-v")
        .arg("-l")
        .arg(&log)
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let banner = format!("FAT Sorter - Sorting directory: {}", base.join("card").display());
    assert!(stdout.contains(&banner), "{stdout}");
    assert!(stdout.contains("Verbose mode enabled"), "{stdout}");
    assert!(stdout.contains(&format!("Logging to: {}", log.display())), "{stdout}");
}
