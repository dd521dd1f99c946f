use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// A target directory with a few files and an empty config next to it.
fn setup_test_directory() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let target = dir.path().join("Downloads");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("a.pdf"), "pdf").unwrap();
    fs::write(target.join("b.png"), "png").unwrap();
    fs::write(target.join("c.unknownext"), "???").unwrap();

    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();

    (dir, target, config)
}

fn orgdir() -> Command {
    let mut cmd = Command::cargo_bin("orgdir").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_dry_run_previews_without_moving() {
    let (_dir, target, config) = setup_test_directory();

    orgdir()
        .arg("--path")
        .arg(&target)
        .arg("--config")
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry Run - Preview for: Downloads"))
        .stdout(predicate::str::contains("Would organize"))
        .stdout(predicate::str::contains("No files were modified."));

    assert!(target.join("a.pdf").exists());
    assert!(!target.join("Documents").exists());
}

#[test]
fn test_yes_organizes_files() {
    let (_dir, target, config) = setup_test_directory();

    orgdir()
        .arg("-p")
        .arg(&target)
        .arg("-c")
        .arg(&config)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Organized"));

    assert!(target.join("Documents/a.pdf").exists());
    assert!(target.join("Images/b.png").exists());
    assert!(target.join("Other/c.unknownext").exists());
}

#[test]
fn test_declined_confirmation_cancels() {
    let (_dir, target, config) = setup_test_directory();

    orgdir()
        .arg("-p")
        .arg(&target)
        .arg("-c")
        .arg(&config)
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Operation cancelled."));

    assert!(target.join("a.pdf").exists());
}

#[test]
fn test_empty_directory_reports_nothing_to_do() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();
    let target = dir.path().join("empty");
    fs::create_dir(&target).unwrap();

    orgdir()
        .arg("-p")
        .arg(&target)
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to organize in 'empty'."));
}

#[test]
fn test_missing_directory_fails() {
    let (dir, _target, config) = setup_test_directory();

    orgdir()
        .arg("-p")
        .arg(dir.path().join("does-not-exist"))
        .arg("-c")
        .arg(&config)
        .arg("--yes")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_config_fails() {
    let (_dir, target, config) = setup_test_directory();
    fs::write(&config, "{ not json").unwrap();

    orgdir()
        .arg("-p")
        .arg(&target)
        .arg("-c")
        .arg(&config)
        .arg("--yes")
        .assert()
        .failure();

    assert!(target.join("a.pdf").exists());
}

#[test]
fn test_config_path_from_env() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("custom.json");

    orgdir()
        .env("ORGDIR_CONFIG", &config)
        .arg("--config-path")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file:"))
        .stdout(predicate::str::contains("custom.json"))
        .stdout(predicate::str::contains("does not exist"));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    orgdir().arg("-q").arg("-v").assert().failure();
}

#[test]
fn test_dry_run_lists_files_left_in_place() {
    let (_dir, target, config) = setup_test_directory();
    fs::write(target.join(".hidden.txt"), "h").unwrap();
    fs::write(target.join("Thumbs.db"), "t").unwrap();

    orgdir()
        .arg("-p")
        .arg(&target)
        .arg("-c")
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Left in place (2):"))
        .stdout(predicate::str::contains(".hidden.txt (hidden)"))
        .stdout(predicate::str::contains("Thumbs.db (excluded by filter)"));
}

#[test]
fn test_quiet_help_describes_logging() {
    orgdir()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Only log errors"));
}
