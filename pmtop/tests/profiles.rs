//! Tests for profile load/save and resolution logic (non-interactive paths
//! only). Each test isolates its config dir via XDG_CONFIG_HOME.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

fn run_pmtop(config_home: &Path, args: &[&str]) {
    Command::new(env!("CARGO_BIN_EXE_pmtop"))
        .env("XDG_CONFIG_HOME", config_home)
        .args(args)
        .assert()
        .success();
}

fn profiles_path(config_home: &Path) -> PathBuf {
    config_home.join("pmtop").join("profiles.json")
}

#[test]
fn test_profile_created_on_first_use() {
    let td = tempfile::tempdir().unwrap();
    run_pmtop(
        td.path(),
        &["--profile", "unittest", "http://example:1", "--dry-run"],
    );
    let data = fs::read_to_string(profiles_path(td.path())).expect("profiles.json created");
    assert!(
        data.contains("unittest") && data.contains("http://example:1"),
        "profiles.json missing profile entry: {data}"
    );
}

#[test]
fn test_profile_overwrite_only_when_changed() {
    let td = tempfile::tempdir().unwrap();
    run_pmtop(
        td.path(),
        &["--profile", "prod", "http://one:1", "--dry-run"],
    );
    let first = fs::read_to_string(profiles_path(td.path())).unwrap();

    // Re-run identical (should not duplicate or corrupt)
    run_pmtop(
        td.path(),
        &["--profile", "prod", "http://one:1", "--dry-run"],
    );
    let second = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert_eq!(first, second, "Profile file changed despite identical input");

    // Overwrite with a different base using --save (no prompt path)
    run_pmtop(
        td.path(),
        &["--profile", "prod", "--save", "http://two:2", "--dry-run"],
    );
    let third = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(third.contains("two"), "Updated base not written: {third}");
}

#[test]
fn test_profile_not_overwritten_without_confirmation() {
    let td = tempfile::tempdir().unwrap();
    run_pmtop(
        td.path(),
        &["--profile", "prod", "http://one:1", "--dry-run"],
    );
    // Changed base without --save: stdin is empty, so the prompt reads as "no"
    run_pmtop(
        td.path(),
        &["--profile", "prod", "http://two:2", "--dry-run"],
    );
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(
        data.contains("one") && !data.contains("two"),
        "profile was overwritten without confirmation: {data}"
    );
}

#[test]
fn test_profile_token_persisted() {
    let td = tempfile::tempdir().unwrap();
    run_pmtop(
        td.path(),
        &[
            "--profile",
            "secured",
            "--token",
            "sekret-token",
            "http://host:9",
            "--dry-run",
        ],
    );
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(data.contains("secured"));
    assert!(data.contains("sekret-token"));
}

#[test]
fn test_loaded_profile_supplies_the_base() {
    let td = tempfile::tempdir().unwrap();
    run_pmtop(
        td.path(),
        &["--profile", "dev", "http://devhost:7", "--dry-run"],
    );
    // Second run names only the profile; resolution must load the saved base
    let output = Command::new(env!("CARGO_BIN_EXE_pmtop"))
        .env("XDG_CONFIG_HOME", td.path())
        .args(["--profile", "dev", "--dry-run"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        text.contains("http://devhost:7"),
        "loaded profile base missing from output: {text}"
    );
}
