//! CLI tests for the sitebuilder binary
//!
//! Each test isolates configuration by pointing HOME and the working
//! directory at a temporary directory and selecting paths through
//! `SITEBUILDER_*` variables.

mod common;

use std::path::Path;

use assert_cmd::Command;
use common::{create_site_project, PACKAGE_JSON_PLAIN, SITE_CONFIG};
use predicates::prelude::*;
use tempfile::TempDir;

fn sitebuilder(home: &Path, clone_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sitebuilder").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .env("SITEBUILDER_PATHS__CLONE_DIR", clone_dir)
        .env("SITEBUILDER_PATHS__WORKING_DIR", home);
    cmd
}

const SITE_FLAGS: [&str; 6] = ["--branch", "main", "--owner", "18F", "--repository", "site"];

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();

    sitebuilder(home.path(), home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("headers"));
}

#[test]
fn test_build_static_moves_site() {
    let home = TempDir::new().unwrap();
    let (_clone, clone_dir) = create_site_project(&[
        ("index.html", "<html></html>"),
        (".git/HEAD", "ref: refs/heads/main"),
    ]);

    sitebuilder(home.path(), &clone_dir)
        .args(["build", "static"])
        .args(SITE_FLAGS)
        .assert()
        .success()
        .stdout(predicate::str::contains("static build of 18F/site"));

    assert!(clone_dir.join("_site").join("index.html").is_file());
    assert!(!clone_dir.join(".git").exists());
}

#[test]
fn test_build_static_into_existing_output_fails() {
    let home = TempDir::new().unwrap();
    let (_clone, clone_dir) = create_site_project(&[
        ("index.html", "<html></html>"),
        ("_site/old.html", "old"),
    ]);

    sitebuilder(home.path(), &clone_dir)
        .args(["build", "static"])
        .args(SITE_FLAGS)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    assert!(clone_dir.join("index.html").is_file());
}

#[test]
fn test_build_script_without_manifest_succeeds() {
    let home = TempDir::new().unwrap();
    let (_clone, clone_dir) = create_site_project(&[("index.html", "<html></html>")]);

    sitebuilder(home.path(), &clone_dir)
        .args(["build", "script"])
        .args(SITE_FLAGS)
        .assert()
        .success()
        .stdout(predicate::str::contains("script build of 18F/site"));

    assert!(clone_dir.join("index.html").is_file());
    assert!(!clone_dir.join("_site").exists());
}

#[test]
fn test_detect_json() {
    let home = TempDir::new().unwrap();
    let (_clone, clone_dir) = create_site_project(&[
        ("package.json", PACKAGE_JSON_PLAIN),
        (".nvmrc", "v8.11.1\n"),
    ]);

    sitebuilder(home.path(), &clone_dir)
        .args(["detect", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"node_version\": \"v8.11.1\""))
        .stdout(predicate::str::contains("\"has_custom_script\": false"));
}

#[test]
fn test_detect_missing_directory_fails() {
    let home = TempDir::new().unwrap();

    sitebuilder(home.path(), &home.path().join("missing"))
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_headers_json() {
    let home = TempDir::new().unwrap();
    let (_clone, clone_dir) = create_site_project(&[("federalist.json", SITE_CONFIG)]);

    sitebuilder(home.path(), &clone_dir)
        .args(["headers", "--path", "/index.html", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cache-control\": \"no-cache\""));

    sitebuilder(home.path(), &clone_dir)
        .args(["headers", "--path", "/app.js", "--format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache-control: max-age=60"));
}

#[test]
fn test_config_reflects_environment() {
    let home = TempDir::new().unwrap();
    let clone_dir = home.path().join("repo");

    sitebuilder(home.path(), &clone_dir)
        .env("SITEBUILDER_HUGO__DEFAULT_VERSION", "0.55")
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_version\": \"0.55\""))
        .stdout(predicate::str::contains("repo"));
}
