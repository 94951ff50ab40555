//! End-to-end tests for the `docbuilder build` command.
//!
//! These tests run the binary against real checkouts in a temporary directory
//! and inspect the written pages, state file and build report.

mod common;
use common::prelude::*;

use std::fs;

fn report(fixture: &TestFixture) -> serde_json::Value {
    let content = fs::read_to_string(fixture.path().join("site/build-report.json"))
        .expect("report should exist");
    serde_json::from_str(&content).expect("report should be JSON")
}

#[test]
fn test_build_help() {
    let mut cmd = cargo_bin_cmd!("docbuilder");
    cmd.arg("build")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_build_single_repository() {
    let fixture = TestFixture::new()
        .with_doc("api", "index.md", "# API Reference\n\nWelcome.\n")
        .with_doc("api", "guide/setup.md", "Install it.\n")
        .with_config(configs::SINGLE_REPO);

    fixture
        .command()
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 2 documents"))
        .stdout(predicate::str::contains("first generation"));

    // Single-repository builds keep the relative path as the logical path.
    fixture
        .child("site/content/index.md")
        .assert(predicate::str::contains("title: API Reference"));
    fixture
        .child("site/content/guide/setup.md")
        .assert(predicate::str::contains("title: Setup"))
        .assert(predicate::str::ends_with("Install it.\n"));
    fixture
        .child("state/docbuilder.json")
        .assert(predicate::path::exists());

    let report = report(&fixture);
    assert_eq!(report["status"], "success");
    assert_eq!(report["documents"], 2);
    assert_eq!(report["doc_files_hash"].as_str().unwrap().len(), 64);
}

#[test]
fn test_build_multi_repository_prefixes_paths() {
    let fixture = TestFixture::new()
        .with_doc("api", "index.md", "# API\n")
        .with_doc("guides", "index.md", "---\nlayout: landing\n---\n# Guides\n")
        .with_config(configs::TWO_REPOS);

    fixture.command().arg("build").assert().success();

    fixture
        .child("site/content/api/index.md")
        .assert(predicate::str::contains("https://github.com/acme/api/edit/main/docs/index.md"))
        .assert(predicate::str::contains("- backend"))
        .assert(predicate::str::contains("layout: docs"));
    fixture
        .child("site/content/guides/index.md")
        .assert(predicate::str::contains("layout: landing"))
        .assert(predicate::str::contains("repository: guides"));
}

#[test]
fn test_rebuild_without_changes_skips_render() {
    let fixture = TestFixture::new()
        .with_doc("api", "index.md", "# API\n")
        .with_config(configs::SINGLE_REPO);

    fixture.command().arg("build").assert().success();
    fixture
        .command()
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"))
        .stdout(predicate::str::contains("No changes to render"));

    let report = report(&fixture);
    assert_eq!(report["rendered"], false);
    assert_eq!(report["first_generation"], false);
}

#[test]
fn test_rebuild_after_new_file_renders() {
    let fixture = TestFixture::new()
        .with_doc("api", "index.md", "# API\n")
        .with_config(configs::SINGLE_REPO);

    fixture.command().arg("build").assert().success();
    fixture.add_doc("api", "changelog.md", "# Changelog\n");
    fixture.command().arg("build").assert().success();

    let report = report(&fixture);
    assert_eq!(report["changed"], true);
    assert_eq!(report["rendered"], true);
    fixture
        .child("site/content/changelog.md")
        .assert(predicate::path::exists());
}

#[test]
fn test_force_renders_content_only_edits() {
    let fixture = TestFixture::new()
        .with_doc("api", "index.md", "# API\n")
        .with_config(configs::SINGLE_REPO);

    fixture.command().arg("build").assert().success();
    fixture.add_doc("api", "index.md", "# API v2\n");

    fixture.command().arg("build").assert().success();
    fixture
        .child("site/content/index.md")
        .assert(predicate::str::contains("title: API\n"));

    fixture.command().arg("build").arg("--force").assert().success();
    fixture
        .child("site/content/index.md")
        .assert(predicate::str::contains("title: API v2"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let fixture = TestFixture::new()
        .with_doc("api", "index.md", "# API\n")
        .with_config(configs::SINGLE_REPO);

    fixture
        .command()
        .arg("build")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"));

    fixture.child("site").assert(predicate::path::missing());
    fixture.child("state").assert(predicate::path::missing());
}

#[test]
fn test_quiet_build_prints_nothing() {
    let fixture = TestFixture::new()
        .with_doc("api", "index.md", "# API\n")
        .with_config(configs::SINGLE_REPO);

    fixture
        .command()
        .arg("--log-level")
        .arg("off")
        .arg("build")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_front_matter_warns_but_succeeds() {
    let fixture = TestFixture::new()
        .with_doc("api", "broken.md", "---\ntitle: [oops\n---\nBody\n")
        .with_config(configs::SINGLE_REPO);

    fixture
        .command()
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("[WARN]"));

    let report = report(&fixture);
    assert_eq!(report["status"], "success");
    assert_eq!(report["warnings"].as_array().unwrap().len(), 1);
    fixture
        .child("site/content/broken.md")
        .assert(predicate::str::contains("title: Broken"));
}

#[test]
fn test_missing_checkout_fails_and_reports() {
    let fixture = TestFixture::new().with_config(configs::SINGLE_REPO);

    fixture
        .command()
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("discover"));

    let report = report(&fixture);
    assert_eq!(report["status"], "failed");
    assert!(report["error"].as_str().unwrap().contains("discover"));
}
