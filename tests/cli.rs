//! End-to-end tests for the `testgrid` binary.
#![allow(deprecated)] // cargo_bin is deprecated but still supported by assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CI_VARS: [&str; 7] = [
    "GITHUB_WORKFLOW",
    "GITHUB_SERVER_URL",
    "GITHUB_REPOSITORY",
    "GITHUB_RUN_ID",
    "GITHUB_SHA",
    "GITHUB_REF_NAME",
    "GITHUB_ACTOR",
];

fn fixture_artifacts() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/artifacts")
}

/// A `testgrid` command running in `cwd` with no CI environment.
fn testgrid(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("testgrid").unwrap();
    cmd.current_dir(cwd).env_remove("TESTGRID_CONFIG");
    for var in CI_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn write_artifact(root: &Path, dir: &str, content: &str) {
    let path = root.join(dir);
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("test-results.json"), content).unwrap();
}

fn read_summary(dir: &Path) -> Value {
    let content = fs::read_to_string(dir.join("test-results-summary.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_fixture_artifacts_produce_dashboard() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .arg(fixture_artifacts())
        .assert()
        .success()
        .stdout(predicate::str::contains("Grid generated successfully!"))
        .stdout(predicate::str::contains("# 🎭 Playwright Test Results Dashboard"));

    let markdown = fs::read_to_string(work.path().join("test-results.md")).unwrap();
    assert!(markdown.contains("| 🌐 chromium | ❌ Failed | 3 | 1 | 1 | 1 | 15s |"));
    assert!(markdown.contains("| 🦊 firefox | ✅ Passed | 2 | 2 | 0 | 0 | 3s |"));
    assert!(!markdown.contains("webkit"));
    assert!(markdown.contains("**Success Rate**: 60.0%"));
    assert!(markdown.contains("**Total Duration**: 18s"));
    assert!(markdown.contains("<details><summary>Show list (3)</summary>"));
    assert!(markdown.contains(
        "| should show error for locked out user | `login.test.ts` | Error: expect(locator).toHaveText(expected) |"
    ));
    assert!(markdown.contains("| should logout from the menu | `login.test.ts` | Timeout 5000ms exceeded. |"));
    assert!(!markdown.contains("should sort products by price"));
    assert!(!markdown.contains('\u{1b}'));

    // Passed tests follow discovery order: firefox's directory sorts first.
    let create = markdown.find("should create a booking").unwrap();
    let login = markdown.find("should login with valid credentials").unwrap();
    assert!(create < login);

    let summary = read_summary(work.path());
    assert_eq!(summary["summary"]["total"], 5);
    assert_eq!(summary["summary"]["passed"], 3);
    assert_eq!(summary["summary"]["failed"], 1);
    assert_eq!(summary["summary"]["flaky"], 1);
    assert_eq!(summary["summary"]["duration"], 18);
    assert_eq!(summary["results"].as_array().unwrap().len(), 2);
}

#[test]
fn test_machine_summary_fields() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .arg(fixture_artifacts())
        .arg("--no-print")
        .assert()
        .success();

    let summary = read_summary(work.path());
    for entry in summary["results"].as_array().unwrap() {
        let mut keys: Vec<_> = entry.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["duration", "failed", "flaky", "passed", "project", "status", "total"]
        );
    }
}

#[test]
fn test_missing_artifacts_root_is_fatal() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .arg("does-not-exist")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Artifacts path not found: does-not-exist"));

    assert!(!work.path().join("test-results.md").exists());
    assert!(!work.path().join("test-results-summary.json").exists());
}

#[test]
fn test_default_artifacts_path() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("./artifacts"));

    let artifacts = work.path().join("artifacts");
    write_artifact(
        &artifacts,
        "test-results-edge",
        r#"{ "stats": { "expected": 1, "unexpected": 0, "flaky": 0, "duration": 10 } }"#,
    );

    testgrid(work.path()).assert().success();
    assert_eq!(read_summary(work.path())["results"][0]["project"], "edge");
}

#[test]
fn test_malformed_artifact_does_not_fail_run() {
    let work = TempDir::new().unwrap();
    let artifacts = work.path().join("artifacts");
    write_artifact(
        &artifacts,
        "test-results-chromium",
        r#"{ "stats": { "expected": 4, "unexpected": 0, "flaky": 0, "duration": 2000 } }"#,
    );
    write_artifact(&artifacts, "test-results-firefox", "{ definitely not json");

    testgrid(work.path())
        .arg(&artifacts)
        .arg("--no-print")
        .assert()
        .success();

    let summary = read_summary(work.path());
    assert_eq!(summary["summary"]["total"], 4);
    assert_eq!(summary["results"].as_array().unwrap().len(), 1);
    assert_eq!(summary["results"][0]["project"], "chromium");
}

#[test]
fn test_empty_artifacts_still_writes_outputs() {
    let work = TempDir::new().unwrap();
    let artifacts = work.path().join("artifacts");
    fs::create_dir(&artifacts).unwrap();

    testgrid(work.path())
        .arg(&artifacts)
        .assert()
        .success()
        .stdout(predicate::str::contains("**Success Rate**: 0.0%"));

    let markdown = fs::read_to_string(work.path().join("test-results.md")).unwrap();
    assert!(!markdown.contains("## ✅ Passed Tests"));
    assert!(!markdown.contains("## ❌ Failed Tests"));

    let summary = read_summary(work.path());
    assert_eq!(summary["summary"]["total"], 0);
    assert!(summary["results"].as_array().unwrap().is_empty());
}

#[test]
fn test_custom_output_paths_and_ci_metadata() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .arg(fixture_artifacts())
        .args(["--output", "out/grid.md", "--summary", "out/grid.json", "--no-print"])
        .env("GITHUB_SHA", "9f8e7d6c5b4a")
        .env("GITHUB_REF_NAME", "feature/cart")
        .env("GITHUB_ACTOR", "octocat")
        .assert()
        .success();

    let markdown = fs::read_to_string(work.path().join("out/grid.md")).unwrap();
    assert!(markdown.contains("`9f8e7d6`"));
    assert!(markdown.contains("| 🌿 Branch | `feature/cart` |"));
    assert!(markdown.contains("| 👤 Triggered by | `octocat` |"));
    assert!(markdown.contains("| 🔗 Workflow | `unknown` |"));
    assert!(work.path().join("out/grid.json").exists());
    assert!(!work.path().join("test-results.md").exists());
}

#[test]
fn test_config_file_changes_limits() {
    let work = TempDir::new().unwrap();
    fs::write(
        work.path().join(".testgrid.toml"),
        "[general]\noutput = \"dashboard.md\"\n\n[report]\nmax_passed_tests = 1\n",
    )
    .unwrap();

    testgrid(work.path())
        .arg(fixture_artifacts())
        .arg("--no-print")
        .assert()
        .success();

    let markdown = fs::read_to_string(work.path().join("dashboard.md")).unwrap();
    assert!(markdown.contains("Show first 1 of 3"));
    assert!(markdown.contains("should create a booking"));
    assert!(!markdown.contains("should delete a booking"));
}

#[test]
fn test_init_config() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .arg("--init-config")
        .assert()
        .success();

    let content = fs::read_to_string(work.path().join(".testgrid.toml")).unwrap();
    assert!(content.contains("[artifacts]"));

    testgrid(work.path()).arg("--init-config").assert().code(1);
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .args(["--verbose", "--quiet"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--verbose and --quiet"));
}

#[test]
fn test_config_verbose_enables_debug_logs() {
    let work = TempDir::new().unwrap();

    testgrid(work.path())
        .arg(fixture_artifacts())
        .arg("--no-print")
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring non-artifact directory").not());

    fs::write(
        work.path().join(".testgrid.toml"),
        "[general]\nverbose = true\n",
    )
    .unwrap();

    testgrid(work.path())
        .arg(fixture_artifacts())
        .arg("--no-print")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Ignoring non-artifact directory: playwright-report",
        ));

    testgrid(work.path())
        .arg(fixture_artifacts())
        .args(["--no-print", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring non-artifact directory").not());
}
