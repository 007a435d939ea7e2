//! Data models for the test results aggregator.
//!
//! This module contains the raw shapes deserialized from Playwright's JSON
//! reporter output and the derived structures used for rendering the
//! dashboard and the machine-readable summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used whenever a piece of run metadata is unavailable.
pub const UNKNOWN: &str = "unknown";

// ---------------------------------------------------------------------------
// Raw reporter output
// ---------------------------------------------------------------------------

/// Top-level structure of a `test-results.json` file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRunResult {
    /// Aggregate counters. Required: a file without them is rejected.
    pub stats: RawStats,
    /// Root suites (usually one per test file).
    #[serde(default)]
    pub suites: Vec<RawSuite>,
}

/// Aggregate counters reported for a single run.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStats {
    /// Tests that behaved as expected (passed).
    pub expected: u64,
    /// Tests that did not behave as expected (failed).
    pub unexpected: u64,
    /// Tests that passed only after a retry.
    pub flaky: u64,
    /// Wall-clock duration in milliseconds.
    pub duration: f64,
}

/// A suite node. Suites nest arbitrarily.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSuite {
    #[serde(default)]
    pub specs: Vec<RawSpec>,
    #[serde(default)]
    pub suites: Vec<RawSuite>,
}

/// A single test case definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub tests: Vec<RawTest>,
}

/// One test of a spec (one per project the spec ran in).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTest {
    #[serde(default)]
    pub results: Vec<RawAttempt>,
}

/// One execution attempt of a test.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAttempt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub error: Option<RawError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawError {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Derived results
// ---------------------------------------------------------------------------

/// Outcome of a single test, taken from its first execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    Unknown,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Skipped => write!(f, "skipped"),
            TestStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<&str> for TestStatus {
    fn from(s: &str) -> Self {
        match s {
            "passed" => TestStatus::Passed,
            "failed" => TestStatus::Failed,
            "skipped" => TestStatus::Skipped,
            _ => TestStatus::Unknown,
        }
    }
}

/// Overall status of a project run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Passed => write!(f, "passed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl RunStatus {
    /// Returns the badge shown in the results grid.
    pub fn badge(&self) -> &'static str {
        match self {
            RunStatus::Passed => "✅ Passed",
            RunStatus::Failed => "❌ Failed",
        }
    }
}

/// A single test extracted from the suite tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub title: String,
    pub file: String,
    pub status: TestStatus,
    /// Duration of the first attempt in milliseconds.
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestOutcome {
    /// Returns the final path component of the test's file.
    pub fn file_name(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

/// Results of one artifact (one CI job or shard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResult {
    /// Grouping key extracted from the artifact directory name.
    pub project: String,
    /// passed + failed + flaky. Skipped tests are not counted.
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub flaky: u64,
    /// Duration in whole seconds.
    pub duration: u64,
    pub status: RunStatus,
    pub tests: Vec<TestOutcome>,
}

impl ProjectResult {
    /// Iterates over the tests of this project with the given status.
    pub fn tests_with_status(&self, status: TestStatus) -> impl Iterator<Item = &TestOutcome> {
        self.tests.iter().filter(move |t| t.status == status)
    }
}

/// Running totals across every parsed artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub flaky: u64,
    /// Sum of per-project durations in seconds.
    pub duration: u64,
}

impl AggregateSummary {
    /// Returns a copy of this summary with `result`'s counters added, or
    /// `None` if any running total would overflow.
    pub fn checked_add(self, result: &ProjectResult) -> Option<Self> {
        Some(Self {
            total: self.total.checked_add(result.total)?,
            passed: self.passed.checked_add(result.passed)?,
            failed: self.failed.checked_add(result.failed)?,
            flaky: self.flaky.checked_add(result.flaky)?,
            duration: self.duration.checked_add(result.duration)?,
        })
    }

    /// Percentage of passed tests, with the total floored at 1.
    pub fn success_rate(&self) -> f64 {
        let total = self.total.max(1);
        (self.passed as f64 / total as f64) * 100.0
    }
}

/// Per-project entry of the machine-readable summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project: String,
    pub status: RunStatus,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub flaky: u64,
    pub duration: u64,
}

impl From<&ProjectResult> for ProjectSummary {
    fn from(r: &ProjectResult) -> Self {
        Self {
            project: r.project.clone(),
            status: r.status,
            total: r.total,
            passed: r.passed,
            failed: r.failed,
            flaky: r.flaky,
            duration: r.duration,
        }
    }
}

/// The machine-readable summary written next to the Markdown dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSummary {
    pub summary: AggregateSummary,
    pub results: Vec<ProjectSummary>,
}

// ---------------------------------------------------------------------------
// Run metadata
// ---------------------------------------------------------------------------

/// Identification of the CI run that produced the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub workflow: String,
    pub server_url: String,
    pub repository: String,
    pub run_id: String,
    pub sha: String,
    pub branch: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

impl RunMetadata {
    /// Build metadata from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), Utc::now())
    }

    /// Build metadata from an arbitrary variable lookup.
    ///
    /// Absent or empty values become [`UNKNOWN`].
    pub fn from_lookup<F>(lookup: F, timestamp: DateTime<Utc>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };

        Self {
            workflow: get("GITHUB_WORKFLOW"),
            server_url: get("GITHUB_SERVER_URL"),
            repository: get("GITHUB_REPOSITORY"),
            run_id: get("GITHUB_RUN_ID"),
            sha: get("GITHUB_SHA"),
            branch: get("GITHUB_REF_NAME"),
            actor: get("GITHUB_ACTOR"),
            timestamp,
        }
    }

    /// Commit SHA truncated to 7 characters.
    pub fn short_sha(&self) -> String {
        self.sha.chars().take(7).collect()
    }

    /// Link to the workflow run, if every part of it is known.
    pub fn run_url(&self) -> Option<String> {
        if self.repo_known() && self.run_id != UNKNOWN {
            Some(format!(
                "{}/{}/actions/runs/{}",
                self.server_url, self.repository, self.run_id
            ))
        } else {
            None
        }
    }

    /// Link to the commit, if every part of it is known.
    pub fn commit_url(&self) -> Option<String> {
        if self.repo_known() && self.sha != UNKNOWN {
            Some(format!(
                "{}/{}/commit/{}",
                self.server_url, self.repository, self.sha
            ))
        } else {
            None
        }
    }

    /// Timestamp formatted to whole seconds.
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    fn repo_known(&self) -> bool {
        self.server_url != UNKNOWN && self.repository != UNKNOWN
    }
}
