//! Artifact discovery and result aggregation.
//!
//! This module walks an artifacts directory, parses every Playwright JSON
//! report it finds and folds them into a single [`Aggregation`].

use crate::config::ArtifactsConfig;
use crate::error::ArtifactError;
use crate::models::{
    AggregateSummary, MachineSummary, ProjectResult, ProjectSummary, RawRunResult, RawSpec,
    RawSuite, RunStatus, TestOutcome, TestStatus, UNKNOWN,
};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Parsed results of every artifact plus their running totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Project results in discovery order.
    pub results: Vec<ProjectResult>,
    pub summary: AggregateSummary,
}

impl Aggregation {
    /// Fold one project result into the aggregation.
    ///
    /// A result that would overflow the running totals is logged and left
    /// out, so `total == passed + failed + flaky` keeps holding.
    pub fn fold(self, result: ProjectResult) -> Self {
        let Some(summary) = self.summary.checked_add(&result) else {
            warn!(
                "Skipping project {}: running totals would overflow",
                result.project
            );
            return self;
        };

        let mut results = self.results;
        results.push(result);
        Self { results, summary }
    }

    /// All tests with `status`, in discovery order.
    pub fn tests_with_status(&self, status: TestStatus) -> impl Iterator<Item = &TestOutcome> {
        self.results
            .iter()
            .flat_map(move |r| r.tests_with_status(status))
    }

    /// Project results sorted by project key. Ties keep discovery order.
    pub fn sorted_results(&self) -> Vec<&ProjectResult> {
        let mut sorted: Vec<&ProjectResult> = self.results.iter().collect();
        sorted.sort_by(|a, b| a.project.cmp(&b.project));
        sorted
    }

    /// Reduced projection for the machine-readable summary.
    pub fn machine_summary(&self) -> MachineSummary {
        MachineSummary {
            summary: self.summary,
            results: self.results.iter().map(ProjectSummary::from).collect(),
        }
    }
}

/// Recognizes artifact directories and extracts their project key.
#[derive(Debug, Clone)]
pub struct ProjectKeyMatcher {
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl ProjectKeyMatcher {
    /// Build a matcher for the given prefixes. Earlier prefixes take precedence.
    pub fn new(prefixes: &[String]) -> Result<Self> {
        let patterns = prefixes
            .iter()
            .map(|prefix| {
                let pattern = format!(r"^{}(\w+)-?(\d+)?", regex::escape(prefix));
                Regex::new(&pattern)
                    .with_context(|| format!("Invalid artifact prefix: {}", prefix))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            prefixes: prefixes.to_vec(),
            patterns,
        })
    }

    /// Whether a directory name looks like a result artifact.
    pub fn is_candidate(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Extract the project key from a directory name.
    ///
    /// `test-results-chromium-2` yields `chromium`. Names matching no
    /// pattern yield `unknown`.
    pub fn project_key(&self, name: &str) -> String {
        self.patterns
            .iter()
            .find_map(|re| re.captures(name))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Discover and parse every artifact under `root`.
///
/// Per-artifact failures are logged and skipped; they never abort the run.
pub fn discover_artifacts(root: &Path, config: &ArtifactsConfig) -> Result<Aggregation> {
    let matcher = ProjectKeyMatcher::new(&config.prefixes)?;

    let aggregation = list_candidates(root, &matcher)
        .into_iter()
        .filter_map(|(name, dir)| load_artifact(&name, &dir, &matcher, &config.result_file))
        .fold(Aggregation::default(), Aggregation::fold);

    info!(
        "Aggregated {} artifact(s): {} tests, {} failed",
        aggregation.results.len(),
        aggregation.summary.total,
        aggregation.summary.failed
    );

    Ok(aggregation)
}

/// List matching subdirectories of `root`, sorted by name.
fn list_candidates(root: &Path, matcher: &ProjectKeyMatcher) -> Vec<(String, PathBuf)> {
    let mut candidates = Vec::new();

    if root.exists() && !root.is_dir() {
        warn!(
            "{}",
            ArtifactError::NotADirectory {
                path: root.to_path_buf()
            }
        );
        return candidates;
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(source) => {
                let path = source.path().unwrap_or(root).to_path_buf();
                warn!("{}", ArtifactError::List { path, source });
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if matcher.is_candidate(&name) {
            candidates.push((name, entry.into_path()));
        } else {
            debug!("Ignoring non-artifact directory: {}", name);
        }
    }

    candidates
}

/// Parse one artifact directory, logging instead of failing.
fn load_artifact(
    name: &str,
    dir: &Path,
    matcher: &ProjectKeyMatcher,
    result_file: &str,
) -> Option<ProjectResult> {
    let json_file = dir.join(result_file);
    if !json_file.is_file() {
        debug!("No {} in {}, skipping", result_file, dir.display());
        return None;
    }

    match parse_result_file(&json_file, matcher.project_key(name)) {
        Ok(result) => {
            debug!(
                "Parsed {}: {} tests ({} failed)",
                json_file.display(),
                result.total,
                result.failed
            );
            Some(result)
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Read and parse a single reporter file.
pub fn parse_result_file(path: &Path, project: String) -> Result<ProjectResult, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: RawRunResult =
        serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    project_result(project, &raw).ok_or_else(|| ArtifactError::CounterOverflow {
        path: path.to_path_buf(),
        expected: raw.stats.expected,
        unexpected: raw.stats.unexpected,
        flaky: raw.stats.flaky,
    })
}

/// Derive a [`ProjectResult`] from raw reporter output.
///
/// Returns `None` when the counters cannot be summed without overflowing.
pub fn project_result(project: String, raw: &RawRunResult) -> Option<ProjectResult> {
    let stats = &raw.stats;
    let total = stats
        .expected
        .checked_add(stats.unexpected)?
        .checked_add(stats.flaky)?;

    Some(ProjectResult {
        project,
        total,
        passed: stats.expected,
        failed: stats.unexpected,
        flaky: stats.flaky,
        duration: (stats.duration.max(0.0) / 1000.0).round() as u64,
        status: if stats.unexpected > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        },
        tests: extract_tests(&raw.suites),
    })
}

/// Flatten the suite tree depth-first: a suite's specs come before its
/// child suites.
pub fn extract_tests(suites: &[RawSuite]) -> Vec<TestOutcome> {
    let mut tests = Vec::new();
    let mut pending: Vec<&RawSuite> = suites.iter().rev().collect();

    while let Some(suite) = pending.pop() {
        tests.extend(suite.specs.iter().map(test_outcome));
        pending.extend(suite.suites.iter().rev());
    }

    tests
}

/// Summarize a spec from its first execution attempt.
fn test_outcome(spec: &RawSpec) -> TestOutcome {
    let attempt = spec.tests.first().and_then(|t| t.results.first());

    let status = match attempt {
        None => TestStatus::Skipped,
        Some(a) => a
            .status
            .as_deref()
            .map(TestStatus::from)
            .unwrap_or(TestStatus::Unknown),
    };

    TestOutcome {
        title: spec.title.clone(),
        file: spec.file.clone(),
        status,
        duration: attempt.and_then(|a| a.duration).unwrap_or(0.0),
        error: attempt
            .and_then(|a| a.error.as_ref())
            .and_then(|e| e.message.clone())
            .filter(|m| !m.is_empty()),
    }
}
