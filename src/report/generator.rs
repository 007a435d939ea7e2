//! Markdown dashboard and JSON summary generation.
//!
//! This module renders the aggregated results into the Markdown grid shown
//! in the CI job summary and the JSON file consumed by later pipeline steps.

use crate::analysis::Aggregation;
use crate::config::ReportConfig;
use crate::models::{AggregateSummary, RunMetadata, TestStatus};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report(
    aggregation: &Aggregation,
    metadata: &RunMetadata,
    config: &ReportConfig,
) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", config.title));

    output.push_str(&generate_metadata_section(metadata));
    output.push('\n');

    output.push_str(&generate_results_grid(aggregation));
    output.push_str(&generate_statistics_section(&aggregation.summary));
    output.push_str(&generate_passed_section(aggregation, config.max_passed_tests));
    output.push_str(&generate_failed_section(
        aggregation,
        config.max_failed_tests,
        config.error_excerpt_width,
    ));
    output.push_str(&generate_reports_section(metadata, &config.report_artifact));

    output
}

/// Generate the run metadata table.
fn generate_metadata_section(metadata: &RunMetadata) -> String {
    let workflow = linked_code(&metadata.workflow, metadata.run_url());
    let commit = linked_code(&metadata.short_sha(), metadata.commit_url());

    let rows = [
        ("🔗 Workflow", workflow),
        ("📝 Commit", commit),
        ("🌿 Branch", format!("`{}`", metadata.branch)),
        ("👤 Triggered by", format!("`{}`", metadata.actor)),
        ("🕐 Timestamp", format!("`{}`", metadata.formatted_timestamp())),
    ];

    let mut table = String::from("| Metadata | Value |\n|----------|-------|\n");
    for (key, value) in rows {
        table.push_str(&format!("| {} | {} |\n", key, value));
    }
    table
}

fn linked_code(text: &str, url: Option<String>) -> String {
    match url {
        Some(url) => format!("[`{}`]({})", text, url),
        None => format!("`{}`", text),
    }
}

/// Generate the per-project results grid, sorted by project key.
fn generate_results_grid(aggregation: &Aggregation) -> String {
    let mut section = String::new();

    section.push_str("## Test Results Grid\n\n");
    section.push_str(
        "| Browser | Status | Total | ✅ Passed | ❌ Failed | 🔄 Flaky | ⏱️ Duration |\n",
    );
    section.push_str(
        "|---------|--------|-------|-----------|-----------|----------|------------|\n",
    );

    for result in aggregation.sorted_results() {
        section.push_str(&format!(
            "| {} {} | {} | {} | {} | {} | {} | {}s |\n",
            project_icon(&result.project),
            escape_cell(&result.project),
            result.status.badge(),
            result.total,
            result.passed,
            result.failed,
            result.flaky,
            result.duration
        ));
    }

    section.push('\n');
    section
}

/// Generate the summary statistics list.
fn generate_statistics_section(summary: &AggregateSummary) -> String {
    let mut section = String::new();

    section.push_str("## 📈 Test Statistics\n\n");
    section.push_str(&format!(
        "- 🎯 **Success Rate**: {:.1}%\n",
        summary.success_rate()
    ));
    section.push_str(&format!("- 📊 **Total Tests**: {}\n", summary.total));
    section.push_str(&format!("- ⏱️ **Total Duration**: {}s\n", summary.duration));
    section.push_str(&format!("- 🔄 **Flaky Tests**: {}\n", summary.flaky));
    section.push('\n');

    section
}

/// Generate the collapsible list of passed tests.
fn generate_passed_section(aggregation: &Aggregation, limit: usize) -> String {
    let total = aggregation.tests_with_status(TestStatus::Passed).count();
    if total == 0 {
        return String::new();
    }

    let label = if total > limit {
        format!("Show first {} of {}", limit, total)
    } else {
        format!("Show list ({})", total)
    };

    let mut section = String::new();
    section.push_str("## ✅ Passed Tests\n\n");
    section.push_str(&format!("<details><summary>{}</summary>\n\n", label));
    section.push_str("| Test | File |\n");
    section.push_str("|------|------|\n");

    for test in aggregation
        .tests_with_status(TestStatus::Passed)
        .take(limit)
    {
        section.push_str(&format!(
            "| {} | `{}` |\n",
            escape_cell(&test.title),
            escape_cell(test.file_name())
        ));
    }

    section.push_str("\n</details>\n\n");
    section
}

/// Generate the failed tests table with one-line error excerpts.
fn generate_failed_section(aggregation: &Aggregation, limit: usize, width: usize) -> String {
    let mut failed = aggregation
        .tests_with_status(TestStatus::Failed)
        .take(limit)
        .peekable();
    if failed.peek().is_none() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## ❌ Failed Tests\n\n");
    section.push_str("| Test | File | Error |\n");
    section.push_str("|------|------|-------|\n");

    for test in failed {
        section.push_str(&format!(
            "| {} | `{}` | {} |\n",
            escape_cell(&test.title),
            escape_cell(test.file_name()),
            escape_cell(&error_excerpt(test.error.as_deref(), width))
        ));
    }

    section.push('\n');
    section
}

/// Generate the pointer to the full HTML report.
fn generate_reports_section(metadata: &RunMetadata, artifact: &str) -> String {
    let mut section = String::new();

    section.push_str("## 📋 Reports\n\n");
    match metadata.run_url() {
        Some(url) => section.push_str(&format!(
            "- 📊 Download the **{}** artifact from the [workflow run]({}) for the full HTML report\n",
            artifact, url
        )),
        None => section.push_str(&format!(
            "- 📊 Download the **{}** artifact below for the full HTML report\n",
            artifact
        )),
    }
    section.push('\n');

    section
}

/// Returns the icon shown next to a project in the grid.
pub fn project_icon(project: &str) -> &'static str {
    match project.to_lowercase().as_str() {
        "chromium" | "chrome" => "🌐",
        "firefox" => "🦊",
        "webkit" => "🧭",
        "edge" => "📘",
        _ => "🌐",
    }
}

fn ansi_regex() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| {
        Regex::new(r"[\x1b\x{9b}][\[\]()#;?]*(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-ORZcf-nqry=><]")
            .expect("ANSI escape pattern is valid")
    })
}

/// Remove ANSI color and cursor escape sequences.
pub fn strip_ansi(s: &str) -> String {
    ansi_regex().replace_all(s, "").into_owned()
}

/// Reduce an error message to a single line of at most `width` characters.
///
/// `...` is appended only when characters were cut.
pub fn error_excerpt(error: Option<&str>, width: usize) -> String {
    let stripped = strip_ansi(error.unwrap_or("Unknown error"));
    let first_line: String = stripped
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .map(|c| if c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();

    if first_line.chars().count() > width {
        let cut: String = first_line.chars().take(width).collect();
        format!("{}...", cut)
    } else {
        first_line
    }
}

/// Escape characters that would break a Markdown table cell.
fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Generate the machine-readable JSON summary.
pub fn generate_json_summary(aggregation: &Aggregation) -> Result<String> {
    serde_json::to_string_pretty(&aggregation.machine_summary()).map_err(Into::into)
}

/// Write a rendered output file, creating parent directories as needed.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))
}
