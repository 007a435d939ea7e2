//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.testgrid.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".testgrid.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Artifact discovery settings.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Markdown dashboard output path.
    #[serde(default = "default_output")]
    pub output: String,

    /// JSON summary output path.
    #[serde(default = "default_summary_output")]
    pub summary_output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            summary_output: default_summary_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "test-results.md".to_string()
}

fn default_summary_output() -> String {
    "test-results-summary.json".to_string()
}

/// Artifact discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory name prefixes that mark a result artifact.
    /// Earlier prefixes win when extracting the project key.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,

    /// Name of the JSON reporter file inside each artifact directory.
    #[serde(default = "default_result_file")]
    pub result_file: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            result_file: default_result_file(),
        }
    }
}

fn default_prefixes() -> Vec<String> {
    vec!["test-results-", "playwright-results-"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_result_file() -> String {
    "test-results.json".to_string()
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Dashboard heading.
    #[serde(default = "default_title")]
    pub title: String,

    /// Maximum rows in the passed tests list.
    #[serde(default = "default_max_passed")]
    pub max_passed_tests: usize,

    /// Maximum rows in the failed tests table.
    #[serde(default = "default_max_failed")]
    pub max_failed_tests: usize,

    /// Maximum characters of an error excerpt before it is cut.
    #[serde(default = "default_excerpt_width")]
    pub error_excerpt_width: usize,

    /// Name of the uploaded HTML report artifact.
    #[serde(default = "default_report_artifact")]
    pub report_artifact: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            max_passed_tests: default_max_passed(),
            max_failed_tests: default_max_failed(),
            error_excerpt_width: default_excerpt_width(),
            report_artifact: default_report_artifact(),
        }
    }
}

fn default_title() -> String {
    "🎭 Playwright Test Results Dashboard".to_string()
}

fn default_max_passed() -> usize {
    100
}

fn default_max_failed() -> usize {
    10
}

fn default_excerpt_width() -> usize {
    100
}

fn default_report_artifact() -> String {
    "playwright-report".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<()> {
        if self.artifacts.prefixes.is_empty() {
            bail!("artifacts.prefixes must contain at least one prefix");
        }
        if self.artifacts.prefixes.iter().any(|p| p.is_empty()) {
            bail!("artifacts.prefixes must not contain an empty prefix");
        }
        if self.artifacts.result_file.trim().is_empty() {
            bail!("artifacts.result_file must not be empty");
        }
        if self.report.max_passed_tests == 0 || self.report.max_failed_tests == 0 {
            bail!("report list limits must be at least 1");
        }
        if self.report.error_excerpt_width == 0 {
            bail!("report.error_excerpt_width must be at least 1");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }
        if let Some(ref summary) = args.summary {
            self.general.summary_output = summary.to_string_lossy().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
