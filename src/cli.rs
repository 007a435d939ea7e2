//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// TestGrid - Playwright results dashboard for CI
///
/// Merges the JSON reporter output of every test job found in an
/// artifacts directory and renders a Markdown dashboard plus a JSON
/// summary for the pipeline.
///
/// Examples:
///   testgrid
///   testgrid ./downloaded-artifacts
///   testgrid ./artifacts --output grid.md --summary grid.json
///   testgrid --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the downloaded test result artifacts
    ///
    /// Each artifact is a `test-results-<project>[-<shard>]` or
    /// `playwright-results-<project>[-<shard>]` subdirectory.
    #[arg(value_name = "ARTIFACTS_PATH", default_value = "./artifacts")]
    pub artifacts_path: PathBuf,

    /// Output file path for the Markdown dashboard
    ///
    /// Default: from config or test-results.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output file path for the JSON summary
    ///
    /// Default: from config or test-results-summary.json
    #[arg(short, long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .testgrid.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "TESTGRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not echo the generated Markdown to stdout
    #[arg(long)]
    pub no_print: bool,

    /// Generate a default .testgrid.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let (Some(output), Some(summary)) = (&self.output, &self.summary) {
            if output == summary {
                return Err(format!(
                    "--output and --summary must differ: {}",
                    output.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file; the
    /// command-line flags take precedence over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Args {
            artifacts_path: PathBuf::from("./artifacts"),
            output: None,
            summary: None,
            config: None,
            verbose: false,
            quiet: false,
            no_print: false,
            init_config: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_artifacts_path() {
        let args = Args::try_parse_from(["testgrid"]).unwrap();
        assert_eq!(args.artifacts_path, PathBuf::from("./artifacts"));
        assert!(args.output.is_none());
        assert!(args.summary.is_none());
    }

    #[test]
    fn test_positional_artifacts_path() {
        let args = Args::try_parse_from(["testgrid", "dl", "-o", "grid.md"]).unwrap();
        assert_eq!(args.artifacts_path, PathBuf::from("dl"));
        assert_eq!(args.output, Some(PathBuf::from("grid.md")));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = Args::for_tests();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_same_outputs() {
        let mut args = Args::for_tests();
        args.output = Some(PathBuf::from("out.txt"));
        args.summary = Some(PathBuf::from("out.txt"));
        assert!(args.validate().is_err());

        args.summary = Some(PathBuf::from("out.json"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::for_tests();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = Args::for_tests();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        // --quiet still wins over a verbose config.
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
