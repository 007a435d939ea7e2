//! TestGrid - Playwright results dashboard for CI
//!
//! A CLI tool that merges the JSON reporter output of every test job in a
//! CI artifacts directory and renders a Markdown dashboard plus a JSON
//! summary.
//!
//! Exit codes:
//!   0 - Success (even if some artifacts could not be parsed)
//!   1 - Artifacts directory missing, or any other runtime error

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use models::RunMetadata;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Nothing is written when the artifacts root is missing.
    if !args.artifacts_path.exists() {
        eprintln!(
            "❌ Artifacts path not found: {}",
            args.artifacts_path.display()
        );
        std::process::exit(1);
    }

    // The config decides the default log level, so it is loaded first and
    // its source is logged once the subscriber is up.
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("TestGrid v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run(&args, &config) {
        error!("Summary generation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .testgrid.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize artifact prefixes, output paths, and list limits.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the rendered dashboard.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Aggregate the artifacts and write both output files.
fn run(args: &Args, config: &Config) -> Result<()> {
    println!(
        "🔍 Collecting test results from: {}",
        args.artifacts_path.display()
    );

    let aggregation = analysis::discover_artifacts(&args.artifacts_path, &config.artifacts)?;
    if aggregation.results.is_empty() {
        warn!(
            "No parsable test results found in {}",
            args.artifacts_path.display()
        );
    }

    let metadata = RunMetadata::from_env();
    let markdown = report::generate_markdown_report(&aggregation, &metadata, &config.report);
    let json_summary = report::generate_json_summary(&aggregation)?;

    let output = PathBuf::from(&config.general.output);
    let summary_output = PathBuf::from(&config.general.summary_output);
    report::write_output(&output, &markdown)?;
    report::write_output(&summary_output, &json_summary)?;

    info!("Wrote {}", output.display());
    info!("Wrote {}", summary_output.display());

    println!("✅ Grid generated successfully!");
    println!(
        "   Projects: {} | Tests: {} | Failed: {} | Flaky: {}",
        aggregation.results.len(),
        aggregation.summary.total,
        aggregation.summary.failed,
        aggregation.summary.flaky
    );

    if !args.no_print {
        println!("\nMarkdown Summary:");
        println!("{}", markdown);
    }

    Ok(())
}

/// Where the configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    Default,
    Builtin,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::Default => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // An explicit path must load
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::Default)),
        Ok(None) => Ok((Config::default(), ConfigSource::Builtin)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}
