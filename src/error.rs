//! Per-artifact error types.
//!
//! None of these abort a run: they are logged and the offending artifact is
//! left out of the summary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifacts root could not be enumerated.
    #[error("Failed to list artifacts in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The artifacts root exists but is not a directory.
    #[error("Artifacts path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A result file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A result file is not valid JSON or lacks required fields.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Counters whose sum does not fit in a `u64`.
    #[error("Counters in {path} overflow: expected={expected} unexpected={unexpected} flaky={flaky}")]
    CounterOverflow {
        path: PathBuf,
        expected: u64,
        unexpected: u64,
        flaky: u64,
    },
}
