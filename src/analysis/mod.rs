//! Analysis modules.
//!
//! Artifact discovery and the fold that merges per-job results.

pub mod aggregator;

pub use aggregator::*;
