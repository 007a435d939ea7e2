//! Report rendering.

pub mod generator;

pub use generator::{generate_json_summary, generate_markdown_report, write_output};
