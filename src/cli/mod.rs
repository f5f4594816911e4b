//! CLI module for the Set-type diff analyzer.
//!
//! This module provides the command-line arguments and the report
//! renderers.

mod commands;
mod output;

pub use commands::{Cli, OutputFormat};
pub use output::OutputFormatter;
