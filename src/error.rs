//! Error types for the Set-type diff analyzer.
//!
//! Only conditions that abort a run live here: unreadable or malformed plan
//! input and malformed schema files. Degraded conditions (missing schema,
//! duplicate element keys, sensitive values) are reported as warnings by
//! [`crate::analyzer::Diagnostics`] and never surface as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status reported for any fatal error.
pub const EXIT_ERROR: u8 = 3;

/// The main error type for the analyzer.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Plan input errors.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Attribute schema errors.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while reading the Terraform plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file was not found.
    #[error("Plan file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The plan could not be parsed.
    #[error("Invalid plan JSON: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Where the plan came from (file path or stdin).
        location: Option<String>,
    },
}

/// Errors raised while loading the attribute schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file could not be parsed.
    #[error("Failed to parse attribute schema: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// The schema parsed but does not have the expected top-level shape.
    #[error("Malformed attribute schema: {message}")]
    Malformed {
        /// Description of the shape problem.
        message: String,
    },
}

/// Result type alias for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

impl AnalyzerError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the process exit status for this error.
    ///
    /// Every error is fatal for the run, so they all share one status.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        EXIT_ERROR
    }
}

impl PlanError {
    /// Creates a parse error with an optional location.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }
}

impl SchemaError {
    /// Creates a malformed-shape error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}
