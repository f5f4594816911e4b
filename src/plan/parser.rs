//! Plan input loading.
//!
//! Reads `terraform show -json` output from a file, any reader (stdin), or
//! a string. Malformed input is always fatal.

use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{AnalyzerError, PlanError, Result};

use super::types::TerraformPlan;

/// Location label used for plans read from stdin.
const STDIN_LOCATION: &str = "<stdin>";

/// Loader for Terraform plan JSON.
#[derive(Debug, Default)]
pub struct PlanParser;

impl PlanParser {
    /// Creates a new plan parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads a plan from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or not a plan.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<TerraformPlan> {
        let path = path.as_ref();
        info!("Loading plan from: {}", path.display());

        if !path.exists() {
            return Err(AnalyzerError::Plan(PlanError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content, Some(&path.display().to_string()))
    }

    /// Loads a plan from a reader, typically stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails or the content is not a plan.
    pub fn load_reader(&self, mut reader: impl Read) -> Result<TerraformPlan> {
        debug!("Reading plan from stdin");
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.parse_str(&content, Some(STDIN_LOCATION))
    }

    /// Parses a plan from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or does not match the plan
    /// shape (e.g. `resource_changes` is not a list).
    pub fn parse_str(&self, content: &str, location: Option<&str>) -> Result<TerraformPlan> {
        let plan: TerraformPlan = serde_json::from_str(content).map_err(|e| {
            AnalyzerError::Plan(PlanError::parse(
                format!("{e}"),
                location.map(String::from),
            ))
        })?;

        debug!(
            "Parsed plan with {} resource changes (terraform {})",
            plan.resource_changes.len(),
            plan.terraform_version.as_deref().unwrap_or("unknown")
        );
        Ok(plan)
    }
}
