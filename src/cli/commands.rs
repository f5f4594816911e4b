//! CLI argument definitions.
//!
//! This module defines the command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{AnalyzerSettings, DEFAULT_PROVIDER_PREFIX};

/// Separates order-only noise from real changes in Set-type attributes of a
/// Terraform plan.
#[derive(Parser, Debug)]
#[command(name = "tf-set-diff")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Exit codes (with --exit-code):\n  \
    0 - No changes or order-only changes\n  \
    1 - Actual Set attribute changes, creates or deletes\n  \
    2 - Resource replacement detected\n  \
    3 - Error")]
pub struct Cli {
    /// Path to the plan JSON (`terraform show -json`). Reads stdin if omitted.
    pub plan_file: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    /// Return an exit code based on change severity.
    #[arg(short, long)]
    pub exit_code: bool,

    /// Suppress warnings and log output.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show detailed warnings and debug information.
    #[arg(short, long)]
    pub verbose: bool,

    /// Ignore case when comparing string values.
    #[arg(long)]
    pub ignore_case: bool,

    /// Path to a custom Set attribute schema (JSON or YAML).
    #[arg(long, env = "TF_SET_DIFF_ATTRIBUTES")]
    pub attributes: Option<PathBuf>,

    /// Only analyze resource types containing this pattern (repeatable).
    #[arg(long, value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Skip resource types containing this pattern (repeatable).
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Resource type prefix to analyze.
    #[arg(long, env = "TF_SET_DIFF_PROVIDER_PREFIX", default_value = DEFAULT_PROVIDER_PREFIX)]
    pub provider_prefix: String,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown report for humans and PR comments.
    #[default]
    Markdown,
    /// JSON for scripting.
    Json,
    /// Single line for CI logs.
    Summary,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Builds analyzer settings from the arguments.
    #[must_use]
    pub fn settings(&self) -> AnalyzerSettings {
        AnalyzerSettings::new()
            .with_ignore_case(self.ignore_case)
            .with_provider_prefix(self.provider_prefix.clone())
            .with_include(self.include.clone())
            .with_exclude(self.exclude.clone())
            .apply_env_overrides()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tf-set-diff"]).unwrap();
        assert!(cli.plan_file.is_none());
        assert_eq!(cli.format, OutputFormat::Markdown);
        assert!(!cli.exit_code);
    }

    #[test]
    fn test_full_arguments() {
        let cli = Cli::try_parse_from([
            "tf-set-diff",
            "plan.json",
            "--format",
            "json",
            "-e",
            "--ignore-case",
            "--include",
            "application_gateway",
            "--include",
            "lb",
            "--exclude",
            "lb_rule",
            "--provider-prefix",
            "azurerm_",
        ])
        .unwrap();

        assert_eq!(cli.plan_file, Some(PathBuf::from("plan.json")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.exit_code);

        let settings = cli.settings();
        assert!(settings.ignore_case);
        assert_eq!(settings.include.len(), 2);
        assert!(!settings.governs("azurerm_lb_rule"));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["tf-set-diff", "-q", "-v"]).is_err());
    }
}
