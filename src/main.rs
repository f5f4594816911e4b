//! tf-set-diff CLI entrypoint.
//!
//! Reads a Terraform plan (file or stdin), analyzes its Set-type attributes
//! and prints a report to stdout. Logs and errors go to stderr.

use std::io::Write;
use std::process::ExitCode;

use colored::Colorize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tf_set_diff::analyzer::{Diagnostics, PlanAnalyzer};
use tf_set_diff::cli::{Cli, OutputFormatter};
use tf_set_diff::config::{SchemaParser, SchemaSource};
use tf_set_diff::error::Result;
use tf_set_diff::plan::{PlanParser, TerraformPlan};

/// Main entrypoint.
fn main() -> ExitCode {
    // Best effort: a missing .env is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    init_logging(cli.quiet, cli.verbose);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initializes the logging system.
fn init_logging(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Runs one analysis and returns the process exit status.
fn run(cli: &Cli) -> Result<u8> {
    let mut diagnostics = Diagnostics::new();

    let (schema, source) =
        SchemaParser::new().discover(cli.attributes.as_deref(), &mut diagnostics)?;
    match &source {
        SchemaSource::File(path) => info!("Using attribute schema: {}", path.display()),
        SchemaSource::Missing(path) => debug!("Schema {} not found, continuing without it", path.display()),
        SchemaSource::Builtin => info!("Using built-in attribute schema"),
    }
    debug!("Schema covers {} resource types", schema.resource_count());

    let plan = load_plan(cli)?;
    let settings = cli.settings();
    let report = PlanAnalyzer::new(&schema, &settings).analyze(&plan, diagnostics);

    let output = OutputFormatter::new(cli.format).format_report(&report)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()?;

    if cli.exit_code {
        Ok(report.summary.exit_code())
    } else {
        Ok(0)
    }
}

/// Reads the plan from the given file, or from stdin when none is given.
fn load_plan(cli: &Cli) -> Result<TerraformPlan> {
    let parser = PlanParser::new();
    match &cli.plan_file {
        Some(path) => {
            debug!("Reading plan from: {}", path.display());
            parser.load_file(path)
        }
        None => {
            debug!("Reading plan from stdin");
            parser.load_reader(std::io::stdin().lock())
        }
    }
}
