// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # tf-set-diff
//!
//! Separates order-only noise from real changes in Set-type attributes of a
//! Terraform plan.
//!
//! ## Overview
//!
//! Providers such as `azurerm` model many nested blocks as Sets. Terraform
//! compares them positionally, so a plan often reports "changes" that are
//! nothing more than the same elements in a different order. This crate:
//!
//! - Reads the JSON produced by `terraform show -json`
//! - Matches Set elements by a key field (or by content hash) using an
//!   attribute schema
//! - Classifies every finding as order-only or as a real addition, removal
//!   or modification, recursing into nested Sets
//! - Rolls the findings up into a severity that maps onto a CI exit code
//!
//! ## Modules
//!
//! - [`config`]: Attribute schema loading and analyzer settings
//! - [`plan`]: Terraform plan model and parser
//! - [`analyzer`]: Normalization, element keys, Set diffing and aggregation
//! - [`cli`]: Command-line interface and report formatting
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```json
//! {
//!   "resources": {
//!     "azurerm_network_security_group": {
//!       "security_rule": "name"
//!     },
//!     "azurerm_application_gateway": {
//!       "rewrite_rule_set": {
//!         "_key": "name",
//!         "rewrite_rule": "name"
//!       }
//!     }
//!   }
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod plan;

// ============================================================================
// Re-exports
// ============================================================================

pub use analyzer::{AnalysisReport, AnalysisSummary, Diagnostics, PlanAnalyzer, Severity};
pub use cli::{Cli, OutputFormat, OutputFormatter};
pub use config::{AnalyzerSettings, SchemaParser, SetAttributeSchema};
pub use error::{AnalyzerError, Result};
pub use plan::{PlanParser, TerraformPlan};
