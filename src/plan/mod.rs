//! Terraform plan input.
//!
//! This module models the parts of a `terraform show -json` document the
//! analyzer reads and loads them from files or stdin.

mod parser;
mod types;

pub use parser::PlanParser;
pub use types::{Change, LifecycleAction, ResourceChange, TerraformPlan};
