//! Configuration module for the analyzer.
//!
//! This module handles everything the analyzer is told before it looks at
//! a plan:
//! - The Set-type attribute schema and its loader
//! - Run-wide settings (case folding, provider prefix, resource filters)

mod parser;
mod schema;
mod settings;

pub use parser::{DEFAULT_SCHEMA_FILES, SchemaParser, SchemaSource, find_schema_file};
pub use schema::{AttributeDefinition, DefinitionIssue, KEY_MARKER, SchemaNode, SetAttributeSchema};
pub use settings::{AnalyzerSettings, DEFAULT_PROVIDER_PREFIX, ENV_IGNORE_CASE};
