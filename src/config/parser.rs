//! Attribute schema loader.
//!
//! Finds the schema file, reads it, and resolves every attribute definition
//! into [`SchemaNode`]s once, so the diff engine never inspects raw JSON
//! shapes. A missing file degrades to an empty schema with a warning; a file
//! that exists but cannot be parsed is fatal.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzer::{AnalysisWarning, Diagnostics};
use crate::error::{AnalyzerError, Result, SchemaError};

use super::schema::{AttributeDefinition, SchemaNode, SetAttributeSchema};

/// Reference schema shipped with the binary.
const BUILTIN_SCHEMA: &str = include_str!("../../references/azurerm_set_attributes.json");

/// File names searched for when no schema path is given.
pub const DEFAULT_SCHEMA_FILES: &[&str] = &[
    "set_attributes.json",
    "set_attributes.yaml",
    "set_attributes.yml",
];

/// Directory under the user config dir holding a personal schema.
const CONFIG_DIR_NAME: &str = "tf-set-diff";

/// Where the active schema came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Loaded from a file on disk.
    File(PathBuf),
    /// An explicit path was given but does not exist.
    Missing(PathBuf),
    /// The reference schema compiled into the binary.
    Builtin,
}

/// Loader for the Set-type attribute schema.
#[derive(Debug, Default)]
pub struct SchemaParser {
    /// Directory where the upward file search starts.
    base_path: Option<PathBuf>,
}

impl SchemaParser {
    /// Creates a new schema parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory the file search starts from.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Resolves and loads the schema.
    ///
    /// An explicit path wins. Without one, the working directory and its
    /// parents are searched, then the user config directory, and finally
    /// the built-in reference schema is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen schema exists but is malformed.
    pub fn discover(
        &self,
        explicit: Option<&Path>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(SetAttributeSchema, SchemaSource)> {
        if let Some(path) = explicit {
            let schema = self.load_file(path, diagnostics)?;
            let source = if path.exists() {
                SchemaSource::File(path.to_path_buf())
            } else {
                SchemaSource::Missing(path.to_path_buf())
            };
            return Ok((schema, source));
        }

        let start = self
            .base_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(path) = find_schema_file(&start).or_else(user_schema_file) {
            let schema = self.load_file(&path, diagnostics)?;
            return Ok((schema, SchemaSource::File(path)));
        }

        debug!("No schema file found, using built-in reference schema");
        let schema = self.parse_json(BUILTIN_SCHEMA, Some(Path::new("<builtin>")), diagnostics)?;
        Ok((schema, SchemaSource::Builtin))
    }

    /// Loads a schema file, choosing JSON or YAML by extension.
    ///
    /// A missing file is not an error: a warning is recorded and an empty
    /// schema is returned so every attribute is treated as ordinary.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        diagnostics: &mut Diagnostics,
    ) -> Result<SetAttributeSchema> {
        let path = path.as_ref();

        if !path.exists() {
            diagnostics.push(AnalysisWarning::SchemaFileMissing {
                path: path.to_path_buf(),
            });
            return Ok(SetAttributeSchema::new());
        }

        info!("Loading attribute schema from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Schema(SchemaError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        if is_yaml(path) {
            self.parse_yaml(&content, Some(path), diagnostics)
        } else {
            self.parse_json(&content, Some(path), diagnostics)
        }
    }

    /// Parses a schema from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or has the wrong shape.
    pub fn parse_json(
        &self,
        content: &str,
        source: Option<&Path>,
        diagnostics: &mut Diagnostics,
    ) -> Result<SetAttributeSchema> {
        let value: Value = serde_json::from_str(content).map_err(|e| {
            AnalyzerError::Schema(SchemaError::ParseError {
                message: format!("JSON parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;
        Self::parse_value(&value, diagnostics)
    }

    /// Parses a schema from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or has the wrong shape.
    pub fn parse_yaml(
        &self,
        content: &str,
        source: Option<&Path>,
        diagnostics: &mut Diagnostics,
    ) -> Result<SetAttributeSchema> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| {
            AnalyzerError::Schema(SchemaError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;
        Self::parse_value(&value, diagnostics)
    }

    /// Builds the schema from an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document or its `resources` entry is not an
    /// object.
    pub fn parse_value(value: &Value, diagnostics: &mut Diagnostics) -> Result<SetAttributeSchema> {
        let root = value
            .as_object()
            .ok_or_else(|| SchemaError::malformed("top-level value must be an object"))?;

        let mut schema = SetAttributeSchema::new();

        let Some(resources) = root.get("resources") else {
            debug!("Schema has no `resources` entry");
            return Ok(schema);
        };

        let resources = resources
            .as_object()
            .ok_or_else(|| SchemaError::malformed("`resources` must be an object"))?;

        for (resource_type, attributes) in resources {
            let Some(attributes) = attributes.as_object() else {
                diagnostics.push(AnalysisWarning::MalformedSchemaEntry {
                    location: resource_type.clone(),
                    reason: String::from("resource entry must be an object"),
                });
                continue;
            };

            schema.insert_resource(resource_type.clone());

            for (attribute, raw) in attributes {
                let mut issues = Vec::new();
                let location = format!("{resource_type}.{attribute}");
                let definition = AttributeDefinition::from_value(raw, &location, &mut issues);
                for issue in issues {
                    diagnostics.push(AnalysisWarning::MalformedSchemaEntry {
                        location: issue.location,
                        reason: issue.reason,
                    });
                }
                let node = SchemaNode::from(&definition);
                schema.insert(resource_type.clone(), attribute.clone(), node);
            }
        }

        debug!("Loaded schema for {} resource types", schema.resource_count());
        Ok(schema)
    }
}

/// Returns true for `.yaml` / `.yml` paths.
fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Finds a schema file in `start_dir` or any of its parents.
#[must_use]
pub fn find_schema_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_SCHEMA_FILES {
            let candidate = current.join(filename);
            if candidate.exists() {
                info!("Found attribute schema: {}", candidate.display());
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Returns the per-user schema file if it exists.
fn user_schema_file() -> Option<PathBuf> {
    let candidate = dirs::config_dir()?
        .join(CONFIG_DIR_NAME)
        .join(DEFAULT_SCHEMA_FILES[0]);
    candidate.exists().then_some(candidate)
}
