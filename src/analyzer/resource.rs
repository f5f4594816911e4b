//! Per-resource change analysis.
//!
//! Runs the Set diff engine over every schema-declared attribute of one
//! planned resource change and lists the remaining attributes that differ.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::{AnalyzerSettings, SetAttributeSchema};
use crate::plan::{LifecycleAction, ResourceChange};

use super::diagnostics::{AnalysisWarning, Diagnostics};
use super::diff::{SetAttributeChange, SetDiffer};
use super::normalize::Normalizer;

/// Findings for one planned resource change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceFinding {
    /// Resource address.
    pub address: String,
    /// Resource type.
    pub resource_type: String,
    /// Raw plan actions.
    pub actions: Vec<String>,
    /// Lifecycle classification.
    pub lifecycle: LifecycleAction,
    /// Findings for Set-type attributes.
    pub set_changes: Vec<SetAttributeChange>,
    /// Other top-level attributes that differ.
    pub other_changes: Vec<String>,
}

impl ResourceFinding {
    /// Returns true if the resource will be destroyed and recreated.
    #[must_use]
    pub fn is_replace(&self) -> bool {
        self.lifecycle == LifecycleAction::Replace
    }

    /// Returns true if the resource will be created.
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.lifecycle == LifecycleAction::Create
    }

    /// Returns true if the resource will be destroyed.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.lifecycle == LifecycleAction::Delete
    }
}

/// Analyzes resource changes against the Set-type attribute schema.
#[derive(Debug, Clone, Copy)]
pub struct ResourceAnalyzer<'a> {
    schema: &'a SetAttributeSchema,
    settings: &'a AnalyzerSettings,
    differ: SetDiffer,
}

impl<'a> ResourceAnalyzer<'a> {
    /// Creates an analyzer bound to a schema and settings.
    #[must_use]
    pub const fn new(schema: &'a SetAttributeSchema, settings: &'a AnalyzerSettings) -> Self {
        Self {
            schema,
            settings,
            differ: SetDiffer::new(Normalizer::new(settings.ignore_case)),
        }
    }

    /// Analyzes one resource change.
    ///
    /// Returns `None` for no-op changes and for resource types outside the
    /// governed prefix or the include/exclude filters. Creates, deletes and
    /// replacements are recorded with their lifecycle only.
    pub fn analyze(
        &self,
        resource: &ResourceChange,
        diagnostics: &mut Diagnostics,
    ) -> Option<ResourceFinding> {
        let change = &resource.change;

        if change.is_no_op() || !self.settings.governs(&resource.resource_type) {
            return None;
        }

        let lifecycle = change.lifecycle();
        let mut finding = ResourceFinding {
            address: resource.address.clone(),
            resource_type: resource.resource_type.clone(),
            actions: change.actions.clone(),
            lifecycle,
            set_changes: Vec::new(),
            other_changes: Vec::new(),
        };

        if lifecycle.is_lifecycle_only() {
            debug!("{} is a {lifecycle}, skipping Set analysis", resource.address);
            return Some(finding);
        }

        let before = change.before_attributes();
        let after = change.after_attributes();
        let mut unknown = BTreeSet::new();

        for (attribute, node) in self.schema.attributes(&resource.resource_type) {
            if change.is_sensitive(attribute) {
                diagnostics.push(AnalysisWarning::SensitiveAttribute {
                    address: resource.address.clone(),
                    attribute: attribute.to_string(),
                });
            }

            let before_value = before.get(attribute);
            let after_value = after.get(attribute);

            if before_value == after_value {
                continue;
            }

            if change.is_unknown_after_apply(attribute) {
                diagnostics.push(AnalysisWarning::UnknownAfterApply {
                    address: resource.address.clone(),
                    attribute: attribute.to_string(),
                });
                unknown.insert(attribute);
                continue;
            }

            let set_change =
                self.differ
                    .diff(before_value, after_value, node, attribute, "", diagnostics);
            if set_change.has_findings() {
                finding.set_changes.push(set_change);
            }
        }

        let names: BTreeSet<&str> = before
            .keys()
            .chain(after.keys())
            .map(String::as_str)
            .collect();

        for name in names {
            if name.starts_with('_') {
                continue;
            }
            let declared = self.schema.resolve(&resource.resource_type, name).is_some();
            if declared && !unknown.contains(name) {
                continue;
            }

            let before_value = before.get(name);
            let after_value = after.get(name);
            if before_value == after_value {
                continue;
            }

            let redacted = change.is_sensitive(name)
                && before_value.is_none_or(serde_json::Value::is_null)
                && after_value.is_none_or(serde_json::Value::is_null);
            if !redacted {
                finding.other_changes.push(name.to_string());
            }
        }

        debug!(
            "{}: {} Set findings, {} other changes",
            finding.address,
            finding.set_changes.len(),
            finding.other_changes.len()
        );
        Some(finding)
    }
}
