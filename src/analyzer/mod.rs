//! Set-type attribute analysis.
//!
//! This module separates order-only noise from real changes in a Terraform
//! plan:
//! - [`Normalizer`] folds representation noise out of values
//! - [`ElementKeyer`] derives element identities
//! - [`SetDiffer`] matches and compares Set elements, recursively
//! - [`ResourceAnalyzer`] applies the differ to one resource change
//! - [`Aggregator`] rolls findings up into counts and severity

mod diagnostics;
mod diff;
mod keyer;
mod normalize;
mod resource;
mod summary;

pub use diagnostics::{AnalysisWarning, Diagnostics, Side};
pub use diff::{FieldDiff, ModifiedElement, SetAttributeChange, SetDiffer};
pub use keyer::{ElementKey, ElementKeyer, canonical_json, content_hash};
pub use normalize::Normalizer;
pub use resource::{ResourceAnalyzer, ResourceFinding};
pub use summary::{
    Aggregator, AnalysisSummary, ChangeEntry, ClassifiedChanges, EXIT_NO_CHANGES,
    EXIT_RESOURCE_REPLACE, EXIT_SET_CHANGES, Severity,
};

use serde::Serialize;
use tracing::info;

use crate::config::{AnalyzerSettings, SetAttributeSchema};
use crate::plan::TerraformPlan;

/// Complete result of analyzing one plan.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Whether the plan listed no resource changes at all.
    #[serde(skip)]
    pub empty_plan: bool,
    /// Findings for every analyzed resource, in plan order.
    pub resources: Vec<ResourceFinding>,
    /// Counts, severity and warnings.
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    /// Splits the findings by classification.
    #[must_use]
    pub fn classify(&self) -> ClassifiedChanges<'_> {
        Aggregator::classify(&self.resources)
    }

    /// Severity of the run.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.summary.severity()
    }
}

/// Analyzes a whole plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanAnalyzer<'a> {
    resources: ResourceAnalyzer<'a>,
}

impl<'a> PlanAnalyzer<'a> {
    /// Creates a plan analyzer bound to a schema and settings.
    #[must_use]
    pub const fn new(schema: &'a SetAttributeSchema, settings: &'a AnalyzerSettings) -> Self {
        Self {
            resources: ResourceAnalyzer::new(schema, settings),
        }
    }

    /// Analyzes every resource change in `plan`.
    ///
    /// Warnings raised before analysis (e.g. while loading the schema) are
    /// carried in through `diagnostics` and end up in the summary.
    #[must_use]
    pub fn analyze(&self, plan: &TerraformPlan, mut diagnostics: Diagnostics) -> AnalysisReport {
        let resources: Vec<ResourceFinding> = plan
            .resource_changes
            .iter()
            .filter_map(|rc| self.resources.analyze(rc, &mut diagnostics))
            .collect();

        let summary = Aggregator::aggregate(&resources, diagnostics.into_warnings());

        info!(
            "Analyzed {} of {} resource changes: {}",
            resources.len(),
            plan.resource_changes.len(),
            summary.severity()
        );

        AnalysisReport {
            empty_plan: plan.resource_changes.is_empty(),
            resources,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaParser;
    use crate::plan::PlanParser;
    use serde_json::json;

    fn schema() -> SetAttributeSchema {
        let raw = json!({
            "resources": {
                "azurerm_application_gateway": {
                    "backend_address_pool": "name",
                    "rewrite_rule_set": {
                        "_key": "name",
                        "rewrite_rule": "name"
                    }
                }
            }
        });
        SchemaParser::parse_value(&raw, &mut Diagnostics::new()).unwrap()
    }

    fn run(plan: &str) -> AnalysisReport {
        let schema = schema();
        let settings = AnalyzerSettings::new();
        let plan = PlanParser::new().parse_str(plan, None).unwrap();
        PlanAnalyzer::new(&schema, &settings).analyze(&plan, Diagnostics::new())
    }

    #[test]
    fn test_empty_plan() {
        let report = run(r#"{"resource_changes": []}"#);
        assert!(report.empty_plan);
        assert_eq!(report.severity(), Severity::NoChanges);
    }

    #[test]
    fn test_replacement_scenario() {
        let report = run(r#"{
            "resource_changes": [{
                "address": "azurerm_application_gateway.main",
                "type": "azurerm_application_gateway",
                "change": {
                    "actions": ["delete", "create"],
                    "before": {"backend_address_pool": [{"name": "a"}]},
                    "after": {"backend_address_pool": [{"name": "b"}]}
                }
            }]
        }"#);

        assert_eq!(report.summary.replace_count, 1);
        assert!(report.resources[0].set_changes.is_empty());
        assert_eq!(report.summary.exit_code(), EXIT_RESOURCE_REPLACE);
    }

    #[test]
    fn test_mixed_plan() {
        let report = run(r#"{
            "resource_changes": [
                {
                    "address": "azurerm_application_gateway.main",
                    "type": "azurerm_application_gateway",
                    "change": {
                        "actions": ["update"],
                        "before": {
                            "backend_address_pool": [{"name": "a"}, {"name": "b"}],
                            "rewrite_rule_set": [{"name": "s", "rewrite_rule": [{"name": "r1", "sequence": 1}]}]
                        },
                        "after": {
                            "backend_address_pool": [{"name": "b"}, {"name": "a"}],
                            "rewrite_rule_set": [{"name": "s", "rewrite_rule": [{"name": "r1", "sequence": 2}]}]
                        }
                    }
                },
                {
                    "address": "azurerm_resource_group.rg",
                    "type": "azurerm_resource_group",
                    "change": {"actions": ["no-op"], "before": {}, "after": {}}
                },
                {
                    "address": "random_string.suffix",
                    "type": "random_string",
                    "change": {"actions": ["create"], "before": null, "after": {}}
                }
            ]
        }"#);

        assert!(!report.empty_plan);
        assert_eq!(report.resources.len(), 1);
        assert_eq!(report.summary.order_only_count, 1);
        assert_eq!(report.summary.actual_set_changes_count, 1);
        assert_eq!(report.severity(), Severity::SetChanges);

        let classified = report.classify();
        assert_eq!(classified.actual[0].name, "rewrite_rule_set.rewrite_rule");
        assert_eq!(classified.order_only[0].name, "backend_address_pool");
    }

    #[test]
    fn test_duplicate_keys_reach_summary_warnings() {
        let report = run(r#"{
            "resource_changes": [{
                "address": "azurerm_application_gateway.main",
                "type": "azurerm_application_gateway",
                "change": {
                    "actions": ["update"],
                    "before": {"backend_address_pool": [{"name": "a", "fqdns": ["x"]}, {"name": "a"}]},
                    "after": {"backend_address_pool": [{"name": "a"}]}
                }
            }]
        }"#);

        assert_eq!(report.summary.warnings.len(), 1);
        assert_eq!(report.severity(), Severity::OrderOnly);
    }
}
