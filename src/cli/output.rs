//! Output formatting for analysis reports.
//!
//! Every format renders the same [`AnalysisReport`] and the same
//! classification from [`AnalysisReport::classify`]; nothing is recomputed
//! per format.

use serde_json::Value;
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::analyzer::{AnalysisReport, AnalysisSummary, ResourceFinding, SetAttributeChange};
use crate::error::{AnalyzerError, Result};

use super::commands::OutputFormat;

/// Report title shared by the Markdown renderings.
const TITLE: &str = "# Terraform Plan Analysis Results";

/// Output formatter for analysis reports.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Order-only row for the Markdown table.
#[derive(Tabled)]
struct OrderOnlyRow {
    #[tabled(rename = "Resource")]
    address: String,
    #[tabled(rename = "Attribute")]
    attribute: String,
    #[tabled(rename = "Elements")]
    elements: usize,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Renders a report in the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON rendering cannot be serialized.
    pub fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let output = match (self.format, report.empty_plan) {
            (OutputFormat::Json, false) => Self::format_json(report)?,
            (OutputFormat::Json, true) => serde_json::json!({
                "summary": {},
                "has_real_changes": false,
                "resources": [],
                "warnings": [],
            })
            .to_string(),
            (OutputFormat::Summary, false) => Self::format_summary(&report.summary),
            (OutputFormat::Summary, true) => String::from("✅ No changes detected"),
            (OutputFormat::Markdown, false) => Self::format_markdown(report),
            (OutputFormat::Markdown, true) => format!("{TITLE}\n\nNo resource changes detected."),
        };
        Ok(output)
    }

    /// Formats the report as Markdown.
    fn format_markdown(report: &AnalysisReport) -> String {
        let classified = report.classify();
        let mut output = String::new();

        let _ = writeln!(output, "{TITLE}\n");
        output.push_str(
            "Analyzes AzureRM Set-type attribute changes and identifies order-only \"false-positive diffs\".\n\n",
        );

        output.push_str("## 🟢 Order-only Changes (No Impact)\n\n");
        if classified.order_only.is_empty() {
            output.push_str("None\n");
        } else {
            output.push_str(
                "The following changes are internal reordering of Set-type attributes only, with no actual resource changes.\n\n",
            );
            let rows: Vec<OrderOnlyRow> = classified
                .order_only
                .iter()
                .map(|entry| OrderOnlyRow {
                    address: format!("`{}`", entry.address),
                    attribute: entry.name.clone(),
                    elements: entry.change.order_only_count,
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            output.push_str(&table.to_string());
            output.push('\n');
        }
        output.push('\n');

        output.push_str("## 🟡 Actual Set Attribute Changes\n\n");
        if classified.actual.is_empty() {
            output.push_str("None\n");
        } else {
            for entry in &classified.actual {
                let _ = writeln!(output, "### `{}` - {}\n", entry.address, entry.name);
                for line in Self::format_set_change(entry.change, 0) {
                    output.push_str(&line);
                    output.push('\n');
                }
                output.push('\n');
            }
        }
        output.push('\n');

        output.push_str("## 🔴 Resource Replacement (Caution)\n\n");
        if classified.replaced.is_empty() {
            output.push_str("None\n");
        } else {
            output.push_str(
                "The following resources will be deleted and recreated. This may cause downtime.\n\n",
            );
            for resource in &classified.replaced {
                let _ = writeln!(output, "- `{}`", resource.address);
            }
        }
        output.push('\n');

        if !classified.created.is_empty() || !classified.deleted.is_empty() || !classified.other.is_empty() {
            output.push_str("## ⚪ Other Changes\n\n");
            for resource in &classified.created {
                let _ = writeln!(output, "- `{}`: create", resource.address);
            }
            for resource in &classified.deleted {
                let _ = writeln!(output, "- `{}`: delete", resource.address);
            }
            for resource in &classified.other {
                let _ = writeln!(
                    output,
                    "- `{}`: {}",
                    resource.address,
                    resource.other_changes.join(", ")
                );
            }
            output.push('\n');
        }

        if !report.summary.warnings.is_empty() {
            output.push_str("## ⚠️ Warnings\n\n");
            for warning in &report.summary.warnings {
                let _ = writeln!(output, "- {warning}");
            }
            output.push('\n');
        }

        output
    }

    /// Formats one Set finding as Markdown bullet lines.
    fn format_set_change(change: &SetAttributeChange, indent: usize) -> Vec<String> {
        let prefix = "  ".repeat(indent);
        let mut lines = Vec::new();

        let mut push_list = |title: &str, items: Vec<String>| {
            if items.is_empty() {
                return;
            }
            lines.push(format!("{prefix}**{title}:**"));
            lines.extend(items.into_iter().map(|item| format!("{prefix}  - {item}")));
        };

        if change.is_primitive {
            push_list("Added", change.primitive_added.iter().map(display_value).collect());
            push_list("Removed", change.primitive_removed.iter().map(display_value).collect());
        } else {
            push_list("Added", change.added.iter().map(ToString::to_string).collect());
            push_list("Removed", change.removed.iter().map(ToString::to_string).collect());

            if !change.modified.is_empty() {
                lines.push(format!("{prefix}**Modified:**"));
                for element in &change.modified {
                    lines.push(format!("{prefix}  - {}:", element.key));
                    for (field, diff) in &element.diffs {
                        lines.push(format!(
                            "{prefix}    - {field}: {} → {}",
                            diff.before, diff.after
                        ));
                    }
                }
            }
        }

        if change.order_only_count > 0 {
            lines.push(format!(
                "{prefix}**Order-only:** {} elements",
                change.order_only_count
            ));
        }

        for nested in &change.nested_changes {
            if nested.has_actual_change() || !nested.nested_changes.is_empty() {
                lines.push(format!(
                    "{prefix}**Nested attribute `{}`:**",
                    nested.attribute_name
                ));
                lines.extend(Self::format_set_change(nested, indent + 1));
            }
        }

        lines
    }

    /// Formats the report as JSON.
    fn format_json(report: &AnalysisReport) -> Result<String> {
        serde_json::to_string_pretty(&ReportJson::from(report))
            .map_err(|e| AnalyzerError::internal(format!("Failed to serialize report: {e}")))
    }

    /// Formats the summary as a single line.
    fn format_summary(summary: &AnalysisSummary) -> String {
        let mut parts = Vec::new();

        if summary.order_only_count > 0 {
            parts.push(format!("🟢 {} order-only", summary.order_only_count));
        }
        if summary.actual_set_changes_count > 0 {
            parts.push(format!("🟡 {} set changes", summary.actual_set_changes_count));
        }
        if summary.replace_count > 0 {
            parts.push(format!("🔴 {} replacements", summary.replace_count));
        }

        if parts.is_empty() {
            return String::from("✅ No changes detected");
        }
        parts.join(" | ")
    }
}

/// Strings are shown bare, everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct ReportJson<'a> {
    summary: &'a AnalysisSummary,
    severity: String,
    has_real_changes: bool,
    resources: Vec<ResourceJson<'a>>,
    warnings: Vec<String>,
}

#[derive(serde::Serialize)]
struct ResourceJson<'a> {
    address: &'a str,
    resource_type: &'a str,
    actions: &'a [String],
    is_replace: bool,
    is_create: bool,
    is_delete: bool,
    set_changes: &'a [SetAttributeChange],
    other_changes: &'a [String],
}

impl<'a> From<&'a AnalysisReport> for ReportJson<'a> {
    fn from(report: &'a AnalysisReport) -> Self {
        Self {
            summary: &report.summary,
            severity: report.severity().to_string(),
            has_real_changes: report.summary.has_real_changes(),
            resources: report.resources.iter().map(ResourceJson::from).collect(),
            warnings: report.summary.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

impl<'a> From<&'a ResourceFinding> for ResourceJson<'a> {
    fn from(finding: &'a ResourceFinding) -> Self {
        Self {
            address: &finding.address,
            resource_type: &finding.resource_type,
            actions: &finding.actions,
            is_replace: finding.is_replace(),
            is_create: finding.is_create(),
            is_delete: finding.is_delete(),
            set_changes: &finding.set_changes,
            other_changes: &finding.other_changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Aggregator, ElementKey, FieldDiff, ModifiedElement};
    use crate::plan::LifecycleAction;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn report(resources: Vec<ResourceFinding>) -> AnalysisReport {
        let summary = Aggregator::aggregate(&resources, Vec::new());
        AnalysisReport {
            empty_plan: false,
            resources,
            summary,
        }
    }

    fn update(set_changes: Vec<SetAttributeChange>) -> ResourceFinding {
        ResourceFinding {
            address: String::from("azurerm_lb.main"),
            resource_type: String::from("azurerm_lb"),
            actions: vec![String::from("update")],
            lifecycle: LifecycleAction::Update,
            set_changes,
            other_changes: Vec::new(),
        }
    }

    fn modified_probe() -> SetAttributeChange {
        let mut diffs = BTreeMap::new();
        diffs.insert(
            String::from("port"),
            FieldDiff {
                before: json!(80),
                after: json!(443),
            },
        );
        SetAttributeChange {
            attribute_name: String::from("probe"),
            path: String::from("probe"),
            modified: vec![ModifiedElement {
                key: ElementKey::Field(String::from("health")),
                diffs,
            }],
            ..SetAttributeChange::default()
        }
    }

    fn reordered_pool() -> SetAttributeChange {
        SetAttributeChange {
            attribute_name: String::from("frontend_ip_configuration"),
            path: String::from("frontend_ip_configuration"),
            order_only_count: 2,
            ..SetAttributeChange::default()
        }
    }

    #[test]
    fn test_summary_line() {
        let formatter = OutputFormatter::new(OutputFormat::Summary);
        assert_eq!(
            formatter.format_report(&report(Vec::new())).unwrap(),
            "✅ No changes detected"
        );

        let line = formatter.format_report(&report(vec![update(vec![reordered_pool(), modified_probe()])]))
            .unwrap();
        assert_eq!(line, "🟢 1 order-only | 🟡 1 set changes");
    }

    #[test]
    fn test_markdown_sections() {
        let formatter = OutputFormatter::new(OutputFormat::Markdown);
        let output = formatter.format_report(&report(vec![update(vec![reordered_pool(), modified_probe()])]))
            .unwrap();

        assert!(output.starts_with(TITLE));
        assert!(output.contains("frontend_ip_configuration"));
        assert!(output.contains("### `azurerm_lb.main` - probe"));
        assert!(output.contains("    - port: 80 → 443"));
        assert!(output.contains("## 🔴 Resource Replacement (Caution)\n\nNone"));
        assert!(!output.contains("Warnings"));
    }

    #[test]
    fn test_primitive_markdown() {
        let change = SetAttributeChange {
            attribute_name: String::from("dns_servers"),
            path: String::from("dns_servers"),
            is_primitive: true,
            primitive_added: vec![json!("10.0.0.4")],
            ..SetAttributeChange::default()
        };
        let lines = OutputFormatter::format_set_change(&change, 1);
        assert_eq!(lines, vec!["  **Added:**", "    - 10.0.0.4"]);
    }

    #[test]
    fn test_json_output() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_report(&report(vec![update(vec![modified_probe()])])).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["summary"]["actual_set_changes_count"], json!(1));
        assert_eq!(value["has_real_changes"], json!(true));
        assert_eq!(value["severity"], json!("set changes"));
        assert_eq!(value["resources"][0]["is_replace"], json!(false));
        assert_eq!(
            value["resources"][0]["set_changes"][0]["modified"][0]["key"],
            json!("health")
        );
        assert_eq!(
            value["resources"][0]["set_changes"][0]["modified"][0]["diffs"]["port"]["after"],
            json!(443)
        );
    }

    #[test]
    fn test_empty_plan_variants() {
        let mut empty = report(Vec::new());
        empty.empty_plan = true;

        let json = OutputFormatter::new(OutputFormat::Json).format_report(&empty).unwrap();
        assert!(json.contains("\"has_real_changes\":false"));

        let markdown = OutputFormatter::new(OutputFormat::Markdown).format_report(&empty).unwrap();
        assert!(markdown.ends_with("No resource changes detected."));
    }
}
