//! Aggregation of resource findings into a run summary.
//!
//! Walks every Set finding tree, splits the nodes into order-only and actual
//! changes, and derives the counts and severity reported to the caller. All
//! output formats consume the classification produced here.

use serde::Serialize;

use super::diagnostics::AnalysisWarning;
use super::diff::SetAttributeChange;
use super::resource::ResourceFinding;

/// Exit status when there are no changes or only reordering.
pub const EXIT_NO_CHANGES: u8 = 0;
/// Exit status when Set attributes change or resources are created/deleted.
pub const EXIT_SET_CHANGES: u8 = 1;
/// Exit status when any resource is replaced.
pub const EXIT_RESOURCE_REPLACE: u8 = 2;

/// Overall severity of a plan, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Nothing to report.
    NoChanges,
    /// Only reordering of Set-type attributes.
    OrderOnly,
    /// Real Set changes, creates or deletes.
    SetChanges,
    /// At least one resource is replaced.
    Replace,
}

impl Severity {
    /// Process exit status for this severity.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::NoChanges | Self::OrderOnly => EXIT_NO_CHANGES,
            Self::SetChanges => EXIT_SET_CHANGES,
            Self::Replace => EXIT_RESOURCE_REPLACE,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoChanges => "no changes",
            Self::OrderOnly => "order-only",
            Self::SetChanges => "set changes",
            Self::Replace => "replace",
        };
        write!(f, "{s}")
    }
}

/// One classified Set finding, borrowed from its resource.
#[derive(Debug, Clone)]
pub struct ChangeEntry<'a> {
    /// Resource address.
    pub address: &'a str,
    /// Dotted display name (`parent.child`).
    pub name: String,
    /// The finding node.
    pub change: &'a SetAttributeChange,
}

/// Findings split by classification.
#[derive(Debug, Default)]
pub struct ClassifiedChanges<'a> {
    /// Nodes that only saw reordering.
    pub order_only: Vec<ChangeEntry<'a>>,
    /// Nodes with additions, removals or modifications.
    pub actual: Vec<ChangeEntry<'a>>,
    /// Replaced resources.
    pub replaced: Vec<&'a ResourceFinding>,
    /// Created resources.
    pub created: Vec<&'a ResourceFinding>,
    /// Deleted resources.
    pub deleted: Vec<&'a ResourceFinding>,
    /// Resources with other attribute changes.
    pub other: Vec<&'a ResourceFinding>,
}

/// Counts and severity for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    /// Order-only Set findings.
    pub order_only_count: usize,
    /// Set findings with real changes.
    pub actual_set_changes_count: usize,
    /// Replaced resources.
    pub replace_count: usize,
    /// Created resources.
    pub create_count: usize,
    /// Deleted resources.
    pub delete_count: usize,
    /// Other (non-Set) attribute changes.
    pub other_changes_count: usize,
    /// Advisory warnings.
    #[serde(skip)]
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisSummary {
    /// Severity of the run.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        if self.replace_count > 0 {
            Severity::Replace
        } else if self.actual_set_changes_count > 0 || self.create_count > 0 || self.delete_count > 0 {
            Severity::SetChanges
        } else if self.order_only_count > 0 {
            Severity::OrderOnly
        } else {
            Severity::NoChanges
        }
    }

    /// Returns true if anything other than reordering will change.
    #[must_use]
    pub const fn has_real_changes(&self) -> bool {
        self.actual_set_changes_count > 0
            || self.replace_count > 0
            || self.create_count > 0
            || self.delete_count > 0
            || self.other_changes_count > 0
    }

    /// Process exit status for `--exit-code`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.severity().exit_code()
    }
}

/// Stateless aggregation over resource findings.
#[derive(Debug, Default)]
pub struct Aggregator;

impl Aggregator {
    /// Splits every finding tree into order-only and actual entries.
    #[must_use]
    pub fn classify(findings: &[ResourceFinding]) -> ClassifiedChanges<'_> {
        let mut classified = ClassifiedChanges::default();

        for finding in findings {
            if finding.is_replace() {
                classified.replaced.push(finding);
            } else if finding.is_create() {
                classified.created.push(finding);
            } else if finding.is_delete() {
                classified.deleted.push(finding);
            }

            for change in &finding.set_changes {
                collect(&finding.address, change, "", &mut classified);
            }

            if !finding.other_changes.is_empty() {
                classified.other.push(finding);
            }
        }

        classified
    }

    /// Derives the run summary.
    #[must_use]
    pub fn aggregate(findings: &[ResourceFinding], warnings: Vec<AnalysisWarning>) -> AnalysisSummary {
        let classified = Self::classify(findings);

        AnalysisSummary {
            order_only_count: classified.order_only.len(),
            actual_set_changes_count: classified.actual.len(),
            replace_count: classified.replaced.len(),
            create_count: classified.created.len(),
            delete_count: classified.deleted.len(),
            other_changes_count: findings.iter().map(|f| f.other_changes.len()).sum(),
            warnings,
        }
    }
}

/// Classifies `change` and recurses into its nested findings.
fn collect<'a>(
    address: &'a str,
    change: &'a SetAttributeChange,
    prefix: &str,
    classified: &mut ClassifiedChanges<'a>,
) {
    let name = format!("{prefix}{}", change.attribute_name);

    if change.has_actual_change() {
        classified.actual.push(ChangeEntry {
            address,
            name: name.clone(),
            change,
        });
    } else if change.order_only_count > 0 {
        classified.order_only.push(ChangeEntry {
            address,
            name: name.clone(),
            change,
        });
    }

    let nested_prefix = format!("{name}.");
    for nested in &change.nested_changes {
        collect(address, nested, &nested_prefix, classified);
    }
}
