//! Terraform plan types.
//!
//! Only the subset of `terraform show -json` output the analyzer needs is
//! modelled: each resource change's address, type, actions, and the
//! before/after attribute trees with their sensitivity and unknown masks.
//! Every field defaults so partially populated plans still load.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed Terraform plan.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TerraformPlan {
    /// Plan format version.
    #[serde(default)]
    pub format_version: Option<String>,
    /// Terraform version that produced the plan.
    #[serde(default)]
    pub terraform_version: Option<String>,
    /// Planned resource changes.
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

/// One planned resource change.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResourceChange {
    /// Full resource address (e.g. `azurerm_lb.main`).
    #[serde(default)]
    pub address: String,
    /// Resource type (e.g. `azurerm_lb`).
    #[serde(default, rename = "type")]
    pub resource_type: String,
    /// The change itself.
    #[serde(default)]
    pub change: Change,
}

/// The before/after payload of a resource change.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Change {
    /// Raw action list (`no-op`, `create`, `read`, `update`, `delete`).
    #[serde(default)]
    pub actions: Vec<String>,
    /// Attribute tree before the change.
    #[serde(default)]
    pub before: Value,
    /// Attribute tree after the change.
    #[serde(default)]
    pub after: Value,
    /// Sensitivity mask for `before`.
    #[serde(default)]
    pub before_sensitive: Value,
    /// Sensitivity mask for `after`.
    #[serde(default)]
    pub after_sensitive: Value,
    /// Mask of values only known after apply.
    #[serde(default)]
    pub after_unknown: Value,
}

/// Lifecycle classification of a resource change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    /// The resource will be created.
    Create,
    /// The resource will be destroyed.
    Delete,
    /// The resource will be updated in place.
    Update,
    /// The resource will be destroyed and recreated.
    Replace,
}

/// Attribute trees are always objects; anything else is treated as empty.
static EMPTY_OBJECT: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);

impl Change {
    /// Returns true if this change does nothing.
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.actions.len() == 1 && self.actions[0] == "no-op"
    }

    /// Classifies the raw action list.
    ///
    /// Any list containing both `delete` and `create` is a replacement,
    /// regardless of order.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleAction {
        let has = |action: &str| self.actions.iter().any(|a| a == action);

        if has("delete") && has("create") {
            LifecycleAction::Replace
        } else if self.actions == ["create"] {
            LifecycleAction::Create
        } else if self.actions == ["delete"] {
            LifecycleAction::Delete
        } else {
            LifecycleAction::Update
        }
    }

    /// Attribute map before the change.
    #[must_use]
    pub fn before_attributes(&self) -> &Map<String, Value> {
        self.before.as_object().unwrap_or(&EMPTY_OBJECT)
    }

    /// Attribute map after the change.
    #[must_use]
    pub fn after_attributes(&self) -> &Map<String, Value> {
        self.after.as_object().unwrap_or(&EMPTY_OBJECT)
    }

    /// Returns true if `attribute` is marked sensitive on either side.
    #[must_use]
    pub fn is_sensitive(&self, attribute: &str) -> bool {
        [&self.before_sensitive, &self.after_sensitive]
            .iter()
            .any(|mask| mask.get(attribute).is_some_and(mask_has_mark))
    }

    /// Returns true if the whole of `attribute` is unknown until apply.
    #[must_use]
    pub fn is_unknown_after_apply(&self, attribute: &str) -> bool {
        matches!(self.after_unknown.get(attribute), Some(Value::Bool(true)))
    }
}

impl LifecycleAction {
    /// Returns true for actions that create or destroy the whole resource.
    #[must_use]
    pub const fn is_lifecycle_only(self) -> bool {
        matches!(self, Self::Create | Self::Delete | Self::Replace)
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Replace => "replace",
        };
        write!(f, "{s}")
    }
}

/// Returns true if a sensitivity mask contains any `true` leaf.
fn mask_has_mark(mask: &Value) -> bool {
    match mask {
        Value::Bool(marked) => *marked,
        Value::Array(items) => items.iter().any(mask_has_mark),
        Value::Object(fields) => fields.values().any(mask_has_mark),
        _ => false,
    }
}
