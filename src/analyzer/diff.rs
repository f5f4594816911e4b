//! Set-type attribute diff engine.
//!
//! Compares the before and after values of one unordered attribute. Elements
//! are matched by [`ElementKey`] rather than by position, so a reordered
//! collection produces an order-only finding instead of a change. Matched
//! pairs that differ are compared field by field, recursing into nested
//! Set-type attributes declared by the schema.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::SchemaNode;

use super::diagnostics::{AnalysisWarning, Diagnostics, Side};
use super::keyer::{ElementKey, ElementKeyer, canonical_json};
use super::normalize::Normalizer;

/// Result of comparing one Set-type attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetAttributeChange {
    /// Attribute name.
    pub attribute_name: String,
    /// Dotted path from the resource root, including parent element keys.
    pub path: String,
    /// Elements that matched with no meaningful difference.
    pub order_only_count: usize,
    /// Whether the elements were scalars rather than objects.
    pub is_primitive: bool,
    /// Keys present only after the change.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<ElementKey>,
    /// Keys present only before the change.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<ElementKey>,
    /// Matched elements with field-level differences.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modified: Vec<ModifiedElement>,
    /// Scalars present only after the change.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primitive_added: Vec<Value>,
    /// Scalars present only before the change.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primitive_removed: Vec<Value>,
    /// Findings in nested Set-type attributes of matched elements.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_changes: Vec<SetAttributeChange>,
}

/// A matched element whose non-Set fields differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedElement {
    /// Element key.
    pub key: ElementKey,
    /// Field name -> before/after values.
    pub diffs: BTreeMap<String, FieldDiff>,
}

/// Before and after values of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    /// Value before the change (`null` if absent).
    pub before: Value,
    /// Value after the change (`null` if absent).
    pub after: Value,
}

impl SetAttributeChange {
    fn new(attribute_name: &str, path: String) -> Self {
        Self {
            attribute_name: attribute_name.to_string(),
            path,
            ..Self::default()
        }
    }

    /// Returns true if elements were added, removed, or modified here.
    #[must_use]
    pub fn has_actual_change(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || !self.modified.is_empty()
            || !self.primitive_added.is_empty()
            || !self.primitive_removed.is_empty()
    }

    /// Returns true if this node itself only saw reordering.
    #[must_use]
    pub fn is_order_only(&self) -> bool {
        self.order_only_count > 0 && !self.has_actual_change()
    }

    /// Returns true if this node or any nested node has an actual change.
    #[must_use]
    pub fn has_actual_change_deep(&self) -> bool {
        self.has_actual_change() || self.nested_changes.iter().any(Self::has_actual_change_deep)
    }

    /// Returns true if there is anything to report for this attribute.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        self.order_only_count > 0 || self.has_actual_change() || !self.nested_changes.is_empty()
    }
}

/// Recursive comparator for Set-type attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetDiffer {
    normalizer: Normalizer,
}

impl SetDiffer {
    /// Creates a differ using the given normalizer.
    #[must_use]
    pub const fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Compares the before and after values of a Set-type attribute.
    ///
    /// Non-list values are treated as single-element lists and `null` or
    /// absence as an empty list. Duplicate keys on one side are reported to
    /// `diagnostics`; the last element with that key wins.
    pub fn diff(
        &self,
        before: Option<&Value>,
        after: Option<&Value>,
        node: &SchemaNode,
        attribute: &str,
        parent_path: &str,
        diagnostics: &mut Diagnostics,
    ) -> SetAttributeChange {
        let path = if parent_path.is_empty() {
            attribute.to_string()
        } else {
            format!("{parent_path}.{attribute}")
        };

        let before_elements = as_elements(before);
        let after_elements = as_elements(after);

        let is_primitive = before_elements
            .iter()
            .chain(after_elements.iter())
            .any(|e| !e.is_null() && !e.is_object());

        if is_primitive {
            return self.diff_primitive(&before_elements, &after_elements, attribute, path);
        }

        self.diff_composite(&before_elements, &after_elements, node, attribute, path, diagnostics)
    }

    /// Compares collections of scalars as plain sets.
    fn diff_primitive(
        &self,
        before: &[&Value],
        after: &[&Value],
        attribute: &str,
        path: String,
    ) -> SetAttributeChange {
        let mut change = SetAttributeChange::new(attribute, path);
        change.is_primitive = true;

        let before_set = self.primitive_set(before);
        let after_set = self.primitive_set(after);

        change.primitive_removed = before_set
            .iter()
            .filter(|(k, _)| !after_set.contains_key(*k))
            .map(|(_, v)| v.clone())
            .collect();
        change.primitive_added = after_set
            .iter()
            .filter(|(k, _)| !before_set.contains_key(*k))
            .map(|(_, v)| v.clone())
            .collect();

        if change.primitive_added.is_empty() && change.primitive_removed.is_empty() {
            change.order_only_count = before_set.len();
        }

        debug!(
            "{}: primitive set, +{} -{} ({} unchanged)",
            change.path,
            change.primitive_added.len(),
            change.primitive_removed.len(),
            change.order_only_count
        );
        change
    }

    /// Canonical encoding -> normalized value for each scalar element.
    fn primitive_set(&self, elements: &[&Value]) -> BTreeMap<String, Value> {
        elements
            .iter()
            .map(|e| {
                let normalized = self.normalizer.normalize(e);
                (canonical_json(&normalized), normalized)
            })
            .collect()
    }

    /// Compares collections of objects, matching elements by key.
    fn diff_composite(
        &self,
        before: &[&Value],
        after: &[&Value],
        node: &SchemaNode,
        attribute: &str,
        path: String,
        diagnostics: &mut Diagnostics,
    ) -> SetAttributeChange {
        let keyer = ElementKeyer::new(node, self.normalizer);
        let before_map = key_elements(&keyer, before, Side::Before, &path, diagnostics);
        let after_map = key_elements(&keyer, after, Side::After, &path, diagnostics);

        let mut change = SetAttributeChange::new(attribute, path);

        change.removed = before_map
            .keys()
            .filter(|k| !after_map.contains_key(*k))
            .cloned()
            .collect();
        change.added = after_map
            .keys()
            .filter(|k| !before_map.contains_key(*k))
            .cloned()
            .collect();

        for (key, before_element) in &before_map {
            let Some(after_element) = after_map.get(key) else {
                continue;
            };

            if before_element == after_element {
                change.order_only_count += 1;
                continue;
            }

            let element_path = format!("{}[{key}]", change.path);
            let (diffs, nested) =
                self.compare_elements(before_element, after_element, node, &element_path, diagnostics);

            if !diffs.is_empty() {
                change.modified.push(ModifiedElement {
                    key: key.clone(),
                    diffs,
                });
            } else if !nested.iter().any(SetAttributeChange::has_actual_change_deep) {
                // Only representation noise or nested reordering.
                change.order_only_count += 1;
            }

            change.nested_changes.extend(nested);
        }

        debug!(
            "{}: +{} -{} ~{} ({} order-only, {} nested)",
            change.path,
            change.added.len(),
            change.removed.len(),
            change.modified.len(),
            change.order_only_count,
            change.nested_changes.len()
        );
        change
    }

    /// Compares two matched elements field by field.
    ///
    /// Returns the differences in ordinary fields, plus the findings of
    /// every nested Set-type field whose raw value changed.
    fn compare_elements(
        &self,
        before: &Value,
        after: &Value,
        node: &SchemaNode,
        element_path: &str,
        diagnostics: &mut Diagnostics,
    ) -> (BTreeMap<String, FieldDiff>, Vec<SetAttributeChange>) {
        let mut diffs = BTreeMap::new();
        let mut nested = Vec::new();

        let field_names: BTreeSet<&str> = field_names(before).chain(field_names(after)).collect();

        for field in field_names {
            let before_value = before.get(field);
            let after_value = after.get(field);

            if let Some(child) = node.child(field) {
                if before_value != after_value {
                    let child_change =
                        self.diff(before_value, after_value, child, field, element_path, diagnostics);
                    if child_change.has_findings() {
                        nested.push(child_change);
                    }
                }
            } else if self.normalizer.normalize_field(before_value)
                != self.normalizer.normalize_field(after_value)
            {
                diffs.insert(
                    field.to_string(),
                    FieldDiff {
                        before: before_value.cloned().unwrap_or(Value::Null),
                        after: after_value.cloned().unwrap_or(Value::Null),
                    },
                );
            }
        }

        (diffs, nested)
    }
}

/// Coerces an attribute value into a list of elements.
fn as_elements(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

/// Field names of an object element; empty for anything else.
fn field_names(element: &Value) -> impl Iterator<Item = &str> {
    element
        .as_object()
        .into_iter()
        .flat_map(|fields| fields.keys().map(String::as_str))
}

/// Builds the key -> element map for one side, reporting duplicate keys.
fn key_elements<'v>(
    keyer: &ElementKeyer<'_>,
    elements: &[&'v Value],
    side: Side,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<ElementKey, &'v Value> {
    let mut map = BTreeMap::new();
    for element in elements.iter().copied().filter(|e| e.is_object()) {
        let key = keyer.key_of(element);
        if map.contains_key(&key) {
            diagnostics.push(AnalysisWarning::DuplicateKey {
                key: key.to_string(),
                side,
                path: path.to_string(),
            });
        }
        map.insert(key, element);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn run(before: &Value, after: &Value, node: &SchemaNode) -> (SetAttributeChange, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let change = SetDiffer::default().diff(
            Some(before),
            Some(after),
            node,
            "attr",
            "",
            &mut diagnostics,
        );
        (change, diagnostics)
    }

    fn field(name: &str) -> ElementKey {
        ElementKey::Field(name.to_string())
    }

    #[test]
    fn test_keyed_reorder_is_order_only() {
        let before = json!([{"name": "a", "port": 80}, {"name": "b", "port": 81}]);
        let after = json!([{"name": "b", "port": 81}, {"name": "a", "port": 80}]);
        let (change, _) = run(&before, &after, &SchemaNode::keyed("name"));

        assert_eq!(change.order_only_count, 2);
        assert!(change.added.is_empty());
        assert!(change.removed.is_empty());
        assert!(change.modified.is_empty());
        assert!(change.is_order_only());
    }

    #[test]
    fn test_modified_field() {
        let before = json!([{"name": "a", "port": 80}]);
        let after = json!([{"name": "a", "port": 443}]);
        let (change, _) = run(&before, &after, &SchemaNode::keyed("name"));

        assert_eq!(change.order_only_count, 0);
        assert_eq!(change.modified.len(), 1);
        assert_eq!(change.modified[0].key, field("a"));
        assert_eq!(
            change.modified[0].diffs.get("port"),
            Some(&FieldDiff {
                before: json!(80),
                after: json!(443)
            })
        );
        assert_eq!(change.modified[0].diffs.len(), 1);
    }

    #[test]
    fn test_primitive_set_add_and_remove() {
        let (change, _) = run(&json!(["x", "y"]), &json!(["y", "z"]), &SchemaNode::hashed());

        assert!(change.is_primitive);
        assert_eq!(change.primitive_added, vec![json!("z")]);
        assert_eq!(change.primitive_removed, vec![json!("x")]);
        assert_eq!(change.order_only_count, 0);
    }

    #[test]
    fn test_primitive_set_reorder() {
        let (change, _) = run(&json!(["10.0.0.0/8", "192.168.0.0/16"]), &json!(["192.168.0.0/16", "10.0.0.0/8"]), &SchemaNode::hashed());
        assert!(change.is_order_only());
        assert_eq!(change.order_only_count, 2);
    }

    #[test]
    fn test_primitive_set_case_folding() {
        let mut diagnostics = Diagnostics::new();
        let change = SetDiffer::new(Normalizer::new(true)).diff(
            Some(&json!(["Web", "api"])),
            Some(&json!(["API", "web"])),
            &SchemaNode::hashed(),
            "names",
            "",
            &mut diagnostics,
        );
        assert!(change.is_order_only());
    }

    #[test]
    fn test_added_and_removed_keys() {
        let before = json!([{"name": "a"}, {"name": "b"}]);
        let after = json!([{"name": "b"}, {"name": "c"}]);
        let (change, _) = run(&before, &after, &SchemaNode::keyed("name"));

        assert_eq!(change.added, vec![field("c")]);
        assert_eq!(change.removed, vec![field("a")]);
        assert_eq!(change.order_only_count, 1);
    }

    #[test]
    fn test_representation_noise_is_order_only() {
        let before = json!([{"name": "a", "description": "", "priority": 100.0}]);
        let after = json!([{"name": "a", "priority": 100}]);
        let (change, _) = run(&before, &after, &SchemaNode::keyed("name"));

        assert_eq!(change.order_only_count, 1);
        assert!(change.modified.is_empty());
    }

    #[test]
    fn test_string_number_mismatch_is_real() {
        let before = json!([{"name": "a", "port": "80"}]);
        let after = json!([{"name": "a", "port": 80}]);
        let (change, _) = run(&before, &after, &SchemaNode::keyed("name"));
        assert_eq!(change.modified.len(), 1);
    }

    #[test]
    fn test_hashed_elements() {
        let before = json!([{"ip": "10.0.0.1"}, {"ip": "10.0.0.2"}]);
        let after = json!([{"ip": "10.0.0.2"}, {"ip": "10.0.0.3"}]);
        let (change, _) = run(&before, &after, &SchemaNode::hashed());

        assert_eq!(change.added.len(), 1);
        assert_eq!(change.removed.len(), 1);
        assert!(change.added[0].is_hashed());
        assert_eq!(change.order_only_count, 1);
    }

    #[test]
    fn test_duplicate_keys_warn_and_last_wins() {
        let before = json!([{"name": "a", "port": 1}, {"name": "a", "port": 2}]);
        let after = json!([{"name": "a", "port": 2}]);
        let (change, diagnostics) = run(&before, &after, &SchemaNode::keyed("name"));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(change.order_only_count, 1);
        assert!(change.modified.is_empty());
    }

    #[test]
    fn test_non_list_values_are_singletons() {
        let (change, _) = run(
            &json!({"name": "a", "port": 80}),
            &json!([{"name": "a", "port": 80}]),
            &SchemaNode::keyed("name"),
        );
        assert_eq!(change.order_only_count, 1);

        let mut diagnostics = Diagnostics::new();
        let change = SetDiffer::default().diff(
            None,
            Some(&json!([{"name": "a"}])),
            &SchemaNode::keyed("name"),
            "attr",
            "",
            &mut diagnostics,
        );
        assert_eq!(change.added, vec![field("a")]);
    }

    fn rewrite_schema() -> SchemaNode {
        let mut children = BTreeMap::new();
        children.insert(String::from("rule"), SchemaNode::keyed("name"));
        SchemaNode::composite(Some(String::from("name")), children)
    }

    #[test]
    fn test_nested_reorder_stays_order_only_at_parent() {
        let before = json!([{
            "name": "set1",
            "rule": [{"name": "r1", "seq": 1}, {"name": "r2", "seq": 2}]
        }]);
        let after = json!([{
            "name": "set1",
            "rule": [{"name": "r2", "seq": 2}, {"name": "r1", "seq": 1}]
        }]);
        let (change, _) = run(&before, &after, &rewrite_schema());

        assert_eq!(change.order_only_count, 1);
        assert!(change.modified.is_empty());
        assert_eq!(change.nested_changes.len(), 1);

        let nested = &change.nested_changes[0];
        assert_eq!(nested.attribute_name, "rule");
        assert_eq!(nested.path, "attr[set1].rule");
        assert_eq!(nested.order_only_count, 2);
        assert!(nested.is_order_only());
    }

    #[test]
    fn test_nested_change_is_reported_only_at_child() {
        let before = json!([{"name": "set1", "rule": [{"name": "r1", "seq": 1}]}]);
        let after = json!([{"name": "set1", "rule": [{"name": "r1", "seq": 5}]}]);
        let (change, _) = run(&before, &after, &rewrite_schema());

        assert_eq!(change.order_only_count, 0);
        assert!(change.modified.is_empty());
        assert!(!change.has_actual_change());
        assert!(change.has_actual_change_deep());
        assert_eq!(change.nested_changes[0].modified.len(), 1);
    }

    #[test]
    fn test_nested_and_ordinary_change_together() {
        let before = json!([{"name": "set1", "enabled": true, "rule": [{"name": "r1"}]}]);
        let after = json!([{"name": "set1", "enabled": false, "rule": [{"name": "r2"}]}]);
        let (change, _) = run(&before, &after, &rewrite_schema());

        assert_eq!(change.modified.len(), 1);
        assert!(change.modified[0].diffs.contains_key("enabled"));
        assert!(!change.modified[0].diffs.contains_key("rule"));
        assert_eq!(change.nested_changes[0].added, vec![field("r2")]);
    }

    #[test]
    fn test_nested_null_versus_empty_is_no_finding() {
        let before = json!([{"name": "set1", "rule": null}]);
        let after = json!([{"name": "set1", "rule": []}]);
        let (change, _) = run(&before, &after, &rewrite_schema());

        assert_eq!(change.order_only_count, 1);
        assert!(change.nested_changes.is_empty());
    }

    #[test]
    fn test_identical_empty_result_has_no_findings() {
        let (change, _) = run(&json!([]), &Value::Null, &SchemaNode::keyed("name"));
        assert!(!change.has_findings());
    }

    fn keyed_elements() -> impl Strategy<Value = Vec<Value>> {
        prop::collection::btree_map("[a-z]{1,4}", 0u16..3, 0..8).prop_map(|m| {
            m.into_iter()
                .map(|(name, port)| json!({ "name": name, "port": port }))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_permutations_are_order_only(
            (original, shuffled) in keyed_elements()
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let (change, _) = run(&Value::Array(original.clone()), &Value::Array(shuffled), &SchemaNode::keyed("name"));
            prop_assert!(change.added.is_empty());
            prop_assert!(change.removed.is_empty());
            prop_assert!(change.modified.is_empty());
            prop_assert_eq!(change.order_only_count, original.len());
        }

        #[test]
        fn test_keys_partition_both_sides(before in keyed_elements(), after in keyed_elements()) {
            let (change, _) = run(&Value::Array(before.clone()), &Value::Array(after.clone()), &SchemaNode::keyed("name"));
            let matched = change.order_only_count + change.modified.len();
            prop_assert_eq!(before.len(), matched + change.removed.len());
            prop_assert_eq!(after.len(), matched + change.added.len());
        }
    }
}
