//! Attribute schema types.
//!
//! The schema lists, per resource type, which attributes are Set-type
//! (unordered) collections and how their elements are identified. It maps
//! to the `resources` object of the attributes file:
//!
//! ```json
//! {
//!   "resources": {
//!     "azurerm_application_gateway": {
//!       "backend_address_pool": "name",
//!       "trusted_client_certificate": null,
//!       "rewrite_rule_set": { "_key": "name", "rewrite_rule": "name" }
//!     }
//!   }
//! }
//! ```

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Marker field carrying the key of a composite definition.
pub const KEY_MARKER: &str = "_key";

/// A raw attribute definition as written in the schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDefinition {
    /// Elements are identified by a single field.
    SimpleKey(String),
    /// Elements have no key field and are identified by content hash.
    Hashed,
    /// Elements carry an optional key field plus nested Set-type attributes.
    Composite {
        /// Key field (`_key`), if any.
        key_field: Option<String>,
        /// Nested attribute definitions.
        children: BTreeMap<String, AttributeDefinition>,
    },
}

/// Resolved description of one Set-type attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaNode {
    /// Field identifying an element. `None` means content-hash keying.
    pub key_field: Option<String>,
    /// Nested Set-type attributes found inside each element.
    pub children: BTreeMap<String, SchemaNode>,
}

/// All Set-type attributes known for every governed resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetAttributeSchema {
    /// Resource type -> attribute name -> schema node.
    resources: BTreeMap<String, BTreeMap<String, SchemaNode>>,
}

/// A part of a definition that had an unsupported shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    /// Dotted path of the offending entry.
    pub location: String,
    /// What was wrong with it.
    pub reason: String,
}

impl AttributeDefinition {
    /// Parses a raw JSON definition found at `location`.
    ///
    /// Parsing never fails as a whole. A shape that is none of the three
    /// accepted forms degrades to [`AttributeDefinition::Hashed`] and a
    /// non-string `_key` degrades to no key field; each is recorded in
    /// `issues`. Valid siblings and the enclosing definition are kept.
    #[must_use]
    pub fn from_value(value: &Value, location: &str, issues: &mut Vec<DefinitionIssue>) -> Self {
        match value {
            Value::Null => Self::Hashed,
            Value::String(field) => Self::SimpleKey(field.clone()),
            Value::Object(map) => {
                let key_field = match map.get(KEY_MARKER) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(field)) => Some(field.clone()),
                    Some(other) => {
                        issues.push(DefinitionIssue {
                            location: format!("{location}.{KEY_MARKER}"),
                            reason: format!("`{KEY_MARKER}` must be a string or null, found {other}"),
                        });
                        None
                    }
                };

                let children = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != KEY_MARKER)
                    .map(|(name, child)| {
                        let child_location = format!("{location}.{name}");
                        (name.clone(), Self::from_value(child, &child_location, issues))
                    })
                    .collect();

                Self::Composite { key_field, children }
            }
            other => {
                issues.push(DefinitionIssue {
                    location: location.to_string(),
                    reason: format!("expected a key field, null or an object, found {other}"),
                });
                Self::Hashed
            }
        }
    }
}

impl SchemaNode {
    /// A node whose elements are identified by `field`.
    #[must_use]
    pub fn keyed(field: impl Into<String>) -> Self {
        Self {
            key_field: Some(field.into()),
            children: BTreeMap::new(),
        }
    }

    /// A node whose elements are identified by content hash.
    #[must_use]
    pub const fn hashed() -> Self {
        Self {
            key_field: None,
            children: BTreeMap::new(),
        }
    }

    /// A node with nested Set-type attributes.
    #[must_use]
    pub const fn composite(key_field: Option<String>, children: BTreeMap<String, Self>) -> Self {
        Self {
            key_field,
            children,
        }
    }

    /// Returns the nested node for `attribute`, if declared.
    #[must_use]
    pub fn child(&self, attribute: &str) -> Option<&Self> {
        self.children.get(attribute)
    }
}

impl From<&AttributeDefinition> for SchemaNode {
    fn from(definition: &AttributeDefinition) -> Self {
        match definition {
            AttributeDefinition::SimpleKey(field) => Self::keyed(field.clone()),
            AttributeDefinition::Hashed => Self::hashed(),
            AttributeDefinition::Composite { key_field, children } => Self::composite(
                key_field.clone(),
                children.iter().map(|(k, v)| (k.clone(), Self::from(v))).collect(),
            ),
        }
    }
}

impl SetAttributeSchema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    /// Registers a Set-type attribute for a resource type.
    pub fn insert(&mut self, resource_type: impl Into<String>, attribute: impl Into<String>, node: SchemaNode) {
        self.resources
            .entry(resource_type.into())
            .or_default()
            .insert(attribute.into(), node);
    }

    /// Registers a resource type with no Set-type attributes.
    pub fn insert_resource(&mut self, resource_type: impl Into<String>) {
        self.resources.entry(resource_type.into()).or_default();
    }

    /// Looks up the schema node for one attribute of a resource type.
    #[must_use]
    pub fn resolve(&self, resource_type: &str, attribute: &str) -> Option<&SchemaNode> {
        self.resources.get(resource_type)?.get(attribute)
    }

    /// Returns every Set-type attribute declared for a resource type.
    pub fn attributes(&self, resource_type: &str) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.resources
            .get(resource_type)
            .into_iter()
            .flat_map(|attrs| attrs.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Number of resource types in the schema.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if no resource types are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: &Value) -> (AttributeDefinition, Vec<DefinitionIssue>) {
        let mut issues = Vec::new();
        let definition = AttributeDefinition::from_value(raw, "attr", &mut issues);
        (definition, issues)
    }

    #[test]
    fn test_simple_key_definition() {
        let (def, issues) = parse(&json!("name"));
        assert_eq!(def, AttributeDefinition::SimpleKey(String::from("name")));
        assert_eq!(SchemaNode::from(&def), SchemaNode::keyed("name"));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_null_definition_is_hashed() {
        let (def, _) = parse(&Value::Null);
        assert_eq!(SchemaNode::from(&def), SchemaNode::hashed());
    }

    #[test]
    fn test_composite_definition() {
        let raw = json!({
            "_key": "name",
            "rewrite_rule": {
                "_key": "name",
                "condition": "variable"
            },
            "tags": null
        });
        let (def, issues) = parse(&raw);
        let node = SchemaNode::from(&def);

        assert!(issues.is_empty());
        assert_eq!(node.key_field.as_deref(), Some("name"));
        assert_eq!(node.children.len(), 2);

        let rule = node.child("rewrite_rule").unwrap();
        assert_eq!(rule.key_field.as_deref(), Some("name"));
        assert_eq!(rule.child("condition"), Some(&SchemaNode::keyed("variable")));
        assert_eq!(node.child("tags"), Some(&SchemaNode::hashed()));
    }

    #[test]
    fn test_composite_without_key_marker() {
        let (def, _) = parse(&json!({ "rule": "name" }));
        let node = SchemaNode::from(&def);
        assert!(node.key_field.is_none());
        assert!(node.child("rule").is_some());
    }

    #[test]
    fn test_malformed_shapes_degrade_to_hashed() {
        for raw in [json!(42), json!(["name"])] {
            let (def, issues) = parse(&raw);
            assert_eq!(def, AttributeDefinition::Hashed);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].location, "attr");
        }
    }

    #[test]
    fn test_malformed_child_keeps_parent_and_siblings() {
        let raw = json!({ "_key": "name", "rewrite_rule": "name", "bad": 7 });
        let (def, issues) = parse(&raw);
        let node = SchemaNode::from(&def);

        assert_eq!(node.key_field.as_deref(), Some("name"));
        assert_eq!(node.child("rewrite_rule"), Some(&SchemaNode::keyed("name")));
        assert_eq!(node.child("bad"), Some(&SchemaNode::hashed()));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "attr.bad");
    }

    #[test]
    fn test_bad_key_marker_keeps_children() {
        let (def, issues) = parse(&json!({ "_key": true, "rule": "name" }));
        let node = SchemaNode::from(&def);

        assert!(node.key_field.is_none());
        assert_eq!(node.child("rule"), Some(&SchemaNode::keyed("name")));
        assert_eq!(issues[0].location, "attr._key");
    }

    #[test]
    fn test_resolve() {
        let mut schema = SetAttributeSchema::new();
        schema.insert("azurerm_network_security_group", "security_rule", SchemaNode::keyed("name"));

        assert!(schema.resolve("azurerm_network_security_group", "security_rule").is_some());
        assert!(schema.resolve("azurerm_network_security_group", "tags").is_none());
        assert!(schema.resolve("azurerm_route_table", "route").is_none());
        assert_eq!(schema.attributes("azurerm_network_security_group").count(), 1);
        assert_eq!(schema.attributes("azurerm_route_table").count(), 0);
    }
}
