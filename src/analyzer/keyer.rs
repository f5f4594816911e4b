//! Element identity for Set matching.
//!
//! An element is matched across snapshots by its key field when the schema
//! declares one, or by a SHA-256 digest of its canonical encoding otherwise.
//! The canonical encoding sorts object fields at every depth, so field
//! insertion order never affects the key.

use serde::{Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::SchemaNode;

use super::normalize::Normalizer;

/// Number of hex characters shown when displaying a hashed key.
const SHORT_HASH_LEN: usize = 8;

/// Identity of one element of a Set-type attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKey {
    /// Normalized value of the declared key field.
    Field(String),
    /// Hex SHA-256 digest of the element's canonical encoding.
    Hashed(String),
}

impl ElementKey {
    /// Returns true if the key came from the content hash fallback.
    #[must_use]
    pub const fn is_hashed(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }
}

impl std::fmt::Display for ElementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(value) => write!(f, "{value}"),
            Self::Hashed(digest) => {
                let short: String = digest.chars().take(SHORT_HASH_LEN).collect();
                write!(f, "(element {short})")
            }
        }
    }
}

impl Serialize for ElementKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Derives [`ElementKey`]s for elements of one attribute.
#[derive(Debug, Clone, Copy)]
pub struct ElementKeyer<'a> {
    node: &'a SchemaNode,
    normalizer: Normalizer,
}

impl<'a> ElementKeyer<'a> {
    /// Creates a keyer for elements described by `node`.
    #[must_use]
    pub const fn new(node: &'a SchemaNode, normalizer: Normalizer) -> Self {
        Self { node, normalizer }
    }

    /// Returns the identity of `element`.
    ///
    /// Falls back to the content hash when no key field is declared, the
    /// element lacks it, or its value normalizes to `null`.
    #[must_use]
    pub fn key_of(&self, element: &Value) -> ElementKey {
        let field_value = self
            .node
            .key_field
            .as_deref()
            .and_then(|field| element.get(field))
            .map(|v| self.normalizer.normalize(v))
            .filter(|v| !v.is_null());

        match field_value {
            Some(Value::String(s)) => ElementKey::Field(s),
            Some(other) => ElementKey::Field(canonical_json(&other)),
            None => ElementKey::Hashed(content_hash(element)),
        }
    }
}

/// Hex SHA-256 digest of the canonical encoding of `value`.
#[must_use]
pub fn content_hash(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    hex::encode(hasher.finalize())
}

/// Serializes `value` as compact JSON with object fields sorted by name.
///
/// Relies on `serde_json::Map` being key-ordered, which holds as long as the
/// `preserve_order` feature stays disabled.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    value.to_string()
}
