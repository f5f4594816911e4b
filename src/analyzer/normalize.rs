//! Value canonicalization for equality checks.
//!
//! Terraform plans carry representation noise that has nothing to do with
//! ordering: `""` versus `null`, `[]` versus absent, `80.0` versus `80`.
//! [`Normalizer::normalize`] folds all of these to one form so that
//! [`Normalizer::equivalent`] only reports real differences.

use serde_json::{Map, Number, Value};

/// Canonicalizes values for comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    /// Fold strings to lowercase.
    ignore_case: bool,
}

impl Normalizer {
    /// Creates a normalizer.
    #[must_use]
    pub const fn new(ignore_case: bool) -> Self {
        Self { ignore_case }
    }

    /// Returns true if strings are compared case-insensitively.
    #[must_use]
    pub const fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Returns the canonical form of `value`.
    ///
    /// - `""` and `[]` become `null`
    /// - floats with no fractional part become integers
    /// - strings are lowercased in case-insensitive mode
    /// - object fields that normalize to `null` are dropped
    ///
    /// Applying it twice gives the same result as applying it once.
    #[must_use]
    pub fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::String(s) if s.is_empty() => Value::Null,
            Value::String(s) if self.ignore_case => Value::String(s.to_lowercase()),
            Value::Array(items) if items.is_empty() => Value::Null,
            Value::Array(items) => Value::Array(items.iter().map(|v| self.normalize(v)).collect()),
            Value::Object(fields) => {
                let normalized: Map<String, Value> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.normalize(v)))
                    .filter(|(_, v)| !v.is_null())
                    .collect();
                Value::Object(normalized)
            }
            Value::Number(n) => Value::Number(fold_integral(n)),
            other => other.clone(),
        }
    }

    /// Returns true if both values normalize to the same form.
    #[must_use]
    pub fn equivalent(&self, a: &Value, b: &Value) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    /// Normalizes an optional field value, treating absence as `null`.
    #[must_use]
    pub fn normalize_field(&self, value: Option<&Value>) -> Value {
        value.map_or(Value::Null, |v| self.normalize(v))
    }
}

/// Converts an integral float to the equivalent integer.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn fold_integral(n: &Number) -> Number {
    if !n.is_f64() {
        return n.clone();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}
