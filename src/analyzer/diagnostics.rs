//! Advisory warnings collected during a run.
//!
//! Warnings never change how a change is classified. They are gathered in an
//! explicit [`Diagnostics`] sink owned by the caller and attached to the
//! final summary.

use serde::{Serialize, Serializer};
use std::path::PathBuf;
use tracing::warn;

/// Which snapshot of a comparison a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The state before the change.
    Before,
    /// The state after the change.
    After,
}

/// A non-fatal condition found while loading or analyzing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisWarning {
    /// The requested schema file does not exist.
    SchemaFileMissing {
        /// Path that was looked up.
        path: PathBuf,
    },
    /// A schema entry has an unsupported shape and was degraded.
    MalformedSchemaEntry {
        /// `resource_type` or `resource_type.attribute`.
        location: String,
        /// What was wrong with it.
        reason: String,
    },
    /// Two elements on one side of a comparison produced the same key.
    DuplicateKey {
        /// Element key.
        key: String,
        /// Side holding the duplicate.
        side: Side,
        /// Dotted attribute path.
        path: String,
    },
    /// A Set-type attribute holds sensitive values.
    SensitiveAttribute {
        /// Resource address.
        address: String,
        /// Attribute name.
        attribute: String,
    },
    /// A Set-type attribute is entirely unknown until apply.
    UnknownAfterApply {
        /// Resource address.
        address: String,
        /// Attribute name.
        attribute: String,
    },
}

/// Sink for warnings produced during one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<AnalysisWarning>,
}

impl Diagnostics {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Records a warning and logs it.
    pub fn push(&mut self, warning: AnalysisWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Recorded warnings in the order they were raised.
    #[must_use]
    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    /// Number of recorded warnings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consumes the sink, returning its warnings.
    #[must_use]
    pub fn into_warnings(self) -> Vec<AnalysisWarning> {
        self.warnings
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

impl std::fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaFileMissing { path } => {
                write!(f, "Attributes file not found: {}", path.display())
            }
            Self::MalformedSchemaEntry { location, reason } => {
                write!(f, "Ignoring malformed schema entry '{location}': {reason}")
            }
            Self::DuplicateKey { key, side, path } => {
                write!(f, "Duplicate key '{key}' in {side} state for {path}")
            }
            Self::SensitiveAttribute { address, attribute } => write!(
                f,
                "Attribute '{attribute}' in {address} contains sensitive values (comparison may be incomplete)"
            ),
            Self::UnknownAfterApply { address, attribute } => write!(
                f,
                "Attribute '{attribute}' in {address} is unknown until apply (Set comparison skipped)"
            ),
        }
    }
}

impl Serialize for AnalysisWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
