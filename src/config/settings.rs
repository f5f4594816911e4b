//! Run-wide analyzer settings.
//!
//! Built once from the command line (plus environment overrides) and then
//! only read. Every component that depends on a setting receives it
//! explicitly.

use tracing::debug;

/// Resource type prefix analyzed when none is configured.
pub const DEFAULT_PROVIDER_PREFIX: &str = "azurerm_";

/// Environment variable enabling case-insensitive comparison.
pub const ENV_IGNORE_CASE: &str = "TF_SET_DIFF_IGNORE_CASE";

/// Immutable analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerSettings {
    /// Compare strings case-insensitively.
    pub ignore_case: bool,
    /// Only resource types starting with this prefix are analyzed.
    pub provider_prefix: String,
    /// If non-empty, a resource type must contain one of these substrings.
    pub include: Vec<String>,
    /// Resource types containing any of these substrings are skipped.
    pub exclude: Vec<String>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            ignore_case: false,
            provider_prefix: String::from(DEFAULT_PROVIDER_PREFIX),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl AnalyzerSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables case-insensitive comparison.
    #[must_use]
    pub const fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Sets the governed resource type prefix.
    #[must_use]
    pub fn with_provider_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.provider_prefix = prefix.into();
        self
    }

    /// Sets the include filters.
    #[must_use]
    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    /// Sets the exclude filters.
    #[must_use]
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Applies environment variable overrides.
    ///
    /// `TF_SET_DIFF_IGNORE_CASE` accepts `1`, `true` or `yes`.
    #[must_use]
    pub fn apply_env_overrides(self) -> Self {
        match std::env::var(ENV_IGNORE_CASE) {
            Ok(value) if is_truthy(&value) => {
                debug!("Enabling ignore_case from environment");
                self.with_ignore_case(true)
            }
            _ => self,
        }
    }

    /// Returns true if resources of this type should be analyzed.
    #[must_use]
    pub fn governs(&self, resource_type: &str) -> bool {
        if !resource_type.starts_with(&self.provider_prefix) {
            return false;
        }
        if !self.include.is_empty() && !self.include.iter().any(|p| resource_type.contains(p.as_str())) {
            return false;
        }
        !self.exclude.iter().any(|p| resource_type.contains(p.as_str()))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
