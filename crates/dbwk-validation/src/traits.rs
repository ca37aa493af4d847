//! Core validation trait

use serde_json::Value;

/// A single check applied to an attribute value.
///
/// Checks are pure: they look only at the value and their own configuration
/// and report the configured (or default) message on failure.
pub trait ValidationRule: Send + Sync {
    /// Check a single value
    fn check(&self, value: &Value) -> Result<(), String>;

    /// Get the validation rule name/type
    fn rule_name(&self) -> &'static str;
}
