//! Numeric range validator

use super::as_number;
use crate::traits::ValidationRule;
use serde_json::Value;

/// Validator for an inclusive numeric range.
///
/// A value that is not numeric at all is reported as out of range.
#[derive(Debug, Clone, Default)]
pub struct NumericValidator {
    /// Minimum value (inclusive)
    pub min: Option<f64>,
    /// Maximum value (inclusive)
    pub max: Option<f64>,
    /// Custom error message
    pub message: Option<String>,
}

impl NumericValidator {
    /// Create a new numeric validator with no bounds
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum value constraint
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set maximum value constraint
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn out_of_range(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
            (Some(min), None) => format!("must be at least {}", min),
            (None, Some(max)) => format!("must be at most {}", max),
            (None, None) => "is out of range".to_string(),
        }
    }
}

impl ValidationRule for NumericValidator {
    fn check(&self, value: &Value) -> Result<(), String> {
        if self.min.is_none() && self.max.is_none() {
            return Ok(());
        }
        let Some(number) = as_number(value) else {
            return Err(self.out_of_range());
        };
        if self.min.is_some_and(|min| number < min) {
            return Err(self.out_of_range());
        }
        if self.max.is_some_and(|max| number > max) {
            return Err(self.out_of_range());
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "numeric"
    }
}
