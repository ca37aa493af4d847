//! Length validator for textual values

use super::as_text;
use crate::traits::ValidationRule;
use serde_json::Value;

/// Validator for character-length constraints
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    /// Minimum length (inclusive)
    pub min: Option<usize>,
    /// Maximum length (inclusive)
    pub max: Option<usize>,
    /// Message when shorter than `min`
    pub too_short: Option<String>,
    /// Message when longer than `max`
    pub too_long: Option<String>,
}

impl LengthValidator {
    /// Create a new length validator with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum length constraint
    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// Set maximum length constraint
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Get the length of a value (Unicode-aware)
    fn get_length(value: &Value) -> Option<usize> {
        match value {
            Value::Array(arr) => Some(arr.len()),
            other => as_text(other).map(|text| text.chars().count()),
        }
    }
}

impl ValidationRule for LengthValidator {
    fn check(&self, value: &Value) -> Result<(), String> {
        let Some(length) = Self::get_length(value) else {
            return Ok(());
        };

        if let Some(min) = self.min {
            if length < min {
                return Err(self
                    .too_short
                    .clone()
                    .unwrap_or_else(|| format!("must be at least {} characters long", min)));
            }
        }

        if let Some(max) = self.max {
            if length > max {
                return Err(self
                    .too_long
                    .clone()
                    .unwrap_or_else(|| format!("must be at most {} characters long", max)));
            }
        }

        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_min_then_max() {
        let validator = LengthValidator::new().min(4).max(6);
        assert_eq!(
            validator.check(&json!("abc")),
            Err("must be at least 4 characters long".to_string())
        );
        assert!(validator.check(&json!("abcd")).is_ok());
        assert_eq!(
            validator.check(&json!("abcdefg")),
            Err("must be at most 6 characters long".to_string())
        );
    }

    #[test]
    fn test_length_counts_characters() {
        let validator = LengthValidator::new().max(5);
        assert!(validator.check(&json!("héllo")).is_ok());
    }

    #[test]
    fn test_custom_messages() {
        let validator = LengthValidator {
            min: Some(6),
            max: None,
            too_short: Some("Password is too short".to_string()),
            too_long: None,
        };
        assert_eq!(
            validator.check(&json!("12345")),
            Err("Password is too short".to_string())
        );
    }
}
