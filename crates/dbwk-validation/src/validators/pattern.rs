//! Pattern-based validator using regular expressions

use super::as_text;
use crate::traits::ValidationRule;
use regex::Regex;
use serde_json::Value;

/// Validator for custom regular expression masks.
///
/// The mask is searched for anywhere in the value; anchor it with `^`/`$`
/// to require a full match.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    /// The regular expression pattern
    pattern: Regex,
    /// Custom error message
    pub message: Option<String>,
}

impl PatternValidator {
    /// Create a new pattern validator
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::from_regex(Regex::new(pattern)?))
    }

    /// Create a validator from an existing Regex
    pub fn from_regex(regex: Regex) -> Self {
        Self {
            pattern: regex,
            message: None,
        }
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Get the pattern string
    pub fn pattern_string(&self) -> &str {
        self.pattern.as_str()
    }
}

impl ValidationRule for PatternValidator {
    fn check(&self, value: &Value) -> Result<(), String> {
        let matched = as_text(value).is_some_and(|text| self.pattern.is_match(&text));
        if matched {
            Ok(())
        } else {
            Err(self
                .message
                .clone()
                .unwrap_or_else(|| "does not match the required pattern".to_string()))
        }
    }

    fn rule_name(&self) -> &'static str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pattern_searches_whole_value() {
        let validator = PatternValidator::new("[0-9]{3}").unwrap();
        assert!(validator.check(&json!("abc123def")).is_ok());
        assert!(validator.check(&json!(4567)).is_ok());
        assert!(validator.check(&json!("12")).is_err());
    }

    #[test]
    fn test_anchored_pattern_with_message() {
        let validator = PatternValidator::new("^[a-z-]+$")
            .unwrap()
            .message("Alias may only contain lowercase letters and dashes");
        assert!(validator.check(&json!("hello-world")).is_ok());
        assert_eq!(
            validator.check(&json!("Hello World")),
            Err("Alias may only contain lowercase letters and dashes".to_string())
        );
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PatternValidator::new("([a-z]").is_err());
    }
}
