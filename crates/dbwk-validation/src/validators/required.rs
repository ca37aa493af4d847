//! Required field validator

use super::is_empty;
use crate::traits::ValidationRule;
use serde_json::Value;

/// Validator that ensures a field is present and not empty
#[derive(Debug, Clone, Default)]
pub struct RequiredValidator {
    /// Custom error message
    pub message: Option<String>,
}

impl RequiredValidator {
    /// Create a new required validator with default message
    pub fn new() -> Self {
        Self { message: None }
    }

    /// Create a required validator with custom message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl ValidationRule for RequiredValidator {
    fn check(&self, value: &Value) -> Result<(), String> {
        if is_empty(value) {
            Err(self
                .message
                .clone()
                .unwrap_or_else(|| "can't be empty".to_string()))
        } else {
            Ok(())
        }
    }

    fn rule_name(&self) -> &'static str {
        "required"
    }
}
