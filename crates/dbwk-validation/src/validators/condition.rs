//! Precomputed boolean condition

use crate::traits::ValidationRule;
use serde_json::Value;

/// Fails when a condition evaluated by the caller does not hold
#[derive(Debug, Clone)]
pub struct ConditionValidator {
    pub holds: bool,
    pub message: Option<String>,
}

impl ConditionValidator {
    pub fn new(holds: bool) -> Self {
        Self {
            holds,
            message: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ValidationRule for ConditionValidator {
    fn check(&self, _value: &Value) -> Result<(), String> {
        if self.holds {
            Ok(())
        } else {
            Err(self
                .message
                .clone()
                .unwrap_or_else(|| "condition is not met".to_string()))
        }
    }

    fn rule_name(&self) -> &'static str {
        "condition"
    }
}
