//! Rule builder: every check one attribute must pass

use crate::traits::ValidationRule;
use crate::validators::*;
use serde_json::Value;

/// Declarative rule for a single attribute.
///
/// Checks run in a fixed order and stop at the first failure: presence,
/// type, pattern, condition, numeric range, then length. Everything after
/// presence is skipped for an empty value.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    required: bool,
    presence: RequiredValidator,
    kind: KindValidator,
    pattern: Option<PatternValidator>,
    pattern_message: Option<String>,
    condition: Option<ConditionValidator>,
    condition_message: Option<String>,
    range: NumericValidator,
    length: LengthValidator,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn error_empty(mut self, message: impl Into<String>) -> Self {
        self.presence = RequiredValidator::with_message(message);
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind.kind = Some(kind);
        self
    }

    pub fn error_type(mut self, message: impl Into<String>) -> Self {
        self.kind.message = Some(message.into());
        self
    }

    /// Require the value to equal `password`, implies [`ValueKind::PasswordConfirmation`]
    pub fn confirms(mut self, password: impl Into<String>) -> Self {
        self.kind.kind = Some(ValueKind::PasswordConfirmation);
        self.kind.password = Some(password.into());
        self
    }

    pub fn error_password_not_eq(mut self, message: impl Into<String>) -> Self {
        self.kind.password_message = Some(message.into());
        self
    }

    /// Regular expression the value must contain a match for
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        let mut validator = PatternValidator::new(pattern)?;
        validator.message = self.pattern_message.clone();
        self.pattern = Some(validator);
        Ok(self)
    }

    pub fn error_pattern(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if let Some(pattern) = self.pattern.as_mut() {
            pattern.message = Some(message.clone());
        }
        self.pattern_message = Some(message);
        self
    }

    /// Condition evaluated by the caller, typically against other attributes
    pub fn condition(mut self, holds: bool) -> Self {
        let mut validator = ConditionValidator::new(holds);
        validator.message = self.condition_message.clone();
        self.condition = Some(validator);
        self
    }

    pub fn error_condition(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if let Some(condition) = self.condition.as_mut() {
            condition.message = Some(message.clone());
        }
        self.condition_message = Some(message);
        self
    }

    pub fn value_min(mut self, min: f64) -> Self {
        self.range.min = Some(min);
        self
    }

    pub fn value_max(mut self, max: f64) -> Self {
        self.range.max = Some(max);
        self
    }

    pub fn error_outofrange(mut self, message: impl Into<String>) -> Self {
        self.range.message = Some(message.into());
        self
    }

    pub fn length_min(mut self, min: usize) -> Self {
        self.length.min = Some(min);
        self
    }

    pub fn length_max(mut self, max: usize) -> Self {
        self.length.max = Some(max);
        self
    }

    pub fn error_length_lt(mut self, message: impl Into<String>) -> Self {
        self.length.too_short = Some(message.into());
        self
    }

    pub fn error_length_mt(mut self, message: impl Into<String>) -> Self {
        self.length.too_long = Some(message.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Run the rule against `value`, returning the first failure message
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        if is_empty(value) {
            if self.required {
                self.presence.check(value)?;
            }
            return Ok(());
        }

        self.kind.check(value)?;
        if let Some(pattern) = &self.pattern {
            pattern.check(value)?;
        }
        if let Some(condition) = &self.condition {
            condition.check(value)?;
        }
        self.range.check(value)?;
        self.length.check(value)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_empty_reports_configured_error_first() {
        let rule = Rule::new()
            .required(true)
            .error_empty("Title cannot be empty")
            .kind(ValueKind::Email)
            .length_min(10);

        for empty in [json!(null), json!(""), json!("   "), json!([]), json!({})] {
            assert_eq!(rule.validate(&empty), Err("Title cannot be empty".to_string()));
        }
    }

    #[test]
    fn test_required_without_message_uses_default() {
        let rule = Rule::new().required(true);
        assert_eq!(rule.validate(&json!("")), Err("can't be empty".to_string()));
    }

    #[test]
    fn test_optional_empty_value_skips_other_checks() {
        let rule = Rule::new().kind(ValueKind::Int).value_min(5.0).length_min(3);
        assert!(rule.validate(&json!(null)).is_ok());
        assert!(rule.validate(&json!("")).is_ok());
    }

    #[test]
    fn test_checks_run_in_order() {
        let rule = Rule::new()
            .kind(ValueKind::Int)
            .error_type("Must be a number")
            .pattern("^[0-9]+$")
            .unwrap()
            .error_pattern("Digits only")
            .value_max(100.0)
            .error_outofrange("Too big")
            .length_max(2)
            .error_length_mt("Too long");

        assert_eq!(rule.validate(&json!("abc")), Err("Must be a number".to_string()));
        assert_eq!(rule.validate(&json!("1.5")), Err("Digits only".to_string()));
        assert_eq!(rule.validate(&json!("101")), Err("Too big".to_string()));
        assert_eq!(rule.validate(&json!("100")), Err("Too long".to_string()));
        assert!(rule.validate(&json!(42)).is_ok());
    }

    #[test]
    fn test_error_pattern_may_precede_pattern() {
        let rule = Rule::new()
            .error_pattern("Lowercase only")
            .pattern("^[a-z]+$")
            .unwrap();
        assert_eq!(rule.validate(&json!("ABC")), Err("Lowercase only".to_string()));
    }

    #[test]
    fn test_condition_after_pattern() {
        let rule = Rule::new()
            .condition(false)
            .error_condition("Category must exist");
        assert_eq!(
            rule.validate(&json!(3)),
            Err("Category must exist".to_string())
        );
        assert!(Rule::new().condition(true).validate(&json!(3)).is_ok());
    }

    #[test]
    fn test_zero_bounds_are_honored() {
        let rule = Rule::new().value_min(0.0).error_outofrange("Negative");
        assert_eq!(rule.validate(&json!(-3)), Err("Negative".to_string()));
        assert!(rule.validate(&json!(0)).is_ok());
    }

    #[test]
    fn test_password_confirmation() {
        let rule = Rule::new()
            .confirms("hunter22")
            .error_password_not_eq("Passwords differ");
        assert!(rule.validate(&json!("hunter22")).is_ok());
        assert_eq!(
            rule.validate(&json!("hunter23")),
            Err("Passwords differ".to_string())
        );
    }

    #[test]
    fn test_length_bounds() {
        let rule = Rule::new()
            .length_min(3)
            .length_max(5)
            .error_length_lt("Too short")
            .error_length_mt("Too long");
        assert_eq!(rule.validate(&json!("ab")), Err("Too short".to_string()));
        assert_eq!(rule.validate(&json!("abcdef")), Err("Too long".to_string()));
        assert!(rule.validate(&json!("abcd")).is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(Rule::new().pattern("(unclosed").is_err());
    }
}
