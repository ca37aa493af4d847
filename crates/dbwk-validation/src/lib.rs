//! # dbwk-validation
//!
//! Stateless attribute validation for the dbwk model layer. A [`Rule`] bundles
//! the checks one attribute must pass; [`Rule::validate`] runs them in a fixed
//! order and reports the first failure as a message. [`ValidationErrors`]
//! collects those messages per attribute, including nested sets for child
//! records saved alongside a parent.

pub mod error;
pub mod rules;
pub mod traits;
pub mod validators;

pub use error::{ErrorEntry, ValidationErrors, ValidationResult};
pub use rules::Rule;
pub use traits::ValidationRule;
pub use validators::{
    condition::ConditionValidator,
    kind::{KindValidator, ValueKind},
    length::LengthValidator,
    numeric::NumericValidator,
    pattern::PatternValidator,
    required::RequiredValidator,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_and_errors_work_together() {
        let rule = Rule::new().required(true).error_empty("Alias cannot be empty");
        let mut errors = ValidationErrors::new();

        if let Err(message) = rule.validate(&json!("")) {
            errors.add_error("alias", message);
        }

        assert_eq!(errors.message("alias"), Some("Alias cannot be empty"));
    }
}
