//! Value type checks: integers, e-mail addresses, urls, file names,
//! password confirmations and date/time strings

use super::{as_number, as_text};
use crate::traits::ValidationRule;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str =
    r"(?i)^[a-z0-9]+([_.\-][a-z0-9]+)*@([a-z0-9]+([.\-][a-z0-9]+)*)+\.[a-z]{2,}$";
const URL_PATTERN: &str = r"(?i)^https?://([a-z0-9]+([.\-][a-z0-9]+)*)+\.[a-z]{2,}(/?.*)?$";
const FILENAME_PATTERN: &str = r"^\w[\w.]+$";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Expected type of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Int,
    Email,
    Url,
    Filename,
    PasswordConfirmation,
    Time,
}

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn email_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, EMAIL_PATTERN)
}

fn url_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, URL_PATTERN)
}

fn filename_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, FILENAME_PATTERN)
}

fn text_matches(regex: Option<&Regex>, text: Option<&str>) -> bool {
    match (regex, text) {
        (Some(regex), Some(text)) => regex.is_match(text),
        _ => false,
    }
}

/// Whether `text` parses as a date or a date with time
pub fn is_parseable_time(text: &str) -> bool {
    let text = text.trim();
    if DateTime::parse_from_rfc3339(text).is_ok() {
        return true;
    }
    DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(text, format).is_ok())
}

/// Validator for the declared type of a value
#[derive(Debug, Clone, Default)]
pub struct KindValidator {
    pub kind: Option<ValueKind>,
    /// Message for a type mismatch
    pub message: Option<String>,
    /// Value a password confirmation must equal
    pub password: Option<String>,
    /// Message for a password confirmation mismatch
    pub password_message: Option<String>,
}

impl KindValidator {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Value a [`ValueKind::PasswordConfirmation`] must match
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    fn type_error(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "has an invalid format".to_string())
    }

    fn matches(&self, kind: ValueKind, value: &Value) -> bool {
        let text = as_text(value);
        let text = text.as_deref();
        match kind {
            ValueKind::Int => as_number(value).is_some(),
            ValueKind::Email => text_matches(email_regex(), text),
            ValueKind::Url => text_matches(url_regex(), text),
            ValueKind::Filename => text_matches(filename_regex(), text),
            ValueKind::Time => text.is_some_and(is_parseable_time),
            ValueKind::PasswordConfirmation => true,
        }
    }
}

impl ValidationRule for KindValidator {
    fn check(&self, value: &Value) -> Result<(), String> {
        let Some(kind) = self.kind else {
            return Ok(());
        };

        if kind == ValueKind::PasswordConfirmation {
            let confirmed = match (value.as_str(), self.password.as_deref()) {
                (Some(given), Some(expected)) => given == expected,
                _ => false,
            };
            if !confirmed {
                return Err(self
                    .password_message
                    .clone()
                    .unwrap_or_else(|| "doesn't match the password".to_string()));
            }
            return Ok(());
        }

        if self.matches(kind, value) {
            Ok(())
        } else {
            Err(self.type_error())
        }
    }

    fn rule_name(&self) -> &'static str {
        "kind"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(kind: ValueKind, value: Value) -> bool {
        KindValidator::new(kind).check(&value).is_ok()
    }

    #[test]
    fn test_int_accepts_numbers_and_numeric_strings() {
        assert!(check(ValueKind::Int, json!(42)));
        assert!(check(ValueKind::Int, json!("17")));
        assert!(check(ValueKind::Int, json!("3.5")));
        assert!(!check(ValueKind::Int, json!("seventeen")));
    }

    #[test]
    fn test_email_pattern() {
        assert!(check(ValueKind::Email, json!("john.doe@example.com")));
        assert!(check(ValueKind::Email, json!("JOHN_doe@mail.example.org")));
        assert!(!check(ValueKind::Email, json!("john@localhost")));
        assert!(!check(ValueKind::Email, json!("john..doe@example.com")));
        assert!(!check(ValueKind::Email, json!("@example.com")));
    }

    #[test]
    fn test_url_pattern() {
        assert!(check(ValueKind::Url, json!("http://example.com")));
        assert!(check(ValueKind::Url, json!("https://news.example.com/articles/17")));
        assert!(!check(ValueKind::Url, json!("ftp://example.com")));
        assert!(!check(ValueKind::Url, json!("example.com")));
    }

    #[test]
    fn test_filename_pattern() {
        assert!(check(ValueKind::Filename, json!("photo_01.jpg")));
        assert!(!check(ValueKind::Filename, json!(".htaccess")));
        assert!(!check(ValueKind::Filename, json!("../etc/passwd")));
    }

    #[test]
    fn test_time_formats() {
        assert!(check(ValueKind::Time, json!("2024-03-01")));
        assert!(check(ValueKind::Time, json!("2024-03-01 10:30")));
        assert!(check(ValueKind::Time, json!("2024-03-01T10:30:00+02:00")));
        assert!(!check(ValueKind::Time, json!("yesterday-ish")));
    }

    #[test]
    fn test_password_confirmation() {
        let validator = KindValidator::new(ValueKind::PasswordConfirmation).password("s3cret");
        assert!(validator.check(&json!("s3cret")).is_ok());

        let mut validator = validator;
        validator.password_message = Some("Passwords do not match".to_string());
        assert_eq!(
            validator.check(&json!("secret")),
            Err("Passwords do not match".to_string())
        );
    }

    #[test]
    fn test_type_error_message() {
        let validator = KindValidator::new(ValueKind::Int).message("Wrong type");
        assert_eq!(validator.check(&json!("x")), Err("Wrong type".to_string()));
    }
}
