//! Validation error sets

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// One entry of an error set: a message for a plain attribute, or the
/// complete error set of a child record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorEntry {
    Message(String),
    Nested(ValidationErrors),
}

impl ErrorEntry {
    /// Number of leaf messages under this entry
    pub fn total_errors(&self) -> usize {
        match self {
            ErrorEntry::Message(_) => 1,
            ErrorEntry::Nested(errors) => errors.total_errors(),
        }
    }
}

/// Error set keyed by attribute name or `<relation>_attributes`.
///
/// Entries keep insertion order. An empty set means the record is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Error)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: IndexMap<String, ErrorEntry>,
}

impl ValidationErrors {
    /// Create a new empty validation errors collection
    pub fn new() -> Self {
        Self {
            errors: IndexMap::new(),
        }
    }

    /// Record a message for a field, replacing any previous entry
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .insert(field.into(), ErrorEntry::Message(message.into()));
    }

    /// Record the error set of a child record under `field`
    pub fn add_nested(&mut self, field: impl Into<String>, errors: ValidationErrors) {
        if errors.is_empty() {
            return;
        }
        let field = field.into();
        match self.errors.get_mut(&field) {
            Some(ErrorEntry::Nested(existing)) => existing.merge(errors),
            _ => {
                self.errors.insert(field, ErrorEntry::Nested(errors));
            }
        }
    }

    /// Check if there are any validation errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of fields with errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Get total number of leaf messages, nested sets included
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(ErrorEntry::total_errors).sum()
    }

    pub fn get(&self, field: &str) -> Option<&ErrorEntry> {
        self.errors.get(field)
    }

    /// Message recorded for a plain field
    pub fn message(&self, field: &str) -> Option<&str> {
        match self.errors.get(field) {
            Some(ErrorEntry::Message(message)) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Nested error set recorded for a relation key
    pub fn nested(&self, field: &str) -> Option<&ValidationErrors> {
        match self.errors.get(field) {
            Some(ErrorEntry::Nested(errors)) => Some(errors),
            _ => None,
        }
    }

    /// Check if a specific field has errors
    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ErrorEntry)> {
        self.errors.iter()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Merge another set into this one; plain messages from `other` win
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, entry) in other.errors {
            match entry {
                ErrorEntry::Message(message) => self.add_error(field, message),
                ErrorEntry::Nested(nested) => self.add_nested(field, nested),
            }
        }
    }

    /// Convert to a JSON-serializable format for API responses
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": "validation_failed",
                "message": "Validation failed",
                "fields": self
            }
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "No validation errors");
        }
        write!(f, "Validation failed for {} field(s):", self.errors.len())?;
        for (field, entry) in &self.errors {
            match entry {
                ErrorEntry::Message(message) => write!(f, "\n  {}: {}", field, message)?,
                ErrorEntry::Nested(nested) => {
                    write!(f, "\n  {}: {} nested error(s)", field, nested.total_errors())?
                }
            }
        }
        Ok(())
    }
}
