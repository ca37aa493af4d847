//! Error types for the ORM system
//!
//! Storage, query-building and configuration failures. Validation failures
//! are not errors here: they live on the model and surface through
//! [`SaveOutcome::Invalid`](crate::model::SaveOutcome).

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Model not found in database
    NotFound(String),
    /// Primary key is missing or invalid
    MissingPrimaryKey,
    /// Attribute is not declared on the model
    UnknownAttribute { model: String, attribute: String },
    /// Relation is not declared on the model
    UnknownRelation { model: String, relation: String },
    /// Model name is not registered
    UnknownModel(String),
    /// Update or delete without a where clause or `all_rows()`
    UnscopedMutation(String),
    /// Query building error
    Query(String),
    /// Connection error
    Connection(String),
    /// Transaction error
    Transaction(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Configuration error
    Configuration(String),
    /// Attachment storage error
    Attachment(String),
}

impl ModelError {
    /// HTTP-style status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            ModelError::NotFound(_) => 404,
            _ => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound(_))
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(table) => write!(f, "Record not found in table '{}'", table),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::UnknownAttribute { model, attribute } => {
                write!(f, "Unknown attribute '{}' on model '{}'", attribute, model)
            }
            ModelError::UnknownRelation { model, relation } => {
                write!(f, "Unknown relation '{}' on model '{}'", relation, model)
            }
            ModelError::UnknownModel(name) => write!(f, "Model '{}' is not registered", name),
            ModelError::UnscopedMutation(table) => write!(
                f,
                "Refusing to modify every row of '{}' without a where clause; call all_rows() to confirm",
                table
            ),
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ModelError::Transaction(msg) => write!(f, "Transaction error: {}", msg),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::Attachment(msg) => write!(f, "Attachment error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ModelError::NotFound("row".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ModelError::Connection(err.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Attachment(err.to_string())
    }
}

impl From<crate::config::ConfigError> for ModelError {
    fn from(err: crate::config::ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ModelError::NotFound("articles".into()).status_code(), 404);
        assert_eq!(ModelError::Database("gone".into()).status_code(), 500);
        assert_eq!(ModelError::MissingPrimaryKey.status_code(), 500);
    }

    #[test]
    fn test_display() {
        let err = ModelError::UnknownAttribute {
            model: "Article".into(),
            attribute: "nope".into(),
        };
        assert_eq!(err.to_string(), "Unknown attribute 'nope' on model 'Article'");
        assert_eq!(
            ModelError::NotFound("articles".into()).to_string(),
            "Record not found in table 'articles'"
        );
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let err: ModelError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }
}
