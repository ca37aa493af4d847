//! # Structured Logging
//!
//! Statements are logged at debug level under the `dbwk::sql` target before
//! they run. Nothing here is required: without an installed subscriber the
//! events are simply dropped.

use serde_json::{json, Value};
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target used for rendered statements and their parameters
pub const SQL_TARGET: &str = "dbwk::sql";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// JSON structured output instead of plain text
    pub json_format: bool,
    pub pretty_print: bool,
    /// Fields included in the initialization event
    pub global_fields: serde_json::Map<String, Value>,
    /// Filter directives such as "dbwk=debug,sqlx=warn"
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_print: true,
            global_fields: serde_json::Map::new(),
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            pretty_print: false,
            global_fields: env_fields("production"),
            env_filter: Some("dbwk=info,sqlx=warn".to_string()),
        }
    }

    /// Every statement is logged with its parameters
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            pretty_print: true,
            global_fields: env_fields("development"),
            env_filter: Some("dbwk=debug,sqlx=info".to_string()),
        }
    }

    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            json_format: false,
            pretty_print: false,
            global_fields: env_fields("test"),
            env_filter: Some("dbwk=error".to_string()),
        }
    }

    /// Start from a plain level, e.g. [`DatabaseConfig::log_level`](crate::DatabaseConfig)
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self.env_filter = None;
        self
    }

    pub fn with_global_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.global_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directives in effect when `RUST_LOG` is not set
    pub fn filter_directives(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

fn env_fields(env: &str) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("env".to_string(), json!(env));
    fields
}

/// Install a global subscriber. Fails when one is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directives()))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).json())
            .try_init()?;
    } else if config.pretty_print {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).pretty())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init()?;
    }

    let mut init_msg = json!({
        "message": "Structured logging initialized",
        "level": config.level,
        "json_format": config.json_format,
    });
    for (key, value) in config.global_fields {
        init_msg[key] = value;
    }
    tracing::info!(target: "dbwk::logging", "{}", init_msg);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(LoggingConfig::production().json_format);
        assert_eq!(LoggingConfig::development().level, "debug");
        assert_eq!(
            LoggingConfig::test().global_fields.get("env"),
            Some(&json!("test"))
        );
    }

    #[test]
    fn test_filter_directives() {
        let config = LoggingConfig::development();
        assert_eq!(config.filter_directives(), "dbwk=debug,sqlx=info");

        let config = config.with_level("warn");
        assert_eq!(config.filter_directives(), "warn");
    }
}
