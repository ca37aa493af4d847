//! # dbwk-orm: ActiveRecord models over MySQL
//!
//! Models are described at runtime by a [`ModelSchema`] (attribute to column
//! mapping, defaults, validation rules, has-many relations, nested attribute
//! and attachment relations) and collected in a [`ModelRegistry`]. A
//! [`Session`] owns one connection plus the registry, and every query and
//! save runs through it.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dbwk_orm::{DatabaseConfig, ModelRegistry, ModelSchema, Session};
//!
//! # async fn run() -> dbwk_orm::OrmResult<()> {
//! let mut registry = ModelRegistry::new();
//! registry.register(
//!     ModelSchema::builder("Category", "categories")
//!         .attribute("id", "id")
//!         .attribute("name", "Name")
//!         .build()?,
//! )?;
//!
//! let mut session = Session::connect(DatabaseConfig::from_env()?, Arc::new(registry)).await?;
//! let categories = session
//!     .query("Category")?
//!     .select("*")
//!     .order_by("name")?
//!     .paginate(1, 20)
//!     .fetch_all(&mut session)
//!     .await?;
//! println!("{}", categories.len());
//! # Ok(())
//! # }
//! ```

pub mod attachments;
pub mod backends;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod session;
pub mod sql;


pub use attachments::{AttachmentStore, LocalAttachmentStore, UploadedFile};
pub use backends::{
    DatabaseConnection, DatabaseValue, ExecResult, MySqlBackendConnection, Params, Row,
    ScriptedConnection, StatementLog,
};
pub use config::{ConfigError, DatabaseConfig};
pub use error::{ModelError, ModelResult, OrmResult};
pub use logging::{init_logging, LoggingConfig};
pub use model::{JsonMap, Model, ModelRegistry, ModelSchema, ModelSchemaBuilder, SaveOutcome};
pub use query::{Collection, OrderDirection, Pagination, QueryBuilder, QueryOperator};
pub use session::Session;

pub use dbwk_validation::{Rule, ValidationErrors, ValueKind};
