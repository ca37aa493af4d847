//! Database Backend Abstractions
//!
//! The [`DatabaseConnection`] trait the query builder executes against, a
//! MySQL implementation on top of sqlx and a scripted in-memory one.

pub mod core;
pub mod mysql;
pub mod scripted;

// Re-export core traits and types
pub use core::*;
pub use mysql::MySqlBackendConnection;
pub use scripted::{ScriptedConnection, Statement, StatementLog};
