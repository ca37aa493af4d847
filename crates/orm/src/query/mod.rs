//! Query Builder Module - clause slots rendered into MySQL statements and run
//! through a [`Session`](crate::Session)

pub mod builder;
pub mod dml;
pub mod execution;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use execution::Collection;
pub use pagination::Pagination;
pub use types::{OrderDirection, QueryAction, QueryOperator};
