//! Query Builder - Core builder implementation

use std::sync::Arc;

use super::pagination::Pagination;
use super::types::*;
use crate::model::ModelSchema;
use crate::sql::escape_identifier;

/// Query builder for one model's table.
///
/// Every clause lives in its own slot; calling a clause method again
/// replaces the slot. Rendering always emits action, joins, set, where,
/// order, limit and offset in that order.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) schema: Arc<ModelSchema>,
    pub(crate) action: Option<QueryAction>,
    pub(crate) joins: Option<String>,
    pub(crate) set: Option<SetClause>,
    pub(crate) where_clause: Option<WhereClause>,
    pub(crate) order_by: Vec<OrderClause>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) pagination: Option<Pagination>,
    pub(crate) eager_loading: Vec<String>,
    pub(crate) all_rows: bool,
}

impl QueryBuilder {
    /// Create a new query builder for `schema`
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        Self {
            schema,
            action: None,
            joins: None,
            set: None,
            where_clause: None,
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            pagination: None,
            eager_loading: Vec::new(),
            all_rows: false,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Backticked table name
    pub fn table_name(&self) -> String {
        escape_identifier(self.schema.table())
    }

    /// `SELECT SQL_CALC_FOUND_ROWS <columns> FROM <table>`
    pub fn select(mut self, columns: &str) -> Self {
        self.action = Some(QueryAction::Select {
            columns: columns.to_string(),
        });
        self
    }

    /// Literal JOIN text, inserted as given
    pub fn joins(mut self, joins: &str) -> Self {
        self.joins = Some(joins.to_string());
        self
    }

    /// Has-many relations to load after [`fetch_all`](QueryBuilder::fetch_all)
    pub fn with<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eager_loading = relations.into_iter().map(Into::into).collect();
        self
    }

    /// Allow update and delete to run without a where clause
    pub fn all_rows(mut self) -> Self {
        self.all_rows = true;
        self
    }

    pub fn action(&self) -> Option<&QueryAction> {
        self.action.as_ref()
    }

    pub fn has_where(&self) -> bool {
        self.where_clause.is_some()
    }
}
