//! Query Builder ORDER BY operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::error::OrmResult;

impl QueryBuilder {
    /// Replace the ordering with `(attribute, direction)` pairs
    pub fn order<I, K>(mut self, terms: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = (K, OrderDirection)>,
        K: AsRef<str>,
    {
        let mut order_by = Vec::new();
        for (attribute, direction) in terms {
            let logical = self.schema.require_attribute(attribute.as_ref())?;
            let column = self
                .schema
                .attributes()
                .column(logical)
                .unwrap_or(logical)
                .to_string();
            order_by.push(OrderClause { column, direction });
        }
        self.order_by = order_by;
        Ok(self)
    }

    /// Ascending order on a single attribute
    pub fn order_by(self, attribute: &str) -> OrmResult<Self> {
        self.order([(attribute, OrderDirection::Asc)])
    }

    /// Descending order on a single attribute
    pub fn order_by_desc(self, attribute: &str) -> OrmResult<Self> {
        self.order([(attribute, OrderDirection::Desc)])
    }
}
