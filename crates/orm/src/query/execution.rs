//! Query Builder execution against a session

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::builder::QueryBuilder;
use super::pagination::Pagination;
use crate::backends::{DatabaseValue, ExecResult, Params};
use crate::error::{ModelError, OrmResult};
use crate::logging::SQL_TARGET;
use crate::model::{Model, ModelSchema};
use crate::session::Session;

/// Records returned by [`QueryBuilder::fetch_all`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct Collection {
    pub records: Vec<Model>,
    /// Identities of `records`, in row order
    pub ids: Vec<DatabaseValue>,
    pub pagination: Option<Pagination>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.records.iter()
    }
}

impl IntoIterator for Collection {
    type Item = Model;
    type IntoIter = std::vec::IntoIter<Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl QueryBuilder {
    /// Render, log and run the statement
    pub async fn exec(&self, session: &mut Session) -> OrmResult<ExecResult> {
        let (sql, params) = self.prepare()?;
        session.connection().execute(&sql, &params).await
    }

    /// First matching record, if any. Without an action this selects `*`.
    pub async fn get(self, session: &mut Session) -> OrmResult<Option<Model>> {
        let query = self.with_default_select();
        let (sql, params) = query.prepare()?;
        let row = session.connection().fetch_optional(&sql, &params).await?;

        let mut records: Vec<Model> = row
            .into_iter()
            .map(|row| Model::from_row(Arc::clone(&query.schema), row))
            .collect();
        query.eager_load(&mut records, session).await?;
        Ok(records.pop())
    }

    /// Like [`get`](QueryBuilder::get), with no match as [`ModelError::NotFound`]
    pub async fn get_or_fail(self, session: &mut Session) -> OrmResult<Model> {
        let table = self.schema.table().to_string();
        self.get(session)
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("No {} record matches the query", table)))
    }

    /// `select * ... where <conditions> limit 1`
    pub async fn find_by<I, K, V>(self, conditions: I, session: &mut Session) -> OrmResult<Option<Model>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DatabaseValue>,
    {
        self.select("*")
            .where_map(conditions)?
            .limit(1)
            .get(session)
            .await
    }

    /// Every matching record, with pagination totals when
    /// [`paginate`](QueryBuilder::paginate) was used and the relations named
    /// in [`with`](QueryBuilder::with) loaded.
    pub async fn fetch_all(self, session: &mut Session) -> OrmResult<Collection> {
        let query = self.with_default_select();
        let mut records = query.fetch_models(session).await?;
        let ids: Vec<DatabaseValue> = records.iter().filter_map(|r| r.id().cloned()).collect();

        let pagination = match query.pagination {
            Some(pagination) => {
                let total = query.records_count(session).await?;
                Some(pagination.with_records_count(total))
            }
            None => None,
        };

        query.eager_load(&mut records, session).await?;

        Ok(Collection {
            records,
            ids,
            pagination,
        })
    }

    /// Rows the last select would have matched without its LIMIT
    pub async fn records_count(&self, session: &mut Session) -> OrmResult<u64> {
        let row = session
            .connection()
            .fetch_optional("SELECT FOUND_ROWS()", &Params::new())
            .await?;
        let count = match row.as_ref().map(|row| row.get_by_index(0)).transpose()? {
            Some(DatabaseValue::UInt(count)) => *count,
            Some(value) => value.as_i64().unwrap_or(0).max(0) as u64,
            None => 0,
        };
        Ok(count)
    }

    fn with_default_select(self) -> Self {
        if self.action.is_none() {
            self.select("*")
        } else {
            self
        }
    }

    fn prepare(&self) -> OrmResult<(String, Params)> {
        if let Some(action) = &self.action {
            if action.is_mutation() && self.where_clause.is_none() && !self.all_rows {
                return Err(ModelError::UnscopedMutation(self.schema.table().to_string()));
            }
        }
        let sql = self.sql();
        let params = self.params()?;
        tracing::debug!(target: SQL_TARGET, sql = %sql, params = ?params, "executing statement");
        Ok((sql, params))
    }

    async fn fetch_models(&self, session: &mut Session) -> OrmResult<Vec<Model>> {
        let (sql, params) = self.prepare()?;
        let rows = session.connection().fetch_all(&sql, &params).await?;
        Ok(rows
            .into_iter()
            .map(|row| Model::from_row(Arc::clone(&self.schema), row))
            .collect())
    }

    async fn eager_load(&self, records: &mut [Model], session: &mut Session) -> OrmResult<()> {
        for relation in &self.eager_loading {
            load_has_many(&self.schema, records, relation, session).await?;
        }
        Ok(())
    }
}

/// Load `relation` for every record with one query, then hand each parent
/// the children whose foreign key equals its id. Parents without children
/// get an empty list.
pub(crate) async fn load_has_many(
    schema: &Arc<ModelSchema>,
    records: &mut [Model],
    relation: &str,
    session: &mut Session,
) -> OrmResult<()> {
    let target = schema
        .has_many(relation)
        .ok_or_else(|| ModelError::UnknownRelation {
            model: schema.name().to_string(),
            relation: relation.to_string(),
        })?;
    let child_schema = session.registry().get(target)?;
    let foreign_key = schema.foreign_key();

    let ids: Vec<DatabaseValue> = records.iter().filter_map(|r| r.id().cloned()).collect();
    let children = if ids.is_empty() {
        Vec::new()
    } else {
        QueryBuilder::new(child_schema)
            .select("*")
            .where_map([(foreign_key.as_str(), DatabaseValue::Array(ids))])?
            .fetch_models(session)
            .await?
    };

    let mut groups: HashMap<String, Vec<Model>> = HashMap::new();
    for child in children {
        if let Some(key) = child.get(&foreign_key).and_then(DatabaseValue::identity_key) {
            groups.entry(key).or_default().push(child);
        }
    }

    for record in records.iter_mut() {
        let matching = record
            .id()
            .and_then(DatabaseValue::identity_key)
            .and_then(|key| groups.get(&key).cloned())
            .unwrap_or_default();
        record.set_related(relation, matching);
    }

    tracing::debug!(relation, parents = records.len(), "eager loaded relation");
    Ok(())
}
