//! In-memory connection that records statements and replays scripted rows.
//!
//! Useful for exercising models and queries without a server: every
//! statement is logged with its parameters, fetches answer from queued row
//! sets, and failures can be injected by SQL fragment.

use super::core::*;
use crate::error::{ModelError, OrmResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// A statement as the connection received it
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

/// Shared view of everything a [`ScriptedConnection`] has executed
#[derive(Debug, Clone, Default)]
pub struct StatementLog {
    entries: Arc<Mutex<Vec<Statement>>>,
}

impl StatementLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Statement>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, sql: &str, params: &Params) {
        self.lock().push(Statement {
            sql: sql.to_string(),
            params: params.clone(),
        });
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.lock().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.lock().iter().map(|s| s.sql.clone()).collect()
    }

    /// Number of statements whose SQL starts with `prefix`
    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.lock().iter().filter(|s| s.sql.starts_with(prefix)).count()
    }

    pub fn contains(&self, sql: &str) -> bool {
        self.lock().iter().any(|s| s.sql == sql)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

struct ScriptedRows {
    fragment: String,
    rows: Vec<Row>,
}

/// Connection double driven by a script of row sets
pub struct ScriptedConnection {
    log: StatementLog,
    scripted: Vec<ScriptedRows>,
    failures: Vec<String>,
    next_insert_id: u64,
    rows_affected: u64,
    last_found_rows: u64,
}

impl Default for ScriptedConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self {
            log: StatementLog::default(),
            scripted: Vec::new(),
            failures: Vec::new(),
            next_insert_id: 1,
            rows_affected: 1,
            last_found_rows: 0,
        }
    }

    /// Handle on the statement log, valid after the connection moves into a session
    pub fn log(&self) -> StatementLog {
        self.log.clone()
    }

    /// Queue `rows` for the next fetch whose SQL contains `fragment`.
    /// Queued sets are consumed in order; an unmatched fetch returns no rows.
    pub fn respond(mut self, fragment: impl Into<String>, rows: Vec<Row>) -> Self {
        self.scripted.push(ScriptedRows {
            fragment: fragment.into(),
            rows,
        });
        self
    }

    /// Fail every statement whose SQL contains `fragment`
    pub fn fail_on(mut self, fragment: impl Into<String>) -> Self {
        self.failures.push(fragment.into());
        self
    }

    /// First id handed out for inserts
    pub fn starting_insert_id(mut self, id: u64) -> Self {
        self.next_insert_id = id;
        self
    }

    /// Affected-row count reported for updates and deletes
    pub fn rows_affected(mut self, rows: u64) -> Self {
        self.rows_affected = rows;
        self
    }

    fn record(&self, sql: &str, params: &Params) -> OrmResult<()> {
        self.log.push(sql, params);
        match self.failures.iter().find(|fragment| sql.contains(fragment.as_str())) {
            Some(fragment) => Err(ModelError::Database(format!(
                "scripted failure for statement containing '{}'",
                fragment
            ))),
            None => Ok(()),
        }
    }

    fn take_rows(&mut self, sql: &str) -> Vec<Row> {
        if let Some(position) = self
            .scripted
            .iter()
            .position(|entry| sql.contains(entry.fragment.as_str()))
        {
            return self.scripted.remove(position).rows;
        }
        if sql.contains("FOUND_ROWS()") {
            return vec![Row::new().with("FOUND_ROWS()", self.last_found_rows)];
        }
        Vec::new()
    }

    fn fetch(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        self.record(sql, params)?;
        let rows = self.take_rows(sql);
        if sql.contains("SQL_CALC_FOUND_ROWS") {
            self.last_found_rows = rows.len() as u64;
        }
        Ok(rows)
    }
}

#[async_trait]
impl DatabaseConnection for ScriptedConnection {
    async fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<ExecResult> {
        self.record(sql, params)?;
        if sql.trim_start().starts_with("INSERT") {
            let id = self.next_insert_id;
            self.next_insert_id += 1;
            return Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: id,
            });
        }
        Ok(ExecResult {
            rows_affected: self.rows_affected,
            last_insert_id: 0,
        })
    }

    async fn fetch_all(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        self.fetch(sql, params)
    }

    async fn fetch_optional(&mut self, sql: &str, params: &Params) -> OrmResult<Option<Row>> {
        Ok(self.fetch(sql, params)?.into_iter().next())
    }

    async fn begin(&mut self) -> OrmResult<()> {
        self.record("BEGIN", &Params::new())
            .map_err(|e| ModelError::Transaction(e.to_string()))
    }

    async fn commit(&mut self) -> OrmResult<()> {
        self.record("COMMIT", &Params::new())
            .map_err(|e| ModelError::Transaction(e.to_string()))
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.record("ROLLBACK", &Params::new())
            .map_err(|e| ModelError::Transaction(e.to_string()))
    }
}
