//! Core Database Backend Traits
//!
//! The value model shared by the query builder and the models, result rows,
//! and the connection trait every storage backend implements.

use crate::error::{ModelError, OrmResult};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// Named statement parameters, keyed without the leading `:`
pub type Params = IndexMap<String, DatabaseValue>;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Abstract database connection trait.
///
/// Statements use named `:name` placeholders; implementations bind `params`
/// by name. Transactions are driven on the connection itself since a session
/// owns exactly one.
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Execute a statement and report affected rows and the generated id
    async fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<ExecResult>;

    /// Execute a query and return the result rows
    async fn fetch_all(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>>;

    /// Execute a query and return the first result row
    async fn fetch_optional(&mut self, sql: &str, params: &Params) -> OrmResult<Option<Row>>;

    /// Begin a transaction
    async fn begin(&mut self) -> OrmResult<()>;

    /// Commit the open transaction
    async fn commit(&mut self) -> OrmResult<()>;

    /// Roll back the open transaction
    async fn rollback(&mut self) -> OrmResult<()>;
}

/// Outcome of a statement that does not return rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Auto-increment id generated by an insert, 0 when none
    pub last_insert_id: u64,
}

/// A single result row with its columns in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, DatabaseValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, replacing an earlier column of the same name
    pub fn with(mut self, column: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    /// Get a column value by name
    pub fn get_by_name(&self, name: &str) -> OrmResult<&DatabaseValue> {
        self.columns
            .get(name)
            .ok_or_else(|| ModelError::Query(format!("Column '{}' not found", name)))
    }

    /// Get a column value by index
    pub fn get_by_index(&self, index: usize) -> OrmResult<&DatabaseValue> {
        self.columns
            .get_index(index)
            .map(|(_, value)| value)
            .ok_or_else(|| ModelError::Query(format!("Column index {} out of range", index)))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DatabaseValue)> {
        self.columns.iter()
    }

    /// Convert row to JSON value
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.columns
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    pub fn into_map(self) -> IndexMap<String, DatabaseValue> {
        self.columns
    }
}

impl FromIterator<(String, DatabaseValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, DatabaseValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(JsonValue),
    /// Only valid inside `IN (...)` lists, expanded before binding
    Array(Vec<DatabaseValue>),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DatabaseValue::Int(i) => Some(*i),
            DatabaseValue::UInt(u) => i64::try_from(*u).ok(),
            DatabaseValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            DatabaseValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used for loose equality: `7`, `7.0`, `"7"` and `"07"` differ
    /// only by representation, so they share a key. Null has none.
    pub fn identity_key(&self) -> Option<String> {
        match self {
            DatabaseValue::Null => None,
            DatabaseValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            DatabaseValue::Int(i) => Some(i.to_string()),
            DatabaseValue::UInt(u) => Some(u.to_string()),
            DatabaseValue::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                Some((*f as i64).to_string())
            }
            DatabaseValue::Float(f) => Some(f.to_string()),
            DatabaseValue::String(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<i64>() {
                    Ok(i) => Some(i.to_string()),
                    Err(_) => Some(trimmed.to_string()),
                }
            }
            other => Some(other.to_json().to_string()),
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int(i) => JsonValue::Number((*i).into()),
            DatabaseValue::UInt(u) => JsonValue::Number((*u).into()),
            DatabaseValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.format(DATETIME_FORMAT).to_string()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Time(t) => JsonValue::String(t.to_string()),
            DatabaseValue::Json(j) => j.clone(),
            DatabaseValue::Array(arr) => JsonValue::Array(arr.iter().map(|v| v.to_json()).collect()),
        }
    }

    /// Create DatabaseValue from JSON value. Strings stay strings.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DatabaseValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    DatabaseValue::UInt(u)
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => DatabaseValue::String(s),
            JsonValue::Array(arr) => {
                DatabaseValue::Array(arr.into_iter().map(DatabaseValue::from_json).collect())
            }
            JsonValue::Object(_) => DatabaseValue::Json(json),
        }
    }
}

impl serde::Serialize for DatabaseValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int(value.into())
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int(value)
    }
}

impl From<u32> for DatabaseValue {
    fn from(value: u32) -> Self {
        DatabaseValue::Int(value.into())
    }
}

impl From<u64> for DatabaseValue {
    fn from(value: u64) -> Self {
        DatabaseValue::UInt(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<NaiveDateTime> for DatabaseValue {
    fn from(value: NaiveDateTime) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<NaiveDate> for DatabaseValue {
    fn from(value: NaiveDate) -> Self {
        DatabaseValue::Date(value)
    }
}

impl From<NaiveTime> for DatabaseValue {
    fn from(value: NaiveTime) -> Self {
        DatabaseValue::Time(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::from_json(value)
    }
}

impl<T> From<Vec<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(values: Vec<T>) -> Self {
        DatabaseValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_key_loose_equality() {
        let int = DatabaseValue::Int(7);
        assert_eq!(int.identity_key(), DatabaseValue::from("7").identity_key());
        assert_eq!(int.identity_key(), DatabaseValue::UInt(7).identity_key());
        assert_eq!(int.identity_key(), DatabaseValue::Float(7.0).identity_key());
        assert_ne!(int.identity_key(), DatabaseValue::Int(8).identity_key());
        assert_eq!(DatabaseValue::Null.identity_key(), None);
    }

    #[test]
    fn test_from_json_keeps_strings() {
        assert_eq!(
            DatabaseValue::from_json(json!("2024-01-01T00:00:00Z")),
            DatabaseValue::String("2024-01-01T00:00:00Z".into())
        );
        assert_eq!(DatabaseValue::from_json(json!(3)), DatabaseValue::Int(3));
        assert_eq!(
            DatabaseValue::from_json(json!([1, "a"])),
            DatabaseValue::Array(vec![DatabaseValue::Int(1), DatabaseValue::from("a")])
        );
    }

    #[test]
    fn test_datetime_to_json() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(DatabaseValue::DateTime(dt).to_json(), json!("2024-03-01 09:05:00"));
    }

    #[test]
    fn test_row_access() {
        let row = Row::new().with("id", 1).with("title", "Hello");
        assert_eq!(row.get_by_name("title").unwrap(), &DatabaseValue::from("Hello"));
        assert_eq!(row.get_by_index(0).unwrap(), &DatabaseValue::Int(1));
        assert!(row.get_by_name("missing").is_err());
        assert_eq!(row.column_names(), vec!["id".to_string(), "title".to_string()]);
        assert_eq!(row.to_json(), json!({"id": 1, "title": "Hello"}));
    }
}
