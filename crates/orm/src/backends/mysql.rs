//! MySQL Backend Implementation
//!
//! Implements [`DatabaseConnection`] over a single sqlx `MySqlConnection`.
//! Named `:name` placeholders are rewritten to positional `?` markers and the
//! values bound in order of appearance.

use super::core::*;
use crate::error::{ModelError, OrmResult};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, MySql, Row as SqlxRow, TypeInfo, ValueRef};

/// MySQL connection implementation
pub struct MySqlBackendConnection {
    conn: MySqlConnection,
}

impl MySqlBackendConnection {
    /// Open a connection from a `mysql://` URL
    pub async fn connect(database_url: &str) -> OrmResult<Self> {
        let conn = MySqlConnection::connect(database_url)
            .await
            .map_err(|e| ModelError::Connection(format!("Failed to connect to MySQL: {}", e)))?;
        tracing::info!("Connected to MySQL");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: MySqlConnection) -> Self {
        Self { conn }
    }

    /// Close the connection gracefully
    pub async fn close(self) -> OrmResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| ModelError::Connection(format!("Failed to close connection: {}", e)))
    }

    async fn run_control(&mut self, statement: &str) -> OrmResult<()> {
        (&mut self.conn)
            .execute(statement)
            .await
            .map_err(|e| ModelError::Transaction(format!("{} failed: {}", statement, e)))?;
        Ok(())
    }
}

#[async_trait]
impl DatabaseConnection for MySqlBackendConnection {
    async fn execute(&mut self, sql: &str, params: &Params) -> OrmResult<ExecResult> {
        let (sql, values) = expand_named_params(sql, params)?;
        let mut query = sqlx::query(&sql);

        for value in &values {
            query = bind_database_value(query, value)?;
        }

        let result = query
            .execute(&mut self.conn)
            .await
            .map_err(|e| ModelError::Database(format!("Query execution failed: {}", e)))?;

        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    async fn fetch_all(&mut self, sql: &str, params: &Params) -> OrmResult<Vec<Row>> {
        let (sql, values) = expand_named_params(sql, params)?;
        let mut query = sqlx::query(&sql);

        for value in &values {
            query = bind_database_value(query, value)?;
        }

        let rows = query
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| ModelError::Database(format!("Query fetch failed: {}", e)))?;

        rows.iter().map(decode_row).collect()
    }

    async fn fetch_optional(&mut self, sql: &str, params: &Params) -> OrmResult<Option<Row>> {
        let (sql, values) = expand_named_params(sql, params)?;
        let mut query = sqlx::query(&sql);

        for value in &values {
            query = bind_database_value(query, value)?;
        }

        let row = query
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e| ModelError::Database(format!("Query fetch failed: {}", e)))?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn begin(&mut self) -> OrmResult<()> {
        self.run_control("START TRANSACTION").await
    }

    async fn commit(&mut self) -> OrmResult<()> {
        self.run_control("COMMIT").await
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.run_control("ROLLBACK").await
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrite `:name` placeholders to `?` and collect their values in order.
///
/// Text inside single quotes, double quotes and backticks is copied as is,
/// and `::` is never read as a placeholder. A placeholder may appear more
/// than once; its value is bound at every occurrence.
pub fn expand_named_params(sql: &str, params: &Params) -> OrmResult<(String, Vec<DatabaseValue>)> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && q != '`' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars.get(i + 1).copied().is_some_and(is_name_start) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let value = params.get(&name).ok_or_else(|| {
                    ModelError::Query(format!("Missing value for parameter ':{}'", name))
                })?;
                if let DatabaseValue::Array(_) = value {
                    return Err(ModelError::Query(format!(
                        "Parameter ':{}' is a list and must be expanded before binding",
                        name
                    )));
                }
                values.push(value.clone());
                out.push('?');
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok((out, values))
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'a>(
    query: sqlx::query::Query<'a, MySql, MySqlArguments>,
    value: &DatabaseValue,
) -> OrmResult<sqlx::query::Query<'a, MySql, MySqlArguments>> {
    match value {
        DatabaseValue::Null => Ok(query.bind(Option::<String>::None)),
        DatabaseValue::Bool(b) => Ok(query.bind(*b)),
        DatabaseValue::Int(i) => Ok(query.bind(*i)),
        DatabaseValue::UInt(u) => Ok(query.bind(*u)),
        DatabaseValue::Float(f) => Ok(query.bind(*f)),
        DatabaseValue::String(s) => Ok(query.bind(s.clone())),
        DatabaseValue::Bytes(b) => Ok(query.bind(b.clone())),
        DatabaseValue::DateTime(dt) => Ok(query.bind(*dt)),
        DatabaseValue::Date(d) => Ok(query.bind(*d)),
        DatabaseValue::Time(t) => Ok(query.bind(*t)),
        DatabaseValue::Json(j) => Ok(query.bind(j.clone())),
        DatabaseValue::Array(_) => Err(ModelError::Query(
            "Array values can only be bound inside IN lists".to_string(),
        )),
    }
}

fn decode_row(row: &MySqlRow) -> OrmResult<Row> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        decoded = decoded.with(column.name(), mysql_value_to_database_value(row, index)?);
    }
    Ok(decoded)
}

fn decode_failed(kind: &str, e: sqlx::Error) -> ModelError {
    ModelError::Database(format!("Failed to get {} value: {}", kind, e))
}

/// Convert a MySQL column value to DatabaseValue
fn mysql_value_to_database_value(row: &MySqlRow, index: usize) -> OrmResult<DatabaseValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| decode_failed("raw", e))?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let type_name = row.columns()[index].type_info().name().to_string();

    match type_name.as_str() {
        "BOOLEAN" => {
            let value: bool = row.try_get(index).map_err(|e| decode_failed("bool", e))?;
            Ok(DatabaseValue::Bool(value))
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            let value: i64 = row.try_get(index).map_err(|e| decode_failed("integer", e))?;
            Ok(DatabaseValue::Int(value))
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => {
            let value: u64 = row
                .try_get(index)
                .map_err(|e| decode_failed("unsigned integer", e))?;
            Ok(DatabaseValue::UInt(value))
        }
        "FLOAT" => {
            let value: f32 = row.try_get(index).map_err(|e| decode_failed("float", e))?;
            Ok(DatabaseValue::Float(value.into()))
        }
        "DOUBLE" => {
            let value: f64 = row.try_get(index).map_err(|e| decode_failed("double", e))?;
            Ok(DatabaseValue::Float(value))
        }
        "DATETIME" | "TIMESTAMP" => {
            let value: chrono::NaiveDateTime = row
                .try_get(index)
                .map_err(|e| decode_failed("datetime", e))?;
            Ok(DatabaseValue::DateTime(value))
        }
        "DATE" => {
            let value: chrono::NaiveDate =
                row.try_get(index).map_err(|e| decode_failed("date", e))?;
            Ok(DatabaseValue::Date(value))
        }
        "TIME" => {
            let value: chrono::NaiveTime =
                row.try_get(index).map_err(|e| decode_failed("time", e))?;
            Ok(DatabaseValue::Time(value))
        }
        "JSON" => {
            let value: JsonValue = row.try_get(index).map_err(|e| decode_failed("JSON", e))?;
            Ok(DatabaseValue::Json(value))
        }
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
            let value: Vec<u8> = row.try_get(index).map_err(|e| decode_failed("bytes", e))?;
            Ok(DatabaseValue::Bytes(value))
        }
        _ => {
            // Fallback: text first, raw bytes for anything sqlx won't decode as text
            match row.try_get::<String, _>(index) {
                Ok(value) => Ok(DatabaseValue::String(value)),
                Err(_) => {
                    let value: Vec<u8> = row.try_get_unchecked(index).map_err(|e| {
                        ModelError::Database(format!(
                            "Failed to get value for unknown type '{}': {}",
                            type_name, e
                        ))
                    })?;
                    Ok(DatabaseValue::String(String::from_utf8_lossy(&value).into_owned()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, DatabaseValue)]) -> Params {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_named_params_become_positional() {
        let p = params(&[
            ("category_id", DatabaseValue::Int(3)),
            ("title", DatabaseValue::from("News")),
        ]);
        let (sql, values) = expand_named_params(
            "SELECT * FROM `articles` WHERE `category_id` = :category_id AND `title` LIKE :title",
            &p,
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `articles` WHERE `category_id` = ? AND `title` LIKE ?"
        );
        assert_eq!(values, vec![DatabaseValue::Int(3), DatabaseValue::from("News")]);
    }

    #[test]
    fn test_quoted_text_and_double_colon_are_untouched() {
        let p = params(&[("id", DatabaseValue::Int(1))]);
        let (sql, values) = expand_named_params(
            "SELECT ':skip', \"a:b\", `c:d`, x::int FROM t WHERE id = :id",
            &p,
        )
        .unwrap();
        assert_eq!(sql, "SELECT ':skip', \"a:b\", `c:d`, x::int FROM t WHERE id = ?");
        assert_eq!(values, vec![DatabaseValue::Int(1)]);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let p = params(&[("id", DatabaseValue::Int(1))]);
        let (sql, values) =
            expand_named_params("SELECT 'it\\'s :not' FROM t WHERE id = :id", &p).unwrap();
        assert_eq!(sql, "SELECT 'it\\'s :not' FROM t WHERE id = ?");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_repeated_placeholder_binds_twice() {
        let p = params(&[("v", DatabaseValue::Int(5))]);
        let (sql, values) = expand_named_params("a = :v OR b = :v", &p).unwrap();
        assert_eq!(sql, "a = ? OR b = ?");
        assert_eq!(values, vec![DatabaseValue::Int(5), DatabaseValue::Int(5)]);
    }

    #[test]
    fn test_missing_param_is_an_error() {
        let err = expand_named_params("a = :missing", &Params::new()).unwrap_err();
        assert!(matches!(err, ModelError::Query(_)));
    }
}
