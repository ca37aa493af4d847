//! Query Builder WHERE clause operations

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::{DatabaseValue, Params};
use crate::error::{ModelError, OrmResult};
use crate::sql::escape_identifier;

fn operator_key_regex() -> OrmResult<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^(.+)\[(.+)\]$").ok())
        .as_ref()
        .ok_or_else(|| ModelError::Query("operator key pattern failed to compile".to_string()))
}

fn regex(pattern: &str) -> OrmResult<Regex> {
    Regex::new(pattern).map_err(|e| ModelError::Query(format!("Invalid pattern '{}': {}", pattern, e)))
}

/// Hands out parameter names that are unique within one clause
#[derive(Default)]
struct ParamNames {
    used: HashSet<String>,
}

impl ParamNames {
    fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// `(:name_0, :name_1, ...)` for a list value, `(NULL)` when empty
fn in_list(name: &str, values: Vec<DatabaseValue>, params: &mut Params) -> String {
    if values.is_empty() {
        return "(NULL)".to_string();
    }
    let placeholders: Vec<String> = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let param = format!("{}_{}", name, index);
            let placeholder = format!(":{}", param);
            params.insert(param, value);
            placeholder
        })
        .collect();
    format!("({})", placeholders.join(", "))
}

impl QueryBuilder {
    /// Conditions from `attr` or `attr[op]` keys, joined with `AND`.
    ///
    /// Lists render as `IN (...)`, null compares with `IS NULL` /
    /// `IS NOT NULL`. An empty map leaves any existing where clause alone.
    pub fn where_map<I, K, V>(mut self, conditions: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DatabaseValue>,
    {
        let key_pattern = operator_key_regex()?;
        let mut names = ParamNames::default();
        let mut params = Params::new();
        let mut rendered = Vec::new();

        for (key, value) in conditions {
            let key = key.as_ref().trim();
            let (attribute, operator) = match key_pattern.captures(key) {
                Some(caps) => (
                    caps[1].trim().to_string(),
                    caps[2].parse::<QueryOperator>()?,
                ),
                None => (key.to_string(), QueryOperator::Equal),
            };

            let logical = self.schema.require_attribute(&attribute)?.to_string();
            let column = self
                .schema
                .attributes()
                .column(&logical)
                .map(escape_identifier)
                .ok_or_else(|| ModelError::UnknownAttribute {
                    model: self.schema.name().to_string(),
                    attribute: attribute.clone(),
                })?;

            match value.into() {
                DatabaseValue::Array(values) => {
                    if !(operator.is_equality() || operator.is_inequality()) {
                        return Err(ModelError::Query(format!(
                            "Operator '{}' cannot be used with a list for '{}'",
                            operator, logical
                        )));
                    }
                    let keyword = if operator.is_inequality() { "NOT IN" } else { "IN" };
                    let name = names.claim(&logical);
                    let list = in_list(&name, values, &mut params);
                    names.used.extend(params.keys().cloned());
                    rendered.push(format!("{} {} {}", column, keyword, list));
                }
                DatabaseValue::Null if operator.is_equality() => {
                    rendered.push(format!("{} IS NULL", column));
                }
                DatabaseValue::Null if operator.is_inequality() => {
                    rendered.push(format!("{} IS NOT NULL", column));
                }
                value => {
                    let name = names.claim(&logical);
                    rendered.push(format!("{} {} :{}", column, operator, name));
                    params.insert(name, value);
                }
            }
        }

        if rendered.is_empty() {
            return Ok(self);
        }

        self.where_clause = Some(WhereClause {
            conditions: rendered.join(" AND "),
            params,
        });
        Ok(self)
    }

    /// Raw condition text with named parameters.
    ///
    /// Logical attribute names standing as whole words after the start, an
    /// opening parenthesis or whitespace are rewritten to their backticked
    /// columns. List parameters are expanded in place to `(:name_0, ...)`.
    pub fn where_raw<I, K, V>(mut self, conditions: &str, params: I) -> OrmResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DatabaseValue>,
    {
        let mut sql = conditions.to_string();

        for def in self.schema.attributes().iter() {
            let pattern = regex(&format!(r"(^|\(|\s){}\b", regex::escape(&def.name)))?;
            let column = escape_identifier(&def.column);
            sql = pattern
                .replace_all(&sql, |caps: &Captures| format!("{}{}", &caps[1], column))
                .into_owned();
        }

        let mut bound = Params::new();
        for (key, value) in params {
            let key = key.as_ref().trim_start_matches(':').to_string();
            match value.into() {
                DatabaseValue::Array(values) => {
                    let list = in_list(&key, values, &mut bound);
                    let pattern = regex(&format!(r":{}\b", regex::escape(&key)))?;
                    sql = pattern
                        .replace_all(&sql, |_: &Captures| list.clone())
                        .into_owned();
                }
                value => {
                    bound.insert(key, value);
                }
            }
        }

        self.where_clause = Some(WhereClause {
            conditions: sql,
            params: bound,
        });
        Ok(self)
    }
}
