//! SQL rendering for the query builder

use std::borrow::Cow;

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::Params;
use crate::error::OrmResult;
use crate::sql::escape_identifier;

/// Replace `:from` placeholders with `:to`, leaving longer names such as
/// `:from_0` alone
fn rename_placeholder(sql: &str, from: &str, to: &str) -> String {
    let needle = format!(":{}", from);
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(pos) = rest.find(&needle) {
        let end = pos + needle.len();
        let at_boundary = rest[end..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        out.push_str(&rest[..pos]);
        if at_boundary {
            out.push(':');
            out.push_str(to);
        } else {
            out.push_str(&needle);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

impl QueryBuilder {
    /// Render the statement. Slots are emitted in fixed order no matter
    /// which order they were set in; empty slots are skipped.
    pub fn sql(&self) -> String {
        let table = self.table_name();
        let mut parts: Vec<String> = Vec::new();

        if let Some(action) = &self.action {
            parts.push(match action {
                QueryAction::Select { columns } => {
                    format!("SELECT SQL_CALC_FOUND_ROWS {} FROM {}", columns, table)
                }
                QueryAction::Insert => format!("INSERT INTO {}", table),
                QueryAction::Update => format!("UPDATE {}", table),
                QueryAction::Delete => format!("DELETE FROM {}", table),
            });
        }

        if let Some(joins) = self.joins.as_deref().filter(|j| !j.trim().is_empty()) {
            parts.push(joins.to_string());
        }

        if let Some(set) = self.set.as_ref().filter(|s| !s.assignments.is_empty()) {
            let assignments: Vec<String> = set
                .assignments
                .iter()
                .map(|(column, param)| format!("{} = :{}", escape_identifier(column), param))
                .collect();
            parts.push(format!("SET {}", assignments.join(", ")));
        }

        if let Some(where_clause) = self.resolved_where() {
            parts.push(format!("WHERE {}", where_clause.conditions));
        }

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|term| format!("{} {}", escape_identifier(&term.column), term.direction))
                .collect();
            parts.push(format!("ORDER BY {}", terms.join(", ")));
        }

        if let Some(limit) = self.limit_count {
            parts.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            parts.push(format!("OFFSET {}", offset));
        }

        parts.join(" ")
    }

    /// Parameters of the set and where slots, merged
    pub fn params(&self) -> OrmResult<Params> {
        let mut merged = self.set.as_ref().map(|s| s.params.clone()).unwrap_or_default();
        if let Some(where_clause) = self.resolved_where() {
            for (name, value) in &where_clause.params {
                merged.entry(name.clone()).or_insert_with(|| value.clone());
            }
        }
        Ok(merged)
    }

    /// The where slot with every parameter that shares a name with a
    /// differently valued set parameter moved to a fresh `<name>_where` name
    fn resolved_where(&self) -> Option<Cow<'_, WhereClause>> {
        let where_clause = self.where_clause.as_ref()?;
        let Some(set) = self.set.as_ref() else {
            return Some(Cow::Borrowed(where_clause));
        };

        let colliding: Vec<&String> = where_clause
            .params
            .iter()
            .filter(|(name, value)| set.params.get(*name).is_some_and(|v| v != *value))
            .map(|(name, _)| name)
            .collect();
        if colliding.is_empty() {
            return Some(Cow::Borrowed(where_clause));
        }

        let taken = |name: &str| set.params.contains_key(name) || where_clause.params.contains_key(name);
        let mut resolved = where_clause.clone();
        for name in colliding {
            let mut fresh = format!("{}_where", name);
            let mut suffix = 1;
            while taken(&fresh) || resolved.params.contains_key(&fresh) {
                suffix += 1;
                fresh = format!("{}_where{}", name, suffix);
            }
            resolved.conditions = rename_placeholder(&resolved.conditions, name, &fresh);
            if let Some(value) = resolved.params.shift_remove(name.as_str()) {
                resolved.params.insert(fresh, value);
            }
        }
        Some(Cow::Owned(resolved))
    }
}
