//! Logical attribute names, their table columns and default values

use crate::backends::DatabaseValue;
use crate::error::{ModelError, OrmResult};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Produces a default at model construction time
pub type DefaultFn = Arc<dyn Fn() -> DatabaseValue + Send + Sync>;

/// Value an attribute starts with on a fresh model
#[derive(Clone, Default)]
pub enum AttributeDefault {
    #[default]
    Null,
    Static(DatabaseValue),
    Computed(DefaultFn),
}

impl AttributeDefault {
    pub fn value(&self) -> DatabaseValue {
        match self {
            AttributeDefault::Null => DatabaseValue::Null,
            AttributeDefault::Static(value) => value.clone(),
            AttributeDefault::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for AttributeDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeDefault::Null => write!(f, "Null"),
            AttributeDefault::Static(value) => f.debug_tuple("Static").field(value).finish(),
            AttributeDefault::Computed(_) => write!(f, "Computed(<fn>)"),
        }
    }
}

/// One logical attribute and the column it is stored in
#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub name: String,
    pub column: String,
    pub default: AttributeDefault,
}

/// Ordered, bijective mapping between attribute names and columns.
///
/// Either side can be used to look an attribute up; lookups always answer
/// with the logical name.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    defs: Vec<AttributeDef>,
    by_name: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute. Reusing a name or a column is rejected, as is
    /// a name that is already another attribute's column (and vice versa).
    pub fn define(
        &mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        default: AttributeDefault,
    ) -> OrmResult<()> {
        let name = name.into();
        let column = column.into();

        if name.is_empty() || column.is_empty() {
            return Err(ModelError::Configuration(
                "Attribute and column names must not be empty".to_string(),
            ));
        }
        if self.by_name.contains_key(&name) {
            return Err(ModelError::Configuration(format!(
                "Attribute '{}' is defined twice",
                name
            )));
        }
        if self.by_column.contains_key(&column) {
            return Err(ModelError::Configuration(format!(
                "Column '{}' is mapped twice",
                column
            )));
        }
        if self.by_column.contains_key(&name) || (column != name && self.by_name.contains_key(&column)) {
            return Err(ModelError::Configuration(format!(
                "Attribute '{}' -> column '{}' collides with an existing mapping",
                name, column
            )));
        }

        let index = self.defs.len();
        self.by_name.insert(name.clone(), index);
        self.by_column.insert(column.clone(), index);
        self.defs.push(AttributeDef {
            name,
            column,
            default,
        });
        Ok(())
    }

    /// Logical name for an attribute or column name
    pub fn resolve(&self, name_or_column: &str) -> Option<&str> {
        self.by_name
            .get(name_or_column)
            .or_else(|| self.by_column.get(name_or_column))
            .map(|&index| self.defs[index].name.as_str())
    }

    /// Column for a logical attribute name
    pub fn column(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|&index| self.defs[index].column.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDef> {
        self.defs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|def| def.name.as_str())
    }

    /// Fresh attribute values: every attribute at its default, in definition order
    pub fn defaults(&self) -> IndexMap<String, DatabaseValue> {
        self.defs
            .iter()
            .map(|def| (def.name.clone(), def.default.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_map() -> AttributeMap {
        let mut map = AttributeMap::new();
        map.define("id", "ID", AttributeDefault::Null).unwrap();
        map.define("title", "Title", AttributeDefault::Null).unwrap();
        map.define(
            "locale",
            "Lang",
            AttributeDefault::Static(DatabaseValue::from("en")),
        )
        .unwrap();
        map
    }

    #[test]
    fn test_resolve_either_side() {
        let map = article_map();
        assert_eq!(map.resolve("title"), Some("title"));
        assert_eq!(map.resolve("Title"), Some("title"));
        assert_eq!(map.resolve("Lang"), Some("locale"));
        assert_eq!(map.resolve("nope"), None);
        assert_eq!(map.column("locale"), Some("Lang"));
        assert_eq!(map.column("Lang"), None);
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let mut map = article_map();
        assert!(map.define("title", "Heading", AttributeDefault::Null).is_err());
        assert!(map.define("heading", "Title", AttributeDefault::Null).is_err());
        assert!(map.define("Title", "Other", AttributeDefault::Null).is_err());
        assert!(map.define("other", "title", AttributeDefault::Null).is_err());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_identity_mapping_is_allowed() {
        let mut map = AttributeMap::new();
        map.define("alias", "alias", AttributeDefault::Null).unwrap();
        assert_eq!(map.resolve("alias"), Some("alias"));
    }

    #[test]
    fn test_defaults_in_definition_order() {
        let mut map = article_map();
        map.define(
            "published_at",
            "PubDate",
            AttributeDefault::Computed(Arc::new(|| DatabaseValue::Int(1_700_000_000))),
        )
        .unwrap();

        let defaults = map.defaults();
        let names: Vec<&str> = defaults.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "title", "locale", "published_at"]);
        assert_eq!(defaults["locale"], DatabaseValue::from("en"));
        assert_eq!(defaults["published_at"], DatabaseValue::Int(1_700_000_000));
        assert!(defaults["id"].is_null());
    }
}
