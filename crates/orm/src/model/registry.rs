//! Name -> schema lookup for relations and nested saves

use super::schema::ModelSchema;
use crate::error::{ModelError, OrmResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Registered model schemas, keyed by model name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelSchema>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema; a second schema with the same name is rejected
    pub fn register(&mut self, schema: ModelSchema) -> OrmResult<Arc<ModelSchema>> {
        if self.models.contains_key(schema.name()) {
            return Err(ModelError::Configuration(format!(
                "Model '{}' is already registered",
                schema.name()
            )));
        }
        let schema = Arc::new(schema);
        self.models
            .insert(schema.name().to_string(), Arc::clone(&schema));
        tracing::debug!(model = schema.name(), table = schema.table(), "Registered model");
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> OrmResult<Arc<ModelSchema>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Check that every relation points at a registered model
    pub fn check_references(&self) -> OrmResult<()> {
        for schema in self.models.values() {
            for (_, target) in schema.relations().chain(schema.nested_relations()) {
                if !self.contains(target) {
                    return Err(ModelError::UnknownModel(format!(
                        "{} (referenced by {})",
                        target,
                        schema.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(name: &str) -> ModelSchema {
        ModelSchema::builder(name, name).attribute("id", "ID").build().unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ModelRegistry::new();
        registry.register(schema("Category")).unwrap();

        assert_eq!(registry.get("Category").unwrap().table(), "Category");
        assert!(matches!(
            registry.get("Missing"),
            Err(ModelError::UnknownModel(_))
        ));
        assert!(registry.register(schema("Category")).is_err());
    }

    #[test]
    fn test_check_references() {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelSchema::builder("Article", "Article")
                    .attribute("id", "ID")
                    .has_many("article_content", "ArticleContent")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert!(registry.check_references().is_err());

        registry.register(schema("ArticleContent")).unwrap();
        assert!(registry.check_references().is_ok());
        assert_eq!(registry.names(), vec!["Article", "ArticleContent"]);
    }
}
