//! Static description of a model: table, attributes, rules and relations

use super::attributes::{AttributeDefault, AttributeMap};
use super::Model;
use crate::attachments::AttachmentStore;
use crate::backends::DatabaseValue;
use crate::error::{ModelError, OrmResult};
use dbwk_validation::{Rule, ValidationErrors};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Produces the `(attribute, rule)` pairs for a model instance
pub type RulesFn = Arc<dyn Fn(&Model) -> Vec<(String, Rule)> + Send + Sync>;

/// Extra checks that run after the declared rules
pub type CustomValidationFn = Arc<dyn Fn(&Model, &mut ValidationErrors) + Send + Sync>;

/// Everything the query builder and the lifecycle need to know about a model
#[derive(Clone)]
pub struct ModelSchema {
    name: String,
    table: String,
    attributes: AttributeMap,
    rules: Option<RulesFn>,
    custom_validation: Option<CustomValidationFn>,
    has_many: IndexMap<String, String>,
    nested_attributes_for: IndexMap<String, String>,
    attachments_for: IndexMap<String, Arc<dyn AttachmentStore>>,
}

impl ModelSchema {
    /// Start describing model `name` stored in `table`
    pub fn builder(name: impl Into<String>, table: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder::new(name, table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Column children use to point at this model: `article` -> `article_id`
    pub fn foreign_key(&self) -> String {
        format!("{}_id", self.name.to_lowercase())
    }

    /// Target model of a has-many relation
    pub fn has_many(&self, relation: &str) -> Option<&str> {
        self.has_many.get(relation).map(String::as_str)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.has_many.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Target model of a relation accepting nested attributes
    pub fn nested_model(&self, relation: &str) -> Option<&str> {
        self.nested_attributes_for.get(relation).map(String::as_str)
    }

    pub fn nested_relations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nested_attributes_for
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn attachment_store(&self, relation: &str) -> Option<&Arc<dyn AttachmentStore>> {
        self.attachments_for.get(relation)
    }

    pub fn attachment_relations(&self) -> impl Iterator<Item = (&str, &Arc<dyn AttachmentStore>)> {
        self.attachments_for.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rules declared for `model`, empty when none were declared
    pub fn rules_for(&self, model: &Model) -> Vec<(String, Rule)> {
        self.rules.as_ref().map(|f| f(model)).unwrap_or_default()
    }

    pub fn run_custom_validation(&self, model: &Model, errors: &mut ValidationErrors) {
        if let Some(hook) = &self.custom_validation {
            hook(model, errors);
        }
    }

    /// Name of the logical attribute for `name_or_column`, or `UnknownAttribute`
    pub fn require_attribute(&self, name_or_column: &str) -> OrmResult<&str> {
        self.attributes
            .resolve(name_or_column)
            .ok_or_else(|| ModelError::UnknownAttribute {
                model: self.name.clone(),
                attribute: name_or_column.to_string(),
            })
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("attributes", &self.attributes.names().collect::<Vec<_>>())
            .field("has_many", &self.has_many)
            .field("nested_attributes_for", &self.nested_attributes_for)
            .field("attachments_for", &self.attachments_for.keys().collect::<Vec<_>>())
            .field("has_rules", &self.rules.is_some())
            .finish()
    }
}

/// Builder for [`ModelSchema`]. Definition errors are collected and
/// reported by [`build`](ModelSchemaBuilder::build).
pub struct ModelSchemaBuilder {
    schema: ModelSchema,
    errors: Vec<ModelError>,
}

impl ModelSchemaBuilder {
    fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: ModelSchema {
                name: name.into(),
                table: table.into(),
                attributes: AttributeMap::new(),
                rules: None,
                custom_validation: None,
                has_many: IndexMap::new(),
                nested_attributes_for: IndexMap::new(),
                attachments_for: IndexMap::new(),
            },
            errors: Vec::new(),
        }
    }

    fn define(mut self, name: &str, column: &str, default: AttributeDefault) -> Self {
        if let Err(e) = self.schema.attributes.define(name, column, default) {
            self.errors.push(e);
        }
        self
    }

    /// Attribute `name` stored in `column`, null by default
    pub fn attribute(self, name: &str, column: &str) -> Self {
        self.define(name, column, AttributeDefault::Null)
    }

    pub fn attribute_with_default(self, name: &str, column: &str, default: impl Into<DatabaseValue>) -> Self {
        self.define(name, column, AttributeDefault::Static(default.into()))
    }

    /// Attribute whose default is computed for every new instance
    pub fn attribute_computed<F>(self, name: &str, column: &str, default: F) -> Self
    where
        F: Fn() -> DatabaseValue + Send + Sync + 'static,
    {
        self.define(name, column, AttributeDefault::Computed(Arc::new(default)))
    }

    pub fn validates<F>(mut self, rules: F) -> Self
    where
        F: Fn(&Model) -> Vec<(String, Rule)> + Send + Sync + 'static,
    {
        self.schema.rules = Some(Arc::new(rules));
        self
    }

    pub fn custom_validation<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Model, &mut ValidationErrors) + Send + Sync + 'static,
    {
        self.schema.custom_validation = Some(Arc::new(hook));
        self
    }

    /// Has-many relation to the registered model `model`
    pub fn has_many(mut self, relation: &str, model: &str) -> Self {
        self.schema
            .has_many
            .insert(relation.to_string(), model.to_string());
        self
    }

    /// Accept `<relation>_attributes` payloads saved as `model` records
    pub fn accepts_nested_attributes_for(mut self, relation: &str, model: &str) -> Self {
        self.schema
            .nested_attributes_for
            .insert(relation.to_string(), model.to_string());
        self
    }

    pub fn attachments_for(mut self, relation: &str, store: Arc<dyn AttachmentStore>) -> Self {
        if self.schema.nested_attributes_for.contains_key(relation) {
            self.errors.push(ModelError::Configuration(format!(
                "Relation '{}' cannot take both nested attributes and attachments",
                relation
            )));
        }
        self.schema.attachments_for.insert(relation.to_string(), store);
        self
    }

    pub fn build(self) -> OrmResult<ModelSchema> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        let schema = self.schema;
        if schema.name.is_empty() || schema.table.is_empty() {
            return Err(ModelError::Configuration(
                "Model name and table must not be empty".to_string(),
            ));
        }
        if !schema.attributes.contains("id") {
            return Err(ModelError::Configuration(format!(
                "Model '{}' must define an 'id' attribute",
                schema.name
            )));
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_schema() {
        let schema = ModelSchema::builder("Article", "Article")
            .attribute("id", "ID")
            .attribute("title", "Title")
            .has_many("article_content", "ArticleContent")
            .accepts_nested_attributes_for("article_content", "ArticleContent")
            .build()
            .unwrap();

        assert_eq!(schema.foreign_key(), "article_id");
        assert_eq!(schema.has_many("article_content"), Some("ArticleContent"));
        assert_eq!(schema.nested_model("article_content"), Some("ArticleContent"));
        assert_eq!(schema.require_attribute("Title").unwrap(), "title");
        assert!(matches!(
            schema.require_attribute("missing"),
            Err(ModelError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_duplicate_attribute_fails_build() {
        let result = ModelSchema::builder("Category", "Categories")
            .attribute("id", "ID")
            .attribute("title", "Title")
            .attribute("title", "Name")
            .build();
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_id_attribute_is_required() {
        let result = ModelSchema::builder("Tag", "Tags").attribute("name", "Name").build();
        assert!(result.is_err());
    }
}
