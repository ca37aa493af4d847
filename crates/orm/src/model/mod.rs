//! Models: attribute values bound to a [`ModelSchema`]
//!
//! A [`Model`] holds logical attribute values (never column names), the
//! validation errors of its last save, buffered nested-attribute and
//! attachment payloads, and the relation cache filled by eager loading.

pub mod attributes;
pub mod lifecycle;
pub mod registry;
pub mod schema;

pub use attributes::{AttributeDef, AttributeDefault, AttributeMap};
pub use lifecycle::SaveOutcome;
pub use registry::ModelRegistry;
pub use schema::{ModelSchema, ModelSchemaBuilder};

use crate::attachments::UploadedFile;
use crate::backends::{DatabaseValue, Row};
use dbwk_validation::ValidationErrors;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// JSON object payload, as submitted by a client
pub type JsonMap = Map<String, Value>;

/// A record of some registered model
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    attributes: IndexMap<String, DatabaseValue>,
    errors: ValidationErrors,
    nested_attributes: IndexMap<String, Vec<JsonMap>>,
    attachments: IndexMap<String, Vec<JsonMap>>,
    attachment_uploads: IndexMap<String, Vec<UploadedFile>>,
    related: HashMap<String, Vec<Model>>,
}

impl Model {
    /// Fresh instance with every attribute at its default
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        let attributes = schema.attributes().defaults();
        Self {
            schema,
            attributes,
            errors: ValidationErrors::new(),
            nested_attributes: IndexMap::new(),
            attachments: IndexMap::new(),
            attachment_uploads: IndexMap::new(),
            related: HashMap::new(),
        }
    }

    /// Fresh instance with `values` assigned over the defaults
    pub fn from_attributes(schema: Arc<ModelSchema>, values: JsonMap) -> Self {
        let mut model = Self::new(schema);
        model.assign_many(values);
        model
    }

    /// Materialize a result row; unmapped columns are dropped
    pub fn from_row(schema: Arc<ModelSchema>, row: Row) -> Self {
        let mut model = Self::new(schema);
        for (column, value) in row.into_map() {
            model.assign(&column, value);
        }
        model
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn model_name(&self) -> &str {
        self.schema.name()
    }

    /// Set an attribute by logical or column name. Unknown names are ignored
    /// and reported with `false`.
    pub fn assign(&mut self, name: &str, value: impl Into<DatabaseValue>) -> bool {
        match self.schema.attributes().resolve(name) {
            Some(attribute) => {
                self.attributes.insert(attribute.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// Alias of [`assign`](Model::assign)
    pub fn set(&mut self, name: &str, value: impl Into<DatabaseValue>) -> bool {
        self.assign(name, value)
    }

    /// Assign a client payload. `<relation>_attributes` entries for nested
    /// and attachment relations are buffered for the next save; everything
    /// else is assigned one by one.
    pub fn assign_many(&mut self, mut values: JsonMap) {
        let nested: Vec<String> = self
            .schema
            .nested_relations()
            .map(|(relation, _)| relation.to_string())
            .collect();
        for relation in nested {
            if let Some(payload) = values.remove(&format!("{}_attributes", relation)) {
                self.nested_attributes
                    .insert(relation, payload_entries(payload));
            }
        }

        let attachments: Vec<String> = self
            .schema
            .attachment_relations()
            .map(|(relation, _)| relation.to_string())
            .collect();
        for relation in attachments {
            if let Some(payload) = values.remove(&format!("{}_attributes", relation)) {
                self.attachments.insert(relation, payload_entries(payload));
            }
        }

        for (name, value) in values {
            self.assign(&name, DatabaseValue::from_json(value));
        }
    }

    /// Value of an attribute by logical or column name
    pub fn get(&self, name: &str) -> Option<&DatabaseValue> {
        let attribute = self.schema.attributes().resolve(name)?;
        self.attributes.get(attribute)
    }

    /// Value of an attribute, or `default` when unknown or null
    pub fn get_or(&self, name: &str, default: impl Into<DatabaseValue>) -> DatabaseValue {
        match self.get(name) {
            Some(value) if !value.is_null() => value.clone(),
            _ => default.into(),
        }
    }

    /// Identity value, `None` until the record is stored
    pub fn id(&self) -> Option<&DatabaseValue> {
        self.attributes.get("id").filter(|value| !value.is_null())
    }

    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub(crate) fn clear_id(&mut self) {
        self.attributes.insert("id".to_string(), DatabaseValue::Null);
    }

    pub fn attributes(&self) -> &IndexMap<String, DatabaseValue> {
        &self.attributes
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub(crate) fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Run the schema rules and the custom hook; replaces earlier errors
    pub fn validate(&mut self) -> bool {
        let mut errors = ValidationErrors::new();
        for (attribute, rule) in self.schema.rules_for(self) {
            let value = self
                .get(&attribute)
                .map(DatabaseValue::to_json)
                .unwrap_or(Value::Null);
            if let Err(message) = rule.validate(&value) {
                errors.add_error(attribute, message);
            }
        }
        self.schema.run_custom_validation(self, &mut errors);
        self.errors = errors;
        self.errors.is_empty()
    }

    /// Buffered nested payloads for `relation`
    pub fn nested_attributes(&self, relation: &str) -> &[JsonMap] {
        self.nested_attributes
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Buffered attachment payloads (deletions) for `relation`
    pub fn attachment_attributes(&self, relation: &str) -> &[JsonMap] {
        self.attachments
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn attachment_uploads(&self, relation: &str) -> &[UploadedFile] {
        self.attachment_uploads
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record uploaded files per attachment relation. Keys may be the
    /// relation name or `<relation>_attributes`; undeclared relations are
    /// ignored.
    pub fn append_files<I, K>(&mut self, uploads: I)
    where
        I: IntoIterator<Item = (K, Vec<UploadedFile>)>,
        K: AsRef<str>,
    {
        for (key, files) in uploads {
            let key = key.as_ref();
            let relation = key.strip_suffix("_attributes").unwrap_or(key);
            if self.schema.attachment_store(relation).is_some() {
                self.attachment_uploads
                    .entry(relation.to_string())
                    .or_default()
                    .extend(files);
            }
        }
    }

    /// Cached records of a loaded relation
    pub fn related(&self, relation: &str) -> Option<&[Model]> {
        self.related.get(relation).map(Vec::as_slice)
    }

    pub fn set_related(&mut self, relation: impl Into<String>, records: Vec<Model>) {
        self.related.insert(relation.into(), records);
    }

    /// Attributes keyed by logical name, plus any loaded relations
    pub fn to_json(&self) -> Value {
        let mut object: JsonMap = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        let mut relations: Vec<&String> = self.related.keys().collect();
        relations.sort();
        for relation in relations {
            let records = self.related[relation].iter().map(Model::to_json).collect();
            object.insert(relation.clone(), Value::Array(records));
        }
        Value::Object(object)
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_json() {
            Value::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in &object {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            other => other.serialize(serializer),
        }
    }
}

/// Nested payloads arrive either as a list of objects or, from form
/// encodings, as an object of objects keyed by position
fn payload_entries(payload: Value) -> Vec<JsonMap> {
    let entries: Vec<Value> = match payload {
        Value::Array(items) => items,
        Value::Object(object) => object.into_iter().map(|(_, item)| item).collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(object) => Some(object),
            _ => None,
        })
        .collect()
}
