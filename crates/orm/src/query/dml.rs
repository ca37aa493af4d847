//! Query Builder DML operations (INSERT, UPDATE, DELETE)

use chrono::Utc;

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::{DatabaseValue, ExecResult, Params};
use crate::error::{ModelError, OrmResult};
use crate::model::Model;
use crate::session::Session;

impl QueryBuilder {
    /// Insert `model` and back-fill its `id` from the generated key.
    ///
    /// `created_at` and `updated_at` are stamped with the current Unix time
    /// when the model declares them. Every mapped attribute with a non-null
    /// value goes into the `SET` list.
    pub async fn insert(mut self, model: &mut Model, session: &mut Session) -> OrmResult<ExecResult> {
        self.check_model(model)?;
        let now = Utc::now().timestamp();
        model.assign("created_at", now);
        model.assign("updated_at", now);

        self.action = Some(QueryAction::Insert);
        self.set = Some(self.set_clause_from(model));

        let result = self.exec(session).await?;
        if result.last_insert_id > 0 {
            model.assign("id", DatabaseValue::UInt(result.last_insert_id));
        }
        Ok(result)
    }

    /// Turn the builder into an `UPDATE ... SET` of `model`'s attributes.
    ///
    /// Nothing scopes the statement to the model's row; add a where clause
    /// (or [`all_rows`](QueryBuilder::all_rows)) before [`exec`](QueryBuilder::exec).
    pub fn update(mut self, model: &mut Model) -> OrmResult<Self> {
        self.check_model(model)?;
        model.assign("updated_at", Utc::now().timestamp());

        self.action = Some(QueryAction::Update);
        self.set = Some(self.set_clause_from(model));
        Ok(self)
    }

    /// `DELETE FROM <table>`; needs a where clause or `all_rows()` to run
    pub fn delete(mut self) -> Self {
        self.action = Some(QueryAction::Delete);
        self
    }

    fn check_model(&self, model: &Model) -> OrmResult<()> {
        if model.model_name() != self.schema.name() {
            return Err(ModelError::Query(format!(
                "Cannot write a {} through a {} query",
                model.model_name(),
                self.schema.name()
            )));
        }
        Ok(())
    }

    fn set_clause_from(&self, model: &Model) -> SetClause {
        let mut set = SetClause {
            assignments: Vec::new(),
            params: Params::new(),
        };
        for def in self.schema.attributes().iter() {
            match model.get(&def.name) {
                Some(value) if !value.is_null() => {
                    set.assignments.push((def.column.clone(), def.name.clone()));
                    set.params.insert(def.name.clone(), value.clone());
                }
                _ => {}
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ScriptedConnection;
    use crate::model::{ModelRegistry, ModelSchema};
    use serde_json::json;
    use std::sync::Arc;

    fn session() -> (Session, crate::backends::StatementLog) {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelSchema::builder("Category", "categories")
                    .attribute("id", "id")
                    .attribute("name", "Name")
                    .attribute_with_default("position", "Position", 0)
                    .attribute("created_at", "CreatedAt")
                    .attribute("updated_at", "UpdatedAt")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let conn = ScriptedConnection::new().starting_insert_id(42);
        let log = conn.log();
        (Session::new(conn, Arc::new(registry)), log)
    }

    #[tokio::test]
    async fn test_insert_sets_non_null_attributes_and_id() {
        let (mut session, log) = session();
        let mut category = session
            .build("Category", json!({"name": "Sport"}).as_object().cloned().unwrap())
            .unwrap();

        let result = session
            .query("Category")
            .unwrap()
            .insert(&mut category, &mut session)
            .await
            .unwrap();

        assert_eq!(result.last_insert_id, 42);
        assert_eq!(category.id(), Some(&DatabaseValue::UInt(42)));
        assert!(category.get("created_at").and_then(DatabaseValue::as_i64).is_some());

        let statements = log.statements();
        assert_eq!(
            statements[0].sql,
            "INSERT INTO `categories` SET `Name` = :name, `Position` = :position, \
             `CreatedAt` = :created_at, `UpdatedAt` = :updated_at"
        );
        assert!(!statements[0].params.contains_key("id"));
    }

    #[tokio::test]
    async fn test_update_requires_scope() {
        let (mut session, _log) = session();
        let mut category = session.new_model("Category").unwrap();
        category.assign("id", 5);

        let unscoped = session.query("Category").unwrap().update(&mut category).unwrap();
        assert!(matches!(
            unscoped.exec(&mut session).await,
            Err(ModelError::UnscopedMutation(_))
        ));

        let scoped = session
            .query("Category")
            .unwrap()
            .update(&mut category)
            .unwrap()
            .where_map([("id", 5)])
            .unwrap();
        assert_eq!(
            scoped.sql(),
            "UPDATE `categories` SET `id` = :id, `Position` = :position, \
             `UpdatedAt` = :updated_at WHERE `id` = :id"
        );
        scoped.exec(&mut session).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_where_same_attribute() {
        let (mut session, log) = session();
        let mut category = session.new_model("Category").unwrap();
        category.assign("name", "Culture");

        session
            .query("Category")
            .unwrap()
            .update(&mut category)
            .unwrap()
            .where_map([("name", "Arts")])
            .unwrap()
            .exec(&mut session)
            .await
            .unwrap();

        let statements = log.statements();
        assert_eq!(
            statements[0].sql,
            "UPDATE `categories` SET `Name` = :name, `Position` = :position, \
             `UpdatedAt` = :updated_at WHERE `Name` = :name_where"
        );
        assert_eq!(statements[0].params["name"], DatabaseValue::from("Culture"));
        assert_eq!(statements[0].params["name_where"], DatabaseValue::from("Arts"));
    }

    #[test]
    fn test_rejects_foreign_model() {
        let (session, _log) = session();
        let mut registry = ModelRegistry::new();
        let other = registry
            .register(
                ModelSchema::builder("Tag", "tags")
                    .attribute("id", "id")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let mut tag = Model::new(other);
        assert!(session.query("Category").unwrap().update(&mut tag).is_err());
    }
}
