//! Persistence lifecycle: save with nested records and attachments, delete,
//! relation loading

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dbwk_validation::ValidationErrors;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use super::{JsonMap, Model};
use crate::attachments::AttachmentStore;
use crate::backends::{DatabaseValue, ExecResult};
use crate::error::{ModelError, OrmResult};
use crate::query::execution::load_has_many;
use crate::session::Session;

type SaveFuture<'a> = Pin<Box<dyn Future<Output = OrmResult<()>> + Send + 'a>>;

/// Result of [`Model::save`] when storage did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Everything was written and committed
    Saved,
    /// Validation failed somewhere; see [`Model::errors`]
    Invalid,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// `_delete` markers as sent by forms and JSON clients
fn is_delete_marker(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn indexed(index: usize, errors: ValidationErrors) -> ValidationErrors {
    let mut entry = ValidationErrors::new();
    entry.add_nested(index.to_string(), errors);
    entry
}

impl Model {
    /// Validate and write the record, its nested records and attachments in
    /// one transaction.
    ///
    /// Validation failures roll back and come back as
    /// [`SaveOutcome::Invalid`]; storage failures roll back and come back as
    /// `Err`. A record that was new before the call is new again after a
    /// rollback, and errors in nested records clear the identity of any
    /// record. When the session already has a transaction open the save runs
    /// inside it and leaves commit or rollback to the caller.
    pub async fn save(&mut self, session: &mut Session) -> OrmResult<SaveOutcome> {
        let owns_transaction = !session.in_transaction();
        if owns_transaction {
            session.begin().await?;
        }

        let was_new = self.is_new();
        let result = self.save_inner(session).await;
        if !owns_transaction {
            return result.map(|()| self.outcome());
        }

        match result {
            Ok(()) if self.is_valid() => match session.commit().await {
                Ok(()) => {
                    self.clear_buffers();
                    Ok(SaveOutcome::Saved)
                }
                Err(error) => {
                    self.abandon(session, was_new).await;
                    Err(error)
                }
            },
            Ok(()) => {
                session.rollback().await?;
                if was_new {
                    self.clear_id();
                }
                Ok(SaveOutcome::Invalid)
            }
            Err(error) => {
                self.abandon(session, was_new).await;
                Err(error)
            }
        }
    }

    /// Roll back after a storage failure; the original error is what the
    /// caller sees, so a failing rollback is only logged
    async fn abandon(&mut self, session: &mut Session, was_new: bool) {
        if let Err(rollback_error) = session.rollback().await {
            warn!("Rollback after failed save also failed: {}", rollback_error);
        }
        if was_new {
            self.clear_id();
        }
    }

    fn outcome(&mut self) -> SaveOutcome {
        if self.is_valid() {
            self.clear_buffers();
            SaveOutcome::Saved
        } else {
            SaveOutcome::Invalid
        }
    }

    fn clear_buffers(&mut self) {
        self.nested_attributes.clear();
        self.attachments.clear();
        self.attachment_uploads.clear();
    }

    fn save_inner<'a>(&'a mut self, session: &'a mut Session) -> SaveFuture<'a> {
        Box::pin(async move {
            if !self.validate() {
                return Ok(());
            }

            let schema = Arc::clone(&self.schema);
            match self.id().cloned() {
                None => {
                    session.query_for(&schema).insert(self, session).await?;
                }
                Some(id) => {
                    session
                        .query_for(&schema)
                        .update(self)?
                        .where_map([("id", id)])?
                        .exec(session)
                        .await?;
                }
            }

            self.save_nested(session).await?;
            if !self.is_valid() {
                self.clear_id();
                return Ok(());
            }

            self.save_attachments().await
        })
    }

    async fn save_nested(&mut self, session: &mut Session) -> OrmResult<()> {
        let schema = Arc::clone(&self.schema);
        let foreign_key = schema.foreign_key();
        let parent_id = self.id().cloned().unwrap_or(DatabaseValue::Null);

        for (relation, model_name) in schema.nested_relations() {
            let payloads: Vec<JsonMap> = self.nested_attributes(relation).to_vec();
            if payloads.is_empty() {
                continue;
            }
            let child_schema = session.registry().get(model_name)?;
            let key = format!("{}_attributes", relation);

            for (index, mut payload) in payloads.into_iter().enumerate() {
                let marked = payload
                    .remove("_delete")
                    .map(|marker| is_delete_marker(&marker))
                    .unwrap_or(false);
                let mut child = Model::from_attributes(Arc::clone(&child_schema), payload);
                child.assign(&foreign_key, parent_id.clone());

                if marked {
                    if !child.is_new() {
                        child.delete(session).await?;
                    }
                    continue;
                }

                child.save_inner(session).await?;
                if !child.is_valid() {
                    self.errors_mut()
                        .add_nested(key.clone(), indexed(index, child.errors().clone()));
                }
            }
        }
        Ok(())
    }

    async fn save_attachments(&mut self) -> OrmResult<()> {
        let Some(owner) = self.id().cloned() else {
            return Ok(());
        };
        let schema = Arc::clone(&self.schema);
        let stores: Vec<(&str, &Arc<dyn AttachmentStore>)> = schema.attachment_relations().collect();

        for (relation, store) in stores {
            let key = format!("{}_attributes", relation);

            let entries: Vec<JsonMap> = self.attachment_attributes(relation).to_vec();
            for (index, entry) in entries.iter().enumerate() {
                let marked = entry.get("_delete").map(is_delete_marker).unwrap_or(false);
                if !marked {
                    continue;
                }
                if let Err(errors) = store.delete(&owner, entry).await {
                    self.errors_mut().add_nested(key.clone(), indexed(index, errors));
                }
            }

            let uploads = self.attachment_uploads(relation).to_vec();
            for (index, file) in uploads.iter().enumerate() {
                if file.is_empty() {
                    continue;
                }
                if let Err(errors) = store.upload(&owner, file).await {
                    self.errors_mut().add_nested(key.clone(), indexed(index, errors));
                }
            }
        }
        Ok(())
    }

    /// Remove the attachment directories, then the row itself.
    ///
    /// Removed directories stay removed even if the row delete later fails
    /// or an enclosing transaction is rolled back.
    pub async fn delete(&self, session: &mut Session) -> OrmResult<ExecResult> {
        let id = self.id().cloned().ok_or(ModelError::MissingPrimaryKey)?;

        for (relation, store) in self.schema.attachment_relations() {
            let directory = store.directory(&id);
            if fs::metadata(&directory).await.is_ok() {
                fs::remove_dir_all(&directory).await?;
                debug!(relation, directory = %directory.display(), "removed attachment directory");
            }
        }

        session
            .query_for(&self.schema)
            .delete()
            .where_map([("id", id)])?
            .limit(1)
            .exec(session)
            .await
    }

    /// Load one has-many relation into the relation cache
    pub async fn load_related(&mut self, relation: &str, session: &mut Session) -> OrmResult<&[Model]> {
        let schema = Arc::clone(&self.schema);
        load_has_many(&schema, std::slice::from_mut(self), relation, session).await?;
        Ok(self.related(relation).unwrap_or(&[]))
    }
}
