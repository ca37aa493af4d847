//! Session - the connection, model registry and defaults every query runs
//! against

use std::sync::Arc;

use tracing::debug;

use crate::backends::{DatabaseConnection, DatabaseValue, MySqlBackendConnection};
use crate::config::DatabaseConfig;
use crate::error::{ModelError, OrmResult};
use crate::model::{JsonMap, Model, ModelRegistry, ModelSchema};
use crate::query::QueryBuilder;

/// One database connection plus the registered models.
///
/// Statements are issued in call order on the single connection; callers
/// that share a session across tasks must serialize access themselves.
pub struct Session {
    conn: Box<dyn DatabaseConnection>,
    registry: Arc<ModelRegistry>,
    config: DatabaseConfig,
    in_transaction: bool,
}

impl Session {
    pub fn new(conn: impl DatabaseConnection + 'static, registry: Arc<ModelRegistry>) -> Self {
        Self {
            conn: Box::new(conn),
            registry,
            config: DatabaseConfig::default(),
            in_transaction: false,
        }
    }

    pub fn with_config(mut self, config: DatabaseConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate `config` and open a MySQL connection from its URL
    pub async fn connect(config: DatabaseConfig, registry: Arc<ModelRegistry>) -> OrmResult<Self> {
        config.validate()?;
        let url = config.require_database_url()?;
        let conn = MySqlBackendConnection::connect(url).await?;
        Ok(Self::new(conn, registry).with_config(config))
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn connection(&mut self) -> &mut dyn DatabaseConnection {
        self.conn.as_mut()
    }

    pub fn schema(&self, model: &str) -> OrmResult<Arc<ModelSchema>> {
        self.registry.get(model)
    }

    /// Empty builder for a registered model
    pub fn query(&self, model: &str) -> OrmResult<QueryBuilder> {
        Ok(QueryBuilder::new(self.schema(model)?))
    }

    pub fn query_for(&self, schema: &Arc<ModelSchema>) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(schema))
    }

    /// Select of `page` using the configured page size
    pub fn query_page(&self, model: &str, page: i64) -> OrmResult<QueryBuilder> {
        Ok(self
            .query(model)?
            .select("*")
            .paginate(page, self.config.per_page))
    }

    pub fn new_model(&self, model: &str) -> OrmResult<Model> {
        Ok(Model::new(self.schema(model)?))
    }

    /// Unsaved instance with `values` assigned over the defaults
    pub fn build(&self, model: &str, values: JsonMap) -> OrmResult<Model> {
        Ok(Model::from_attributes(self.schema(model)?, values))
    }

    pub async fn find(&mut self, model: &str, id: impl Into<DatabaseValue>) -> OrmResult<Option<Model>> {
        self.query(model)?.find_by([("id", id.into())], self).await
    }

    /// Like [`find`](Session::find), with a missing row as [`ModelError::NotFound`]
    pub async fn find_or_fail(&mut self, model: &str, id: impl Into<DatabaseValue>) -> OrmResult<Model> {
        let schema = self.schema(model)?;
        let id = id.into();
        self.find(model, id.clone()).await?.ok_or_else(|| {
            ModelError::NotFound(format!(
                "{} with id {} not found",
                schema.table(),
                id.to_json()
            ))
        })
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub async fn begin(&mut self) -> OrmResult<()> {
        if self.in_transaction {
            return Err(ModelError::Transaction(
                "A transaction is already open on this session".to_string(),
            ));
        }
        debug!("Beginning transaction");
        self.conn.begin().await?;
        self.in_transaction = true;
        Ok(())
    }

    pub async fn commit(&mut self) -> OrmResult<()> {
        if !self.in_transaction {
            return Err(ModelError::Transaction("No transaction to commit".to_string()));
        }
        debug!("Committing transaction");
        self.conn.commit().await?;
        self.in_transaction = false;
        Ok(())
    }

    pub async fn rollback(&mut self) -> OrmResult<()> {
        if !self.in_transaction {
            return Err(ModelError::Transaction("No transaction to roll back".to_string()));
        }
        debug!("Rolling back transaction");
        self.in_transaction = false;
        self.conn.rollback().await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("models", &self.registry.names())
            .field("config", &self.config)
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Row, ScriptedConnection};

    fn registry() -> Arc<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelSchema::builder("Category", "categories")
                    .attribute("id", "id")
                    .attribute("name", "Name")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_transaction_state() {
        let conn = ScriptedConnection::new();
        let log = conn.log();
        let mut session = Session::new(conn, registry());

        assert!(session.commit().await.is_err());
        session.begin().await.unwrap();
        assert!(session.in_transaction());
        assert!(matches!(session.begin().await, Err(ModelError::Transaction(_))));
        session.rollback().await.unwrap();
        assert!(!session.in_transaction());

        assert_eq!(log.sql(), vec!["BEGIN", "ROLLBACK"]);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_transaction_open() {
        let mut session = Session::new(ScriptedConnection::new().fail_on("COMMIT"), registry());

        session.begin().await.unwrap();
        assert!(session.commit().await.is_err());
        assert!(session.in_transaction());
        session.rollback().await.unwrap();
        assert!(!session.in_transaction());
    }

    #[tokio::test]
    async fn test_find_or_fail() {
        let conn = ScriptedConnection::new().respond(
            "FROM `categories`",
            vec![Row::new().with("id", 3).with("Name", "Sport")],
        );
        let mut session = Session::new(conn, registry());

        let found = session.find_or_fail("Category", 3).await.unwrap();
        assert_eq!(found.get("name"), Some(&DatabaseValue::from("Sport")));

        let missing = session.find_or_fail("Category", 4).await.unwrap_err();
        assert!(missing.is_not_found());
        assert_eq!(missing.status_code(), 404);
    }

    #[test]
    fn test_unknown_model() {
        let session = Session::new(ScriptedConnection::new(), registry());
        assert!(matches!(session.query("Article"), Err(ModelError::UnknownModel(_))));
    }

    #[test]
    fn test_query_page_uses_configured_size() {
        let mut config = DatabaseConfig::default();
        config.per_page = 20;
        let session = Session::new(ScriptedConnection::new(), registry()).with_config(config);

        let query = session.query_page("Category", 2).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT SQL_CALC_FOUND_ROWS * FROM `categories` LIMIT 20 OFFSET 20"
        );
    }
}
