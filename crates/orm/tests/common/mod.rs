//! Shared models for the integration tests: categories with articles,
//! articles with content blocks and image attachments

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use dbwk_orm::{
    JsonMap, LocalAttachmentStore, ModelRegistry, ModelSchema, Rule, ScriptedConnection, Session,
    StatementLog,
};
use serde_json::Value;

pub fn category_schema() -> ModelSchema {
    ModelSchema::builder("Category", "categories")
        .attribute("id", "id")
        .attribute("name", "Name")
        .has_many("articles", "Article")
        .validates(|_| vec![("name".to_string(), Rule::new().required(true))])
        .build()
        .unwrap()
}

pub fn article_schema(images: &Path) -> ModelSchema {
    ModelSchema::builder("Article", "articles")
        .attribute("id", "id")
        .attribute("title", "Title")
        .attribute("category_id", "CategoryId")
        .attribute_with_default("status", "Status", "draft")
        .attribute("published_at", "PubDate")
        .attribute("created_at", "CreatedAt")
        .attribute("updated_at", "UpdatedAt")
        .has_many("article_contents", "ArticleContent")
        .accepts_nested_attributes_for("article_content", "ArticleContent")
        .attachments_for(
            "images",
            Arc::new(LocalAttachmentStore::new(images).allowed_extensions(["jpg", "png"])),
        )
        .validates(|_| {
            vec![(
                "title".to_string(),
                Rule::new()
                    .required(true)
                    .error_empty("Title is required")
                    .length_max(120),
            )]
        })
        .build()
        .unwrap()
}

pub fn article_content_schema() -> ModelSchema {
    ModelSchema::builder("ArticleContent", "article_contents")
        .attribute("id", "id")
        .attribute("article_id", "ArticleId")
        .attribute("body", "Body")
        .attribute_with_default("position", "Position", 0)
        .validates(|_| vec![("body".to_string(), Rule::new().required(true))])
        .build()
        .unwrap()
}

pub fn registry(images: &Path) -> Arc<ModelRegistry> {
    let mut registry = ModelRegistry::new();
    registry.register(category_schema()).unwrap();
    registry.register(article_schema(images)).unwrap();
    registry.register(article_content_schema()).unwrap();
    registry.check_references().unwrap();
    Arc::new(registry)
}

/// Session over `conn` plus a handle on its statement log
pub fn session(conn: ScriptedConnection, images: &Path) -> (Session, StatementLog) {
    let log = conn.log();
    (Session::new(conn, registry(images)), log)
}

pub fn payload(value: Value) -> JsonMap {
    match value {
        Value::Object(object) => object,
        other => panic!("expected a JSON object, got {}", other),
    }
}
