//! Articles with nested content blocks, run against a scripted connection.
//!
//! Prints every statement the session issues. Run with
//! `RUST_LOG=dbwk=debug` to see them through the logging layer as well.

use std::sync::Arc;

use dbwk_orm::{
    init_logging, LoggingConfig, ModelRegistry, ModelSchema, OrmResult, Row, Rule,
    ScriptedConnection, Session,
};
use serde_json::json;

fn registry() -> OrmResult<Arc<ModelRegistry>> {
    let mut registry = ModelRegistry::new();
    registry.register(
        ModelSchema::builder("Article", "articles")
            .attribute("id", "id")
            .attribute("title", "Title")
            .attribute("published_at", "PubDate")
            .attribute("created_at", "CreatedAt")
            .attribute("updated_at", "UpdatedAt")
            .has_many("article_contents", "ArticleContent")
            .accepts_nested_attributes_for("article_content", "ArticleContent")
            .validates(|_| vec![("title".to_string(), Rule::new().required(true).length_max(120))])
            .build()?,
    )?;
    registry.register(
        ModelSchema::builder("ArticleContent", "article_contents")
            .attribute("id", "id")
            .attribute("article_id", "ArticleId")
            .attribute("body", "Body")
            .validates(|_| vec![("body".to_string(), Rule::new().required(true))])
            .build()?,
    )?;
    registry.check_references()?;
    Ok(Arc::new(registry))
}

#[tokio::main]
async fn main() -> OrmResult<()> {
    if let Err(e) = init_logging(LoggingConfig::development()) {
        eprintln!("logging disabled: {}", e);
    }

    let conn = ScriptedConnection::new()
        .respond(
            "FROM `articles`",
            vec![Row::new().with("id", 1).with("Title", "Polls open")],
        )
        .respond(
            "FROM `article_contents`",
            vec![Row::new().with("id", 1).with("ArticleId", 1).with("Body", "Turnout is high.")],
        );
    let log = conn.log();
    let mut session = Session::new(conn, registry()?);

    let payload = json!({
        "title": "Polls open",
        "article_content_attributes": [
            {"body": "Turnout is high."},
            {"body": ""}
        ]
    });
    let mut article = session.build("Article", payload.as_object().cloned().unwrap_or_default())?;
    let outcome = article.save(&mut session).await?;
    println!("first save: {:?}, errors: {}", outcome, article.errors().to_json());

    let mut article = session.build(
        "Article",
        json!({
            "title": "Polls open",
            "article_content_attributes": [{"body": "Turnout is high."}]
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
    )?;
    let outcome = article.save(&mut session).await?;
    println!("second save: {:?}, id: {:?}", outcome, article.id());

    let articles = session
        .query("Article")?
        .select("*")
        .with(["article_contents"])
        .paginate(1, 10)
        .fetch_all(&mut session)
        .await?;
    println!("{}", serde_json::to_string_pretty(&articles).unwrap_or_default());

    for statement in log.sql() {
        println!("{}", statement);
    }
    Ok(())
}
