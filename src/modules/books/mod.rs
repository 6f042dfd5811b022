pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

use async_trait::async_trait;
use axum::Router;
use biblio_kernel::{InitCtx, Migration, Module};
use sqlx::SqlitePool;

use store::BookStore;

/// DDL for the `books` table; safe to run on every startup.
pub const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        isbn       TEXT PRIMARY KEY NOT NULL,
        amazon_url TEXT NOT NULL,
        author     TEXT NOT NULL,
        language   TEXT NOT NULL,
        pages      INTEGER NOT NULL,
        publisher  TEXT NOT NULL,
        title      TEXT NOT NULL,
        year       INTEGER NOT NULL
    );
"#;

/// Book catalogue module: CRUD over `/books`
pub struct BooksModule {
    store: BookStore,
}

impl BooksModule {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            store: BookStore::new(pool),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let stored = self.store.count().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            stored,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let json_body = |schema: &str| {
            serde_json::json!({
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{schema}") }
                }
            })
        };
        let isbn_param = serde_json::json!([{
            "name": "isbn",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);

        Some(serde_json::json!({
            "paths": {
                "/books/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": { "description": "All books", "content": json_body("BookList") },
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": { "required": true, "content": json_body("Book") },
                        "responses": {
                            "200": { "description": "Created book", "content": json_body("BookEnvelope") },
                            "400": error("Invalid input or duplicate isbn"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/books/{isbn}": {
                    "get": {
                        "summary": "Fetch a book",
                        "tags": ["Books"],
                        "parameters": isbn_param.clone(),
                        "responses": {
                            "200": { "description": "The book", "content": json_body("BookEnvelope") },
                            "404": error("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Update some fields of a book",
                        "tags": ["Books"],
                        "parameters": isbn_param.clone(),
                        "requestBody": { "required": true, "content": json_body("BookPatch") },
                        "responses": {
                            "200": { "description": "Updated book", "content": json_body("BookEnvelope") },
                            "400": error("Invalid input"),
                            "404": error("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": isbn_param,
                        "responses": {
                            "200": { "description": "Deleted", "content": json_body("Message") },
                            "404": error("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "isbn": { "type": "string" },
                            "amazon_url": { "type": "string", "format": "uri" },
                            "author": { "type": "string" },
                            "language": { "type": "string" },
                            "pages": { "type": "integer", "format": "int64" },
                            "publisher": { "type": "string" },
                            "title": { "type": "string" },
                            "year": { "type": "integer", "format": "int64" }
                        },
                        "required": ["isbn", "amazon_url", "author", "language", "pages", "publisher", "title", "year"]
                    },
                    "BookPatch": {
                        "type": "object",
                        "properties": {
                            "amazon_url": { "type": "string", "format": "uri" },
                            "author": { "type": "string" },
                            "language": { "type": "string" },
                            "pages": { "type": "integer", "format": "int64" },
                            "publisher": { "type": "string" },
                            "title": { "type": "string" },
                            "year": { "type": "integer", "format": "int64" }
                        }
                    },
                    "BookEnvelope": {
                        "type": "object",
                        "properties": { "book": { "$ref": "#/components/schemas/Book" } },
                        "required": ["book"]
                    },
                    "BookList": {
                        "type": "object",
                        "properties": {
                            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                        },
                        "required": ["books"]
                    },
                    "Message": {
                        "type": "object",
                        "properties": { "message": { "type": "string" } },
                        "required": ["message"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_books",
            up: SCHEMA,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(pool: SqlitePool) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(pool))
}
