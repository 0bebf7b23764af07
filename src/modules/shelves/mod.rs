//! User-curated, ordered book shelves.
//!
//! Routes are served under `/shelf`. Adding a book answers AJAX callers with
//! a bare status code and everyone else with a redirect plus flash message.

pub mod handlers;
pub mod messages;
pub mod outcome;
pub mod service;


use std::sync::Arc;

use async_trait::async_trait;
use atlas_kernel::{InitCtx, Migration, Module};
use axum::{
    routing::{get, post},
    Router,
};
use once_cell::sync::Lazy;

pub use service::{ShelfError, ShelfState};

pub const MODULE_NAME: &str = "shelf";

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: atlas_db::shelves::SCHEMA_V1,
    }]
}

static OPENAPI: Lazy<serde_json::Value> = Lazy::new(|| {
    let error_response = serde_json::json!({
        "content": {"text/plain": {"schema": {"type": "string"}}}
    });
    let flash_redirect = serde_json::json!({
        "description": "Redirect; the outcome is flashed in the x-flash header"
    });
    let page = serde_json::json!({
        "description": "Rendered page",
        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Page"}}}
    });

    serde_json::json!({
        "paths": {
            "/add/{shelf_id}/{book_id}": {
                "post": {
                    "summary": "Append a book to a shelf",
                    "tags": ["Shelves"],
                    "parameters": [
                        {"name": "shelf_id", "in": "path", "required": true, "schema": {"type": "integer"}},
                        {"name": "book_id", "in": "path", "required": true, "schema": {"type": "integer"}},
                        {"name": "X-Requested-With", "in": "header", "required": false, "schema": {"type": "string"}}
                    ],
                    "responses": {
                        "204": {"description": "Book added (AJAX callers)"},
                        "302": flash_redirect,
                        "400": {"description": "Invalid shelf, invalid book, or book already on shelf", "content": error_response["content"]},
                        "403": {"description": "Caller may not edit the shelf", "content": error_response["content"]}
                    }
                }
            },
            "/create": {
                "get": {
                    "summary": "Shelf creation form",
                    "tags": ["Shelves"],
                    "responses": {"200": page, "401": {"description": "Login required"}}
                },
                "post": {
                    "summary": "Create a shelf",
                    "tags": ["Shelves"],
                    "requestBody": {
                        "content": {"application/x-www-form-urlencoded": {"schema": {"$ref": "#/components/schemas/ShelfForm"}}}
                    },
                    "responses": {"200": page, "302": flash_redirect}
                }
            },
            "/edit/{shelf_id}": {
                "get": {
                    "summary": "Shelf edit form",
                    "tags": ["Shelves"],
                    "responses": {"200": page, "302": flash_redirect}
                },
                "post": {
                    "summary": "Change a shelf's title or visibility",
                    "tags": ["Shelves"],
                    "requestBody": {
                        "content": {"application/x-www-form-urlencoded": {"schema": {"$ref": "#/components/schemas/ShelfForm"}}}
                    },
                    "responses": {"200": page, "302": flash_redirect}
                }
            },
            "/show/{shelf_id}": {
                "get": {
                    "summary": "Books on a shelf, in shelf order",
                    "tags": ["Shelves"],
                    "responses": {"200": page, "302": flash_redirect}
                }
            },
            "/download/{shelf_id}": {
                "get": {
                    "summary": "Whole shelf on one page for bulk download",
                    "tags": ["Shelves"],
                    "responses": {"200": page, "302": flash_redirect}
                }
            },
            "/health": {
                "get": {
                    "summary": "Shelf module health check",
                    "tags": ["Shelves"],
                    "responses": {"200": {"description": "OK"}}
                }
            }
        },
        "components": {
            "schemas": {
                "ShelfForm": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "Shelf name"},
                        "is_public": {"type": "string", "description": "\"on\" makes the shelf public"}
                    }
                },
                "Page": {
                    "type": "object",
                    "properties": {
                        "template": {"type": "string"},
                        "title": {"type": "string"},
                        "page": {"type": "string"},
                        "flash": {"type": "object"},
                        "data": {"type": "object"}
                    },
                    "required": ["template", "title", "page", "data"]
                }
            }
        }
    })
});

pub struct ShelvesModule {
    state: ShelfState,
}

impl ShelvesModule {
    pub fn new(state: ShelfState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ShelvesModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn mount_path(&self) -> String {
        "/shelf".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "shelf module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/add/{shelf_id}/{book_id}", post(handlers::add_to_shelf))
            .route(
                "/create",
                get(handlers::create_form).post(handlers::create_submit),
            )
            .route(
                "/edit/{shelf_id}",
                get(handlers::edit_form).post(handlers::edit_submit),
            )
            .route("/show/{shelf_id}", get(handlers::show_shelf))
            .route("/download/{shelf_id}", get(handlers::download_shelf))
            .route("/health", get(handlers::health_check))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(OPENAPI.clone())
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "shelf module stopped");
        Ok(())
    }
}

pub fn create_module(state: ShelfState) -> Arc<dyn Module> {
    Arc::new(ShelvesModule::new(state))
}
