//! Page rendering seam.
//!
//! Handlers describe a page by template name plus JSON data; the installed
//! [`PageRenderer`] turns that into a response. The default renderer hands
//! the page model to the client as JSON, leaving markup to the front end.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{error::AppError, flash::Flash};

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub template: &'static str,
    pub title: String,
    /// Navigation marker used to highlight the active menu entry.
    pub page: &'static str,
    pub flash: Option<Flash>,
    pub data: serde_json::Value,
}

impl Page {
    pub fn new(template: &'static str, title: impl Into<String>, page: &'static str) -> Self {
        Self {
            template,
            title: title.into(),
            page,
            flash: None,
            data: serde_json::Value::Null,
        }
    }

    /// Attach the page data; serialization failures surface as internal errors.
    pub fn with_data(mut self, data: impl Serialize) -> Result<Self, AppError> {
        self.data = serde_json::to_value(data)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("page data: {e}")))?;
        Ok(self)
    }

    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }
}

pub trait PageRenderer: Send + Sync {
    fn render(&self, page: Page) -> Result<Response, AppError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPageRenderer;

impl PageRenderer for JsonPageRenderer {
    fn render(&self, page: Page) -> Result<Response, AppError> {
        tracing::debug!(template = page.template, "rendering page");
        Ok(Json(page).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn json_renderer_exposes_page_model() {
        let page = Page::new("shelf_edit", "Create a Shelf", "shelfcreate")
            .with_data(serde_json::json!({"name": ""}))
            .unwrap()
            .with_flash(Flash::error("Database error: locked"));

        let response = JsonPageRenderer.render(page).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["template"], "shelf_edit");
        assert_eq!(body["title"], "Create a Shelf");
        assert_eq!(body["page"], "shelfcreate");
        assert_eq!(body["flash"]["category"], "error");
        assert_eq!(body["data"]["name"], "");
    }
}
