//! Redirects carrying a one-shot notification for the next page.
//!
//! The message travels in the `x-flash` response header as JSON; the front
//! end shows it after following the redirect.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

pub const FLASH_HEADER: &str = "x-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Error,
            message: message.into(),
        }
    }

    /// Header encoding; `None` if the message cannot be carried in a header.
    pub fn to_header(&self) -> Option<HeaderValue> {
        let encoded = serde_json::to_string(self).ok()?;
        HeaderValue::from_bytes(encoded.as_bytes()).ok()
    }

    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        serde_json::from_slice(value.as_bytes()).ok()
    }
}

/// `302 Found` to `location`, optionally flashing a message.
#[derive(Debug, Clone)]
pub struct FlashRedirect {
    pub location: String,
    pub flash: Option<Flash>,
}

impl FlashRedirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flash: None,
        }
    }

    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let Ok(location) = HeaderValue::try_from(self.location.as_str()) else {
            tracing::error!(location = %self.location, "redirect target is not a valid header");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };

        let mut response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
        if let Some(value) = self.flash.as_ref().and_then(Flash::to_header) {
            response.headers_mut().insert(FLASH_HEADER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_carries_location_and_flash() {
        let response = FlashRedirect::to("/shelf/show/3")
            .with_flash(Flash::success("Shelf Sci-Fi created"))
            .into_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/shelf/show/3");
        let flash = Flash::from_header(&response.headers()[FLASH_HEADER]).unwrap();
        assert_eq!(flash, Flash::success("Shelf Sci-Fi created"));
    }

    #[test]
    fn non_ascii_messages_survive() {
        let flash = Flash::error("Regal „Bücher“ existiert nicht");
        let value = flash.to_header().unwrap();
        assert_eq!(Flash::from_header(&value).unwrap(), flash);
    }

    #[test]
    fn control_characters_are_escaped() {
        let flash = Flash::error("line one\nline two");
        assert!(flash.to_header().is_some());
    }
}
