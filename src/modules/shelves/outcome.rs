//! Transport-neutral handler results.
//!
//! A handler decides *what* happened; [`Outcome::respond`] decides how to
//! tell the client, depending on whether it navigates (redirect + flash) or
//! calls in the background (status + plain text).

use atlas_http::{CallerKind, Flash, FlashRedirect};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::messages::Message;

/// Landing page for rejected requests.
pub const DEFAULT_LANDING: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    NotFound,
    Forbidden,
    Conflict,
    StoreError,
}

impl OutcomeKind {
    /// Status sent to programmatic callers.
    pub fn status(self) -> StatusCode {
        match self {
            OutcomeKind::Success => StatusCode::NO_CONTENT,
            OutcomeKind::NotFound | OutcomeKind::Conflict => StatusCode::BAD_REQUEST,
            OutcomeKind::Forbidden => StatusCode::FORBIDDEN,
            OutcomeKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub message: Message,
    pub redirect: String,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, message: Message, redirect: impl Into<String>) -> Self {
        Self {
            kind,
            message,
            redirect: redirect.into(),
        }
    }

    pub fn success(message: Message, redirect: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Success, message, redirect)
    }

    pub fn respond(self, caller: CallerKind) -> Response {
        match caller {
            CallerKind::Interactive => {
                let flash = match self.kind {
                    OutcomeKind::Success => Flash::success(self.message.to_string()),
                    _ => Flash::error(self.message.to_string()),
                };
                FlashRedirect::to(self.redirect)
                    .with_flash(flash)
                    .into_response()
            }
            CallerKind::Programmatic => match self.kind {
                OutcomeKind::Success => StatusCode::NO_CONTENT.into_response(),
                kind => (kind.status(), self.message.to_string()).into_response(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_http::flash::FLASH_HEADER;
    use axum::http::header;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn programmatic_success_is_empty_no_content() {
        let response = Outcome::success(
            Message::BookAdded {
                shelf: "Sci-Fi".to_string(),
            },
            "/",
        )
        .respond(CallerKind::Programmatic);

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn programmatic_errors_are_plain_text() {
        let cases = [
            (OutcomeKind::NotFound, StatusCode::BAD_REQUEST),
            (OutcomeKind::Conflict, StatusCode::BAD_REQUEST),
            (OutcomeKind::Forbidden, StatusCode::FORBIDDEN),
            (OutcomeKind::StoreError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            let response =
                Outcome::new(kind, Message::InvalidShelf, "/").respond(CallerKind::Programmatic);
            assert_eq!(response.status(), status);
            assert_eq!(body_text(response).await, "Invalid shelf specified");
        }
    }

    #[test]
    fn interactive_outcome_redirects_with_flash() {
        let response = Outcome::new(OutcomeKind::Forbidden, Message::AddNotAllowed, "/")
            .respond(CallerKind::Interactive);

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let flash = Flash::from_header(&response.headers()[FLASH_HEADER]).unwrap();
        assert_eq!(
            flash,
            Flash::error("Sorry you are not allowed to add a book to that shelf")
        );
    }
}
