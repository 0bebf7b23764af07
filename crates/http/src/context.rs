//! Request-scoped caller context.
//!
//! ATLAS sits behind an authenticating proxy which forwards the signed-in
//! user id and role names as headers. [`RequestCtx`] turns those, together
//! with the AJAX marker and the referring page, into an explicit value handed
//! to every handler.

use atlas_authz::{Caller, Role, UserId};
use atlas_kernel::settings::AuthSettings;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::error::AppError;

const REQUESTED_WITH: &str = "x-requested-with";
const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Header names carrying the proxy-asserted identity.
///
/// Installed as a request extension by [`crate::router::RouterBuilder::with_identity`];
/// defaults apply when absent.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub user: String,
    pub roles: String,
}

impl From<&AuthSettings> for IdentityHeaders {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            user: settings.user_header.clone(),
            roles: settings.roles_header.clone(),
        }
    }
}

impl Default for IdentityHeaders {
    fn default() -> Self {
        Self::from(&AuthSettings::default())
    }
}

/// How the client wants to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerKind {
    /// Full-page navigation: redirect and flash a message.
    Interactive,
    /// Background request: bare status code and a short text body.
    Programmatic,
}

impl CallerKind {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ajax = headers
            .get(REQUESTED_WITH)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case(XML_HTTP_REQUEST));
        if ajax {
            CallerKind::Programmatic
        } else {
            CallerKind::Interactive
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestCtx {
    pub caller: Caller,
    pub kind: CallerKind,
    /// Value of the `Referer` header, if any.
    pub referrer: Option<String>,
}

impl RequestCtx {
    /// Where to send the client back to: the referring page or `fallback`.
    pub fn return_to(&self, fallback: &str) -> String {
        self.referrer
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn parse_caller(headers: &HeaderMap, names: &IdentityHeaders) -> Result<Caller, AppError> {
    let Some(raw_user) = headers.get(names.user.as_str()) else {
        return Ok(Caller::Anonymous);
    };

    let id: UserId = raw_user
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| AppError::unauthorized("malformed user identity header"))?;

    let roles = headers
        .get_all(names.roles.as_str())
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(Role::parse);

    Ok(Caller::user(id, roles))
}

impl<S> FromRequestParts<S> for RequestCtx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let names = parts
            .extensions
            .get::<IdentityHeaders>()
            .cloned()
            .unwrap_or_default();

        let caller = parse_caller(&parts.headers, &names)?;
        let referrer = parts
            .headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self {
            caller,
            kind: CallerKind::from_headers(&parts.headers),
            referrer,
        })
    }
}
