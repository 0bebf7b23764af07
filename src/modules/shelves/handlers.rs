use atlas_db::{Book, BookId, Shelf, ShelfId};
use atlas_http::{AppError, Flash, FlashRedirect, Page, RequestCtx};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::{Deserialize, Serialize};

use super::messages::Message;
use super::outcome::{Outcome, OutcomeKind, DEFAULT_LANDING};
use super::service::{self, ShelfDraft, ShelfError, ShelfState};

/// Fields of the create/edit shelf form.
#[derive(Debug, Default, Deserialize)]
pub struct ShelfForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_public: Option<String>,
}

impl ShelfForm {
    /// A checked checkbox submits `on`; anything else means private.
    pub fn into_draft(self) -> ShelfDraft {
        ShelfDraft {
            name: self.title.unwrap_or_default(),
            is_public: self.is_public.as_deref() == Some("on"),
        }
    }
}

/// Listing parameters; accepted for link compatibility but not applied.
///
/// `page` stays a string so a malformed value cannot fail the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<String>,
    pub sort: Option<String>,
}

impl ListingQuery {
    /// Requested page, `1` when absent or not a positive number.
    pub fn page_no(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse::<u32>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Regular shelf page.
    Listing,
    /// Everything on one page, for bulk download.
    Download,
}

impl DisplayMode {
    fn template(self) -> &'static str {
        match self {
            DisplayMode::Listing => "shelf",
            DisplayMode::Download => "shelfdown",
        }
    }

    /// Entries per page; `0` lets the front end decide.
    fn page_size(self) -> usize {
        match self {
            DisplayMode::Listing => 0,
            DisplayMode::Download => usize::MAX,
        }
    }
}

#[derive(Debug, Serialize)]
struct ShelfFormView {
    id: Option<ShelfId>,
    name: String,
    is_public: bool,
}

#[derive(Debug, Serialize)]
struct ShelfListing {
    shelf: Shelf,
    entries: Vec<Book>,
    page_size: usize,
    page_no: u32,
    sort: String,
}

fn show_path(shelf_id: ShelfId) -> String {
    format!("/shelf/show/{shelf_id}")
}

fn require_login(ctx: &RequestCtx) -> Result<atlas_authz::UserId, AppError> {
    ctx.caller
        .id()
        .ok_or_else(|| AppError::unauthorized(Message::LoginRequired.to_string()))
}

/// Outcome for a failed shelf edit or lookup outside add-to-shelf.
fn shelf_rejection(error: ShelfError, ctx: &RequestCtx) -> Outcome {
    match error {
        error @ (ShelfError::Store(_) | ShelfError::Worker(_)) => {
            tracing::error!(error = %error, "shelf database error");
            Outcome::new(
                OutcomeKind::StoreError,
                Message::FormDatabaseError {
                    error: error.to_string(),
                },
                ctx.return_to(DEFAULT_LANDING),
            )
        }
        ShelfError::EditDenied(_) => Outcome::new(
            OutcomeKind::Forbidden,
            Message::EditNotAllowed,
            DEFAULT_LANDING,
        ),
        other => Outcome::new(other.kind(), Message::ShelfUnavailable, DEFAULT_LANDING),
    }
}

pub async fn add_to_shelf(
    State(state): State<ShelfState>,
    ctx: RequestCtx,
    Path((shelf_id, book_id)): Path<(ShelfId, BookId)>,
) -> Response {
    let caller = ctx.caller.clone();
    let added = service::run_blocking(&state, move |state| {
        service::add_book(state, &caller, shelf_id, book_id)
    })
    .await;

    let outcome = match added {
        Ok((shelf, _)) => Outcome::success(
            Message::BookAdded { shelf: shelf.name },
            ctx.return_to(DEFAULT_LANDING),
        ),
        Err(error) => {
            let kind = error.kind();
            match error {
                ShelfError::ShelfNotFound(_) => {
                    Outcome::new(kind, Message::InvalidShelf, DEFAULT_LANDING)
                }
                ShelfError::EditDenied(_) => {
                    Outcome::new(kind, Message::AddNotAllowed, DEFAULT_LANDING)
                }
                ShelfError::AlreadyOnShelf { shelf, .. } => {
                    Outcome::new(kind, Message::AlreadyOnShelf { shelf }, DEFAULT_LANDING)
                }
                ShelfError::BookNotFound(book_id) => {
                    Outcome::new(kind, Message::InvalidBookId { book_id }, DEFAULT_LANDING)
                }
                error @ (ShelfError::Store(_) | ShelfError::Worker(_)) => {
                    tracing::error!(
                        error = %error,
                        shelf_id,
                        book_id,
                        "database error while adding book to shelf"
                    );
                    Outcome::new(
                        kind,
                        Message::AddDatabaseError {
                            error: error.to_string(),
                        },
                        ctx.return_to(DEFAULT_LANDING),
                    )
                }
                ShelfError::ViewDenied(_) => {
                    Outcome::new(kind, Message::ShelfUnavailable, DEFAULT_LANDING)
                }
            }
        }
    };

    outcome.respond(ctx.kind)
}

fn render_form(
    state: &ShelfState,
    title: Message,
    page: &'static str,
    view: ShelfFormView,
    flash: Option<Flash>,
) -> Result<Response, AppError> {
    let mut page = Page::new("shelf_edit", title.to_string(), page).with_data(view)?;
    if let Some(flash) = flash {
        page = page.with_flash(flash);
    }
    state.renderer.render(page)
}

pub async fn create_form(
    State(state): State<ShelfState>,
    ctx: RequestCtx,
) -> Result<Response, AppError> {
    require_login(&ctx)?;
    render_form(
        &state,
        Message::CreateShelfTitle,
        "shelfcreate",
        ShelfFormView {
            id: None,
            name: String::new(),
            is_public: false,
        },
        None,
    )
}

pub async fn create_submit(
    State(state): State<ShelfState>,
    ctx: RequestCtx,
    Form(form): Form<ShelfForm>,
) -> Result<Response, AppError> {
    let owner = require_login(&ctx)?;
    let draft = form.into_draft();

    let submitted = draft.clone();
    let created = service::run_blocking(&state, move |state| {
        service::create_shelf(state, owner, &submitted)
    })
    .await;

    match created {
        Ok(shelf) => Ok(FlashRedirect::to(show_path(shelf.id))
            .with_flash(Flash::success(
                Message::ShelfCreated { title: shelf.name }.to_string(),
            ))
            .into_response()),
        Err(error) => {
            tracing::error!(error = %error, user_id = owner, "shelf could not be created");
            render_form(
                &state,
                Message::CreateShelfTitle,
                "shelfcreate",
                ShelfFormView {
                    id: None,
                    name: draft.name,
                    is_public: draft.is_public,
                },
                Some(Flash::error(
                    Message::FormDatabaseError {
                        error: error.to_string(),
                    }
                    .to_string(),
                )),
            )
        }
    }
}

async fn editable(
    state: &ShelfState,
    ctx: &RequestCtx,
    shelf_id: ShelfId,
) -> Result<Shelf, ShelfError> {
    let caller = ctx.caller.clone();
    service::run_blocking(state, move |state| {
        service::editable_shelf(state, &caller, shelf_id)
    })
    .await
}

pub async fn edit_form(
    State(state): State<ShelfState>,
    ctx: RequestCtx,
    Path(shelf_id): Path<ShelfId>,
) -> Result<Response, AppError> {
    require_login(&ctx)?;
    let shelf = match editable(&state, &ctx, shelf_id).await {
        Ok(shelf) => shelf,
        Err(error) => return Ok(shelf_rejection(error, &ctx).respond(ctx.kind)),
    };

    render_form(
        &state,
        Message::EditShelfTitle,
        "shelfedit",
        ShelfFormView {
            id: Some(shelf.id),
            name: shelf.name,
            is_public: shelf.is_public,
        },
        None,
    )
}

pub async fn edit_submit(
    State(state): State<ShelfState>,
    ctx: RequestCtx,
    Path(shelf_id): Path<ShelfId>,
    Form(form): Form<ShelfForm>,
) -> Result<Response, AppError> {
    require_login(&ctx)?;
    let shelf = match editable(&state, &ctx, shelf_id).await {
        Ok(shelf) => shelf,
        Err(error) => return Ok(shelf_rejection(error, &ctx).respond(ctx.kind)),
    };
    let draft = form.into_draft();

    let (target, submitted) = (shelf.clone(), draft.clone());
    let updated = service::run_blocking(&state, move |state| {
        service::update_shelf(state, &target, &submitted)
    })
    .await;

    match updated {
        Ok(updated) => Ok(FlashRedirect::to(show_path(updated.id))
            .with_flash(Flash::success(
                Message::ShelfChanged {
                    title: updated.name,
                }
                .to_string(),
            ))
            .into_response()),
        Err(error) => {
            tracing::error!(error = %error, shelf_id, "shelf could not be changed");
            render_form(
                &state,
                Message::EditShelfTitle,
                "shelfedit",
                ShelfFormView {
                    id: Some(shelf.id),
                    name: draft.name,
                    is_public: draft.is_public,
                },
                Some(Flash::error(
                    Message::FormDatabaseError {
                        error: error.to_string(),
                    }
                    .to_string(),
                )),
            )
        }
    }
}

async fn render_shelf(
    state: &ShelfState,
    ctx: &RequestCtx,
    shelf_id: ShelfId,
    mode: DisplayMode,
    query: ListingQuery,
) -> Result<Response, AppError> {
    let caller = ctx.caller.clone();
    let listing = service::run_blocking(state, move |state| {
        service::shelf_listing(state, &caller, shelf_id)
    })
    .await;

    let (shelf, entries) = match listing {
        Ok(listing) => listing,
        Err(error) => return Ok(shelf_rejection(error, ctx).respond(ctx.kind)),
    };

    let title = Message::ShelfTitle {
        name: shelf.name.clone(),
    };
    let listing = ShelfListing {
        shelf,
        entries,
        page_size: mode.page_size(),
        page_no: query.page_no(),
        sort: query.sort.unwrap_or_else(|| "abc".to_string()),
    };

    state
        .renderer
        .render(Page::new(mode.template(), title.to_string(), "shelf").with_data(listing)?)
}

pub async fn show_shelf(
    State(state): State<ShelfState>,
    ctx: RequestCtx,
    Path(shelf_id): Path<ShelfId>,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    render_shelf(&state, &ctx, shelf_id, DisplayMode::Listing, query).await
}

pub async fn download_shelf(
    State(state): State<ShelfState>,
    ctx: RequestCtx,
    Path(shelf_id): Path<ShelfId>,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    render_shelf(&state, &ctx, shelf_id, DisplayMode::Download, query).await
}

pub async fn health_check() -> &'static str {
    "shelf module is healthy"
}
