//! Shelf operations, independent of how the request arrived.

use std::sync::Arc;

use atlas_authz::{can_edit_shelf, can_view_shelf, Caller, UserId};
use atlas_db::{
    Book, BookId, Catalog, NewShelf, Shelf, ShelfChanges, ShelfId, ShelfMembership, ShelfStore,
    StoreError,
};
use atlas_http::PageRenderer;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::task::JoinError;

use super::outcome::OutcomeKind;

/// Collaborators shared by every shelf request.
#[derive(Clone)]
pub struct ShelfState {
    pub shelves: Arc<dyn ShelfStore>,
    pub catalog: Arc<dyn Catalog>,
    pub renderer: Arc<dyn PageRenderer>,
}

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("shelf {0} does not exist")]
    ShelfNotFound(ShelfId),
    #[error("caller may not edit shelf {0}")]
    EditDenied(ShelfId),
    #[error("caller may not view shelf {0}")]
    ViewDenied(ShelfId),
    #[error("book {book_id} is already part of shelf {shelf}")]
    AlreadyOnShelf { shelf: String, book_id: BookId },
    #[error("book {0} is not in the catalog")]
    BookNotFound(BookId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("shelf task failed: {0}")]
    Worker(#[from] JoinError),
}

impl ShelfError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ShelfError::ShelfNotFound(_) | ShelfError::BookNotFound(_) => OutcomeKind::NotFound,
            ShelfError::EditDenied(_) | ShelfError::ViewDenied(_) => OutcomeKind::Forbidden,
            ShelfError::AlreadyOnShelf { .. } => OutcomeKind::Conflict,
            ShelfError::Store(_) | ShelfError::Worker(_) => OutcomeKind::StoreError,
        }
    }
}

/// Submitted shelf fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfDraft {
    pub name: String,
    pub is_public: bool,
}

/// Run `op` on the blocking pool; the stores hold synchronous SQLite
/// connections.
pub async fn run_blocking<T, F>(state: &ShelfState, op: F) -> Result<T, ShelfError>
where
    T: Send + 'static,
    F: FnOnce(&ShelfState) -> Result<T, ShelfError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || op(&state)).await?
}

fn resolve_shelf(state: &ShelfState, shelf_id: ShelfId) -> Result<Shelf, ShelfError> {
    state
        .shelves
        .get_shelf(shelf_id)?
        .ok_or(ShelfError::ShelfNotFound(shelf_id))
}

/// Append `book_id` to the shelf on behalf of `caller`.
///
/// Checks run in a fixed order: shelf exists, caller may edit it, book not
/// yet on it, book exists in the catalog. The store repeats the duplicate
/// check inside the append, so racing adds of one book insert it once.
pub fn add_book(
    state: &ShelfState,
    caller: &Caller,
    shelf_id: ShelfId,
    book_id: BookId,
) -> Result<(Shelf, ShelfMembership), ShelfError> {
    let shelf = resolve_shelf(state, shelf_id).inspect_err(|error| {
        if let ShelfError::ShelfNotFound(_) = error {
            tracing::error!(shelf_id, "invalid shelf specified");
        }
    })?;

    if !can_edit_shelf(caller, &shelf) {
        return Err(ShelfError::EditDenied(shelf.id));
    }

    if state.shelves.membership(shelf.id, book_id)?.is_some() {
        tracing::error!(book_id, shelf = %shelf.name, "book is already part of shelf");
        return Err(ShelfError::AlreadyOnShelf {
            shelf: shelf.name,
            book_id,
        });
    }

    if !state.catalog.book_exists(book_id)? {
        tracing::error!(
            book_id,
            shelf = %shelf.name,
            "invalid book id, could not be added to shelf"
        );
        return Err(ShelfError::BookNotFound(book_id));
    }

    let membership = match state
        .shelves
        .append_book(shelf.id, book_id, OffsetDateTime::now_utc())
    {
        Ok(membership) => membership,
        Err(StoreError::AlreadyPresent { .. }) => {
            tracing::error!(book_id, shelf = %shelf.name, "book is already part of shelf");
            return Err(ShelfError::AlreadyOnShelf {
                shelf: shelf.name,
                book_id,
            });
        }
        Err(error) => return Err(error.into()),
    };
    tracing::debug!(
        book_id,
        shelf = %shelf.name,
        order = membership.order,
        "book has been added to shelf"
    );

    Ok((shelf, membership))
}

pub fn create_shelf(
    state: &ShelfState,
    owner: UserId,
    draft: &ShelfDraft,
) -> Result<Shelf, ShelfError> {
    let shelf = state.shelves.create_shelf(&NewShelf {
        name: draft.name.clone(),
        user_id: owner,
        is_public: draft.is_public,
    })?;
    tracing::info!(shelf_id = shelf.id, user_id = owner, "shelf created");
    Ok(shelf)
}

/// Shelf `shelf_id`, provided `caller` may edit it.
pub fn editable_shelf(
    state: &ShelfState,
    caller: &Caller,
    shelf_id: ShelfId,
) -> Result<Shelf, ShelfError> {
    let shelf = resolve_shelf(state, shelf_id)?;
    if !can_edit_shelf(caller, &shelf) {
        return Err(ShelfError::EditDenied(shelf.id));
    }
    Ok(shelf)
}

pub fn update_shelf(
    state: &ShelfState,
    shelf: &Shelf,
    draft: &ShelfDraft,
) -> Result<Shelf, ShelfError> {
    let updated = state.shelves.update_shelf(
        shelf.id,
        &ShelfChanges {
            name: draft.name.clone(),
            is_public: draft.is_public,
            last_modified: OffsetDateTime::now_utc(),
        },
    )?;
    tracing::info!(shelf_id = shelf.id, "shelf changed");
    Ok(updated)
}

/// The shelf and its books in shelf order, provided `caller` may view it.
///
/// Memberships pointing at books gone from the catalog are left out.
pub fn shelf_listing(
    state: &ShelfState,
    caller: &Caller,
    shelf_id: ShelfId,
) -> Result<(Shelf, Vec<Book>), ShelfError> {
    let shelf = resolve_shelf(state, shelf_id)?;
    if !can_view_shelf(caller, &shelf) {
        return Err(ShelfError::ViewDenied(shelf.id));
    }

    let ids: Vec<BookId> = state
        .shelves
        .memberships(shelf.id)?
        .into_iter()
        .map(|membership| membership.book_id)
        .collect();
    let books = state.catalog.books_by_ids(&ids)?;

    Ok((shelf, books))
}
