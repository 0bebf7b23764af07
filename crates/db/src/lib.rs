//! SQLite persistence for ATLAS shelves.
//!
//! Two databases are involved: the read-only book [`catalog`] and the
//! read-write [`shelves`] store, which also records applied migrations.

use thiserror::Error;

pub mod catalog;
pub mod migrate;
pub mod models;
pub mod shelves;

pub use catalog::{Catalog, SqliteCatalog, CATALOG_SCHEMA};
pub use models::{Book, BookId, NewShelf, Shelf, ShelfChanges, ShelfId, ShelfMembership};
pub use shelves::{ShelfStore, SqliteShelfStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("book {book_id} is already on shelf {shelf}")]
    AlreadyPresent { shelf: ShelfId, book_id: BookId },
    #[error("store connection poisoned by a panicking writer")]
    Poisoned,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
