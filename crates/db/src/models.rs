use serde::Serialize;
use time::OffsetDateTime;

use atlas_authz::{ShelfAccess, UserId};

pub type ShelfId = i64;
pub type BookId = i64;

/// A named, owned, visibility-flagged collection of books.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shelf {
    pub id: ShelfId,
    pub name: String,
    pub user_id: UserId,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

impl ShelfAccess for Shelf {
    fn owner_id(&self) -> UserId {
        self.user_id
    }

    fn is_public(&self) -> bool {
        self.is_public
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct NewShelf {
    pub name: String,
    pub user_id: UserId,
    pub is_public: bool,
}

/// Field updates applied when a shelf is edited.
#[derive(Debug, Clone)]
pub struct ShelfChanges {
    pub name: String,
    pub is_public: bool,
    pub last_modified: OffsetDateTime,
}

/// A book's position on a shelf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShelfMembership {
    pub id: i64,
    pub shelf: ShelfId,
    pub book_id: BookId,
    pub order: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub date_added: OffsetDateTime,
}

/// Catalog projection shown in shelf listings.
///
/// Dates are kept as the catalog stores them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_sort: String,
    pub series: Option<String>,
    pub series_index: f64,
    pub pubdate: Option<String>,
    pub timestamp: Option<String>,
    pub custom_1: Option<String>,
    pub custom_2: Option<String>,
}
