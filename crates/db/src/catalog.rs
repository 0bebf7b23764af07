//! Read access to the external book catalog.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};

use crate::models::{Book, BookId};
use crate::{StoreError, StoreResult};

/// Catalog columns projected into shelf listings.
pub const CATALOG_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL DEFAULT 'Unknown',
        author_sort TEXT NOT NULL DEFAULT '',
        series TEXT,
        series_index REAL NOT NULL DEFAULT 1.0,
        pubdate TEXT,
        timestamp TEXT,
        custom_1 TEXT,
        custom_2 TEXT
    );
"#;

pub trait Catalog: Send + Sync {
    fn book_exists(&self, id: BookId) -> StoreResult<bool>;

    /// Books for `ids`, in the order given. Ids missing from the catalog are
    /// skipped.
    fn books_by_ids(&self, ids: &[BookId]) -> StoreResult<Vec<Book>>;
}

/// Ids bound per `IN (..)` query, well under SQLite's variable limit.
const MAX_IDS_PER_QUERY: usize = 500;

pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open an existing catalog without write access.
    pub fn open_read_only(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::info!(target: "atlas-db", path = %path.display(), "catalog opened read-only");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create (or reuse) a writable catalog at `path` with the catalog schema.
    pub fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(CATALOG_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CATALOG_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a book into a writable catalog, returning its id.
    pub fn insert_book(&self, book: &Book) -> StoreResult<BookId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO books (title, author_sort, series, series_index, pubdate, timestamp, custom_1, custom_2)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                book.title,
                book.author_sort,
                book.series,
                book.series_index,
                book.pubdate,
                book.timestamp,
                book.custom_1,
                book.custom_2,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Catalog for SqliteCatalog {
    fn book_exists(&self, id: BookId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row("SELECT 1 FROM books WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn books_by_ids(&self, ids: &[BookId]) -> StoreResult<Vec<Book>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut found: HashMap<BookId, Book> = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id, title, author_sort, series, series_index, pubdate, timestamp, custom_1, custom_2
                 FROM books WHERE id IN ({placeholders})"
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok(Book {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    author_sort: row.get(2)?,
                    series: row.get(3)?,
                    series_index: row.get(4)?,
                    pubdate: row.get(5)?,
                    timestamp: row.get(6)?,
                    custom_1: row.get(7)?,
                    custom_2: row.get(8)?,
                })
            })?;
            for book in rows {
                let book = book?;
                found.insert(book.id, book);
            }
        }

        // Shelf order wins over catalog order; a book listed twice shows once.
        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }
}
