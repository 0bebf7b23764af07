//! Read-write store for shelves and the books placed on them.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use atlas_kernel::Migration;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use time::OffsetDateTime;

use crate::models::{BookId, NewShelf, Shelf, ShelfChanges, ShelfId, ShelfMembership};
use crate::{migrate, StoreError, StoreResult};

/// Initial shelf schema. Membership uniqueness is enforced by
/// [`ShelfStore::append_book`], not by a constraint.
pub const SCHEMA_V1: &str = r#"
    CREATE TABLE shelf (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        is_public INTEGER NOT NULL DEFAULT 0,
        created TEXT NOT NULL,
        last_modified TEXT NOT NULL
    );

    CREATE TABLE book_shelf_link (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        shelf INTEGER NOT NULL REFERENCES shelf(id),
        book_id INTEGER NOT NULL,
        "order" INTEGER NOT NULL,
        date_added TEXT NOT NULL
    );

    CREATE INDEX book_shelf_link_shelf_order ON book_shelf_link (shelf, "order");
"#;

/// Operations the shelf controller needs from its store.
pub trait ShelfStore: Send + Sync {
    fn get_shelf(&self, id: ShelfId) -> StoreResult<Option<Shelf>>;

    fn create_shelf(&self, shelf: &NewShelf) -> StoreResult<Shelf>;

    fn update_shelf(&self, id: ShelfId, changes: &ShelfChanges) -> StoreResult<Shelf>;

    fn membership(&self, shelf: ShelfId, book_id: BookId) -> StoreResult<Option<ShelfMembership>>;

    /// Put `book_id` at the end of the shelf and touch its `last_modified`.
    ///
    /// The duplicate check, the next order value and the insert share one
    /// write transaction. Fails with [`StoreError::AlreadyPresent`] when the
    /// book is already on the shelf.
    fn append_book(
        &self,
        shelf: ShelfId,
        book_id: BookId,
        now: OffsetDateTime,
    ) -> StoreResult<ShelfMembership>;

    /// Memberships sorted by order, ties by insertion.
    fn memberships(&self, shelf: ShelfId) -> StoreResult<Vec<ShelfMembership>>;
}

pub struct SqliteShelfStore {
    conn: Mutex<Connection>,
}

impl SqliteShelfStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        tracing::info!(target: "atlas-db", path = %path.display(), "shelf store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply pending module migrations.
    pub fn migrate(&self, migrations: &[(String, Migration)]) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        migrate::apply(&mut conn, migrations)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn shelf_from_row(row: &Row) -> rusqlite::Result<Shelf> {
    Ok(Shelf {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        is_public: row.get(3)?,
        created: row.get(4)?,
        last_modified: row.get(5)?,
    })
}

fn membership_from_row(row: &Row) -> rusqlite::Result<ShelfMembership> {
    Ok(ShelfMembership {
        id: row.get(0)?,
        shelf: row.get(1)?,
        book_id: row.get(2)?,
        order: row.get(3)?,
        date_added: row.get(4)?,
    })
}

fn select_shelf(conn: &Connection, id: ShelfId) -> rusqlite::Result<Option<Shelf>> {
    conn.query_row(
        "SELECT id, name, user_id, is_public, created, last_modified FROM shelf WHERE id = ?1",
        params![id],
        shelf_from_row,
    )
    .optional()
}

fn select_max_order(conn: &Connection, shelf: ShelfId) -> rusqlite::Result<i64> {
    let max: Option<i64> = conn.query_row(
        r#"SELECT MAX("order") FROM book_shelf_link WHERE shelf = ?1"#,
        params![shelf],
        |row| row.get(0),
    )?;
    Ok(max.unwrap_or(0))
}

impl ShelfStore for SqliteShelfStore {
    fn get_shelf(&self, id: ShelfId) -> StoreResult<Option<Shelf>> {
        let conn = self.lock()?;
        Ok(select_shelf(&conn, id)?)
    }

    fn create_shelf(&self, shelf: &NewShelf) -> StoreResult<Shelf> {
        let mut conn = self.lock()?;
        let now = OffsetDateTime::now_utc();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO shelf (name, user_id, is_public, created, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![shelf.name, shelf.user_id, shelf.is_public, now],
        )?;
        let id = tx.last_insert_rowid();
        let created = select_shelf(&tx, id)?
            .ok_or_else(|| StoreError::NotFound(format!("shelf {id}")))?;
        tx.commit()?;

        tracing::debug!(target: "atlas-db", shelf_id = id, "shelf inserted");
        Ok(created)
    }

    fn update_shelf(&self, id: ShelfId, changes: &ShelfChanges) -> StoreResult<Shelf> {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE shelf SET name = ?1, is_public = ?2, last_modified = ?3 WHERE id = ?4",
            params![changes.name, changes.is_public, changes.last_modified, id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("shelf {id}")));
        }
        let shelf =
            select_shelf(&tx, id)?.ok_or_else(|| StoreError::NotFound(format!("shelf {id}")))?;
        tx.commit()?;

        Ok(shelf)
    }

    fn membership(&self, shelf: ShelfId, book_id: BookId) -> StoreResult<Option<ShelfMembership>> {
        let conn = self.lock()?;
        let membership = conn
            .query_row(
                r#"SELECT id, shelf, book_id, "order", date_added
                   FROM book_shelf_link WHERE shelf = ?1 AND book_id = ?2"#,
                params![shelf, book_id],
                membership_from_row,
            )
            .optional()?;
        Ok(membership)
    }

    fn append_book(
        &self,
        shelf: ShelfId,
        book_id: BookId,
        now: OffsetDateTime,
    ) -> StoreResult<ShelfMembership> {
        let mut conn = self.lock()?;

        // IMMEDIATE takes the write lock before reading MAX("order").
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let present = tx
            .query_row(
                "SELECT 1 FROM book_shelf_link WHERE shelf = ?1 AND book_id = ?2",
                params![shelf, book_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if present {
            return Err(StoreError::AlreadyPresent { shelf, book_id });
        }
        let order = select_max_order(&tx, shelf)? + 1;
        tx.execute(
            r#"INSERT INTO book_shelf_link (shelf, book_id, "order", date_added)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![shelf, book_id, order, now],
        )?;
        let id = tx.last_insert_rowid();

        let touched = tx.execute(
            "UPDATE shelf SET last_modified = ?1 WHERE id = ?2",
            params![now, shelf],
        )?;
        if touched == 0 {
            return Err(StoreError::NotFound(format!("shelf {shelf}")));
        }
        tx.commit()?;

        Ok(ShelfMembership {
            id,
            shelf,
            book_id,
            order,
            date_added: now,
        })
    }

    fn memberships(&self, shelf: ShelfId) -> StoreResult<Vec<ShelfMembership>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, shelf, book_id, "order", date_added
               FROM book_shelf_link WHERE shelf = ?1
               ORDER BY "order" ASC, id ASC"#,
        )?;
        let rows = stmt
            .query_map(params![shelf], membership_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteShelfStore {
        let store = SqliteShelfStore::in_memory().unwrap();
        store
            .migrate(&[(
                "shelf".to_string(),
                Migration {
                    id: "001_init",
                    up: SCHEMA_V1,
                },
            )])
            .unwrap();
        store
    }

    fn new_shelf(store: &SqliteShelfStore, owner: i64, public: bool) -> Shelf {
        store
            .create_shelf(&NewShelf {
                name: "Reading list".to_string(),
                user_id: owner,
                is_public: public,
            })
            .unwrap()
    }

    #[test]
    fn create_and_get_shelf() {
        let store = store();
        let shelf = new_shelf(&store, 4, true);

        let loaded = store.get_shelf(shelf.id).unwrap().unwrap();
        assert_eq!(loaded, shelf);
        assert_eq!(loaded.user_id, 4);
        assert!(loaded.is_public);
        assert!(store.get_shelf(shelf.id + 100).unwrap().is_none());
    }

    #[test]
    fn append_assigns_increasing_orders_from_one() {
        let store = store();
        let shelf = new_shelf(&store, 1, false);

        let now = OffsetDateTime::now_utc();
        let orders: Vec<i64> = [30, 10, 20]
            .into_iter()
            .map(|book| store.append_book(shelf.id, book, now).unwrap().order)
            .collect();

        assert_eq!(orders, vec![1, 2, 3]);

        let listed: Vec<i64> = store
            .memberships(shelf.id)
            .unwrap()
            .into_iter()
            .map(|m| m.book_id)
            .collect();
        assert_eq!(listed, vec![30, 10, 20]);
    }

    #[test]
    fn append_touches_last_modified() {
        let store = store();
        let shelf = new_shelf(&store, 1, false);
        let later = shelf.last_modified + time::Duration::hours(1);

        store.append_book(shelf.id, 7, later).unwrap();

        let loaded = store.get_shelf(shelf.id).unwrap().unwrap();
        assert_eq!(loaded.last_modified, later);
        assert!(store.membership(shelf.id, 7).unwrap().is_some());
        assert!(store.membership(shelf.id, 8).unwrap().is_none());
    }

    #[test]
    fn append_rejects_a_book_already_on_the_shelf() {
        let store = store();
        let shelf = new_shelf(&store, 1, false);
        let now = OffsetDateTime::now_utc();
        store.append_book(shelf.id, 7, now).unwrap();

        let again = store.append_book(shelf.id, 7, now);

        assert!(matches!(
            again,
            Err(StoreError::AlreadyPresent { shelf: s, book_id: 7 }) if s == shelf.id
        ));
        assert_eq!(store.memberships(shelf.id).unwrap().len(), 1);
        assert_eq!(store.append_book(shelf.id, 8, now).unwrap().order, 2);
    }

    #[test]
    fn append_to_missing_shelf_rolls_back() {
        let store = store();

        let result = store.append_book(99, 7, OffsetDateTime::now_utc());

        assert!(matches!(result, Err(StoreError::Database(_)) | Err(StoreError::NotFound(_))));
        assert!(store.memberships(99).unwrap().is_empty());
    }

    #[test]
    fn orders_are_per_shelf() {
        let store = store();
        let first = new_shelf(&store, 1, false);
        let second = new_shelf(&store, 1, false);
        let now = OffsetDateTime::now_utc();

        store.append_book(first.id, 1, now).unwrap();
        store.append_book(first.id, 2, now).unwrap();
        let membership = store.append_book(second.id, 1, now).unwrap();

        assert_eq!(membership.order, 1);
    }

    #[test]
    fn update_shelf_changes_fields() {
        let store = store();
        let shelf = new_shelf(&store, 1, false);
        let changes = ShelfChanges {
            name: "Favourites".to_string(),
            is_public: true,
            last_modified: shelf.last_modified + time::Duration::minutes(5),
        };

        let updated = store.update_shelf(shelf.id, &changes).unwrap();

        assert_eq!(updated.name, "Favourites");
        assert!(updated.is_public);
        assert_eq!(updated.created, shelf.created);
        assert!(matches!(
            store.update_shelf(shelf.id + 1, &changes),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.db");

        let store = SqliteShelfStore::open(&path).unwrap();
        drop(store);

        assert!(path.exists());
    }
}
