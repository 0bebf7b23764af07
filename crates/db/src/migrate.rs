//! Applies module migrations exactly once per database.

use atlas_kernel::Migration;
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::StoreResult;

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module TEXT NOT NULL,
        id TEXT NOT NULL,
        applied_at TEXT NOT NULL,
        PRIMARY KEY (module, id)
    );
"#;

/// Apply every migration not yet recorded, each in its own transaction.
///
/// Returns how many migrations ran.
pub fn apply(conn: &mut Connection, migrations: &[(String, Migration)]) -> StoreResult<usize> {
    conn.execute_batch(MIGRATIONS_TABLE)?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let exists = conn
            .query_row(
                "SELECT 1 FROM _migrations WHERE module = ?1 AND id = ?2",
                params![module, migration.id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            continue;
        }

        tracing::info!(
            target: "atlas-db",
            module = %module,
            migration = migration.id,
            "applying migration"
        );

        let tx = conn.transaction()?;
        tx.execute_batch(migration.up)?;
        tx.execute(
            "INSERT INTO _migrations (module, id, applied_at) VALUES (?1, ?2, ?3)",
            params![module, migration.id, OffsetDateTime::now_utc()],
        )?;
        tx.commit()?;
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "test".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE widget (id INTEGER PRIMARY KEY);",
            },
        )]
    }

    #[test]
    fn migrations_run_once() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(apply(&mut conn, &migrations()).unwrap(), 1);
        assert_eq!(apply(&mut conn, &migrations()).unwrap(), 0);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn failed_migration_is_not_recorded() {
        let mut conn = Connection::open_in_memory().unwrap();
        let broken = vec![(
            "test".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE oops (",
            },
        )];

        assert!(apply(&mut conn, &broken).is_err());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
