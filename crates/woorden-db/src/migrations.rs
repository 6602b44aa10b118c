//! Migration system for tracking and applying database schema changes.
//!
//! Each migration has a version number and a SQL statement.
//! Migrations are applied in order and tracked in a `_migrations` table.

use rusqlite::{Connection, params};
use tracing::info;
use woorden_common::{Error, Result};

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Schema history of the local store, oldest first.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create_collections_and_words",
    // No ON DELETE CASCADE: words are removed explicitly before their collection.
    sql: "CREATE TABLE IF NOT EXISTS collections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection_id INTEGER NOT NULL REFERENCES collections(id),
            dutch TEXT NOT NULL,
            translation TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_words_collection_id
            ON words(collection_id);",
}];

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &mut Connection, migrations: &[Migration]) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| Error::StorageUnavailable(format!("failed to create _migrations: {e}")))?;

    let start = current_version(conn)?;
    let mut current = start;

    for migration in migrations.iter().filter(|m| m.version > start) {
        let tx = conn
            .transaction()
            .map_err(|e| Error::Transaction(format!("failed to begin migration: {e}")))?;
        tx.execute_batch(migration.sql).map_err(|e| {
            Error::StorageUnavailable(format!(
                "migration {} ({}) failed: {e}",
                migration.version, migration.name
            ))
        })?;
        tx.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )
        .map_err(|e| Error::Transaction(format!("failed to record migration: {e}")))?;
        tx.commit()
            .map_err(|e| Error::Transaction(format!("failed to commit migration: {e}")))?;

        info!(
            "applied local schema migration {} ({})",
            migration.version, migration.name
        );
        current = migration.version;
    }

    Ok(current)
}

pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::Transaction(format!("failed to read schema version: {e}")))
}
