use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use woorden_common::{Collection, CollectionWithWords, Error, NewWord, Result, Word};

use crate::migrations::{MIGRATIONS, run_migrations};
use crate::store::{LocalStore, join_words};

enum Target {
    File(PathBuf),
    Memory,
}

/// SQLite-backed local store.
///
/// The connection is opened on first use and kept for the lifetime of the store.
pub struct SqliteLocalStore {
    target: Target,
    conn: OnceCell<Mutex<Connection>>,
}

impl SqliteLocalStore {
    /// Store backed by `db_path`, opened lazily by the first operation.
    pub fn lazy(db_path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(db_path.into()),
            conn: OnceCell::new(),
        }
    }

    /// Open `db_path` now so that a missing or unwritable file is reported immediately.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = open_connection(&Target::File(db_path.to_path_buf()))?;
        Ok(Self {
            target: Target::File(db_path.to_path_buf()),
            conn: OnceCell::new_with(Some(Mutex::new(conn))),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = open_connection(&Target::Memory)?;
        Ok(Self {
            target: Target::Memory,
            conn: OnceCell::new_with(Some(Mutex::new(conn))),
        })
    }

    async fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        let conn = self
            .conn
            .get_or_try_init(|| async { open_connection(&self.target).map(Mutex::new) })
            .await?;
        conn.lock()
            .map_err(|_| Error::Transaction("local store lock poisoned".into()))
    }
}

fn open_connection(target: &Target) -> Result<Connection> {
    let mut conn = match target {
        Target::File(path) => {
            info!("opening local store at {}", path.display());
            Connection::open(path).map_err(|e| {
                Error::StorageUnavailable(format!("failed to open {}: {e}", path.display()))
            })?
        }
        Target::Memory => Connection::open_in_memory().map_err(|e| {
            Error::StorageUnavailable(format!("failed to open in-memory database: {e}"))
        })?,
    };

    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .map_err(|e| Error::StorageUnavailable(format!("failed to set pragmas: {e}")))?;

    run_migrations(&mut conn, MIGRATIONS)?;
    Ok(conn)
}

fn tx_err(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::Transaction(format!("{context}: {e}"))
}

fn collection_from_row(row: &Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_datetime(2, &row.get::<_, String>(2)?)?,
    })
}

fn word_from_row(row: &Row<'_>) -> rusqlite::Result<Word> {
    Ok(Word {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        dutch: row.get(2)?,
        translation: row.get(3)?,
        created_at: parse_datetime(4, &row.get::<_, String>(4)?)?,
    })
}

fn select_collection(conn: &Connection, id: i64) -> Result<Option<Collection>> {
    conn.query_row(
        "SELECT id, name, created_at FROM collections WHERE id = ?1",
        params![id],
        collection_from_row,
    )
    .optional()
    .map_err(tx_err("failed to read collection"))
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn list_collections_with_words(&self) -> Result<Vec<CollectionWithWords>> {
        let conn = self.connection().await?;

        let mut stmt = conn
            .prepare("SELECT id, name, created_at FROM collections ORDER BY id ASC")
            .map_err(tx_err("failed to prepare query"))?;
        let collections = stmt
            .query_map([], collection_from_row)
            .map_err(tx_err("failed to query collections"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(tx_err("failed to read collection row"))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, collection_id, dutch, translation, created_at
                 FROM words
                 ORDER BY id ASC",
            )
            .map_err(tx_err("failed to prepare query"))?;
        let words = stmt
            .query_map([], word_from_row)
            .map_err(tx_err("failed to query words"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(tx_err("failed to read word row"))?;

        Ok(join_words(collections, words))
    }

    async fn get_collection(&self, id: i64) -> Result<Option<Collection>> {
        let conn = self.connection().await?;
        select_collection(&conn, id)
    }

    async fn add_collection(&self, name: &str) -> Result<Collection> {
        let conn = self.connection().await?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO collections (name, created_at) VALUES (?1, ?2)",
            params![name, created_at.to_rfc3339()],
        )
        .map_err(tx_err("failed to add collection"))?;

        let collection = Collection {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_at,
        };
        debug!("added local collection {}", collection.id);
        Ok(collection)
    }

    async fn rename_collection(&self, id: i64, name: &str) -> Result<Collection> {
        let mut conn = self.connection().await?;
        let tx = conn
            .transaction()
            .map_err(tx_err("failed to begin transaction"))?;

        let mut collection = select_collection(&tx, id)?
            .ok_or_else(|| Error::NotFound(format!("collection {id}")))?;
        tx.execute(
            "UPDATE collections SET name = ?1 WHERE id = ?2",
            params![name, id],
        )
        .map_err(tx_err("failed to rename collection"))?;
        tx.commit().map_err(tx_err("failed to commit rename"))?;

        collection.name = name.to_string();
        Ok(collection)
    }

    async fn delete_collection(&self, id: i64) -> Result<()> {
        let mut conn = self.connection().await?;
        let tx = conn
            .transaction()
            .map_err(tx_err("failed to begin transaction"))?;

        let words = tx
            .execute("DELETE FROM words WHERE collection_id = ?1", params![id])
            .map_err(tx_err("failed to delete words"))?;
        tx.execute("DELETE FROM collections WHERE id = ?1", params![id])
            .map_err(tx_err("failed to delete collection"))?;
        tx.commit().map_err(tx_err("failed to commit delete"))?;

        debug!("deleted local collection {id} and {words} words");
        Ok(())
    }

    async fn add_words(&self, collection_id: i64, words: &[NewWord]) -> Result<Vec<Word>> {
        let mut conn = self.connection().await?;
        let tx = conn
            .transaction()
            .map_err(tx_err("failed to begin transaction"))?;

        if select_collection(&tx, collection_id)?.is_none() {
            return Err(Error::NotFound(format!("collection {collection_id}")));
        }

        let mut added = Vec::with_capacity(words.len());
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO words (collection_id, dutch, translation, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(tx_err("failed to prepare insert"))?;

            for word in words {
                let created_at = Utc::now();
                let id = stmt
                    .insert(params![
                        collection_id,
                        word.dutch,
                        word.translation,
                        created_at.to_rfc3339()
                    ])
                    .map_err(tx_err("failed to add word"))?;
                added.push(Word {
                    id,
                    collection_id,
                    dutch: word.dutch.clone(),
                    translation: word.translation.clone(),
                    created_at,
                });
            }
        }
        tx.commit().map_err(tx_err("failed to commit words"))?;

        debug!(
            "added {} words to local collection {collection_id}",
            added.len()
        );
        Ok(added)
    }

    async fn delete_words(&self, collection_id: i64) -> Result<()> {
        let conn = self.connection().await?;
        conn.execute(
            "DELETE FROM words WHERE collection_id = ?1",
            params![collection_id],
        )
        .map_err(tx_err("failed to delete words"))?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let tx = conn
            .transaction()
            .map_err(tx_err("failed to begin transaction"))?;
        tx.execute_batch("DELETE FROM words; DELETE FROM collections;")
            .map_err(tx_err("failed to clear local data"))?;
        tx.commit().map_err(tx_err("failed to commit clear"))?;

        info!("cleared local store");
        Ok(())
    }

    async fn is_empty(&self) -> Result<bool> {
        let conn = self.connection().await?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))
            .map_err(tx_err("failed to count collections"))?;
        Ok(count == 0)
    }
}

/// Timestamps are written as RFC 3339; anything else is a corrupt row.
fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
