use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use woorden_common::{CollectionWithWords, Error, Result};
use woorden_db::LocalStore;
use woorden_remote::{RemoteClient, RemoteCollection};

pub const COLLECTIONS_TABLE: &str = "collections";
pub const WORDS_TABLE: &str = "words";

/// Outcome of a migration run.
#[derive(Debug, Default, Serialize)]
pub struct MigrationReport {
    /// Remote collections created, in local order. A collection whose words
    /// failed to upload is still listed here.
    pub collections: Vec<RemoteCollection>,
    pub failures: Vec<MigrationFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationFailure {
    pub collection: String,
    pub stage: FailureStage,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Collection,
    Words,
}

impl MigrationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copy every local collection and its words into the remote store as
/// `user_id`, then clear the local store.
///
/// Remote failures are logged and recorded per collection without aborting
/// the run. Local data is cleared even when some uploads failed, so the same
/// data is never migrated twice.
pub async fn migrate_local_to_remote(
    local: &dyn LocalStore,
    remote: &dyn RemoteClient,
    user_id: &str,
) -> Result<MigrationReport> {
    let collections = local.list_collections_with_words().await?;
    info!(
        "migrating {} local collections for user {user_id}",
        collections.len()
    );

    let mut report = MigrationReport::default();
    for entry in &collections {
        let created = match insert_collection(remote, entry, user_id).await {
            Ok(created) => created,
            Err(e) => {
                warn!("error migrating collection {:?}: {e}", entry.name());
                report.failures.push(MigrationFailure {
                    collection: entry.name().to_string(),
                    stage: FailureStage::Collection,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if !entry.words.is_empty() {
            let rows = word_rows(entry, created.id);
            if let Err(e) = remote.insert(WORDS_TABLE, rows).await {
                warn!("error migrating words of {:?}: {e}", entry.name());
                report.failures.push(MigrationFailure {
                    collection: entry.name().to_string(),
                    stage: FailureStage::Words,
                    error: e.to_string(),
                });
            }
        }

        report.collections.push(created);
    }

    local.clear_all().await?;

    info!(
        "migration finished: {} collections created, {} failures",
        report.collections.len(),
        report.failures.len()
    );
    Ok(report)
}

async fn insert_collection(
    remote: &dyn RemoteClient,
    entry: &CollectionWithWords,
    user_id: &str,
) -> Result<RemoteCollection> {
    let rows = remote
        .insert(
            COLLECTIONS_TABLE,
            vec![json!({ "name": entry.name(), "user_id": user_id })],
        )
        .await?;

    // Exactly one row comes back for a single-row insert.
    let [row]: [Value; 1] = rows.try_into().map_err(|rows: Vec<Value>| {
        Error::RemoteInsert(format!(
            "expected one created collection, got {}",
            rows.len()
        ))
    })?;
    // Only the id is needed to attach the words; the rest is informational.
    let id = row
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::RemoteInsert(format!("created collection has no id: {row}")))?;
    let mut created = serde_json::from_value::<RemoteCollection>(row).unwrap_or_else(|e| {
        warn!("created collection {id} has unexpected columns: {e}");
        RemoteCollection {
            id,
            name: String::new(),
            user_id: None,
            created_at: None,
        }
    });
    if created.name.is_empty() {
        created.name = entry.name().to_string();
    }
    if created.user_id.is_none() {
        created.user_id = Some(user_id.to_string());
    }
    Ok(created)
}

fn word_rows(entry: &CollectionWithWords, remote_collection_id: i64) -> Vec<Value> {
    entry
        .words
        .iter()
        .map(|word| {
            json!({
                "collection_id": remote_collection_id,
                "dutch": word.dutch,
                "translation": word.translation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use woorden_common::NewWord;
    use woorden_db::MemoryLocalStore;
    use woorden_remote::SelectQuery;

    use super::*;

    /// Records inserts and assigns ids; tables listed in `fail` reject writes.
    #[derive(Default)]
    struct FakeRemote {
        fail: Vec<&'static str>,
        fail_collection_named: Option<&'static str>,
        first_id: i64,
        /// Answer inserts with `{"id": ..}` only, as a trimmed `select=id` would.
        id_only: bool,
        tables: Mutex<HashMap<String, Vec<Value>>>,
    }

    #[async_trait]
    impl RemoteClient for FakeRemote {
        async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
            if self.fail.iter().any(|t| *t == table) {
                return Err(Error::RemoteInsert(format!("{table} rejected")));
            }
            if let Some(name) = self.fail_collection_named
                && rows.iter().any(|r| r["name"] == name)
            {
                return Err(Error::RemoteInsert(format!("{name} rejected")));
            }

            let mut tables = self.tables.lock().unwrap();
            let stored = tables.entry(table.to_string()).or_default();
            let mut created = Vec::new();
            for mut row in rows {
                row["id"] = json!(self.first_id + stored.len() as i64);
                stored.push(row.clone());
                if self.id_only {
                    created.push(json!({ "id": row["id"] }));
                } else {
                    created.push(row);
                }
            }
            Ok(created)
        }

        async fn select(&self, table: &str, _query: &SelectQuery) -> Result<Vec<Value>> {
            Ok(self
                .tables
                .lock()
                .unwrap()
                .get(table)
                .cloned()
                .unwrap_or_default())
        }
    }

    impl FakeRemote {
        fn rows(&self, table: &str) -> Vec<Value> {
            self.tables
                .lock()
                .unwrap()
                .get(table)
                .cloned()
                .unwrap_or_default()
        }
    }

    async fn seed(store: &MemoryLocalStore, name: &str, words: &[(&str, &str)]) -> i64 {
        let id = store.add_collection(name).await.unwrap().id;
        let words: Vec<NewWord> = words.iter().map(|(d, t)| NewWord::new(*d, *t)).collect();
        store.add_words(id, &words).await.unwrap();
        id
    }

    #[tokio::test]
    async fn migrates_collections_and_words_then_clears() {
        let local = MemoryLocalStore::new();
        seed(&local, "Animals", &[("hond", "dog"), ("kat", "cat")]).await;
        seed(&local, "Fruit", &[("appel", "apple")]).await;
        let remote = FakeRemote {
            first_id: 10,
            ..FakeRemote::default()
        };

        let report = migrate_local_to_remote(&local, &remote, "user-1")
            .await
            .unwrap();

        assert!(report.is_complete());
        let names: Vec<&str> = report.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Animals", "Fruit"]);
        assert_eq!(report.collections[0].id, 10);
        assert_eq!(report.collections[1].id, 11);

        let collections = remote.rows(COLLECTIONS_TABLE);
        assert!(collections.iter().all(|c| c["user_id"] == "user-1"));

        let words = remote.rows(WORDS_TABLE);
        assert_eq!(words.len(), 3);
        assert_eq!(words[0]["collection_id"], 10);
        assert_eq!(words[0]["dutch"], "hond");
        assert_eq!(words[2]["collection_id"], 11);
        assert!(words.iter().all(|w| w.get("created_at").is_none()));

        assert!(local.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn word_failure_keeps_collection_in_result() {
        let local = MemoryLocalStore::new();
        seed(&local, "Animals", &[("hond", "dog"), ("kat", "cat")]).await;
        let remote = FakeRemote {
            fail: vec![WORDS_TABLE],
            first_id: 7,
            ..FakeRemote::default()
        };

        let report = migrate_local_to_remote(&local, &remote, "user-1")
            .await
            .unwrap();

        assert_eq!(report.collections.len(), 1);
        assert_eq!(report.collections[0].id, 7);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::Words);
        assert!(local.list_collections_with_words().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collection_failure_skips_its_words_and_continues() {
        let local = MemoryLocalStore::new();
        seed(&local, "Broken", &[("fout", "error")]).await;
        seed(&local, "Fruit", &[("appel", "apple")]).await;
        let remote = FakeRemote {
            fail_collection_named: Some("Broken"),
            first_id: 1,
            ..FakeRemote::default()
        };

        let report = migrate_local_to_remote(&local, &remote, "user-1")
            .await
            .unwrap();

        assert_eq!(report.collections.len(), 1);
        assert_eq!(report.collections[0].name, "Fruit");
        assert_eq!(report.failures[0].collection, "Broken");
        assert_eq!(report.failures[0].stage, FailureStage::Collection);

        let words = remote.rows(WORDS_TABLE);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0]["dutch"], "appel");
        assert!(local.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn collection_without_words_skips_word_insert() {
        let local = MemoryLocalStore::new();
        local.add_collection("Empty").await.unwrap();
        let remote = FakeRemote {
            fail: vec![WORDS_TABLE],
            first_id: 1,
            ..FakeRemote::default()
        };

        let report = migrate_local_to_remote(&local, &remote, "user-1")
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.collections.len(), 1);
    }

    #[tokio::test]
    async fn empty_store_migrates_nothing() {
        let local = MemoryLocalStore::new();
        let remote = FakeRemote::default();

        let report = migrate_local_to_remote(&local, &remote, "user-1")
            .await
            .unwrap();

        assert!(report.collections.is_empty());
        assert!(remote.rows(COLLECTIONS_TABLE).is_empty());
    }

    #[tokio::test]
    async fn created_row_with_only_an_id_is_enough() {
        let local = MemoryLocalStore::new();
        seed(&local, "Animals", &[("hond", "dog")]).await;
        let remote = FakeRemote {
            first_id: 4,
            id_only: true,
            ..FakeRemote::default()
        };

        let report = migrate_local_to_remote(&local, &remote, "user-1")
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.collections[0].id, 4);
        assert_eq!(report.collections[0].name, "Animals");
        assert_eq!(report.collections[0].user_id.as_deref(), Some("user-1"));
        assert_eq!(remote.rows(WORDS_TABLE)[0]["collection_id"], 4);
    }
}
