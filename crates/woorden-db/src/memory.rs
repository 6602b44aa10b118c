use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use woorden_common::{Collection, CollectionWithWords, Error, NewWord, Result, Word};

use crate::store::{LocalStore, join_words};

#[derive(Default)]
struct State {
    collections: BTreeMap<i64, Collection>,
    words: BTreeMap<i64, Word>,
    last_collection_id: i64,
    last_word_id: i64,
}

/// Process-local store with the same semantics as the SQLite store.
///
/// Nothing is persisted. Useful for tests and for sessions that should not
/// touch the disk.
#[derive(Default)]
pub struct MemoryLocalStore {
    state: Mutex<State>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Transaction("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn list_collections_with_words(&self) -> Result<Vec<CollectionWithWords>> {
        let state = self.state()?;
        Ok(join_words(
            state.collections.values().cloned().collect(),
            state.words.values().cloned().collect(),
        ))
    }

    async fn get_collection(&self, id: i64) -> Result<Option<Collection>> {
        Ok(self.state()?.collections.get(&id).cloned())
    }

    async fn add_collection(&self, name: &str) -> Result<Collection> {
        let mut state = self.state()?;
        state.last_collection_id += 1;
        let collection = Collection {
            id: state.last_collection_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn rename_collection(&self, id: i64, name: &str) -> Result<Collection> {
        let mut state = self.state()?;
        let collection = state
            .collections
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("collection {id}")))?;
        collection.name = name.to_string();
        Ok(collection.clone())
    }

    async fn delete_collection(&self, id: i64) -> Result<()> {
        let mut state = self.state()?;
        state.words.retain(|_, w| w.collection_id != id);
        state.collections.remove(&id);
        Ok(())
    }

    async fn add_words(&self, collection_id: i64, words: &[NewWord]) -> Result<Vec<Word>> {
        let mut state = self.state()?;
        if !state.collections.contains_key(&collection_id) {
            return Err(Error::NotFound(format!("collection {collection_id}")));
        }

        let mut added = Vec::with_capacity(words.len());
        for word in words {
            state.last_word_id += 1;
            let word = Word {
                id: state.last_word_id,
                collection_id,
                dutch: word.dutch.clone(),
                translation: word.translation.clone(),
                created_at: Utc::now(),
            };
            state.words.insert(word.id, word.clone());
            added.push(word);
        }
        Ok(added)
    }

    async fn delete_words(&self, collection_id: i64) -> Result<()> {
        self.state()?
            .words
            .retain(|_, w| w.collection_id != collection_id);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut state = self.state()?;
        state.collections.clear();
        state.words.clear();
        Ok(())
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.state()?.collections.is_empty())
    }
}
