use async_trait::async_trait;
use woorden_common::{Collection, CollectionWithWords, NewWord, Result, Word};

/// Client-side persistence for collections and their words.
///
/// Referential integrity between words and collections is enforced by the
/// implementations, not by the caller: words can only be added to an existing
/// collection, and deleting a collection removes its words first.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// All collections in id order, each joined with its words in id order.
    async fn list_collections_with_words(&self) -> Result<Vec<CollectionWithWords>>;

    async fn get_collection(&self, id: i64) -> Result<Option<Collection>>;

    /// Create a collection stamped with the current time. Names are not validated here.
    async fn add_collection(&self, name: &str) -> Result<Collection>;

    /// Fails with `NotFound` and changes nothing if `id` does not exist.
    async fn rename_collection(&self, id: i64, name: &str) -> Result<Collection>;

    /// Remove a collection and every word that references it. Absent ids are a no-op.
    async fn delete_collection(&self, id: i64) -> Result<()>;

    /// Create one word per input, returned in input order.
    async fn add_words(&self, collection_id: i64, words: &[NewWord]) -> Result<Vec<Word>>;

    async fn delete_words(&self, collection_id: i64) -> Result<()>;

    /// Empty both collections and words. Ids are not reused afterwards.
    async fn clear_all(&self) -> Result<()>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.list_collections_with_words().await?.is_empty())
    }
}

/// Group `words` under their collections, preserving the input order of both.
pub(crate) fn join_words(
    collections: Vec<Collection>,
    words: Vec<Word>,
) -> Vec<CollectionWithWords> {
    collections
        .into_iter()
        .map(|collection| {
            let words = words
                .iter()
                .filter(|w| w.collection_id == collection.id)
                .cloned()
                .collect();
            CollectionWithWords { collection, words }
        })
        .collect()
}
