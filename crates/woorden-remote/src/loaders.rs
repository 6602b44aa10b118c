//! Read models for the collections page, the quiz page and the dashboard.
//!
//! A failed select is logged and shows up as an empty list.

use serde::de::DeserializeOwned;
use tracing::error;
use woorden_common::{Error, Result};

use crate::client::{RemoteClient, SelectQuery};
use crate::types::{QuizScore, RemoteCollectionWithWords};

const COLLECTIONS_PAGE_COLUMNS: &str = "
    id,
    name,
    created_at,
    words (
        id,
        dutch,
        translation
    )";

const QUIZ_PAGE_COLUMNS: &str = "
    id,
    name,
    words (
        id,
        dutch,
        translation
    )";

const QUIZ_RESULTS_COLUMNS: &str = "
    *,
    collections (
        name
    )";

/// The signed-in user's collections with their words, newest first.
pub async fn load_collections(
    remote: &dyn RemoteClient,
    user_id: Option<&str>,
) -> Result<Vec<RemoteCollectionWithWords>> {
    if user_id.is_none() {
        return Err(Error::Auth("sign in to view collections".into()));
    }
    let query = SelectQuery::columns(COLLECTIONS_PAGE_COLUMNS).order("created_at", false);
    Ok(select_or_empty(remote, "collections", &query, "collections").await)
}

/// Collections available for a quiz, newest first.
pub async fn load_quiz_collections(remote: &dyn RemoteClient) -> Vec<RemoteCollectionWithWords> {
    let query = SelectQuery::columns(QUIZ_PAGE_COLUMNS).order("created_at", false);
    select_or_empty(remote, "collections", &query, "collections").await
}

/// Quiz history for `user_id`, newest first. Empty when nobody is signed in.
pub async fn load_quiz_results(remote: &dyn RemoteClient, user_id: Option<&str>) -> Vec<QuizScore> {
    let Some(user_id) = user_id else {
        return Vec::new();
    };
    let query = SelectQuery::columns(QUIZ_RESULTS_COLUMNS)
        .eq("user_id", user_id)
        .order("created_at", false);
    select_or_empty(remote, "quiz_scores", &query, "quiz results").await
}

async fn select_or_empty<T: DeserializeOwned>(
    remote: &dyn RemoteClient,
    table: &str,
    query: &SelectQuery,
    what: &str,
) -> Vec<T> {
    let rows = match remote.select(table, query).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("error loading {what}: {e}");
            return Vec::new();
        }
    };
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(item) => Some(item),
            Err(e) => {
                error!("skipping unreadable row in {what}: {e}");
                None
            }
        })
        .collect()
}
