use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A collection row as stored by the hosted backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCollection {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// A word row as stored by the hosted backend. Embedded selects omit some columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<i64>,
    pub dutch: String,
    pub translation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCollectionWithWords {
    #[serde(flatten)]
    pub collection: RemoteCollection,
    #[serde(default)]
    pub words: Vec<RemoteWord>,
}

/// Name of the collection a quiz score belongs to, embedded by the select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizCollectionRef {
    pub name: String,
}

/// One quiz attempt from the `quiz_scores` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizScore {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub collection_id: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collections: Option<QuizCollectionRef>,
    /// Columns the dashboard does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl QuizScore {
    pub fn collection_name(&self) -> Option<&str> {
        self.collections.as_ref().map(|c| c.name.as_str())
    }
}

/// Postgres `timestamp` columns come back without an offset; those are read as UTC.
/// Anything unparseable becomes `None` instead of failing the whole row.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
