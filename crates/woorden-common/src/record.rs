use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of vocabulary words stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A single vocabulary entry belonging to one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub collection_id: i64,
    pub dutch: String,
    pub translation: String,
    pub created_at: DateTime<Utc>,
}

/// Input shape for adding words to a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWord {
    pub dutch: String,
    pub translation: String,
}

impl NewWord {
    pub fn new(dutch: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            dutch: dutch.into(),
            translation: translation.into(),
        }
    }

    /// Parse a `dutch=translation` pair. Both sides are trimmed and must be non-empty.
    pub fn parse_pair(pair: &str) -> Option<Self> {
        let (dutch, translation) = pair.split_once('=')?;
        let (dutch, translation) = (dutch.trim(), translation.trim());
        if dutch.is_empty() || translation.is_empty() {
            return None;
        }
        Some(Self::new(dutch, translation))
    }
}

/// A collection joined with its words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionWithWords {
    #[serde(flatten)]
    pub collection: Collection,
    pub words: Vec<Word>,
}

impl CollectionWithWords {
    pub fn id(&self) -> i64 {
        self.collection.id
    }

    pub fn name(&self) -> &str {
        &self.collection.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pair_trims_both_sides() {
        let word = NewWord::parse_pair(" hond = dog ").unwrap();
        assert_eq!(word, NewWord::new("hond", "dog"));
    }

    #[test]
    fn parse_pair_rejects_missing_halves() {
        assert!(NewWord::parse_pair("hond").is_none());
        assert!(NewWord::parse_pair("=dog").is_none());
        assert!(NewWord::parse_pair("hond=").is_none());
    }

    #[test]
    fn collection_with_words_flattens_collection_fields() {
        let entry = CollectionWithWords {
            collection: Collection {
                id: 1,
                name: "Animals".into(),
                created_at: Utc::now(),
            },
            words: Vec::new(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Animals");
        assert!(json["words"].as_array().unwrap().is_empty());
    }
}
