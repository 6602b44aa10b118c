use async_trait::async_trait;
use serde_json::Value;
use woorden_common::Result;

/// Table-level access to the hosted backend under the current session.
///
/// Rejections come back as `Err` values: `RemoteInsert` for writes and
/// `Remote` for reads and transport failures.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Insert `rows` into `table` and return the created rows.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Vec<Value>>;
}

/// Column list, equality filters and ordering for a table select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub columns: String,
    pub filters: Vec<(String, String)>,
    pub order: Option<(String, bool)>,
}

impl Default for SelectQuery {
    fn default() -> Self {
        Self {
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }
}

impl SelectQuery {
    /// Select the given columns. Whitespace is stripped so embedded
    /// resource lists can be written over several lines.
    pub fn columns(columns: &str) -> Self {
        Self {
            columns: columns.split_whitespace().collect(),
            ..Self::default()
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    /// Query-string pairs in PostgREST syntax.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        for (column, value) in &self.filters {
            pairs.push((column.clone(), format!("eq.{value}")));
        }
        if let Some((column, ascending)) = &self.order {
            let direction = if *ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{column}.{direction}")));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_strip_whitespace() {
        let query = SelectQuery::columns(
            "id,
             name,
             words (
                 id,
                 dutch
             )",
        );
        assert_eq!(query.columns, "id,name,words(id,dutch)");
    }

    #[test]
    fn query_pairs_use_postgrest_operators() {
        let query = SelectQuery::columns("*,collections(name)")
            .eq("user_id", "u-1")
            .order("created_at", false);

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("select".to_string(), "*,collections(name)".to_string()),
                ("user_id".to_string(), "eq.u-1".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn default_selects_everything() {
        assert_eq!(
            SelectQuery::default().to_query_pairs(),
            vec![("select".to_string(), "*".to_string())]
        );
    }
}
