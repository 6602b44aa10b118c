use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;
use woorden_common::{Error, Result};
use woorden_config::SupabaseConfig;

use crate::auth::Session;
use crate::client::{RemoteClient, SelectQuery};

/// REST client for a hosted Supabase project.
///
/// Table requests carry the signed-in user's access token when a session is
/// set, and fall back to the anon key otherwise.
pub struct SupabaseClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) anon_key: String,
    session: RwLock<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        config.validate()?;

        let mut base_url = Url::parse(config.url.trim())
            .map_err(|e| Error::Config(format!("invalid supabase url: {e}")))?;
        // Url::join drops the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
            session: RwLock::new(None),
        })
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    pub fn set_session(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = session;
        }
    }

    /// Id of the signed-in user, if any.
    pub fn user_id(&self) -> Option<String> {
        self.session().map(|s| s.user.id)
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint {path}: {e}")))
    }

    fn bearer(&self) -> String {
        self.session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    /// Attach the project key and the current bearer token.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }
}

#[async_trait]
impl RemoteClient for SupabaseClient {
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let url = self.endpoint(&format!("rest/v1/{table}"))?;
        debug!("inserting {} rows into {table}", rows.len());

        let response = self
            .authorize(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await
            .map_err(|e| Error::RemoteInsert(format!("{table}: request failed: {e}")))?;

        let response = check_status(response)
            .await
            .map_err(|msg| Error::RemoteInsert(format!("{table}: {msg}")))?;
        response
            .json()
            .await
            .map_err(|e| Error::RemoteInsert(format!("{table}: invalid response body: {e}")))
    }

    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Vec<Value>> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        debug!("selecting from {table}");

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|e| Error::Remote(format!("{table}: request failed: {e}")))?;

        let response = check_status(response)
            .await
            .map_err(|msg| Error::Remote(format!("{table}: {msg}")))?;
        response
            .json()
            .await
            .map_err(|e| Error::Remote(format!("{table}: invalid response body: {e}")))
    }
}

/// Pass successful responses through; turn others into a readable message.
pub(crate) async fn check_status(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("{status}: {}", error_message(&body)))
}

/// Pull the human-readable message out of a PostgREST or GoTrue error body.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
