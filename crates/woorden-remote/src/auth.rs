//! Password and OAuth sign-in against the hosted auth API.
//!
//! Successful sign-in stores the session on the client so later table
//! requests are made as the signed-in user. Sessions can be saved to and
//! restored from a JSON file between runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};
use woorden_common::{Error, Result};

use crate::supabase::{SupabaseClient, check_status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn remove(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Result of a sign-up: a live session, or a user awaiting e-mail confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired(AuthUser),
}

impl SupabaseClient {
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let url = self.endpoint("auth/v1/signup")?;
        let body: Value = self
            .auth_request(
                self.http
                    .post(url)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            self.set_session(Some(session.clone()));
            info!("signed up and signed in as {}", session.user.id);
            return Ok(SignUpOutcome::SignedIn(session));
        }

        // Without a session the API returns the bare user, sometimes nested.
        let user = body.get("user").cloned().unwrap_or(body);
        let user: AuthUser = serde_json::from_value(user)?;
        info!("signed up {}, awaiting confirmation", user.id);
        Ok(SignUpOutcome::ConfirmationRequired(user))
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let session: Session = self
            .auth_request(
                self.http
                    .post(url)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        self.set_session(Some(session.clone()));
        info!("signed in as {}", session.user.id);
        Ok(session)
    }

    /// URL that starts the Google OAuth flow in a browser.
    pub fn oauth_authorize_url(&self, redirect_to: Option<&str>) -> Result<String> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("provider", "google");
            if let Some(redirect) = redirect_to {
                pairs.append_pair("redirect_to", redirect);
            }
        }
        Ok(url.to_string())
    }

    /// Revoke the current session. The local session is dropped even if the API call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        self.set_session(None);

        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("sign-out request failed: {e}")))?;
        if let Err(msg) = check_status(response).await {
            warn!("sign-out was not acknowledged: {msg}");
            return Err(Error::Auth(msg));
        }
        Ok(())
    }

    pub async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        let mut url = self.endpoint("auth/v1/recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        let _: Value = self
            .auth_request(self.http.post(url).json(&json!({ "email": email })))
            .await?;
        Ok(())
    }

    /// Change the signed-in user's password.
    pub async fn update_password(&self, new_password: &str) -> Result<AuthUser> {
        if self.session().is_none() {
            return Err(Error::Auth("not signed in".into()));
        }
        let url = self.endpoint("auth/v1/user")?;
        self.auth_request(
            self.http
                .put(url)
                .json(&json!({ "password": new_password })),
        )
        .await
    }

    async fn auth_request<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("request failed: {e}")))?;
        let response = check_status(response).await.map_err(Error::Auth)?;

        // Some endpoints answer with an empty body.
        let text = response
            .text()
            .await
            .map_err(|e| Error::Auth(format!("failed to read response: {e}")))?;
        let text = if text.trim().is_empty() {
            "{}"
        } else {
            text.as_str()
        };
        serde_json::from_str(text).map_err(|e| Error::Auth(format!("unexpected response: {e}")))
    }
}
