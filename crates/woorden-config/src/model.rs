use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use woorden_common::{Error, Result};

pub const DEFAULT_RESET_REDIRECT_URL: &str = "https://woorden-leren.netlify.app/reset-password";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub supabase: SupabaseConfig,
    pub auth: AuthConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            supabase: SupabaseConfig::default(),
            auth: AuthConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Directory holding the local database and the saved session.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".woorden")
                .join("data")
        })
    }

    pub fn local_db_path(&self) -> PathBuf {
        self.resolved_data_dir().join("local.db")
    }

    pub fn session_path(&self) -> PathBuf {
        self.resolved_data_dir().join("session.json")
    }
}

/// Connection settings for the hosted Supabase project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            request_timeout_secs: 30,
        }
    }
}

impl SupabaseConfig {
    /// Fails unless both the project url and the anon key are set.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config(
                "supabase.url is not set (or PUBLIC_SUPABASE_URL)".into(),
            ));
        }
        if self.anon_key.trim().is_empty() {
            return Err(Error::Config(
                "supabase.anon_key is not set (or PUBLIC_SUPABASE_ANON_KEY)".into(),
            ));
        }
        Ok(())
    }
}

/// Redirect targets handed to the auth API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub reset_redirect_url: String,
    pub oauth_redirect_url: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reset_redirect_url: DEFAULT_RESET_REDIRECT_URL.to_string(),
            oauth_redirect_url: None,
        }
    }
}
