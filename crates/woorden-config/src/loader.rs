use std::path::{Path, PathBuf};

use tracing::{debug, info};
use woorden_common::{Error, Result};

use crate::model::AppConfig;

pub const ENV_SUPABASE_URL: &str = "PUBLIC_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "PUBLIC_SUPABASE_ANON_KEY";
pub const ENV_DATA_DIR: &str = "WOORDEN_DATA_DIR";

/// Loads `AppConfig` from a YAML or TOML file, then applies environment overrides.
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Use an explicit config file. The file must exist.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Use `~/.woorden/config.yml` when present, defaults otherwise.
    pub fn from_default_location() -> Self {
        Self { path: None }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".woorden")
            .join("config.yml")
    }

    pub fn load(&self) -> Result<AppConfig> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();

        let mut config = match &self.path {
            Some(path) => read_config(path)?,
            None => {
                let path = Self::default_config_path();
                if path.exists() {
                    read_config(&path)?
                } else {
                    debug!("no config file at {}, using defaults", path.display());
                    AppConfig::default()
                }
            }
        };

        apply_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = match ext {
        "yml" | "yaml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
        "toml" => {
            toml::from_str(&contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))?
        }
        other => {
            return Err(Error::Config(format!(
                "unsupported config extension: {other}"
            )));
        }
    };

    info!("config loaded from {}", path.display());
    Ok(config)
}

/// Overlay non-empty values returned by `lookup` onto `config`.
pub fn apply_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(ENV_SUPABASE_URL) {
        config.supabase.url = url;
    }
    if let Some(key) = lookup(ENV_SUPABASE_ANON_KEY) {
        config.supabase.anon_key = key;
    }
    if let Some(dir) = lookup(ENV_DATA_DIR) {
        config.data_dir = Some(PathBuf::from(dir));
    }
}
