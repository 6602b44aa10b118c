use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Value, json};
use tracing::{info, warn};
use woorden_common::{Error, NewWord};
use woorden_config::AppConfig;
use woorden_db::{LocalStore, SqliteLocalStore};
use woorden_remote::{Session, SignUpOutcome, SupabaseClient, loaders};
use woorden_sync::{MigrationReport, migrate_local_to_remote};

use crate::{CollectionsCommand, Command, RemoteCommand, WordsCommand};

pub struct App {
    config: AppConfig,
    local: SqliteLocalStore,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let data_dir = config.resolved_data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let local = SqliteLocalStore::lazy(config.local_db_path());
        Ok(Self { config, local })
    }

    /// Execute one command. Returns the JSON to print, if any.
    pub async fn run(&self, command: Command) -> Result<Option<Value>> {
        match command {
            Command::Collections(cmd) => self.collections(cmd).await,
            Command::Words(cmd) => self.words(cmd).await,
            Command::Clear => {
                self.local.clear_all().await?;
                Ok(None)
            }
            Command::Signup { email, password } => {
                let remote = self.remote()?;
                match remote.sign_up(&email, &password).await? {
                    SignUpOutcome::SignedIn(session) => self.signed_in(&remote, session).await,
                    SignUpOutcome::ConfirmationRequired(user) => Ok(Some(json!({
                        "user_id": user.id,
                        "confirmation_required": true,
                    }))),
                }
            }
            Command::Login { email, password } => {
                let remote = self.remote()?;
                let session = remote.sign_in_with_password(&email, &password).await?;
                self.signed_in(&remote, session).await
            }
            Command::GoogleUrl => {
                let remote = self.remote()?;
                let url =
                    remote.oauth_authorize_url(self.config.auth.oauth_redirect_url.as_deref())?;
                Ok(Some(json!({ "url": url })))
            }
            Command::Logout => {
                let path = self.config.session_path();
                let session = Session::load(&path).unwrap_or_else(|e| {
                    warn!("saved session is unreadable: {e}");
                    None
                });
                Session::remove(&path)?;

                // Revoking the token needs the backend; forgetting it does not.
                if let Some(session) = session
                    && self.config.supabase.validate().is_ok()
                {
                    let remote = SupabaseClient::new(&self.config.supabase)?;
                    remote.set_session(Some(session));
                    if let Err(e) = remote.sign_out().await {
                        warn!("sign-out failed, session forgotten locally: {e}");
                    }
                }
                Ok(None)
            }
            Command::ResetPassword { email } => {
                self.remote()?
                    .reset_password_for_email(&email, &self.config.auth.reset_redirect_url)
                    .await?;
                Ok(None)
            }
            Command::UpdatePassword { password } => {
                let user = self.remote()?.update_password(&password).await?;
                Ok(Some(serde_json::to_value(user)?))
            }
            Command::Migrate => {
                let remote = self.remote()?;
                let user_id = remote.user_id().context("not signed in; run `woorden login`")?;
                let report = self.migrate(&remote, &user_id).await?;
                Ok(Some(serde_json::to_value(report)?))
            }
            Command::Remote(cmd) => {
                let remote = self.remote()?;
                let value = match cmd {
                    RemoteCommand::Collections => serde_json::to_value(
                        loaders::load_collections(&remote, remote.user_id().as_deref()).await?,
                    )?,
                    RemoteCommand::Quiz => {
                        serde_json::to_value(loaders::load_quiz_collections(&remote).await)?
                    }
                };
                Ok(Some(value))
            }
            Command::History => {
                let remote = self.remote()?;
                let results =
                    loaders::load_quiz_results(&remote, remote.user_id().as_deref()).await;
                Ok(Some(serde_json::to_value(results)?))
            }
        }
    }

    async fn collections(&self, command: CollectionsCommand) -> Result<Option<Value>> {
        let value = match command {
            CollectionsCommand::List => {
                serde_json::to_value(self.local.list_collections_with_words().await?)?
            }
            CollectionsCommand::Add { name } => {
                let name = validate_name(&name)?;
                serde_json::to_value(self.local.add_collection(name).await?)?
            }
            CollectionsCommand::Rename { id, name } => {
                let name = validate_name(&name)?;
                let renamed = self
                    .local
                    .rename_collection(id, name)
                    .await
                    .map_err(|e| missing_collection(e, id))?;
                serde_json::to_value(renamed)?
            }
            CollectionsCommand::Delete { id } => {
                self.local.delete_collection(id).await?;
                return Ok(None);
            }
        };
        Ok(Some(value))
    }

    async fn words(&self, command: WordsCommand) -> Result<Option<Value>> {
        match command {
            WordsCommand::Add {
                collection_id,
                pairs,
            } => {
                let words = parse_word_pairs(&pairs)?;
                let added = self
                    .local
                    .add_words(collection_id, &words)
                    .await
                    .map_err(|e| missing_collection(e, collection_id))?;
                Ok(Some(serde_json::to_value(added)?))
            }
            WordsCommand::Clear { collection_id } => {
                self.local.delete_words(collection_id).await?;
                Ok(None)
            }
        }
    }

    /// Client for the configured project, carrying the saved session if there is one.
    fn remote(&self) -> Result<SupabaseClient> {
        let client = SupabaseClient::new(&self.config.supabase)?;
        client.set_session(Session::load(&self.config.session_path())?);
        Ok(client)
    }

    async fn signed_in(&self, remote: &SupabaseClient, session: Session) -> Result<Option<Value>> {
        session.save(&self.config.session_path())?;
        let user_id = session.user.id.clone();

        let migrated = if self.local.is_empty().await? {
            None
        } else {
            Some(self.migrate(remote, &user_id).await?)
        };
        Ok(Some(json!({ "user_id": user_id, "migrated": migrated })))
    }

    async fn migrate(&self, remote: &SupabaseClient, user_id: &str) -> Result<MigrationReport> {
        let report = migrate_local_to_remote(&self.local, remote, user_id).await?;
        if !report.is_complete() {
            warn!(
                "{} items could not be migrated and were dropped from local storage",
                report.failures.len()
            );
        }
        info!("moved {} collections to the account", report.collections.len());
        Ok(report)
    }
}

fn missing_collection(e: Error, id: i64) -> anyhow::Error {
    if e.is_not_found() {
        anyhow!("no local collection with id {id}; see `woorden collections list`")
    } else {
        e.into()
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        bail!("collection name cannot be empty");
    }
    Ok(name)
}

fn parse_word_pairs(pairs: &[String]) -> Result<Vec<NewWord>> {
    pairs
        .iter()
        .map(|pair| {
            NewWord::parse_pair(pair)
                .with_context(|| format!("expected dutch=translation, got {pair:?}"))
        })
        .collect()
}
