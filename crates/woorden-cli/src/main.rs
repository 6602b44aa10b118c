mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use woorden_config::{AppConfig, ConfigLoader};

use crate::commands::App;

#[derive(Parser)]
#[command(name = "woorden", version, about = "Vocabulary collections, offline first")]
struct Cli {
    /// Config file (YAML or TOML). Defaults to ~/.woorden/config.yml when present.
    #[arg(long, global = true, env = "WOORDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the local database and saved session.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage local collections
    #[command(subcommand)]
    Collections(CollectionsCommand),
    /// Manage words in a local collection
    #[command(subcommand)]
    Words(WordsCommand),
    /// Remove all local collections and words
    Clear,
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "WOORDEN_PASSWORD")]
        password: String,
    },
    /// Sign in and move local data into the account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "WOORDEN_PASSWORD")]
        password: String,
    },
    /// Print the Google sign-in URL
    GoogleUrl,
    /// Sign out and forget the saved session
    Logout,
    /// Send a password reset e-mail
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Change the signed-in user's password
    UpdatePassword {
        #[arg(long, env = "WOORDEN_NEW_PASSWORD")]
        password: String,
    },
    /// Move local data into the signed-in account
    Migrate,
    /// Read data from the account
    #[command(subcommand)]
    Remote(RemoteCommand),
    /// Show quiz history
    History,
}

#[derive(Subcommand)]
pub enum CollectionsCommand {
    List,
    Add { name: String },
    Rename { id: i64, name: String },
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum WordsCommand {
    /// Add words given as dutch=translation pairs
    Add {
        collection_id: i64,
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Remove every word from a collection
    Clear { collection_id: i64 },
}

#[derive(Subcommand)]
pub enum RemoteCommand {
    /// Collections with their words
    Collections,
    /// Collections available for a quiz
    Quiz,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::from_path(path),
        None => ConfigLoader::from_default_location(),
    };
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}

fn init_tracing(config: &AppConfig) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.log_level;
        EnvFilter::new(format!(
            "warn,woorden={level},woorden_db={level},woorden_remote={level},woorden_sync={level},woorden_config={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config);

    let app = App::new(config)?;
    let output = app.run(cli.command).await?;
    if let Some(value) = output {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
