pub mod commands;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::cache::QueryCache;
use crate::client::ApiClient;
use crate::services::{AccountService, AuthService, TransactionService};
use crate::session::{FileSessionStorage, SessionStore};

#[derive(Parser)]
#[command(name = "bank")]
#[command(about = "Bank CLI - Command-line client for the banking REST API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Account management")]
    Account {
        #[command(subcommand)]
        cmd: commands::account::AccountCommands,
    },

    #[command(about = "Deposits, withdrawals, transfers and history")]
    Transaction {
        #[command(subcommand)]
        cmd: commands::transaction::TransactionCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Wired-up service graph shared by all subcommands: one session store, one
/// request pipeline, one query cache.
pub struct App {
    pub session: Arc<SessionStore>,
    pub auth: AuthService,
    pub accounts: AccountService,
    pub transactions: TransactionService,
}

impl App {
    pub fn from_config() -> anyhow::Result<Self> {
        let session = Arc::new(SessionStore::open(FileSessionStorage::from_config()));
        let client = Arc::new(ApiClient::new(session.clone())?);
        let cache = Arc::new(QueryCache::new());

        Ok(Self {
            session,
            auth: AuthService::new(client.clone()),
            accounts: AccountService::new(client.clone(), cache.clone()),
            transactions: TransactionService::new(client, cache),
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let app = App::from_config()?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(&app, cmd, output_format).await,
        Commands::Account { cmd } => commands::account::handle(&app, cmd, output_format).await,
        Commands::Transaction { cmd } => {
            commands::transaction::handle(&app, cmd, output_format).await
        }
    }
}
