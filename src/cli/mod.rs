pub mod commands;
pub mod config;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::context::AppContext;
use crate::session::{CredentialLifetimes, FileCredentialStore};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "FinTrack CLI - accounts, transactions, budgets and dashboard from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "API base URL (overrides FINTRACK_API_URL)")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, registration and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Bank, cash and card accounts")]
    Accounts {
        #[command(subcommand)]
        cmd: commands::accounts::AccountCommands,
    },

    #[command(about = "Income and expense categories")]
    Categories {
        #[command(subcommand)]
        cmd: commands::categories::CategoryCommands,
    },

    #[command(about = "Income, expense and transfer records")]
    Transactions {
        #[command(subcommand)]
        cmd: commands::transactions::TransactionCommands,
    },

    #[command(about = "Spending budgets and alerts")]
    Budgets {
        #[command(subcommand)]
        cmd: commands::budgets::BudgetCommands,
    },

    #[command(about = "Aggregated statistics, trends and recent activity")]
    Dashboard {
        #[command(subcommand)]
        cmd: commands::dashboard::DashboardCommands,
    },

    #[command(about = "Profile and password of the signed-in user")]
    Profile {
        #[command(subcommand)]
        cmd: commands::profile::ProfileCommands,
    },

    #[command(about = "Evaluate navigation against the route guard")]
    Route {
        #[command(subcommand)]
        cmd: commands::route::RouteCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
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

/// Build the context the commands run against: environment configuration
/// and the credential file in the CLI config directory
pub fn build_context(api_url: Option<String>) -> anyhow::Result<AppContext> {
    let mut client_config = ClientConfig::from_env();
    if let Some(url) = api_url {
        client_config.api.base_url = url;
    }

    let store = FileCredentialStore::new(
        config::credentials_path()?,
        CredentialLifetimes::from_config(&client_config.session),
    );
    Ok(AppContext::new(client_config, Arc::new(store))?)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = build_context(cli.api_url)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx, output_format).await,
        Commands::Accounts { cmd } => commands::accounts::handle(cmd, &ctx, output_format).await,
        Commands::Categories { cmd } => commands::categories::handle(cmd, &ctx, output_format).await,
        Commands::Transactions { cmd } => {
            commands::transactions::handle(cmd, &ctx, output_format).await
        }
        Commands::Budgets { cmd } => commands::budgets::handle(cmd, &ctx, output_format).await,
        Commands::Dashboard { cmd } => commands::dashboard::handle(cmd, &ctx, output_format).await,
        Commands::Profile { cmd } => commands::profile::handle(cmd, &ctx, output_format).await,
        Commands::Route { cmd } => commands::route::handle(cmd, &ctx, output_format),
    }
}
