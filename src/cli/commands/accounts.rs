use clap::Subcommand;
use rust_decimal::Decimal;

use crate::cli::utils::{output_record, output_rows, output_success, report_client_error};
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::error::ClientError;
use crate::format::format_currency;
use crate::models::{Account, AccountInput, AccountType, AccountUpdate};
use crate::resources::Resource;

#[derive(Subcommand)]
pub enum AccountCommands {
    #[command(about = "List accounts")]
    List,

    #[command(about = "Show one account")]
    Show {
        #[arg(help = "Account ID")]
        id: String,
    },

    #[command(about = "Create an account")]
    Create {
        #[arg(help = "Account name")]
        name: String,
        #[arg(long = "type", help = "checking, savings, credit_card, cash, investment or other")]
        kind: AccountType,
        #[arg(long, help = "Opening balance")]
        balance: Option<Decimal>,
        #[arg(long, help = "Currency code")]
        currency: Option<String>,
        #[arg(long, help = "Free-form description")]
        description: Option<String>,
    },

    #[command(about = "Update an account")]
    Update {
        #[arg(help = "Account ID")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        kind: Option<AccountType>,
        #[arg(long)]
        balance: Option<Decimal>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, help = "Mark the account active or inactive")]
        active: Option<bool>,
    },

    #[command(about = "Delete an account")]
    Delete {
        #[arg(help = "Account ID")]
        id: String,
    },
}

fn line(account: &Account) -> String {
    format!(
        "{:<38} {:<24} {:<12} {:>18}{}",
        account.id,
        account.name,
        account.kind.as_str(),
        format_currency(account.balance, &account.currency),
        if account.is_active { "" } else { "  (inactive)" }
    )
}

pub async fn handle(cmd: AccountCommands, ctx: &AppContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let accounts = ctx.accounts();
    let fail = |e: ClientError| report_client_error(&output_format, e);

    match cmd {
        AccountCommands::List => {
            let list = accounts.list().await.map_err(fail)?;
            output_rows(&output_format, "accounts", &list, line)
        }
        AccountCommands::Show { id } => {
            let account = accounts.get(&id).await.map_err(fail)?;
            output_record(
                &output_format,
                &account,
                &[
                    ("ID", account.id.clone()),
                    ("Name", account.name.clone()),
                    ("Type", account.kind.to_string()),
                    ("Balance", format_currency(account.balance, &account.currency)),
                    ("Active", account.is_active.to_string()),
                    ("Description", account.description.clone().unwrap_or_default()),
                ],
            )
        }
        AccountCommands::Create {
            name,
            kind,
            balance,
            currency,
            description,
        } => {
            let input = AccountInput {
                name,
                kind,
                balance,
                currency,
                description,
            };
            let account = accounts.create(&input).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Created account {} ({})", account.name, account.id),
                Some(serde_json::to_value(&account)?),
            )
        }
        AccountCommands::Update {
            id,
            name,
            kind,
            balance,
            currency,
            description,
            active,
        } => {
            let update = AccountUpdate {
                name,
                kind,
                balance,
                currency,
                description,
                is_active: active,
            };
            let account = accounts.update(&id, &update).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Updated account {}", account.name),
                Some(serde_json::to_value(&account)?),
            )
        }
        AccountCommands::Delete { id } => {
            accounts.delete(&id).await.map_err(fail)?;
            output_success(&output_format, &format!("Deleted account {}", id), None)
        }
    }
}
