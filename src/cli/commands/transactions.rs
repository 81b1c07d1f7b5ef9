use clap::Subcommand;
use rust_decimal::Decimal;

use crate::cli::utils::{output_rows, output_success, report_client_error};
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::error::ClientError;
use crate::format::{format_currency, format_date};
use crate::models::{
    Transaction, TransactionFilters, TransactionInput, TransactionType, TransactionUpdate,
};
use crate::resources::Resource;

#[derive(Subcommand)]
pub enum TransactionCommands {
    #[command(about = "List transactions matching the filters")]
    List {
        #[arg(long, help = "Earliest date (YYYY-MM-DD)")]
        start_date: Option<String>,
        #[arg(long, help = "Latest date (YYYY-MM-DD)")]
        end_date: Option<String>,
        #[arg(long, help = "Account ID")]
        account: Option<String>,
        #[arg(long, help = "Category ID")]
        category: Option<String>,
        #[arg(long = "type", help = "income, expense or transfer")]
        kind: Option<TransactionType>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },

    #[command(about = "Record a transaction")]
    Create {
        #[arg(help = "Amount (positive)")]
        amount: Decimal,
        #[arg(help = "Description")]
        description: String,
        #[arg(long, help = "Account ID")]
        account: String,
        #[arg(long, help = "Category ID")]
        category: Option<String>,
        #[arg(long = "type", help = "income, expense or transfer")]
        kind: TransactionType,
        #[arg(long, help = "Transaction date (YYYY-MM-DD)")]
        date: String,
        #[arg(long)]
        notes: Option<String>,
    },

    #[command(about = "Update a transaction")]
    Update {
        #[arg(help = "Transaction ID")]
        id: String,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        kind: Option<TransactionType>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    #[command(about = "Delete a transaction")]
    Delete {
        #[arg(help = "Transaction ID")]
        id: String,
    },
}

fn line(tx: &Transaction) -> String {
    let amount = match tx.kind {
        TransactionType::Expense => format_currency(-tx.amount, ""),
        _ => format_currency(tx.amount, ""),
    };
    format!(
        "{:<12} {:<30} {:<18} {:>16}  {}",
        format_date(&tx.transaction_date),
        tx.description,
        tx.category_name.as_deref().unwrap_or("-"),
        amount,
        tx.account_name.as_deref().unwrap_or(&tx.account_id)
    )
}

pub async fn handle(
    cmd: TransactionCommands,
    ctx: &AppContext,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let transactions = ctx.transactions();
    let fail = |e: ClientError| report_client_error(&output_format, e);

    match cmd {
        TransactionCommands::List {
            start_date,
            end_date,
            account,
            category,
            kind,
            page,
            limit,
        } => {
            let filters = TransactionFilters {
                start_date,
                end_date,
                account_id: account,
                category_id: category,
                kind,
                page,
                limit,
            };
            let result = transactions.list(&filters).await.map_err(fail)?;
            output_rows(&output_format, "transactions", &result.items, line)?;

            if let (OutputFormat::Text, Some(meta)) = (&output_format, &result.meta) {
                println!(
                    "page {} of {} ({} total)",
                    meta.page.unwrap_or(1),
                    meta.total_pages.unwrap_or(1),
                    result.total()
                );
            }
            Ok(())
        }
        TransactionCommands::Create {
            amount,
            description,
            account,
            category,
            kind,
            date,
            notes,
        } => {
            let input = TransactionInput {
                account_id: account,
                category_id: category,
                kind,
                amount,
                description,
                transaction_date: date,
                notes,
            };
            let tx = transactions.create(&input).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Recorded {} of {} ({})", tx.kind, tx.amount, tx.id),
                Some(serde_json::to_value(&tx)?),
            )
        }
        TransactionCommands::Update {
            id,
            amount,
            description,
            account,
            category,
            kind,
            date,
            notes,
        } => {
            let update = TransactionUpdate {
                account_id: account,
                category_id: category,
                kind,
                amount,
                description,
                transaction_date: date,
                notes,
            };
            let tx = transactions.update(&id, &update).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Updated transaction {}", tx.id),
                Some(serde_json::to_value(&tx)?),
            )
        }
        TransactionCommands::Delete { id } => {
            transactions.delete(&id).await.map_err(fail)?;
            output_success(&output_format, &format!("Deleted transaction {}", id), None)
        }
    }
}
