use clap::Subcommand;
use rust_decimal::Decimal;

use crate::cli::utils::{output_rows, output_success, report_client_error};
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::error::ClientError;
use crate::format::{format_currency, format_percentage};
use crate::models::budget::DEFAULT_ALERT_THRESHOLD;
use crate::models::{Budget, BudgetForm, BudgetPeriod};
use crate::resources::Resource;

#[derive(Subcommand)]
pub enum BudgetCommands {
    #[command(about = "List budgets with spending so far")]
    List,

    #[command(about = "Budgets over their alert threshold")]
    Alerts,

    #[command(about = "Create a budget for a category")]
    Create {
        #[arg(help = "Budget amount")]
        amount: Decimal,
        #[arg(long, help = "Category ID")]
        category: String,
        #[arg(long, default_value = "monthly", help = "weekly, monthly or yearly")]
        period: BudgetPeriod,
        #[arg(long, help = "First day (YYYY-MM-DD)")]
        start_date: String,
        #[arg(long, help = "Last day (YYYY-MM-DD)")]
        end_date: Option<String>,
        #[arg(long, default_value_t = DEFAULT_ALERT_THRESHOLD, help = "Alert at this percentage (0-100)")]
        threshold: u8,
    },

    #[command(about = "Edit a budget; its category cannot change")]
    Update {
        #[arg(help = "Budget ID")]
        id: String,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        period: Option<BudgetPeriod>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        threshold: Option<u8>,
    },

    #[command(about = "Delete a budget")]
    Delete {
        #[arg(help = "Budget ID")]
        id: String,
    },
}

fn line(budget: &Budget) -> String {
    let spent = budget.spent.unwrap_or_default();
    let used = budget.percentage_used.unwrap_or_default();
    format!(
        "{:<38} {:<20} {:<8} {:>14} of {:<14} {:>8}{}",
        budget.id,
        budget.category_name.as_deref().unwrap_or(&budget.category_id),
        budget.period.as_str(),
        format_currency(spent, ""),
        format_currency(budget.amount, ""),
        format_percentage(used),
        if budget.is_alerting() { "  !" } else { "" }
    )
}

pub async fn handle(cmd: BudgetCommands, ctx: &AppContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let budgets = ctx.budgets();
    let fail = |e: ClientError| report_client_error(&output_format, e);

    match cmd {
        BudgetCommands::List => {
            let list = budgets.list().await.map_err(fail)?;
            output_rows(&output_format, "budgets", &list, line)
        }
        BudgetCommands::Alerts => {
            let list = budgets.alerts().await.map_err(fail)?;
            output_rows(&output_format, "alerts", &list, line)
        }
        BudgetCommands::Create {
            amount,
            category,
            period,
            start_date,
            end_date,
            threshold,
        } => {
            let form = BudgetForm {
                category_id: category,
                amount,
                period,
                start_date,
                end_date,
                alert_threshold: threshold,
            };
            let budget = budgets.create_from_form(form).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Created budget {}", budget.id),
                Some(serde_json::to_value(&budget)?),
            )
        }
        BudgetCommands::Update {
            id,
            amount,
            period,
            start_date,
            end_date,
            threshold,
        } => {
            // start from the stored budget so unspecified fields keep their values
            let current = budgets.get(&id).await.map_err(fail)?;
            let mut form = BudgetForm::from_budget(&current);
            if let Some(amount) = amount {
                form.amount = amount;
            }
            if let Some(period) = period {
                form.period = period;
            }
            if let Some(start_date) = start_date {
                form.start_date = start_date;
            }
            if end_date.is_some() {
                form.end_date = end_date;
            }
            if let Some(threshold) = threshold {
                form.alert_threshold = threshold;
            }

            let budget = budgets.update_from_form(&id, form).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Updated budget {}", budget.id),
                Some(serde_json::to_value(&budget)?),
            )
        }
        BudgetCommands::Delete { id } => {
            budgets.delete(&id).await.map_err(fail)?;
            output_success(&output_format, &format!("Deleted budget {}", id), None)
        }
    }
}
