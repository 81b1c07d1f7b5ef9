use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::format::{format_currency, format_date, format_percentage};
use crate::resources::DashboardSnapshot;

#[derive(Subcommand)]
pub enum DashboardCommands {
    #[command(about = "Show totals, monthly trend, spending by category and recent transactions")]
    Show {
        #[arg(long, help = "Ignore cached aggregates")]
        reload: bool,
    },
}

pub async fn handle(cmd: DashboardCommands, ctx: &AppContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DashboardCommands::Show { reload } => {
            let snapshot = if reload {
                ctx.dashboard().reload().await
            } else {
                ctx.dashboard().load().await
            };

            if !snapshot.is_authenticated() {
                output_error(&output_format, "Not logged in", Some("UNAUTHENTICATED"))?;
                anyhow::bail!("not logged in");
            }

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Dashboard loaded",
                    Some(json!({
                        "stats": snapshot.stats,
                        "monthly_trend": snapshot.monthly_trend,
                        "expense_by_category": snapshot.expense_by_category,
                        "recent_transactions": snapshot.recent_transactions,
                        "errors": snapshot
                            .errors
                            .iter()
                            .map(|(query, err)| (query.as_str(), err.user_message()))
                            .collect::<std::collections::BTreeMap<_, _>>(),
                    })),
                )?,
                OutputFormat::Text => print_text(&snapshot),
            }

            if snapshot.is_total_failure() {
                anyhow::bail!("dashboard unavailable");
            }
            Ok(())
        }
    }
}

fn print_text(snapshot: &DashboardSnapshot) {
    let currency = snapshot
        .user
        .as_ref()
        .map(|u| u.currency.as_str())
        .unwrap_or_default();

    if let Some(stats) = &snapshot.stats {
        println!("Total balance   {}", format_currency(stats.total_balance, currency));
        println!("Income          {}", format_currency(stats.total_income, currency));
        println!("Expenses        {}", format_currency(stats.total_expense, currency));
        println!("Net savings     {}", format_currency(stats.net_savings, currency));
        if let Some(change) = stats.monthly_change {
            println!("Monthly change  {}", format_percentage(change));
        }
    }

    if let Some(trend) = &snapshot.monthly_trend {
        println!();
        println!("Monthly trend");
        for month in trend {
            println!(
                "  {:<10} +{:<16} -{}",
                month.month,
                format_currency(month.income, currency),
                format_currency(month.expense, currency)
            );
        }
    }

    if let Some(categories) = &snapshot.expense_by_category {
        println!();
        println!("Spending by category");
        for category in categories {
            println!(
                "  {:<20} {:>16} {:>8}",
                category.category_name,
                format_currency(category.total, currency),
                format_percentage(category.percentage)
            );
        }
    }

    if let Some(recent) = &snapshot.recent_transactions {
        println!();
        println!("Recent transactions");
        for tx in recent {
            println!(
                "  {:<12} {:<30} {}",
                format_date(&tx.transaction_date),
                tx.description,
                format_currency(tx.amount, currency)
            );
        }
    }

    for (query, err) in &snapshot.errors {
        eprintln!("warning: {} unavailable: {}", query.as_str(), err.user_message());
    }
}
