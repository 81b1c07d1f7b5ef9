use clap::Subcommand;

use crate::cli::utils::{output_rows, output_success, report_client_error};
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::error::ClientError;
use crate::models::{Category, CategoryInput, CategoryType, CategoryUpdate};
use crate::resources::Resource;

#[derive(Subcommand)]
pub enum CategoryCommands {
    #[command(about = "List categories")]
    List {
        #[arg(long = "type", help = "Only income or expense categories")]
        kind: Option<CategoryType>,
    },

    #[command(about = "Create a category")]
    Create {
        #[arg(help = "Category name")]
        name: String,
        #[arg(long = "type", help = "income or expense")]
        kind: CategoryType,
        #[arg(long, help = "Display color, e.g. #10B981")]
        color: Option<String>,
        #[arg(long, help = "Icon name")]
        icon: Option<String>,
    },

    #[command(about = "Update a category")]
    Update {
        #[arg(help = "Category ID")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        kind: Option<CategoryType>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },

    #[command(about = "Delete a category (default categories are refused by the server)")]
    Delete {
        #[arg(help = "Category ID")]
        id: String,
    },
}

fn line(category: &Category) -> String {
    format!(
        "{:<38} {:<24} {:<8} {}",
        category.id,
        category.name,
        category.kind.as_str(),
        if category.is_default { "default" } else { "" }
    )
}

pub async fn handle(cmd: CategoryCommands, ctx: &AppContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let categories = ctx.categories();
    let fail = |e: ClientError| report_client_error(&output_format, e);

    match cmd {
        CategoryCommands::List { kind } => {
            let list = categories.list(kind).await.map_err(fail)?;
            output_rows(&output_format, "categories", &list, line)
        }
        CategoryCommands::Create { name, kind, color, icon } => {
            let input = CategoryInput { name, kind, color, icon };
            let category = categories.create(&input).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Created category {} ({})", category.name, category.id),
                Some(serde_json::to_value(&category)?),
            )
        }
        CategoryCommands::Update {
            id,
            name,
            kind,
            color,
            icon,
        } => {
            let update = CategoryUpdate { name, kind, color, icon };
            let category = categories.update(&id, &update).await.map_err(fail)?;
            output_success(
                &output_format,
                &format!("Updated category {}", category.name),
                Some(serde_json::to_value(&category)?),
            )
        }
        CategoryCommands::Delete { id } => {
            categories.delete(&id).await.map_err(fail)?;
            output_success(&output_format, &format!("Deleted category {}", id), None)
        }
    }
}
