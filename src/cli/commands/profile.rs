use clap::Subcommand;

use crate::cli::utils::{output_error, output_record, output_success, report_client_error};
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::models::{PasswordChange, ProfileUpdate};

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "Show the signed-in user's profile")]
    Show,

    #[command(about = "Update name or preferred currency")]
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        currency: Option<String>,
    },

    #[command(about = "Change the account password")]
    Password {
        #[arg(long, help = "Current password")]
        current: String,
        #[arg(long = "new", help = "New password (at least 6 characters)")]
        new_password: String,
    },
}

pub async fn handle(cmd: ProfileCommands, ctx: &AppContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ProfileCommands::Show => {
            let Some(user) = ctx.auth().current_user().await else {
                output_error(&output_format, "Not logged in", Some("UNAUTHENTICATED"))?;
                anyhow::bail!("not logged in");
            };
            output_record(
                &output_format,
                &user,
                &[
                    ("Name", user.full_name()),
                    ("Email", user.email.clone()),
                    ("Currency", user.currency.clone()),
                    ("Member since", user.created_at.clone().unwrap_or_default()),
                ],
            )
        }
        ProfileCommands::Update {
            first_name,
            last_name,
            currency,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                currency,
            };
            let user = ctx
                .users()
                .update_profile(&update)
                .await
                .map_err(|e| report_client_error(&output_format, e))?;
            output_success(
                &output_format,
                &format!("Profile updated for {}", user.email),
                Some(serde_json::to_value(&user)?),
            )
        }
        ProfileCommands::Password { current, new_password } => {
            let change = PasswordChange {
                current_password: current,
                new_password,
            };
            let message = ctx
                .users()
                .change_password(&change)
                .await
                .map_err(|e| report_client_error(&output_format, e))?;
            let message = if message.is_empty() {
                "Password changed".to_string()
            } else {
                message
            };
            output_success(&output_format, &message, None)
        }
    }
}
