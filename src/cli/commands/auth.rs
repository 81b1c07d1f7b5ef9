use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_record, output_success, report_client_error};
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::models::{LoginInput, RegisterForm};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with email and password")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password")]
        password: String,
    },

    #[command(about = "Create an account and sign in")]
    Register {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "First name")]
        first_name: String,
        #[arg(long, help = "Last name")]
        last_name: String,
        #[arg(long, help = "Password (at least 6 characters)")]
        password: String,
        #[arg(long, help = "Repeat the password")]
        confirm_password: String,
        #[arg(long, help = "Preferred currency code, e.g. ETB")]
        currency: Option<String>,
    },

    #[command(about = "Logout and forget stored credentials")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Refresh authentication token")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, ctx: &AppContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let user = ctx
                .auth()
                .login(&LoginInput { email, password })
                .await
                .map_err(|e| report_client_error(&output_format, e))?;
            output_success(
                &output_format,
                &format!("Logged in as {}", user.email),
                Some(serde_json::to_value(&user)?),
            )
        }
        AuthCommands::Register {
            email,
            first_name,
            last_name,
            password,
            confirm_password,
            currency,
        } => {
            let form = RegisterForm {
                email,
                password,
                confirm_password,
                first_name,
                last_name,
                currency,
            };
            let user = ctx
                .auth()
                .register(form)
                .await
                .map_err(|e| report_client_error(&output_format, e))?;
            output_success(
                &output_format,
                &format!("Registered and logged in as {}", user.email),
                Some(serde_json::to_value(&user)?),
            )
        }
        AuthCommands::Logout => {
            ctx.auth()
                .logout()
                .map_err(|e| report_client_error(&output_format, e))?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let has_credential = ctx.has_credential();
            let user = if has_credential {
                ctx.auth().current_user().await
            } else {
                None
            };
            let message = match &user {
                Some(user) => format!("Authenticated as {}", user.email),
                None if has_credential => "Credential stored but the server did not accept it".to_string(),
                None => "Not logged in".to_string(),
            };
            output_success(
                &output_format,
                &message,
                Some(json!({
                    "authenticated": user.is_some(),
                    "credential_stored": has_credential,
                    "user": user,
                })),
            )
        }
        AuthCommands::Refresh => {
            ctx.auth()
                .refresh()
                .await
                .map_err(|e| report_client_error(&output_format, e))?;
            output_success(&output_format, "Access token refreshed", None)
        }
        AuthCommands::Whoami => match ctx.auth().current_user().await {
            Some(user) => output_record(
                &output_format,
                &user,
                &[
                    ("ID", user.id.clone()),
                    ("Name", user.full_name()),
                    ("Email", user.email.clone()),
                    ("Currency", user.currency.clone()),
                ],
            ),
            None => {
                output_error(&output_format, "Not logged in", Some("UNAUTHENTICATED"))?;
                anyhow::bail!("not logged in")
            }
        },
    }
}
