use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_location, save_location, LocationState};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::guard::{GuardDecision, Navigator, RouteGuard, LOGIN_PATH};

#[derive(Subcommand)]
pub enum RouteCommands {
    #[command(about = "Classify a path and show the guard's decision")]
    Check {
        #[arg(help = "Path, e.g. /dashboard")]
        path: String,
    },

    #[command(about = "Navigate to a path and remember where the guard lands")]
    Go {
        #[arg(help = "Path, e.g. /budgets")]
        path: String,
    },

    #[command(about = "Show the remembered location")]
    Current,
}

pub fn handle(cmd: RouteCommands, ctx: &AppContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RouteCommands::Check { path } => {
            let guard = RouteGuard::new();
            let has_credential = ctx.has_credential();
            let class = guard.classify(&path);
            let decision = guard.check(&path, has_credential);

            let message = match decision {
                GuardDecision::Continue => format!("{} ({:?}): continue", path, class),
                GuardDecision::Redirect(target) => {
                    format!("{} ({:?}): redirect to {}", path, class, target)
                }
            };
            let redirect = match decision {
                GuardDecision::Continue => None,
                GuardDecision::Redirect(target) => Some(target),
            };
            output_success(
                &output_format,
                &message,
                Some(json!({
                    "path": path,
                    "class": format!("{:?}", class).to_lowercase(),
                    "authenticated": has_credential,
                    "redirect": redirect,
                })),
            )
        }
        RouteCommands::Go { path } => {
            let navigator = Navigator::new(ctx.clone(), &path);
            let location = navigator.location().to_string();
            save_location(&LocationState::at(&location))?;
            output_success(
                &output_format,
                &format!("Now at {}", location),
                Some(json!({ "requested": path, "location": location })),
            )
        }
        RouteCommands::Current => {
            let state = load_location()?;
            let current = state.current.unwrap_or_else(|| LOGIN_PATH.to_string());

            // re-apply the guard in case the session changed since
            let navigator = Navigator::new(ctx.clone(), &current);
            if navigator.location() != current {
                save_location(&LocationState::at(navigator.location()))?;
            }
            output_success(
                &output_format,
                &format!("Current location: {}", navigator.location()),
                Some(json!({ "location": navigator.location(), "updated_at": state.updated_at })),
            )
        }
    }
}
