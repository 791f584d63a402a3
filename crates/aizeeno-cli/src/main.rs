//! aizeeno command-line client
//!
//! Drives the subscription checkout against the aizeeno backend.
//!
//! # Usage
//!
//! ```bash
//! # Record the signed-in user
//! aizeeno login --username bob --name Bob --email bob@example.com
//!
//! # Start a checkout for a plan
//! aizeeno checkout pro
//!
//! # After paying, verify the URL the payment page returned to
//! aizeeno verify 'http://127.0.0.1:5000/subscription/success?session_id=cs_123&plan=pro'
//! ```

mod commands;
mod state;

use aizeeno_core::ClientContext;
use aizeeno_runtime::RuntimeSettings;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

/// Filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "aizeeno")]
#[command(author, version, about = "aizeeno subscription checkout client")]
struct Cli {
    /// Backend base URL (overrides AIZEENO_BACKEND_URL)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the signed-in user in local storage
    Login {
        #[arg(short, long)]
        username: String,

        /// Display name (defaults to the username)
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },
    /// Show the locally stored user
    Status,
    /// Fetch the payment configuration
    Config,
    /// Create a checkout session for a plan
    Checkout {
        /// Plan identifier, e.g. `starter` or `pro`
        plan: String,
    },
    /// Confirm payment for the URL the payment page returned to
    Verify {
        /// Return URL carrying `session_id` and optionally `plan`
        location: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let context = match cli.backend {
        Some(backend) => ClientContext::new(backend),
        None => ClientContext::from_env(),
    };
    let state = AppState::new(context, &RuntimeSettings::from_env())?;

    match cli.command {
        Commands::Login {
            username,
            name,
            email,
        } => {
            let name = name.unwrap_or_else(|| username.clone());
            commands::login(&state, &username, &name, email.as_deref());
        }
        Commands::Status => commands::status(&state)?,
        Commands::Config => commands::config(&state).await?,
        Commands::Checkout { plan } => commands::checkout(&state, &plan).await?,
        Commands::Verify { location } => commands::verify(&state, &location).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter() {
        assert_eq!(DEFAULT_LOG_FILTER, "info");
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_parse_checkout_with_backend() {
        let cli = Cli::try_parse_from(["aizeeno", "--backend", "http://localhost:9000", "checkout", "pro"])
            .unwrap();
        assert_eq!(cli.backend.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(cli.command, Commands::Checkout { plan } if plan == "pro"));
    }
}
