//! Card Ledger CLI - Database migrations and catalog maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run ledger database migrations
//! ledger-cli migrate
//!
//! # Refetch the card catalog and rewrite the local snapshot
//! ledger-cli catalog refresh
//!
//! # Show the age and size of the local snapshot
//! ledger-cli catalog status
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ledger-cli")]
#[command(author, version, about = "Card Ledger CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Maintain the local catalog snapshot
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Fetch the catalog now, ignoring the freshness window
    Refresh,
    /// Print snapshot age and card count
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::Refresh => commands::catalog::refresh().await?,
            CatalogAction::Status => commands::catalog::status().await?,
        },
    }
    Ok(())
}
