//! Venture Market CLI - session migrations and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table in the storefront database
//! vm-cli migrate sessions
//!
//! # Check that the marketplace backend answers
//! vm-cli backend ping
//!
//! # Print the category catalogue
//! vm-cli categories list
//! ```
//!
//! # Commands
//!
//! - `migrate sessions` - Create the `PostgreSQL` session store schema
//! - `backend ping` - Probe the REST backend
//! - `categories list` - List categories from the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vm-cli")]
#[command(author, version, about = "Venture Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Check the marketplace backend
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },
    /// Inspect the category catalogue
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the session store table
    Sessions,
}

#[derive(Subcommand)]
enum BackendAction {
    /// Verify the backend is reachable
    Ping,
}

#[derive(Subcommand)]
enum CategoriesAction {
    /// Print every category with its ID
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Backend { action } => match action {
            BackendAction::Ping => commands::backend::ping().await?,
        },
        Commands::Categories { action } => match action {
            CategoriesAction::List => commands::categories::list().await?,
        },
    }
    Ok(())
}
