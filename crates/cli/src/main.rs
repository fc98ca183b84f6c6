//! GreenShop CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! gs-cli migrate
//!
//! # Create the demo categories and products
//! gs-cli seed
//!
//! # Load the catalog fixtures, replacing the current catalog
//! gs-cli load-catalog crates/storefront/fixtures --flush
//!
//! # Create a staff account for the back office
//! gs-cli user create-staff --username admin --email admin@example.com --password '...'
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gs-cli")]
#[command(author, version, about = "GreenShop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create demo categories and products (idempotent)
    Seed,
    /// Load categories and products from JSON fixtures
    LoadCatalog {
        /// Directory holding `catalog_categories.json` and `catalog_products.json`
        #[arg(default_value = "crates/storefront/fixtures")]
        dir: PathBuf,

        /// Delete existing products and categories first
        #[arg(long)]
        flush: bool,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a staff user who can open the back office
    CreateStaff {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::demo_store().await?,
        Commands::LoadCatalog { dir, flush } => {
            commands::catalog::load(&dir, flush).await?;
        }
        Commands::User { action } => match action {
            UserAction::CreateStaff {
                username,
                email,
                password,
            } => {
                commands::user::create_staff(&username, &email, &password).await?;
            }
        },
    }
    Ok(())
}
