//! Bazaar CLI - database migrations and operational tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations and create the session table
//! bz-cli migrate
//!
//! # Recompute every product's stored rating from its reviews
//! bz-cli ratings sync
//!
//! # Recompute one product
//! bz-cli ratings sync-one --product-id 42
//!
//! # Promote a user to admin
//! bz-cli user set-role --email admin@example.com --role admin
//!
//! # Load products from YAML
//! bz-cli seed catalog --file crates/cli/seed/catalog.yaml
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use bazaar_core::{ProductId, UserRole};

mod commands;

#[derive(Parser)]
#[command(name = "bz-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Resynchronize denormalized product ratings
    Ratings {
        #[command(subcommand)]
        action: RatingsAction,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum RatingsAction {
    /// Recompute ratings for every product
    Sync,
    /// Recompute the rating of one product
    SyncOne {
        /// Product ID
        #[arg(short, long)]
        product_id: i64,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change a user's role
    SetRole {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// New role (`admin` or `user`)
        #[arg(short, long)]
        role: UserRole,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a YAML catalog file
    Catalog {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bz_cli=info,bazaar_storefront=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Ratings { action } => match action {
            RatingsAction::Sync => commands::ratings::sync_all().await?,
            RatingsAction::SyncOne { product_id } => {
                commands::ratings::sync_one(ProductId::new(product_id)).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
    }
    Ok(())
}
