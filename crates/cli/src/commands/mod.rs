//! CLI subcommands.

pub mod migrate;
pub mod ratings;
pub mod seed;
pub mod user;

use bazaar_core::EmailError;
use bazaar_storefront::db::{self, RepositoryError};
use bazaar_storefront::services::ratings::RatingSyncError;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

const CLI_MAX_CONNECTIONS: u32 = 2;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    RatingSync(#[from] RatingSyncError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("No user with email: {0}")]
    UserNotFound(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The catalog file parsed but failed validation.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Connect to the storefront database named by the environment.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url, CLI_MAX_CONNECTIONS).await?)
}
