//! Database migration command.
//!
//! Applies `crates/storefront/migrations/` and creates the
//! `tower_sessions.session` table used by the session store.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CliError, connect};

/// Run storefront migrations and the session store migration.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
