//! Database migration commands.
//!
//! The storefront keeps no business data; its only table is the session
//! store, whose schema is owned by `tower-sessions-sqlx-store`.
//!
//! # Usage
//!
//! ```bash
//! vm-cli migrate sessions
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or DDL error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolve the session database URL.
fn database_url() -> Result<SecretString, MigrationError> {
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Create the session schema and table if they do not exist.
///
/// # Errors
///
/// Returns an error if the URL is unset, the database is unreachable, or
/// the DDL fails.
pub async fn sessions() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();
    let url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(url.expose_secret()).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Session store ready");
    Ok(())
}
