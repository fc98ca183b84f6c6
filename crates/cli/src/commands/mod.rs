//! CLI command implementations.

pub mod catalog;
pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the storefront database named by the environment.
///
/// # Errors
///
/// Returns an error if no database URL is set or the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(greenshop_storefront::db::create_pool(&database_url).await?)
}
