//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `categories`, `products`, `product_images` - Catalog
//! - `users`, `user_profiles` - Accounts
//! - `orders`, `order_items` - Placed orders
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p greenshop-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`query_as` with `FromRow` rows and
//! `QueryBuilder` for dynamic filters) so the crate builds without a live
//! database.

pub mod catalog;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Row is still referenced by another table (restrict foreign key).
    #[error("still referenced: {0}")]
    Protected(String),
}

impl RepositoryError {
    /// Classify a write error: unique violations become `Conflict`, foreign
    /// key violations become `Protected`.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Protected(format!("{what} is referenced by existing orders"));
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
#[must_use]
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
