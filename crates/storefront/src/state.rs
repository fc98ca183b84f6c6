//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::config::StorefrontConfig;
use crate::db::{CatalogRepository, RepositoryError};
use crate::models::Category;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    categories: Cache<(), Arc<Vec<Category>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        // The category list backs every page's navigation; admin writes
        // invalidate it, the TTL covers writes from the CLI.
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(60))
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                categories,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// All categories ordered by name, cached for a minute.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the list has to be loaded and
    /// the query fails.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(categories) = self.inner.categories.get(&()).await {
            debug!("Cache hit for category list");
            return Ok(categories);
        }

        let categories = Arc::new(CatalogRepository::new(self.pool()).list_categories().await?);
        self.inner
            .categories
            .insert((), Arc::clone(&categories))
            .await;
        Ok(categories)
    }

    /// Drop the cached category list after a category write.
    pub async fn invalidate_categories(&self) {
        self.inner.categories.invalidate(&()).await;
    }
}
