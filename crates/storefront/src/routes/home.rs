//! Home page route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{Category, ProductSummary};
use crate::state::AppState;

/// Featured and newest products shown on the home page.
const HOME_SECTION_SIZE: i64 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured: Vec<ProductSummary>,
    pub newest: Vec<ProductSummary>,
    pub categories: Arc<Vec<Category>>,
}

/// Display the home page.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());

    let featured = catalog.featured_products(HOME_SECTION_SIZE).await?;
    let newest = catalog.newest_products(HOME_SECTION_SIZE).await?;
    let categories = state.categories().await?;

    Ok(HomeTemplate {
        ctx,
        featured,
        newest,
        categories,
    })
}
