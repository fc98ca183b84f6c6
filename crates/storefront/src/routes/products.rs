//! Catalog and product detail route handlers.

use std::borrow::Borrow;
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::db::catalog::CatalogFilter;
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::optional;
use crate::middleware::PageContext;
use crate::models::{Category, Page, ProductImage, ProductSummary, catalog::media_url, primary_image};
use crate::state::AppState;

/// Related products shown under a product.
const RELATED_PRODUCTS: i64 = 4;

// =============================================================================
// Query Types
// =============================================================================

/// Catalog query parameters. `page` stays a string: junk values fall back
/// to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl CatalogQuery {
    fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            category: self.category.as_deref().and_then(optional),
            query: self.q.as_deref().and_then(optional),
            newest_first: self.sort.as_deref() == Some("new"),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/catalog.html")]
pub struct CatalogTemplate {
    pub ctx: PageContext,
    pub page: Page<ProductSummary>,
    pub categories: Arc<Vec<Category>>,
    pub active_category: String,
    pub active_sort: String,
    pub query: String,
}

impl CatalogTemplate {
    /// URL of another page with the current filters kept.
    #[must_use]
    pub fn page_url(&self, number: impl Borrow<i64>) -> String {
        catalog_url(
            &self.active_category,
            &self.query,
            &self.active_sort,
            Some(*number.borrow()),
        )
    }

    #[must_use]
    pub fn is_current_page(&self, number: impl Borrow<i64>) -> bool {
        *number.borrow() == self.page.number
    }

    /// URL of the catalog with a different sort order.
    #[must_use]
    pub fn sort_url(&self, sort: &str) -> String {
        catalog_url(&self.active_category, &self.query, sort, None)
    }
}

/// Build a catalog URL, leaving out empty parameters.
#[must_use]
pub fn catalog_url(category: &str, query: &str, sort: &str, page: Option<i64>) -> String {
    let mut params = Vec::new();
    if !category.is_empty() {
        params.push(format!("category={}", urlencoding::encode(category)));
    }
    if !query.is_empty() {
        params.push(format!("q={}", urlencoding::encode(query)));
    }
    if !sort.is_empty() {
        params.push(format!("sort={}", urlencoding::encode(sort)));
    }
    if let Some(page) = page {
        params.push(format!("page={page}"));
    }

    if params.is_empty() {
        "/catalog".to_owned()
    } else {
        format!("/catalog?{}", params.join("&"))
    }
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/product_detail.html")]
pub struct ProductDetailTemplate {
    pub ctx: PageContext,
    pub product: ProductSummary,
    pub image_url: Option<String>,
    pub gallery: Vec<ProductImage>,
    pub related: Vec<ProductSummary>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the catalog.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter();
    let page = CatalogRepository::new(state.pool())
        .catalog_page(&filter, query.page.as_deref())
        .await?;
    let categories = state.categories().await?;

    Ok(CatalogTemplate {
        ctx,
        page,
        categories,
        active_category: filter.category.unwrap_or_default(),
        active_sort: query.sort.unwrap_or_default(),
        query: filter.query.unwrap_or_default(),
    })
}

/// Display a product.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());

    let product = catalog
        .active_product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;
    let gallery = catalog.product_images(product.product.id).await?;
    let related = catalog
        .related_products(&product.product, RELATED_PRODUCTS)
        .await?;

    let image_url = primary_image(&gallery, product.product.main_image.as_deref()).map(media_url);

    Ok(ProductDetailTemplate {
        ctx,
        product,
        image_url,
        gallery,
        related,
    })
}
