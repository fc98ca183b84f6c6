//! Category list route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::Category;
use crate::state::AppState;

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Arc<Vec<Category>>,
}

/// Display every category.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let categories = state.categories().await?;
    Ok(CategoriesTemplate { ctx, categories })
}
