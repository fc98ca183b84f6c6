//! Admin dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::{CatalogRepository, OrderRepository, UserRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::state::AppState;

/// Row counts shown on the dashboard tiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardCounts {
    pub categories: i64,
    pub products: i64,
    pub orders: i64,
    pub users: i64,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub counts: DashboardCounts,
}

/// Dashboard page handler.
#[instrument(skip(state, staff, ctx), fields(user_id = %staff.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());
    let order_repo = OrderRepository::new(state.pool());
    let user_repo = UserRepository::new(state.pool());
    let (categories, products, orders, users) = tokio::try_join!(
        catalog.count_categories(),
        catalog.count_products(),
        order_repo.count(),
        user_repo.count(),
    )?;

    Ok(DashboardTemplate {
        ctx,
        current_path: "/admin",
        counts: DashboardCounts {
            categories,
            products,
            orders,
            users,
        },
    })
}
