//! Staff back office under `/admin`.
//!
//! Every handler takes [`RequireStaff`](crate::middleware::RequireStaff):
//! anonymous visitors are sent to the login page, logged-in customers get a
//! 403. Admin templates extend `admin/base.html`, which highlights the
//! section named by `current_path`.

pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod profiles;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::forms::optional;
use crate::state::AppState;

/// Largest accepted gallery upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard::dashboard))
        // Categories
        .route("/admin/categories", get(categories::index))
        .route(
            "/admin/categories/new",
            get(categories::new_page).post(categories::create),
        )
        .route(
            "/admin/categories/{id}/edit",
            get(categories::edit_page).post(categories::update),
        )
        .route("/admin/categories/{id}/delete", post(categories::delete))
        // Products
        .route("/admin/products", get(products::index))
        .route(
            "/admin/products/new",
            get(products::new_page).post(products::create),
        )
        .route(
            "/admin/products/{id}/edit",
            get(products::edit_page).post(products::update),
        )
        .route("/admin/products/{id}/quick-edit", post(products::quick_edit))
        .route("/admin/products/{id}/delete", post(products::delete))
        .route(
            "/admin/products/{id}/images",
            post(products::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/admin/products/{id}/images/{image_id}/delete",
            post(products::delete_image),
        )
        // Orders
        .route("/admin/orders", get(orders::index))
        .route("/admin/orders/{id}", get(orders::show))
        .route("/admin/orders/{id}/status", post(orders::update_status))
        // Customers
        .route("/admin/profiles", get(profiles::index))
}

/// Search box value, `None` when blank.
fn search_term(q: Option<&String>) -> Option<String> {
    q.and_then(|q| optional(q))
}

/// Tri-state filter from a `1`/`0` query value.
fn yes_no(value: Option<&String>) -> Option<bool> {
    match value.map(String::as_str) {
        Some("1") => Some(true),
        Some("0") => Some(false),
        _ => None,
    }
}
