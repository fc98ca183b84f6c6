//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Home page
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (database ping)
//!
//! # Catalog
//! GET  /categories                 - Category list
//! GET  /catalog                    - Product listing (?category=&q=&sort=&page=)
//! GET  /product/{slug}             - Product detail
//!
//! # Cart (JSON for XMLHttpRequest, redirect otherwise)
//! GET  /cart                       - Cart page
//! POST /cart/add/{product_id}      - Add quantity
//! POST /cart/update/{product_id}   - Replace quantity
//! POST /cart/remove/{product_id}   - Remove line
//!
//! # Checkout
//! GET  /checkout                   - Checkout form
//! POST /checkout                   - Place order
//! GET  /order/{id}/confirmation    - Order confirmation
//!
//! # Auth (POSTs rate limited)
//! GET  /login, /register           - Forms
//! POST /login, /register           - Actions
//! POST /logout                     - Logout action
//!
//! # Account (requires auth)
//! GET  /account                    - Dashboard
//! GET  /account/orders             - Order history
//! GET  /account/profile            - Profile form
//! POST /account/profile            - Save profile
//!
//! # Admin (requires staff)
//! /admin/...                       - See `admin::router`
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only the form submissions are rate limited; `.get` is added after the
/// layer so the pages themselves are not.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login)
                .layer(auth_rate_limiter())
                .get(auth::login_page),
        )
        .route(
            "/register",
            post(auth::register)
                .layer(auth_rate_limiter())
                .get(auth::register_page),
        )
        .route("/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories::index))
        .route("/catalog", get(products::index))
        .route("/product/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{product_id}", post(cart::add))
        .route("/update/{product_id}", post(cart::update))
        .route("/remove/{product_id}", post(cart::remove))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::dashboard))
        .route("/orders", get(account::orders))
        .route(
            "/profile",
            get(account::profile_page).post(account::update_profile),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Catalog
        .merge(catalog_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .route(
            "/checkout",
            get(checkout::checkout_page).post(checkout::checkout),
        )
        .route("/order/{id}/confirmation", get(checkout::confirmation))
        // Account routes
        .nest("/account", account_routes())
        // Auth routes
        .merge(auth_routes())
        // Back office
        .merge(admin::router())
}
