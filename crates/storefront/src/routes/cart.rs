//! Cart route handlers.
//!
//! Cart mutations are plain form posts. `static/js/cart.js` submits them
//! with `X-Requested-With: XMLHttpRequest` and gets a JSON summary back to
//! refresh the header badge; without the header the browser is redirected
//! to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use greenshop_core::{Price, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{Cart, CartItem, Flash, FlashLevel};
use crate::services::cart::{CartService, parse_quantity};
use crate::state::AppState;

/// Quantity submitted by the add and update forms.
#[derive(Debug, Default, Deserialize)]
pub struct QuantityForm {
    pub quantity: Option<String>,
}

/// JSON answer for scripted cart changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Number of units in the cart.
    pub items: u32,
    /// Cart total with two decimals, without currency.
    pub total: String,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.len(),
            total: Price::format_amount(cart.total()),
        }
    }
}

/// Whether the request came from `cart.js`.
#[must_use]
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn cart_response(headers: &HeaderMap, cart: &Cart) -> Response {
    if is_ajax(headers) {
        Json(CartSummary::from(cart)).into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/cart.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub items: Vec<CartItem>,
    pub total: String,
    pub max_quantity: u32,
}

/// Display the cart.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let service = CartService::new(state.pool(), &session);
    let cart = service.load().await?;
    let items = service.items(&cart).await?;

    Ok(CartTemplate {
        ctx,
        items,
        total: Price::store(cart.total()).display(),
        max_quantity: Cart::MAX_QUANTITY,
    })
}

/// Add a product to the cart.
#[instrument(skip(state, session, headers, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let quantity = parse_quantity(form.quantity.as_deref())?;
    let (cart, product) = CartService::new(state.pool(), &session)
        .add(product_id, quantity, false)
        .await?;

    let id = product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
    Flash::push(
        &session,
        FlashLevel::Success,
        format!("{} added to cart.", product.name),
    )
    .await?;

    Ok(cart_response(&headers, &cart))
}

/// Set a product's quantity.
#[instrument(skip(state, session, headers, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let quantity = parse_quantity(form.quantity.as_deref())?;
    let (cart, _) = CartService::new(state.pool(), &session)
        .add(product_id, quantity, true)
        .await?;

    Ok(cart_response(&headers, &cart))
}

/// Remove a product from the cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
) -> Result<Response> {
    let cart = CartService::new(state.pool(), &session)
        .remove(product_id)
        .await?;

    Ok(cart_response(&headers, &cart))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_is_ajax() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax(&headers));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_ajax(&headers));
        headers.insert("x-requested-with", HeaderValue::from_static("fetch"));
        assert!(!is_ajax(&headers));
    }

    #[test]
    fn test_cart_summary() {
        let mut cart = Cart::default();
        assert_eq!(
            CartSummary::from(&cart),
            CartSummary {
                items: 0,
                total: "0.00".to_owned()
            }
        );

        cart.add(ProductId::new(1), Decimal::new(2499, 0), 2, false);
        cart.add(ProductId::new(2), Decimal::new(29050, 2), 1, false);
        let summary = CartSummary::from(&cart);
        assert_eq!(summary.items, 3);
        assert_eq!(summary.total, "5288.50");
    }
}
