//! Router-level tests through the full middleware stack.
//!
//! Every request here is answered without a working database: health,
//! form pages, validation failures, auth redirects, empty-cart flows, static
//! files and a checkout whose database is down.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use rust_decimal::Decimal;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use greenshop_core::ProductId;
use greenshop_integration_tests::{
    app_with, body_text, form_post, location, send, unreachable_pool,
};
use greenshop_storefront::middleware::session::SESSION_COOKIE_NAME;
use greenshop_storefront::models::{Cart, session_keys};

const CHECKOUT_FORM: &str = "first_name=Anna&last_name=Petrova&email=anna%40example.com\
     &phone=%2B79990000000&address=Lenina+1&city=Moscow&postal_code=101000&notes=";

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let response = send(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = send(get("/no-such-page")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_security_headers_on_pages() {
    let response = send(get("/login")).await;
    let headers = response.headers();

    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(
        headers.get(header::CACHE_CONTROL).unwrap(),
        "no-store, max-age=0"
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::get("/health")
        .header("x-request-id", "edge-42")
        .body(Body::empty())
        .unwrap();
    let response = send(request).await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "edge-42");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let response = send(get("/health")).await;
    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_static_files_are_cacheable() {
    let response = send(get("/static/css/main.css")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=604800"
    );
}

// =============================================================================
// Auth pages
// =============================================================================

#[tokio::test]
async fn test_login_page_renders() {
    let response = send(get("/login?next=/account/orders")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Log in"));
    assert!(body.contains(r#"name="next""#));
}

#[tokio::test]
async fn test_register_page_renders() {
    let response = send(get("/register")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("password2"));
}

#[tokio::test]
async fn test_login_with_blank_fields_redisplays_form() {
    let response = send(form_post("/login", "username=&password=&next=")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
}

#[tokio::test]
async fn test_register_with_bad_input_redisplays_form() {
    let response = send(form_post(
        "/register",
        "username=bad+name%21&email=not-an-email&password1=abc&password2=xyz",
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Enter a valid username."));
    assert!(body.contains("Enter a valid email address."));
    assert!(body.contains("The two password fields didn"));
    assert!(!body.contains("xyz"), "passwords are never echoed back");
}

#[tokio::test]
async fn test_auth_post_without_client_address_is_rejected() {
    let request = Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=&password="))
        .unwrap();
    let response = send(request).await;
    assert!(response.status().is_server_error() || response.status().is_client_error());
}

#[tokio::test]
async fn test_logout_redirects_home() {
    let response = send(form_post("/logout", "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

// =============================================================================
// Access control
// =============================================================================

#[tokio::test]
async fn test_account_requires_login() {
    let response = send(get("/account")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login?next=%2Faccount"));
}

#[tokio::test]
async fn test_account_orders_keeps_query_in_next() {
    let response = send(get("/account/orders?page=2")).await;
    assert_eq!(
        location(&response),
        Some("/login?next=%2Faccount%2Forders%3Fpage%3D2")
    );
}

#[tokio::test]
async fn test_admin_requires_login() {
    for uri in ["/admin", "/admin/products", "/admin/orders/1"] {
        let response = send(get(uri)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert!(
            location(&response).is_some_and(|l| l.starts_with("/login?next=%2Fadmin")),
            "{uri}"
        );
    }
}

// =============================================================================
// Cart and checkout
// =============================================================================

#[tokio::test]
async fn test_remove_from_empty_cart_returns_json_summary() {
    let request = Request::post("/cart/remove/1")
        .header("x-requested-with", "XMLHttpRequest")
        .body(Body::empty())
        .unwrap();
    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let summary: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(summary, serde_json::json!({"items": 0, "total": "0.00"}));
}

#[tokio::test]
async fn test_remove_without_xhr_redirects_to_cart() {
    let response = send(form_post("/cart/remove/1", "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/cart"));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_catalog() {
    let response = send(get("/checkout")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/catalog"));
}

#[tokio::test]
async fn test_placing_order_with_empty_cart_redirects_to_catalog() {
    let response = send(form_post("/checkout", CHECKOUT_FORM)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/catalog"));
}

#[tokio::test]
async fn test_failed_checkout_keeps_the_cart() {
    let store = MemoryStore::default();
    let mut cart = Cart::default();
    cart.add(ProductId::new(4), Decimal::new(1000, 2), 2, false);

    let session = Session::new(None, Arc::new(store.clone()), None);
    session.insert(session_keys::CART, &cart).await.unwrap();
    session.save().await.unwrap();
    let id = session.id().unwrap();

    let mut request = form_post("/checkout", CHECKOUT_FORM);
    request.headers_mut().insert(
        header::COOKIE,
        format!("{SESSION_COOKIE_NAME}={id}").parse().unwrap(),
    );
    let response = app_with(unreachable_pool(), store.clone())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let reloaded = Session::new(Some(id), Arc::new(store), None);
    assert_eq!(
        reloaded.get::<Cart>(session_keys::CART).await.unwrap(),
        Some(cart)
    );
}
