//! GreenShop storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused: the binary and the integration
//! tests both build their router with [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Request, Response, header},
};
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Cache policy for fingerprinted assets and uploaded media.
const STATIC_CACHE_CONTROL: &str = "public, max-age=604800";

/// Build the full application router.
///
/// Layers, innermost first: sessions, security headers, request id, request
/// tracing. Sentry layers are added by the binary around the result.
pub fn app<Store>(state: AppState, sessions: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static(STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(&state.config().static_dir));
    let media_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static(STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(&state.config().media_dir));

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .nest_service("/media", media_files)
        .layer(sessions)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}
