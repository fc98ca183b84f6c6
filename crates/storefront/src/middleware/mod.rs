//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Login and registration submissions additionally carry the rate limiter
//! (governor), and handlers pull identity and page data through the
//! extractors in [`auth`] and [`context`].

pub mod auth;
pub mod context;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, RequireStaff, clear_current_user, login_url, set_current_user,
};
pub use context::PageContext;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
