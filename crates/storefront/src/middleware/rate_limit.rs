//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Login and registration submissions are limited per client IP (~10/min) to
//! slow down password guessing and sign-up spam.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor that trusts the usual reverse proxy headers first, then
/// falls back to the TCP peer address.
///
/// The peer address is only available when the server is started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        // CF-Connecting-IP, then the first hop of X-Forwarded-For, then X-Real-IP
        header_ip(req, "cf-connecting-ip")
            .or_else(|| header_ip(req, "x-forwarded-for"))
            .or_else(|| header_ip(req, "x-real-ip"))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5) // Allow burst of 5 requests
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request() -> axum::http::request::Builder {
        Request::builder().uri("/login")
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request()
            .header("cf-connecting-ip", "203.0.113.7")
            .header("x-forwarded-for", "198.51.100.1")
            .body(())
            .unwrap();
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_uses_first_forwarded_hop() {
        let req = request()
            .header("x-forwarded-for", "198.51.100.1, 10.0.0.2")
            .body(())
            .unwrap();
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.10:51000".parse::<SocketAddr>().unwrap()));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "192.0.2.10".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_no_source_is_an_error() {
        let req = request().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}
