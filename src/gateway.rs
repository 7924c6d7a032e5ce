//! Gateway middleware: the single enforcement point in front of every
//! protected route.
//!
//! Per request: OAuth/discovery/root paths pass through untouched;
//! everything under `/api/` is rate-limited by client IP and then must
//! carry a valid bearer credential (signed token or static API key);
//! all other paths pass through.
//!
//! Rejections are terminal: 429 with `Retry-After`, or 401 with a
//! `WWW-Authenticate` challenge. The middleware never retries on the
//! caller's behalf.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode, header};
use serde_json::json;
use tracing::warn;

use crate::auth::Authenticator;
use crate::config::REALM;
use crate::rate_limit::RateLimiter;
use crate::types::ClientKey;

/// Shared state for the gateway layer.
pub struct GatewayState {
    pub authenticator: Authenticator,
    pub rate_limiter: RateLimiter,
}

impl GatewayState {
    pub fn new(authenticator: Authenticator, rate_limiter: RateLimiter) -> Self {
        Self {
            authenticator,
            rate_limiter,
        }
    }
}

/// Paths that bypass both rate limiting and authentication.
///
/// The OAuth endpoints hand out the first credential, the discovery
/// document must be fetchable anonymously, and the root/favicon are
/// harmless.
fn is_open_path(path: &str) -> bool {
    path.starts_with("/api/oauth")
        || path.starts_with("/.well-known")
        || path == "/"
        || path == "/favicon.ico"
}

/// Paths guarded by the rate limiter and bearer auth.
fn is_protected_path(path: &str) -> bool {
    path.starts_with("/api/")
}

/// Derive the rate-limit key from forwarding headers.
pub fn client_key(headers: &HeaderMap) -> ClientKey {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return ClientKey::new(first.trim());
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok())
        && !real_ip.trim().is_empty()
    {
        return ClientKey::new(real_ip.trim());
    }
    ClientKey::unknown()
}

/// The middleware itself; apply with `middleware::from_fn_with_state`.
pub async fn gateway_guard(
    State(state): State<Arc<GatewayState>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if is_open_path(path) {
        return next.run(req).await;
    }

    if is_protected_path(path) {
        let key = client_key(req.headers());
        if !state.rate_limiter.allow(&key) {
            warn!(client = %key, path, "rate limit exceeded");
            return rate_limited(state.rate_limiter.retry_after_seconds());
        }

        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if !state.authenticator.validate_bearer(auth_header) {
            warn!(client = %key, path, "rejecting unauthenticated request");
            return unauthorized();
        }
    }

    next.run(req).await
}

fn rate_limited(retry_after_seconds: u64) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": "rate_limit_exceeded",
            "message": "Too many requests. Try again later.",
        })),
    )
        .into_response();
    response.headers_mut().insert(
        header::RETRY_AFTER,
        retry_after_seconds
            .to_string()
            .parse()
            .expect("integer header value"),
    );
    response
}

fn unauthorized() -> Response {
    // One generic message for every failure mode; no oracle for why a
    // credential was rejected.
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": "Valid Bearer token required. Use OAuth flow or API key.",
        })),
    )
        .into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        format!("Bearer realm=\"{REALM}\"")
            .parse()
            .expect("static header value"),
    );
    response
}
