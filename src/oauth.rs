//! OAuth-style token issuance endpoints.
//!
//! Three public routes, all on the gateway allow-list because their whole
//! purpose is to hand out the first credential:
//!
//! - `GET /api/oauth/authorize` — mints a single-use authorization code
//! - `POST /api/oauth/token` — exchanges a code or refresh token for a
//!   signed access token
//! - `GET /.well-known/oauth-authorization-server` — discovery document

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{CodeStore, DEFAULT_TOKEN_TTL_SECONDS, TokenSigner, generate_refresh_token};

/// Shared state for the OAuth routes.
pub struct OauthState {
    pub signer: TokenSigner,
    pub code_store: Arc<CodeStore>,
}

/// Build the OAuth router.
pub fn router(state: Arc<OauthState>) -> Router {
    Router::new()
        .route("/api/oauth/authorize", get(authorize))
        .route("/api/oauth/token", post(token))
        .route("/.well-known/oauth-authorization-server", get(discovery))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AuthorizeParams {
    redirect_uri: Option<String>,
    state: Option<String>,
}

/// Issue a fresh authorization code.
///
/// With a `redirect_uri` the code is delivered as a redirect query
/// parameter; without one it is echoed as JSON (useful for manual flows
/// and tests).
async fn authorize(
    State(state): State<Arc<OauthState>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let code = state.code_store.issue();
    info!("issued authorization code");

    if let Some(redirect_uri) = params.redirect_uri {
        let Ok(mut target) = url::Url::parse(&redirect_uri) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_request" })),
            )
                .into_response();
        };
        {
            let mut query = target.query_pairs_mut();
            query.append_pair("code", &code);
            if let Some(client_state) = &params.state {
                query.append_pair("state", client_state);
            }
        }
        return Redirect::to(target.as_str()).into_response();
    }

    Json(json!({ "code": code, "state": params.state })).into_response()
}

/// Body of a token request, from either form or JSON encoding.
#[derive(Debug, Default, Deserialize)]
struct TokenRequest {
    grant_type: Option<String>,
    code: Option<String>,
    refresh_token: Option<String>,
}

impl TokenRequest {
    fn from_form(body: &[u8]) -> Self {
        let mut request = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "grant_type" => request.grant_type = Some(value.into_owned()),
                "code" => request.code = Some(value.into_owned()),
                "refresh_token" => request.refresh_token = Some(value.into_owned()),
                _ => {}
            }
        }
        request
    }
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// The token endpoint: authorization_code and refresh_token grants.
async fn token(
    State(state): State<Arc<OauthState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let request = if content_type.contains("application/x-www-form-urlencoded") {
        TokenRequest::from_form(&body)
    } else {
        match serde_json::from_slice::<TokenRequest>(&body) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "unparseable token request body");
                return grant_error("invalid_request");
            }
        }
    };

    match request.grant_type.as_deref() {
        Some("authorization_code") => {
            let consumed = request
                .code
                .map(|code| state.code_store.verify_and_consume(&code))
                .unwrap_or(false);
            if !consumed {
                return grant_error("invalid_grant");
            }

            info!("exchanged authorization code for access token");
            (
                StatusCode::OK,
                Json(TokenResponse {
                    access_token: state.signer.issue(DEFAULT_TOKEN_TTL_SECONDS),
                    token_type: "Bearer",
                    expires_in: DEFAULT_TOKEN_TTL_SECONDS,
                    refresh_token: Some(generate_refresh_token()),
                }),
            )
                .into_response()
        }
        Some("refresh_token") => {
            // The presented refresh token is not validated against any
            // store. Known authentication gap inherited from the original
            // contract; see DESIGN.md before tightening.
            warn!(
                token_present = request.refresh_token.is_some(),
                "issuing access token for unverified refresh token"
            );
            (
                StatusCode::OK,
                Json(TokenResponse {
                    access_token: state.signer.issue(DEFAULT_TOKEN_TTL_SECONDS),
                    token_type: "Bearer",
                    expires_in: DEFAULT_TOKEN_TTL_SECONDS,
                    refresh_token: None,
                }),
            )
                .into_response()
        }
        _ => grant_error("unsupported_grant_type"),
    }
}

fn grant_error(code: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": code }))).into_response()
}

/// RFC 8414-shaped metadata so MCP clients can find the token endpoint.
async fn discovery() -> Json<serde_json::Value> {
    Json(json!({
        "issuer": "ads-mcp-gateway",
        "authorization_endpoint": "/api/oauth/authorize",
        "token_endpoint": "/api/oauth/token",
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "token_endpoint_auth_methods_supported": ["none"],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<OauthState> {
        Arc::new(OauthState {
            signer: TokenSigner::new("oauth-test-secret"),
            code_store: Arc::new(CodeStore::new()),
        })
    }

    fn form_request(body: &str) -> http::Request<axum::body::Body> {
        http::Request::builder()
            .method("POST")
            .uri("/api/oauth/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(body: serde_json::Value) -> http::Request<axum::body::Body> {
        http::Request::builder()
            .method("POST")
            .uri("/api/oauth/token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn code_exchange_succeeds_once_then_fails() {
        let state = test_state();
        state.code_store.insert("abc123".to_string());
        let app = router(state);

        let first = app
            .clone()
            .oneshot(form_request("grant_type=authorization_code&code=abc123"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let body = body_json(first).await;
        assert!(body["access_token"].as_str().unwrap().starts_with("gads_"));
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 86_400);
        assert!(
            body["refresh_token"]
                .as_str()
                .unwrap()
                .starts_with("gads_rt_")
        );

        let second = app
            .oneshot(form_request("grant_type=authorization_code&code=abc123"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(second).await["error"], "invalid_grant");
    }

    #[tokio::test]
    async fn json_body_is_accepted() {
        let state = test_state();
        state.code_store.insert("abc123".to_string());
        let app = router(state);

        let response = app
            .oneshot(json_request(json!({
                "grant_type": "authorization_code",
                "code": "abc123",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_code_is_invalid_grant() {
        let app = router(test_state());
        let response = app
            .oneshot(form_request("grant_type=authorization_code"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_grant");
    }

    #[tokio::test]
    async fn refresh_grant_accepts_any_value() {
        let state = test_state();
        let signer = state.signer.clone();
        let app = router(state);

        let response = app
            .oneshot(form_request("grant_type=refresh_token&refresh_token=whatever"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(signer.verify(body["access_token"].as_str().unwrap()));
        assert!(
            body.get("refresh_token").is_none(),
            "refresh grant issues no new refresh token"
        );
    }

    #[tokio::test]
    async fn unsupported_grant_type_is_rejected() {
        let app = router(test_state());
        let response = app.oneshot(form_request("grant_type=foo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "unsupported_grant_type");
    }

    #[tokio::test]
    async fn absent_grant_type_is_rejected() {
        let app = router(test_state());
        let response = app.oneshot(form_request("code=abc123")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "unsupported_grant_type");
    }

    #[tokio::test]
    async fn unparseable_json_body_is_rejected() {
        let app = router(test_state());
        let request = http::Request::builder()
            .method("POST")
            .uri("/api/oauth/token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn authorize_without_redirect_returns_code() {
        let state = test_state();
        let app = router(state.clone());
        let request = http::Request::builder()
            .uri("/api/oauth/authorize?state=xyz")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let code = body["code"].as_str().unwrap().to_string();
        assert_eq!(body["state"], "xyz");
        assert!(state.code_store.verify_and_consume(&code));
    }

    #[tokio::test]
    async fn authorize_with_redirect_carries_code_and_state() {
        let app = router(test_state());
        let request = http::Request::builder()
            .uri("/api/oauth/authorize?redirect_uri=https%3A%2F%2Fclient.example%2Fcb&state=s1")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://client.example/cb?"));
        assert!(location.contains("code="));
        assert!(location.contains("state=s1"));
    }

    #[tokio::test]
    async fn discovery_names_the_endpoints() {
        let app = router(test_state());
        let request = http::Request::builder()
            .uri("/.well-known/oauth-authorization-server")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["token_endpoint"], "/api/oauth/token");
        assert_eq!(
            body["grant_types_supported"],
            json!(["authorization_code", "refresh_token"])
        );
    }

    /// End-to-end: code exchange, then hitting a protected route with the
    /// issued token, then with a corrupted one.
    #[tokio::test]
    async fn issued_token_opens_the_gateway() {
        use crate::auth::{ApiKeySet, Authenticator};
        use crate::gateway::{GatewayState, gateway_guard};
        use crate::rate_limit::RateLimiter;
        use axum::{middleware, routing::get};

        let signer = TokenSigner::new("e2e-secret");
        let oauth_state = Arc::new(OauthState {
            signer: signer.clone(),
            code_store: Arc::new(CodeStore::new()),
        });
        oauth_state.code_store.insert("abc123".to_string());

        let gateway_state = Arc::new(GatewayState::new(
            Authenticator::new(signer, ApiKeySet::default()),
            RateLimiter::new(),
        ));

        let app = router(oauth_state)
            .route("/api/mcp", get(|| async { "forwarded" }))
            .layer(middleware::from_fn_with_state(gateway_state, gateway_guard));

        // Exchange the code. The token endpoint itself is allow-listed, so
        // no Authorization header is needed.
        let exchange = app
            .clone()
            .oneshot(form_request("grant_type=authorization_code&code=abc123"))
            .await
            .unwrap();
        assert_eq!(exchange.status(), StatusCode::OK);
        let access_token = body_json(exchange).await["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        let ok = app
            .clone()
            .oneshot(
                http::Request::builder()
                    .uri("/api/mcp")
                    .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let corrupted = app
            .oneshot(
                http::Request::builder()
                    .uri("/api/mcp")
                    .header(header::AUTHORIZATION, format!("Bearer {access_token}X"))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(corrupted.status(), StatusCode::UNAUTHORIZED);
    }
}
