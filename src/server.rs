//! MCP server implementation using rmcp, plus HTTP assembly.
//!
//! The MCP endpoint is served over streamable HTTP at `/api/mcp`, behind
//! the gateway middleware. The OAuth routes and discovery document sit on
//! the same router but on the middleware allow-list.

use std::sync::Arc;

use anyhow::Result;
use axum::{Json, Router, middleware, routing::get};
use http::StatusCode;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::ads::{AdsClient, GoogleAdsHttpClient};
use crate::auth::CodeStore;
use crate::config::{AdsConfig, GatewayConfig};
use crate::gateway::{GatewayState, gateway_guard};
use crate::oauth::{self, OauthState};
use crate::rate_limit::RateLimiter;
use crate::tools::{
    CampaignPerformanceHandler, ListAccountsHandler, ToolContext, ToolRegistry,
    UpdateCampaignStatusHandler,
};
use crate::types::CustomerId;

/// MCP server that handles protocol requests and delegates to tool
/// handlers.
#[derive(Clone)]
pub struct McpServer {
    tool_registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(tool_registry: Arc<ToolRegistry>) -> Self {
        Self { tool_registry }
    }

    fn capabilities() -> ServerCapabilities {
        ServerCapabilities::builder().enable_tools().build()
    }

    fn instructions() -> String {
        "Ads MCP gateway exposing advertising-account tools: list accounts, \
         query campaign performance, and mutate campaign state. \
         Authenticate with a Bearer token from the OAuth flow or an API key."
            .to_string()
    }
}

impl ServerHandler for McpServer {
    fn ping(
        &self,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<(), McpError>> + Send + '_ {
        std::future::ready(Ok(()))
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let result = ListToolsResult {
            tools: self.tool_registry.list_tools(),
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();
        let registry = self.tool_registry.clone();

        async move {
            let ctx = ToolContext {
                request_context: Some(context),
            };
            match registry.call_tool(&tool_name, args, &ctx).await {
                Ok(result) => Ok(result),
                Err(e) => Err(McpError::internal_error(
                    format!("Tool execution failed: {}", e),
                    None,
                )),
            }
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: Self::capabilities(),
            server_info: Implementation::from_build_env(),
            instructions: Some(Self::instructions()),
        }
    }
}

/// Build the tool registry over a live ads client.
pub fn build_registry(ads_client: Arc<dyn AdsClient>, login_customer_id: CustomerId) -> ToolRegistry {
    ToolRegistry::new()
        .register_handler(ListAccountsHandler::new(
            ads_client.clone(),
            login_customer_id,
        ))
        .register_handler(CampaignPerformanceHandler::new(ads_client.clone()))
        .register_handler(UpdateCampaignStatusHandler::new(ads_client))
}

/// Assemble the full application router: MCP endpoint, OAuth routes,
/// root/fallback, and the gateway layer over all of it.
pub fn app_router(gateway_config: &GatewayConfig, registry: Arc<ToolRegistry>) -> Router {
    let authenticator = gateway_config.authenticator();
    let signer = authenticator.signer().clone();

    let gateway_state = Arc::new(GatewayState::new(authenticator, RateLimiter::new()));
    let oauth_state = Arc::new(OauthState {
        signer,
        code_store: Arc::new(CodeStore::new()),
    });

    let mcp_service = StreamableHttpService::new(
        {
            let registry = registry.clone();
            move || Ok(McpServer::new(registry.clone()))
        },
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/", get(root))
        .nest_service("/api/mcp", mcp_service)
        .merge(oauth::router(oauth_state))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(gateway_state, gateway_guard)),
        )
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "ads-mcp-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "mcp_endpoint": "/api/mcp",
        "token_endpoint": "/api/oauth/token",
    }))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" })))
}

/// Bind and serve the gateway.
pub async fn start_http(
    bind: &str,
    gateway_config: GatewayConfig,
    ads_config: AdsConfig,
) -> Result<()> {
    if gateway_config.auth_secret.is_empty() {
        warn!("AUTH_SECRET is empty: signed-token auth will reject everything");
    }

    let login_customer_id = CustomerId::new(ads_config.login_customer_id.clone());
    let ads_client: Arc<dyn AdsClient> = Arc::new(GoogleAdsHttpClient::new(ads_config));
    let registry = Arc::new(build_registry(ads_client, login_customer_id));

    let router = app_router(&gateway_config, registry);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("ads MCP gateway listening on http://{}", bind);
    axum::serve(listener, router).await?;
    Ok(())
}
