//! Ads MCP gateway: an MCP server over advertising-account tools, fronted
//! by token issuance, bearer authentication, and per-client rate limiting.

pub mod ads;
pub mod auth;
mod config;
pub mod gateway;
pub mod oauth;
mod rate_limit;
pub mod server;
pub mod tools;
mod types;

// Re-export key types and functions
pub use auth::{ApiKeySet, Authenticator, CodeStore, TokenSigner};
pub use config::{AdsConfig, GatewayConfig, REALM};
pub use rate_limit::{RATE_LIMIT, RATE_WINDOW, RateLimiter};
pub use server::{McpServer, app_router, build_registry, start_http};
pub use types::{ClientKey, CustomerId};
