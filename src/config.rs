//! Process-wide configuration, loaded from the environment at startup.

use std::env;

use anyhow::{Context, Result};

use crate::auth::{ApiKeySet, Authenticator, TokenSigner};

/// Realm named in `WWW-Authenticate` challenges.
pub const REALM: &str = "Ads MCP";

/// Gateway credentials and policy knobs.
///
/// `auth_secret` signs bearer tokens; if empty, signed-token verification
/// fails closed and only static API keys (if any) can authenticate.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// HMAC secret for signed tokens (`AUTH_SECRET`).
    pub auth_secret: String,
    /// Comma-separated static API keys (`MCP_API_KEYS`).
    pub api_keys: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            auth_secret: env::var("AUTH_SECRET").unwrap_or_default(),
            api_keys: env::var("MCP_API_KEYS").unwrap_or_default(),
        }
    }

    /// Build the authenticator both the middleware and the token endpoint
    /// share.
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(
            TokenSigner::new(self.auth_secret.clone()),
            ApiKeySet::from_delimited(&self.api_keys),
        )
    }
}

/// Google Ads API credentials for the tool-execution collaborator.
#[derive(Debug, Clone)]
pub struct AdsConfig {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// MCC (manager) account the API calls log in through.
    pub login_customer_id: String,
}

impl AdsConfig {
    /// Load from `GOOGLE_ADS_*` environment variables. All are required
    /// because every tool call needs the full credential set.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            developer_token: require("GOOGLE_ADS_DEVELOPER_TOKEN")?,
            client_id: require("GOOGLE_ADS_CLIENT_ID")?,
            client_secret: require("GOOGLE_ADS_CLIENT_SECRET")?,
            refresh_token: require("GOOGLE_ADS_REFRESH_TOKEN")?,
            login_customer_id: require("GOOGLE_ADS_LOGIN_CUSTOMER_ID")?,
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing required environment variable {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticator_from_empty_config_rejects_everything() {
        let config = GatewayConfig::default();
        let auth = config.authenticator();
        assert!(!auth.validate_bearer(Some("Bearer anything")));
        let token = auth.signer().issue(60);
        assert!(!auth.validate_bearer(Some(&format!("Bearer {token}"))));
    }

    #[test]
    fn authenticator_uses_configured_keys() {
        let config = GatewayConfig {
            auth_secret: "s3cret".to_string(),
            api_keys: "ops-key".to_string(),
        };
        let auth = config.authenticator();
        assert!(auth.validate_bearer(Some("Bearer ops-key")));
        let token = auth.signer().issue(60);
        assert!(auth.validate_bearer(Some(&format!("Bearer {token}"))));
    }
}
