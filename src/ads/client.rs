//! reqwest-based Google Ads REST client.
//!
//! Holds the long-lived platform refresh token from configuration and
//! lazily exchanges it for a short-lived platform access token, refreshed
//! ahead of expiry. This is the gateway's *outbound* credential and is
//! unrelated to the bearer tokens the gateway issues to its own clients.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::debug;

use super::AdsClient;
use crate::config::AdsConfig;
use crate::types::CustomerId;

const API_BASE: &str = "https://googleads.googleapis.com/v19";
const PLATFORM_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh the platform token this long before its stated expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct PlatformToken {
    access_token: String,
    expires_at: Instant,
}

impl PlatformToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// HTTP implementation of [`AdsClient`].
pub struct GoogleAdsHttpClient {
    http: reqwest::Client,
    config: AdsConfig,
    token: RwLock<Option<PlatformToken>>,
}

impl GoogleAdsHttpClient {
    pub fn new(config: AdsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            token: RwLock::new(None),
        }
    }

    /// Return a fresh platform access token, exchanging the refresh token
    /// if the cached one is missing or near expiry.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref()
            && token.is_fresh()
        {
            return Ok(token.access_token.clone());
        }

        let mut slot = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref()
            && token.is_fresh()
        {
            return Ok(token.access_token.clone());
        }

        debug!("refreshing Google Ads platform access token");
        let response = self
            .http
            .post(PLATFORM_TOKEN_URL)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
            ])
            .send()
            .await
            .context("platform token refresh request failed")?;

        if !response.status().is_success() {
            bail!(
                "platform token refresh rejected with status {}",
                response.status()
            );
        }

        #[derive(Deserialize)]
        struct RefreshResponse {
            access_token: String,
            expires_in: u64,
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .context("malformed platform token response")?;

        let access_token = refreshed.access_token.clone();
        *slot = Some(PlatformToken {
            access_token: refreshed.access_token,
            expires_at: Instant::now() + Duration::from_secs(refreshed.expires_in),
        });
        Ok(access_token)
    }

    async fn post_json(&self, url: &str, body: Value) -> Result<Value> {
        let access_token = self.access_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .header("developer-token", &self.config.developer_token)
            .header("login-customer-id", &self.config.login_customer_id)
            .json(&body)
            .send()
            .await
            .context("ads API request failed")?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .context("malformed ads API response")?;

        if !status.is_success() {
            // Surface the platform's own error text verbatim.
            bail!("ads API error ({status}): {payload}");
        }
        Ok(payload)
    }
}

impl AdsClient for GoogleAdsHttpClient {
    fn query<'a>(
        &'a self,
        customer_id: &'a CustomerId,
        gaql: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Value>>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{API_BASE}/customers/{customer_id}/googleAds:search");
            let payload = self.post_json(&url, json!({ "query": gaql })).await?;
            let rows = payload
                .get("results")
                .and_then(|r| r.as_array())
                .cloned()
                .unwrap_or_default();
            Ok(rows)
        })
    }

    fn mutate<'a>(
        &'a self,
        customer_id: &'a CustomerId,
        operations: Vec<Value>,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{API_BASE}/customers/{customer_id}/googleAds:mutate");
            self.post_json(&url, json!({ "mutateOperations": operations }))
                .await
        })
    }
}
