//! Handler for the `list_accounts` tool.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::json;

use crate::ads::AdsClient;
use crate::tools::{ToolContext, ToolHandler, registry::text_result};
use crate::types::CustomerId;

/// Lists the enabled client accounts under the MCC.
pub struct ListAccountsHandler {
    ads: Arc<dyn AdsClient>,
    login_customer_id: CustomerId,
}

impl ListAccountsHandler {
    pub fn new(ads: Arc<dyn AdsClient>, login_customer_id: CustomerId) -> Self {
        Self {
            ads,
            login_customer_id,
        }
    }
}

impl ToolHandler for ListAccountsHandler {
    fn name(&self) -> &str {
        "list_accounts"
    }

    fn title(&self) -> Option<&str> {
        Some("List Ads Accounts")
    }

    fn description(&self) -> &str {
        "List all enabled advertising accounts under the manager (MCC) account."
    }

    fn input_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), json!({}));
        schema.insert("required".to_string(), json!([]));
        schema
    }

    fn execute(
        &self,
        _args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CallToolResult>> + Send + '_>> {
        Box::pin(async move {
            let gaql = "SELECT customer_client.id, customer_client.descriptive_name, \
                        customer_client.status, customer_client.manager, \
                        customer_client.currency_code, customer_client.time_zone \
                        FROM customer_client WHERE customer_client.status = 'ENABLED'";

            match self.ads.query(&self.login_customer_id, gaql).await {
                Ok(rows) => {
                    let accounts: Vec<_> = rows
                        .iter()
                        .map(|row| {
                            let client = &row["customerClient"];
                            json!({
                                "id": client["id"],
                                "name": client["descriptiveName"],
                                "status": client["status"],
                                "isManager": client["manager"],
                                "currency": client["currencyCode"],
                                "timezone": client["timeZone"],
                            })
                        })
                        .collect();
                    let text = serde_json::to_string_pretty(&accounts)
                        .unwrap_or_else(|_| "internal serialization error".to_string());
                    Ok(text_result(text, false))
                }
                Err(e) => Ok(text_result(format!("Error: {e}"), true)),
            }
        })
    }
}
