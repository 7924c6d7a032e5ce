//! Handler for the `update_campaign_status` tool.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::json;

use crate::ads::AdsClient;
use crate::tools::{ToolContext, ToolHandler, registry::text_result};
use crate::types::CustomerId;

const VALID_STATUSES: &[&str] = &["ENABLED", "PAUSED", "REMOVED"];

/// Pauses, enables, or removes a campaign via a mutate operation.
pub struct UpdateCampaignStatusHandler {
    ads: Arc<dyn AdsClient>,
}

impl UpdateCampaignStatusHandler {
    pub fn new(ads: Arc<dyn AdsClient>) -> Self {
        Self { ads }
    }
}

impl ToolHandler for UpdateCampaignStatusHandler {
    fn name(&self) -> &str {
        "update_campaign_status"
    }

    fn title(&self) -> Option<&str> {
        Some("Update Campaign Status")
    }

    fn description(&self) -> &str {
        "Set a campaign's status to ENABLED, PAUSED or REMOVED."
    }

    fn input_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert(
            "properties".to_string(),
            json!({
                "customer_id": {
                    "type": "string",
                    "description": "Ads customer ID (digits only, no dashes)."
                },
                "campaign_id": {
                    "type": "string",
                    "description": "Numeric campaign ID."
                },
                "status": {
                    "type": "string",
                    "enum": VALID_STATUSES,
                    "description": "New campaign status."
                }
            }),
        );
        schema.insert(
            "required".to_string(),
            json!(["customer_id", "campaign_id", "status"]),
        );
        schema
    }

    fn execute(
        &self,
        args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CallToolResult>> + Send + '_>> {
        Box::pin(async move {
            let Some(customer_id) = args.get("customer_id").and_then(|v| v.as_str()) else {
                return Ok(text_result("customer_id is required", true));
            };
            let Some(campaign_id) = args.get("campaign_id").and_then(|v| v.as_str()) else {
                return Ok(text_result("campaign_id is required", true));
            };
            let Some(status) = args.get("status").and_then(|v| v.as_str()) else {
                return Ok(text_result("status is required", true));
            };
            if !VALID_STATUSES.contains(&status) {
                return Ok(text_result(
                    format!("status must be one of {VALID_STATUSES:?}"),
                    true,
                ));
            }

            let customer_id = CustomerId::new(customer_id);
            let operation = json!({
                "campaignOperation": {
                    "update": {
                        "resourceName": format!(
                            "customers/{customer_id}/campaigns/{campaign_id}"
                        ),
                        "status": status,
                    },
                    "updateMask": "status",
                }
            });

            match self.ads.mutate(&customer_id, vec![operation]).await {
                Ok(result) => {
                    let text = serde_json::to_string_pretty(&result)
                        .unwrap_or_else(|_| "internal serialization error".to_string());
                    Ok(text_result(text, false))
                }
                Err(e) => Ok(text_result(format!("Error: {e}"), true)),
            }
        })
    }
}
