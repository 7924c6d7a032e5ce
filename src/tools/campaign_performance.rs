//! Handler for the `get_campaign_performance` tool.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::json;

use crate::ads::{AdsClient, convert_date_range};
use crate::tools::{ToolContext, ToolHandler, registry::text_result};
use crate::types::CustomerId;

/// Queries campaign-level performance metrics for an account.
pub struct CampaignPerformanceHandler {
    ads: Arc<dyn AdsClient>,
}

impl CampaignPerformanceHandler {
    pub fn new(ads: Arc<dyn AdsClient>) -> Self {
        Self { ads }
    }
}

impl ToolHandler for CampaignPerformanceHandler {
    fn name(&self) -> &str {
        "get_campaign_performance"
    }

    fn title(&self) -> Option<&str> {
        Some("Get Campaign Performance")
    }

    fn description(&self) -> &str {
        "Show campaign performance metrics (impressions, clicks, cost, conversions) \
         for an account over a date range."
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
                "date_range": {
                    "type": "string",
                    "description": "Named range (e.g. LAST_30_DAYS) or LAST_<n>_DAYS.",
                    "default": "LAST_30_DAYS"
                }
            }),
        );
        schema.insert("required".to_string(), json!(["customer_id"]));
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
            let customer_id = CustomerId::new(customer_id);
            let date_range = args
                .get("date_range")
                .and_then(|v| v.as_str())
                .unwrap_or("LAST_30_DAYS");
            let date_clause = convert_date_range(date_range);

            let gaql = format!(
                "SELECT campaign.id, campaign.name, campaign.status, \
                 campaign.advertising_channel_type, metrics.impressions, \
                 metrics.clicks, metrics.cost_micros, metrics.conversions \
                 FROM campaign WHERE {date_clause} \
                 ORDER BY metrics.cost_micros DESC"
            );

            match self.ads.query(&customer_id, &gaql).await {
                Ok(rows) => {
                    let text = serde_json::to_string_pretty(&rows)
                        .unwrap_or_else(|_| "internal serialization error".to_string());
                    Ok(text_result(text, false))
                }
                Err(e) => Ok(text_result(format!("Error: {e}"), true)),
            }
        })
    }
}
