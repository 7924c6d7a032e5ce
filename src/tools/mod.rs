//! MCP tool handlers for the advertising platform.
//!
//! The handlers are thin translation glue over the [`crate::ads`]
//! boundary: build a GAQL string or a mutate operation, call the platform,
//! reshape the response. Adding a tool means implementing `ToolHandler`
//! and registering it; the server core never changes.

pub(crate) mod registry;

pub use registry::{ToolContext, ToolHandler, ToolRegistry};

mod campaign_performance;
mod list_accounts;
mod update_campaign_status;

pub use campaign_performance::CampaignPerformanceHandler;
pub use list_accounts::ListAccountsHandler;
pub use update_campaign_status::UpdateCampaignStatusHandler;
