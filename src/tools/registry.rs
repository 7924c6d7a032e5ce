//! Tool registry for managing MCP tool handlers.
//!
//! Provides a `ToolHandler` trait for implementing tools and a
//! `ToolRegistry` for registering and invoking them.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use rmcp::RoleServer;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool as McpTool};
use rmcp::service::RequestContext;

/// Context passed to tool handlers during execution.
#[derive(Clone, Default)]
pub struct ToolContext {
    /// Request context from rmcp (for session info, etc.). `None` when a
    /// handler runs outside an MCP session (tests, CLI invocations).
    pub request_context: Option<RequestContext<RoleServer>>,
}

impl ToolContext {
    /// Context for running a handler outside an MCP session.
    pub fn detached() -> Self {
        Self::default()
    }
}

/// Trait for handling MCP tool invocations.
pub trait ToolHandler: Send + Sync {
    /// The tool's name (e.g., "list_accounts").
    fn name(&self) -> &str;

    /// Human-readable title shown by clients.
    fn title(&self) -> Option<&str> {
        None
    }

    /// The tool's description.
    fn description(&self) -> &str;

    /// The input schema for this tool.
    fn input_schema(&self) -> JsonObject;

    /// Execute the tool with the given arguments.
    fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<CallToolResult>> + Send + '_>>;

    /// Converts this handler to an `McpTool` for use in `list_tools`.
    fn to_mcp_tool(&self) -> McpTool {
        use std::borrow::Cow;

        McpTool {
            name: Cow::Owned(self.name().to_string()),
            title: self.title().map(|s| s.to_string()),
            description: Some(Cow::Owned(self.description().to_string())),
            input_schema: Arc::new(self.input_schema()),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }
}

/// Build a text tool result, flagged as an error or not.
///
/// Platform errors are reported inside the tool result (not as protocol
/// errors) so the calling agent can read them.
pub fn text_result(text: impl Into<String>, is_error: bool) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text.into())],
        structured_content: None,
        is_error: Some(is_error),
        meta: None,
    }
}

/// Registry for managing tool handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool handler.
    pub fn register_handler<T: ToolHandler + 'static>(mut self, handler: T) -> Self {
        self.handlers
            .insert(handler.name().to_string(), Arc::new(handler));
        self
    }

    /// Get a tool handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Get all registered tools as `McpTool` instances for `list_tools`.
    pub fn list_tools(&self) -> Vec<McpTool> {
        self.handlers
            .values()
            .map(|handler| handler.to_mcp_tool())
            .collect()
    }

    /// Execute a tool by name with the given arguments.
    pub async fn call_tool(
        &self,
        name: &str,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult> {
        let handler = self
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Tool not found: {}", name))?;
        handler.execute(args, ctx).await
    }

    /// Check if a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
