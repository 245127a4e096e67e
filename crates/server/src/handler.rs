//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::session::Session;
use crate::tools::{
    CacheLookupParams, SiteClickParams, SiteHistoryParams, SiteOpenParams, WorkerMessageParams, click_impl,
    history_impl, lookup_impl, message_impl, open_impl, state_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for pjax-mcp.
#[derive(Clone)]
pub struct PjaxServer {
    session: Arc<Session>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PjaxServer {
    /// Create a new server handler over `session`.
    pub fn new(session: Arc<Session>) -> Self {
        Self { session, tool_router: Self::tool_router() }
    }

    /// Load a document from the site as a full page.
    #[tool(description = "Load a page of the site as a full document. Resets history and rebinds page behaviour.")]
    async fn site_open(&self, params: Parameters<SiteOpenParams>) -> Result<CallToolResult, McpError> {
        open_impl(&self.session, params.0).await
    }

    /// Click a link on the current page.
    ///
    /// Same-origin links are fetched and swapped in without a full load;
    /// failures fall back to a full document load.
    #[tool(
        description = "Click a link (by href or element id) on the current page. Returns the navigation outcome and the resulting page state."
    )]
    async fn site_click(&self, params: Parameters<SiteClickParams>) -> Result<CallToolResult, McpError> {
        click_impl(&self.session, params.0).await
    }

    #[tool(description = "Step back or forward through session history.")]
    async fn site_history(&self, params: Parameters<SiteHistoryParams>) -> Result<CallToolResult, McpError> {
        history_impl(&self.session, params.0).await
    }

    #[tool(description = "Report the current page state and the worker registration.")]
    async fn site_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.session).await
    }

    /// Post a control message to the worker.
    #[tool(description = "Post a control message (SKIP_WAITING or CLEAR_CACHE) to the worker registration.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.session, params.0).await
    }

    /// Look up a cached response.
    #[tool(description = "Retrieve the cached response for a GET request, optionally from a named store.")]
    async fn cache_lookup(&self, params: Parameters<CacheLookupParams>) -> Result<CallToolResult, McpError> {
        lookup_impl(&self.session, params.0).await
    }
}

impl ServerHandler for PjaxServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pjax-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let server = PjaxServer::new(Arc::new(testing::session().await));
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["cache_lookup", "site_click", "site_history", "site_open", "site_state", "worker_message"]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = PjaxServer::new(Arc::new(testing::session().await));
        assert_eq!(server.get_info().server_info.name, "pjax-mcp");
    }
}
