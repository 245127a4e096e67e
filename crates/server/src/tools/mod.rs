//! MCP tool implementations.
//!
//! This module contains all tools exposed by the pjax-mcp server. Each
//! tool is an `*_impl` function over the shared [`Session`](crate::session::Session);
//! the handler only routes.

pub mod cache;
pub mod site;
pub mod worker;

pub use cache::{CacheLookupParams, lookup_impl};
pub use site::{
    SiteClickParams, SiteHistoryParams, SiteOpenParams, click_impl, history_impl, open_impl, state_impl,
};
pub use worker::{WorkerMessageParams, message_impl};

use pjax_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Render `output` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
