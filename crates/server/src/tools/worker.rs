//! worker_message tool implementation.
//!
//! Posts a control message to the worker registration, the way a page
//! would after noticing an update or when the visitor asks to reset caches.

use pjax_client::WorkerMessage;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::session::{Session, WorkerSummary};

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message type: "SKIP_WAITING" or "CLEAR_CACHE". Anything else is ignored.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
struct MessageOutput {
    /// Whether the message was recognized and handled.
    handled: bool,
    worker: WorkerSummary,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(session: &Session, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let handled = match WorkerMessage::from_type(&params.kind) {
        Some(message) => {
            session.registration().post_message(message).await?;
            true
        }
        None => false,
    };

    let worker = session.worker_summary().await?;
    json_result(&MessageOutput { handled, worker })
}
