//! Control messages from pages to the worker.

use serde::{Deserialize, Serialize};

/// `{"type": "SKIP_WAITING"}` or `{"type": "CLEAR_CACHE"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate the waiting worker now.
    SkipWaiting,
    /// Delete every store carrying the application prefix.
    ClearCache,
}

impl WorkerMessage {
    /// Parse a message payload. Unknown or malformed payloads are ignored.
    pub fn from_json(payload: &str) -> Option<Self> {
        match serde_json::from_str(payload) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!("ignoring worker message {}: {}", payload, e);
                None
            }
        }
    }

    /// Message for a bare type name such as `SKIP_WAITING`.
    pub fn from_type(kind: &str) -> Option<Self> {
        Self::from_json(&serde_json::json!({ "type": kind }).to_string())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "SKIP_WAITING",
            Self::ClearCache => "CLEAR_CACHE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        assert_eq!(WorkerMessage::from_json(r#"{"type": "SKIP_WAITING"}"#), Some(WorkerMessage::SkipWaiting));
        assert_eq!(WorkerMessage::from_json(r#"{"type": "CLEAR_CACHE"}"#), Some(WorkerMessage::ClearCache));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let message = WorkerMessage::from_json(r#"{"type": "CLEAR_CACHE", "reason": "settings"}"#);
        assert_eq!(message, Some(WorkerMessage::ClearCache));
    }

    #[test]
    fn test_unknown_messages_ignored() {
        assert_eq!(WorkerMessage::from_json(r#"{"type": "RELOAD"}"#), None);
        assert_eq!(WorkerMessage::from_json(r#"{"kind": "SKIP_WAITING"}"#), None);
        assert_eq!(WorkerMessage::from_json("SKIP_WAITING"), None);
    }

    #[test]
    fn test_from_type() {
        assert_eq!(WorkerMessage::from_type("SKIP_WAITING"), Some(WorkerMessage::SkipWaiting));
        assert_eq!(WorkerMessage::from_type("skip_waiting"), None);
        assert_eq!(WorkerMessage::ClearCache.as_str(), "CLEAR_CACHE");
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&WorkerMessage::SkipWaiting).unwrap();
        assert_eq!(json, r#"{"type":"SKIP_WAITING"}"#);
    }
}
