//! Shared types for tool invocations and Telegram payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named tool call from the CLI host. Created per invocation and
/// discarded after the call completes.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool_name: String,
    /// Keyword arguments as a JSON object.
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Decoded Telegram Bot API response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A text message extracted from a `getUpdates` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMessage {
    pub update_id: i64,
    pub chat_id: i64,
    pub text: String,
}

/// Result of a `read` invocation: filtered messages plus the offset the
/// caller should pass on its next call. The extension itself keeps no
/// cross-call state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResult {
    pub messages: Vec<ReadMessage>,
    pub offset: i64,
}
