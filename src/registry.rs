//! Static registry mapping tool names to Telegram Bot API requests.
//!
//! Each supported operation is described by a [`ToolDescriptor`]: its
//! parameters, the Bot API method it maps to, and how those parameters are
//! carried on the wire. The table is immutable and defined at compile time;
//! dispatch is a plain table lookup.

use serde_json::{json, Value};

use crate::error::ExtensionError;

/// HTTP verb used for a tool's API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// How the declared parameters are carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// JSON object body (POST).
    Json,
    /// URL query string (GET).
    Query,
    /// Multipart form with a file part read from a local path.
    /// `param` names the path argument, `part` the form field it becomes.
    Multipart {
        param: &'static str,
        part: &'static str,
    },
}

/// Immutable description of one tool and the API call it maps to.
#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Telegram Bot API method name (`sendMessage`, `getUpdates`, ...).
    pub api_method: &'static str,
    pub http_method: HttpMethod,
    pub encoding: BodyEncoding,
    pub required_params: &'static [&'static str],
    pub optional_params: &'static [&'static str],
}

/// Parameters that must coerce to integers before dispatch.
pub const INTEGER_PARAMS: &[&str] = &["message_id", "offset", "timeout"];

/// The full tool table. Order matches the README matrix.
pub const TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "send_message",
        description: "Send a text message to a chat.",
        api_method: "sendMessage",
        http_method: HttpMethod::Post,
        encoding: BodyEncoding::Json,
        required_params: &["chat_id", "text"],
        optional_params: &[],
    },
    ToolDescriptor {
        name: "read",
        description: "Long-poll for new text messages, optionally filtered by chat.",
        api_method: "getUpdates",
        http_method: HttpMethod::Post,
        encoding: BodyEncoding::Json,
        required_params: &["timeout"],
        optional_params: &["chat_id", "offset"],
    },
    ToolDescriptor {
        name: "get_me",
        description: "Fetch information about the bot itself.",
        api_method: "getMe",
        http_method: HttpMethod::Get,
        encoding: BodyEncoding::Query,
        required_params: &[],
        optional_params: &[],
    },
    ToolDescriptor {
        name: "get_chat",
        description: "Fetch information about a chat.",
        api_method: "getChat",
        http_method: HttpMethod::Get,
        encoding: BodyEncoding::Query,
        required_params: &["chat_id"],
        optional_params: &[],
    },
    ToolDescriptor {
        name: "edit_message_text",
        description: "Edit the text of an existing message.",
        api_method: "editMessageText",
        http_method: HttpMethod::Post,
        encoding: BodyEncoding::Json,
        required_params: &["chat_id", "message_id", "text"],
        optional_params: &[],
    },
    ToolDescriptor {
        name: "delete_message",
        description: "Delete a message from a chat.",
        api_method: "deleteMessage",
        http_method: HttpMethod::Post,
        encoding: BodyEncoding::Json,
        required_params: &["chat_id", "message_id"],
        optional_params: &[],
    },
    ToolDescriptor {
        name: "send_photo",
        description: "Upload a local photo to a chat.",
        api_method: "sendPhoto",
        http_method: HttpMethod::Post,
        encoding: BodyEncoding::Multipart {
            param: "photo_path",
            part: "photo",
        },
        required_params: &["chat_id", "photo_path"],
        optional_params: &["caption"],
    },
    ToolDescriptor {
        name: "send_document",
        description: "Upload a local file to a chat as a document.",
        api_method: "sendDocument",
        http_method: HttpMethod::Post,
        encoding: BodyEncoding::Multipart {
            param: "document_path",
            part: "document",
        },
        required_params: &["chat_id", "document_path"],
        optional_params: &["caption"],
    },
    ToolDescriptor {
        name: "get_chat_administrators",
        description: "List the administrators of a chat.",
        api_method: "getChatAdministrators",
        http_method: HttpMethod::Get,
        encoding: BodyEncoding::Query,
        required_params: &["chat_id"],
        optional_params: &[],
    },
    ToolDescriptor {
        name: "answer_callback_query",
        description: "Answer an inline keyboard callback query.",
        api_method: "answerCallbackQuery",
        http_method: HttpMethod::Post,
        encoding: BodyEncoding::Json,
        required_params: &["callback_query_id"],
        optional_params: &["text"],
    },
];

/// Look up a tool by name.
pub fn lookup(name: &str) -> Result<&'static ToolDescriptor, ExtensionError> {
    TOOLS
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ExtensionError::UnknownTool(name.to_string()))
}

impl ToolDescriptor {
    /// JSON-schema-shaped parameter listing for the `tools` subcommand.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in self
            .required_params
            .iter()
            .chain(self.optional_params.iter())
        {
            let ty = if INTEGER_PARAMS.contains(param) {
                "integer"
            } else {
                "string"
            };
            properties.insert((*param).to_string(), json!({ "type": ty }));
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_params,
        })
    }
}
