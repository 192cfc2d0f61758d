//! Error taxonomy for tool dispatch and the CLI surface.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while handling one tool invocation.
///
/// Each invocation fails independently; none of these are fatal to the
/// process, and none are retried.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// No bot token in the environment or the `.env` file.
    #[error("TELEGRAM_BOT_TOKEN is not set (environment variable or .env file)")]
    MissingToken,

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A parameter is missing, empty, or of the wrong type. Raised before
    /// any network call is made.
    #[error("invalid parameter '{param}': {reason}")]
    Validation {
        param: &'static str,
        reason: String,
    },

    /// A media upload path does not resolve to a readable file.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Telegram reported a failure (non-2xx status or an `ok: false`
    /// envelope). Carries the upstream error code and description.
    #[error("Telegram API error ({code}): {description}")]
    Api { code: i64, description: String },

    /// Network-level failure before a response could be decoded.
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExtensionError {
    /// Stable machine-readable kind, used in the structured failure shape.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Validation { .. } => "validation",
            Self::FileNotFound(_) => "file_not_found",
            Self::Api { .. } => "api",
            Self::Transport(_) => "transport",
            Self::Io(_) => "io",
        }
    }

    /// JSON failure object printed to stderr by the CLI.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}
