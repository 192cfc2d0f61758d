//! Telegram Bot API client for outbound tool requests.
//!
//! Plain HTTPS JSON/multipart calls against
//! `https://api.telegram.org/bot<token>/<method>`. The client holds no
//! state beyond the token and a connection pool; every call is a single
//! attempt with no retry.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use crate::error::ExtensionError;
use crate::types::{ApiEnvelope, ReadMessage, ReadResult};

/// Default Bot API host.
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Request timeout for everything except the `getUpdates` long poll.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Headroom added on top of the caller-supplied long-poll timeout, so the
/// server side always wins the race against our own transport timeout.
const POLL_TIMEOUT_MARGIN_SECS: u64 = 10;

/// Telegram Bot API client.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    api_base: String,
    token: String,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Client against a non-default API host (mock servers in tests).
    pub fn with_api_base(api_base: &str, token: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Build the URL for a Bot API method.
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Strip the bot token out of error text before it can reach logs or
    /// callers. Transport errors embed the full request URL.
    fn sanitize(&self, text: &str) -> String {
        if self.token.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.token, "<token>")
        }
    }

    fn transport_err(&self, err: &reqwest::Error) -> ExtensionError {
        ExtensionError::Transport(self.sanitize(&err.to_string()))
    }

    /// Decode a Bot API response into its `result` payload.
    ///
    /// Non-2xx statuses and `ok: false` envelopes both surface as
    /// [`ExtensionError::Api`] carrying the upstream description.
    async fn decode(&self, resp: reqwest::Response) -> Result<Value, ExtensionError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_err(&e))?;

        let envelope: ApiEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) => {
                // Not a Bot API envelope at all (proxy error page, etc.)
                return Err(ExtensionError::Api {
                    code: i64::from(status.as_u16()),
                    description: self.sanitize(body.trim()),
                });
            }
        };

        if !status.is_success() || !envelope.ok {
            return Err(ExtensionError::Api {
                code: envelope
                    .error_code
                    .unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown Telegram API error".to_string()),
            });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// POST a JSON-bodied method call.
    pub async fn call_json(&self, method: &str, body: &Value) -> Result<Value, ExtensionError> {
        debug!("Telegram {}", method);
        let resp = self
            .http
            .post(self.api_url(method))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_err(&e))?;
        self.decode(resp).await
    }

    /// GET a method call with query parameters.
    pub async fn call_get(
        &self,
        method: &str,
        query: &[(String, String)],
    ) -> Result<Value, ExtensionError> {
        debug!("Telegram {}", method);
        let resp = self
            .http
            .get(self.api_url(method))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_err(&e))?;
        self.decode(resp).await
    }

    /// POST a multipart form (photo and document uploads).
    pub async fn call_multipart(&self, method: &str, form: Form) -> Result<Value, ExtensionError> {
        debug!("Telegram {} (multipart)", method);
        let resp = self
            .http
            .post(self.api_url(method))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_err(&e))?;
        self.decode(resp).await
    }

    /// Read a local file into a named multipart part.
    ///
    /// Fails with [`ExtensionError::FileNotFound`] before any network call
    /// when the path does not resolve to a readable file.
    pub async fn file_part(path: &Path) -> Result<Part, ExtensionError> {
        if !path.is_file() {
            return Err(ExtensionError::FileNotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        Ok(Part::bytes(bytes).file_name(file_name))
    }

    /// One long-poll `getUpdates` pass, filtered down to text messages.
    ///
    /// Takes `message` or `edited_message` from each update, keeps only
    /// those with text, and optionally only those from `chat_id`. The
    /// returned offset is one past the last update seen, whether or not it
    /// survived the filter; tracking it across calls is the caller's job.
    pub async fn read_updates(
        &self,
        timeout_secs: u64,
        offset: i64,
        chat_id: Option<&str>,
    ) -> Result<ReadResult, ExtensionError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
        });

        debug!("Telegram getUpdates (timeout {}s)", timeout_secs);
        let resp = self
            .http
            .post(self.api_url("getUpdates"))
            .timeout(Duration::from_secs(
                timeout_secs + POLL_TIMEOUT_MARGIN_SECS,
            ))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_err(&e))?;
        let result = self.decode(resp).await?;

        let mut messages = Vec::new();
        let mut next_offset = offset;
        if let Some(updates) = result.as_array() {
            for update in updates {
                let Some(update_id) = update.get("update_id").and_then(Value::as_i64) else {
                    continue;
                };
                next_offset = update_id + 1;

                let Some(message) = update
                    .get("message")
                    .or_else(|| update.get("edited_message"))
                else {
                    continue;
                };
                let Some(text) = message.get("text").and_then(Value::as_str) else {
                    continue;
                };
                let Some(message_chat_id) = message
                    .get("chat")
                    .and_then(|chat| chat.get("id"))
                    .and_then(Value::as_i64)
                else {
                    continue;
                };
                if let Some(filter) = chat_id {
                    if filter != message_chat_id.to_string() {
                        continue;
                    }
                }

                messages.push(ReadMessage {
                    update_id,
                    chat_id: message_chat_id,
                    text: text.to_string(),
                });
            }
        }

        debug!("getUpdates returned {} text message(s)", messages.len());
        Ok(ReadResult {
            messages,
            offset: next_offset,
        })
    }
}
