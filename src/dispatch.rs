//! Validation and dispatch of tool invocations.
//!
//! Each invocation is an independent request/response cycle: look the tool
//! up in the registry, validate and coerce its arguments, then issue exactly
//! one HTTP call. Validation failures never reach the network.

use std::path::PathBuf;

use reqwest::multipart::Form;
use serde_json::{Map, Value};

use crate::error::ExtensionError;
use crate::registry::{self, BodyEncoding, ToolDescriptor, INTEGER_PARAMS};
use crate::telegram::TelegramClient;
use crate::types::ToolInvocation;

/// Dispatch one tool invocation against the Telegram Bot API.
///
/// On success returns the decoded `result` payload unchanged in shape. The
/// one exception is `read`, which returns `{messages, offset}` built from
/// the filtered update batch.
pub async fn dispatch(
    client: &TelegramClient,
    invocation: &ToolInvocation,
) -> Result<Value, ExtensionError> {
    let descriptor = registry::lookup(&invocation.tool_name)?;
    let args = validate(descriptor, &invocation.arguments)?;

    if descriptor.name == "read" {
        return read(client, &args).await;
    }

    match descriptor.encoding {
        BodyEncoding::Query => {
            let query: Vec<(String, String)> = args
                .iter()
                .map(|(key, value)| (key.clone(), query_value(value)))
                .collect();
            client.call_get(descriptor.api_method, &query).await
        }
        BodyEncoding::Multipart { param, part } => {
            send_file(client, descriptor, &args, param, part).await
        }
        BodyEncoding::Json => {
            client
                .call_json(descriptor.api_method, &Value::Object(args))
                .await
        }
    }
}

/// Check required parameters and coerce integer-typed ones.
///
/// Produces a normalized argument map containing only declared parameters;
/// anything else the caller sent is dropped rather than forwarded upstream.
fn validate(
    descriptor: &ToolDescriptor,
    arguments: &Value,
) -> Result<Map<String, Value>, ExtensionError> {
    let Some(given) = arguments.as_object() else {
        return Err(ExtensionError::Validation {
            param: "arguments",
            reason: "expected a JSON object".to_string(),
        });
    };

    let mut args = Map::new();
    for &param in descriptor.required_params {
        let value = given.get(param).filter(|v| !is_empty(v)).ok_or_else(|| {
            ExtensionError::Validation {
                param,
                reason: "required parameter is missing or empty".to_string(),
            }
        })?;
        args.insert(param.to_string(), coerce(param, value)?);
    }
    for &param in descriptor.optional_params {
        if let Some(value) = given.get(param) {
            if !is_empty(value) {
                args.insert(param.to_string(), coerce(param, value)?);
            }
        }
    }
    Ok(args)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Coerce integer parameters from JSON numbers or numeric strings.
fn coerce(param: &'static str, value: &Value) -> Result<Value, ExtensionError> {
    if !INTEGER_PARAMS.contains(&param) {
        return Ok(value.clone());
    }
    match value {
        Value::Number(n) if n.is_i64() => Ok(value.clone()),
        Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| {
            ExtensionError::Validation {
                param,
                reason: format!("expected an integer, got '{s}'"),
            }
        }),
        _ => Err(ExtensionError::Validation {
            param,
            reason: "expected an integer".to_string(),
        }),
    }
}

/// Render a parameter for a URL query string or multipart text field.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn required_i64(args: &Map<String, Value>, param: &'static str) -> Result<i64, ExtensionError> {
    args.get(param)
        .and_then(Value::as_i64)
        .ok_or_else(|| ExtensionError::Validation {
            param,
            reason: "expected an integer".to_string(),
        })
}

/// One long-poll pass over `getUpdates`.
async fn read(
    client: &TelegramClient,
    args: &Map<String, Value>,
) -> Result<Value, ExtensionError> {
    let timeout = required_i64(args, "timeout")?;
    if timeout < 0 {
        return Err(ExtensionError::Validation {
            param: "timeout",
            reason: "must be non-negative".to_string(),
        });
    }
    let offset = args.get("offset").and_then(Value::as_i64).unwrap_or(0);
    let chat_id = args.get("chat_id").map(query_value);

    let result = client
        .read_updates(timeout as u64, offset, chat_id.as_deref())
        .await?;
    Ok(serde_json::to_value(result).unwrap_or(Value::Null))
}

/// Upload a local file as a multipart form, the file read up front so a bad
/// path fails before any network traffic.
async fn send_file(
    client: &TelegramClient,
    descriptor: &ToolDescriptor,
    args: &Map<String, Value>,
    path_param: &'static str,
    part_name: &'static str,
) -> Result<Value, ExtensionError> {
    let path_str = args
        .get(path_param)
        .and_then(Value::as_str)
        .ok_or_else(|| ExtensionError::Validation {
            param: path_param,
            reason: "expected a file path string".to_string(),
        })?;
    let path = PathBuf::from(shellexpand::tilde(path_str).into_owned());
    let file = TelegramClient::file_part(&path).await?;

    let chat_id = args
        .get("chat_id")
        .map(query_value)
        .ok_or_else(|| ExtensionError::Validation {
            param: "chat_id",
            reason: "required parameter is missing or empty".to_string(),
        })?;

    let mut form = Form::new().text("chat_id", chat_id).part(part_name, file);
    if let Some(caption) = args.get("caption").and_then(Value::as_str) {
        form = form.text("caption", caption.to_string());
    }

    client.call_multipart(descriptor.api_method, form).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "123:TEST";

    fn invocation(tool: &str, arguments: Value) -> ToolInvocation {
        ToolInvocation::new(tool, arguments)
    }

    /// Catch-all mock asserting that no HTTP request reaches the server.
    async fn expect_no_requests(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let client = TelegramClient::new(TOKEN);
        let err = dispatch(&client, &invocation("warp_core", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unknown_tool");
    }

    #[tokio::test]
    async fn missing_required_param_issues_no_http_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = expect_no_requests(&mut server).await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let err = dispatch(
            &client,
            &invocation("send_message", json!({"text": "hello"})),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("chat_id"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_required_param_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = expect_no_requests(&mut server).await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let err = dispatch(
            &client,
            &invocation("send_message", json!({"chat_id": "42", "text": "  "})),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("text"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_numeric_message_id_is_rejected_before_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = expect_no_requests(&mut server).await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let err = dispatch(
            &client,
            &invocation(
                "delete_message",
                json!({"chat_id": "42", "message_id": "abc"}),
            ),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("message_id"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn numeric_string_message_id_is_coerced() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:TEST/deleteMessage")
            .match_body(mockito::Matcher::Json(
                json!({"chat_id": "42", "message_id": 7}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": true}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let payload = dispatch(
            &client,
            &invocation(
                "delete_message",
                json!({"chat_id": "42", "message_id": "7"}),
            ),
        )
        .await
        .unwrap();

        assert_eq!(payload, json!(true));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_me_payload_is_relayed_unchanged() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/bot123:TEST/getMe")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "ok": true,
                    "result": {"id": 42, "is_bot": true, "first_name": "TestBot", "username": "testbot"}
                }"#,
            )
            .create_async()
            .await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let payload = dispatch(&client, &invocation("get_me", json!({})))
            .await
            .unwrap();

        assert_eq!(
            payload,
            json!({"id": 42, "is_bot": true, "first_name": "TestBot", "username": "testbot"})
        );
    }

    #[tokio::test]
    async fn get_chat_sends_query_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bot123:TEST/getChat")
            .match_query(mockito::Matcher::UrlEncoded(
                "chat_id".into(),
                "-100200".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": {"id": -100200, "type": "supergroup"}}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let payload = dispatch(&client, &invocation("get_chat", json!({"chat_id": "-100200"})))
            .await
            .unwrap();

        assert_eq!(payload["type"], "supergroup");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_failure_carries_upstream_description() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:TEST/sendMessage")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#,
            )
            .create_async()
            .await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let err = dispatch(
            &client,
            &invocation("send_message", json!({"chat_id": "1", "text": "hi"})),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "api");
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn send_photo_missing_file_fails_before_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = expect_no_requests(&mut server).await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let err = dispatch(
            &client,
            &invocation(
                "send_photo",
                json!({"chat_id": "1", "photo_path": "/nonexistent/cat.jpg"}),
            ),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "file_not_found");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn send_document_uploads_multipart_form() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        std::fs::write(&file_path, b"hello from the test").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:TEST/sendDocument")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": {"message_id": 9}}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let payload = dispatch(
            &client,
            &invocation(
                "send_document",
                json!({
                    "chat_id": "1",
                    "document_path": file_path.to_str().unwrap(),
                    "caption": "test upload"
                }),
            ),
        )
        .await
        .unwrap();

        assert_eq!(payload["message_id"], 9);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn read_returns_messages_and_next_offset() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot123:TEST/getUpdates")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "ok": true,
                    "result": [
                        {"update_id": 100, "message": {"chat": {"id": 7}, "text": "ping"}}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let payload = dispatch(
            &client,
            &invocation("read", json!({"timeout": 0, "chat_id": "7"})),
        )
        .await
        .unwrap();

        assert_eq!(payload["offset"], 101);
        assert_eq!(payload["messages"][0]["text"], "ping");
        assert_eq!(payload["messages"][0]["chat_id"], 7);
    }

    #[tokio::test]
    async fn read_requires_timeout() {
        let mut server = mockito::Server::new_async().await;
        let mock = expect_no_requests(&mut server).await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        let err = dispatch(&client, &invocation("read", json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("timeout"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn undeclared_arguments_are_dropped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:TEST/sendMessage")
            .match_body(mockito::Matcher::Json(
                json!({"chat_id": "1", "text": "hi"}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": {"message_id": 3}}"#)
            .create_async()
            .await;

        let client = TelegramClient::with_api_base(&server.url(), TOKEN);
        dispatch(
            &client,
            &invocation(
                "send_message",
                json!({"chat_id": "1", "text": "hi", "parse_mode": "Markdown"}),
            ),
        )
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn arguments_must_be_an_object() {
        let client = TelegramClient::new(TOKEN);
        let err = dispatch(&client, &invocation("get_me", json!([1, 2])))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}
