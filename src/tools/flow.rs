//! Shared invocation flow for the Kling tools.
//!
//! Every create tool follows the same arc: acquire a client, validate and
//! assemble a sparse payload, announce the launch, POST, classify the raw
//! response, summarize. Every query tool mirrors it with a GET. The
//! tool-specific pieces (payload fields, detail rendering) stay in the tool
//! files; everything else lives here so the message contract is uniform.

use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::client::{KlingClient, RawResponse};
use crate::emit::MessageSink;
use crate::error::TransportError;
use crate::params::format_timestamp;
use crate::utils::truncate_chars;

use super::spec::ToolContext;

/// Prompt preview length in launch announcements.
pub const PROMPT_PREVIEW_CHARS: usize = 80;
/// Response body clip length in error messages.
const BODY_CLIP_CHARS: usize = 500;
/// Reminder appended after any listing of generated media.
pub const EXPIRY_REMINDER: &str =
    "⚠️ Generated media is cleaned up after 30 days, save it promptly";

/// Build the per-invocation client, reporting credential failures to the
/// sink. Returns `None` when the invocation must end.
pub fn acquire_client(context: &ToolContext, sink: &mut dyn MessageSink) -> Option<KlingClient> {
    match KlingClient::new(&context.credentials, &context.base_url) {
        Ok(client) => Some(client),
        Err(e) => {
            error!("credential setup failed: {e}");
            sink.text(format!("❌ Failed to obtain credentials: {e}"));
            None
        }
    }
}

/// Standard launch banner for create tools: task line, model line, optional
/// prompt preview, connecting line.
pub fn announce_create(
    sink: &mut dyn MessageSink,
    launch: &str,
    model_name: &str,
    prompt: Option<&str>,
) {
    sink.text(launch);
    sink.text(format!("🤖 Model: {model_name}"));
    if let Some(prompt) = prompt {
        sink.text(format!(
            "📝 Prompt: {}",
            crate::utils::preview(prompt, PROMPT_PREVIEW_CHARS)
        ));
    }
    sink.text("⏳ Connecting to the Kling AI API...");
}

/// POST a payload and classify the response into an accepted envelope.
pub async fn post_and_classify(
    client: &KlingClient,
    path: &str,
    payload: &Value,
    fail_prefix: &str,
    sink: &mut dyn MessageSink,
) -> Option<Value> {
    info!(path, "submitting task payload");
    classify(client.post(path, payload).await, fail_prefix, sink)
}

/// GET a path and classify the response into an accepted envelope.
pub async fn get_and_classify(
    client: &KlingClient,
    path: &str,
    fail_prefix: &str,
    sink: &mut dyn MessageSink,
) -> Option<Value> {
    info!(path, "querying task");
    classify(client.get(path).await, fail_prefix, sink)
}

/// Turn a raw HTTP outcome into an accepted vendor envelope, emitting the
/// appropriate error messages when it is anything else.
///
/// Terminal outcomes, in checking order: transport failure, non-200 status,
/// non-JSON body, envelope code other than zero (the code may arrive as a
/// number or a string). A rejected envelope is still echoed as JSON so the
/// caller sees the vendor's full answer.
fn classify(
    result: Result<RawResponse, TransportError>,
    fail_prefix: &str,
    sink: &mut dyn MessageSink,
) -> Option<Value> {
    let response = match result {
        Ok(response) => response,
        Err(TransportError::Timeout) => {
            warn!("request timed out");
            sink.text("❌ Request timed out, please retry later");
            return None;
        }
        Err(e) => {
            warn!("request failed: {e}");
            sink.text(format!("❌ Request failed: {e}"));
            return None;
        }
    };

    if response.status != 200 {
        warn!(status = response.status, "unexpected API status");
        sink.text(format!("❌ API response status: {}", response.status));
        if !response.body.is_empty() {
            sink.text(format!(
                "🔧 Response body: {}",
                truncate_chars(&response.body, BODY_CLIP_CHARS)
            ));
        }
        return None;
    }

    let envelope: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) => {
            warn!("API returned a non-JSON body");
            sink.text("❌ Failed to parse API response (non-JSON)");
            return None;
        }
    };

    let code_ok = match envelope.get("code") {
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        Some(Value::String(s)) => s == "0",
        _ => false,
    };
    if !code_ok {
        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        warn!("API rejected the request: {message}");
        sink.text(format!("❌ {fail_prefix}: {message}"));
        sink.json(envelope);
        return None;
    }

    Some(envelope)
}

/// Standard create summary: created notice, task id, task status, optional
/// raw `created_at` echo, follow-up hint, then the full envelope as JSON.
pub fn summarize_create(
    sink: &mut dyn MessageSink,
    envelope: Value,
    created_notice: &str,
    hint: &str,
    echo_created_at: bool,
) {
    let data = envelope.get("data").cloned().unwrap_or_else(|| json!({}));
    sink.text(created_notice);
    if let Some(task_id) = scalar_text(data.get("task_id")) {
        sink.text(format!("📋 task_id: {task_id}"));
    }
    if let Some(task_status) = scalar_text(data.get("task_status")) {
        sink.text(format!("📊 task_status: {task_status}"));
    }
    if echo_created_at {
        if let Some(created) = scalar_text(data.get("created_at")) {
            sink.text(format!("🕒 Created: {created}"));
        }
    }
    sink.text(hint);
    sink.json(envelope);
}

/// Standard query header: success notice, status, optional vendor status
/// message, created/updated timestamps.
pub fn summarize_query_header(sink: &mut dyn MessageSink, data: &Value) {
    sink.text("✅ Query succeeded");
    sink.text(format!(
        "📊 task_status: {}",
        scalar_text(data.get("task_status")).unwrap_or_else(|| "unknown".to_string())
    ));
    if let Some(note) = scalar_text(data.get("task_status_msg")).filter(|s| !s.is_empty()) {
        sink.text(format!("🧾 Status note: {note}"));
    }
    sink.text(format!(
        "🕒 Created: {}",
        format_timestamp(data.get("created_at"))
    ));
    sink.text(format!(
        "🕒 Updated: {}",
        format_timestamp(data.get("updated_at"))
    ));
}

/// Render a scalar envelope field for display. Objects and arrays are not
/// scalar and render as absent.
#[must_use]
pub fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{text_lines, ToolMessage};
    use pretty_assertions::assert_eq;

    fn classify_raw(status: u16, body: &str) -> (Option<Value>, Vec<ToolMessage>) {
        let mut messages: Vec<ToolMessage> = Vec::new();
        let outcome = classify(
            Ok(RawResponse {
                status,
                body: body.to_string(),
            }),
            "Creation failed",
            &mut messages,
        );
        (outcome, messages)
    }

    #[test]
    fn accepted_envelope_emits_nothing() {
        let (outcome, messages) = classify_raw(200, r#"{"code": 0, "data": {"task_id": "t1"}}"#);
        assert!(outcome.is_some());
        assert!(messages.is_empty());
    }

    #[test]
    fn string_zero_code_is_accepted() {
        let (outcome, messages) = classify_raw(200, r#"{"code": "0", "data": {}}"#);
        assert!(outcome.is_some());
        assert!(messages.is_empty());
    }

    #[test]
    fn non_200_reports_status_and_clipped_body() {
        let long_body = "x".repeat(600);
        let (outcome, messages) = classify_raw(500, &long_body);
        assert!(outcome.is_none());
        let lines = text_lines(&messages);
        assert_eq!(lines[0], "❌ API response status: 500");
        assert_eq!(lines[1].chars().count(), "🔧 Response body: ".chars().count() + 500);
    }

    #[test]
    fn non_200_with_empty_body_reports_only_status() {
        let (outcome, messages) = classify_raw(502, "");
        assert!(outcome.is_none());
        assert_eq!(text_lines(&messages), vec!["❌ API response status: 502"]);
    }

    #[test]
    fn non_json_body_is_terminal() {
        let (outcome, messages) = classify_raw(200, "<html>oops</html>");
        assert!(outcome.is_none());
        assert_eq!(
            text_lines(&messages),
            vec!["❌ Failed to parse API response (non-JSON)"]
        );
    }

    #[test]
    fn rejected_envelope_is_echoed_as_json() {
        let (outcome, messages) =
            classify_raw(200, r#"{"code": 1102, "message": "balance low"}"#);
        assert!(outcome.is_none());
        assert_eq!(
            text_lines(&messages),
            vec!["❌ Creation failed: balance low"]
        );
        assert!(matches!(messages.last(), Some(ToolMessage::Json(_))));
    }

    #[test]
    fn timeout_has_a_dedicated_message() {
        let mut messages: Vec<ToolMessage> = Vec::new();
        let outcome = classify(Err(TransportError::Timeout), "Query failed", &mut messages);
        assert!(outcome.is_none());
        assert_eq!(
            text_lines(&messages),
            vec!["❌ Request timed out, please retry later"]
        );
    }

    #[test]
    fn create_summary_order_is_fixed() {
        let mut messages: Vec<ToolMessage> = Vec::new();
        let sink: &mut dyn MessageSink = &mut messages;
        summarize_create(
            sink,
            json!({"code": 0, "data": {"task_id": "t1", "task_status": "submitted"}}),
            "✅ Task created",
            "💡 Use the query tool to fetch the result",
            false,
        );
        assert_eq!(
            text_lines(&messages),
            vec![
                "✅ Task created",
                "📋 task_id: t1",
                "📊 task_status: submitted",
                "💡 Use the query tool to fetch the result",
            ]
        );
        assert!(matches!(messages.last(), Some(ToolMessage::Json(_))));
    }

    #[test]
    fn create_summary_skips_absent_task_fields() {
        let mut messages: Vec<ToolMessage> = Vec::new();
        let sink: &mut dyn MessageSink = &mut messages;
        summarize_create(sink, json!({"code": 0, "data": {}}), "✅ Task created", "💡 hint", true);
        assert_eq!(text_lines(&messages), vec!["✅ Task created", "💡 hint"]);
    }

    #[test]
    fn query_header_includes_status_note_only_when_present() {
        let mut messages: Vec<ToolMessage> = Vec::new();
        let sink: &mut dyn MessageSink = &mut messages;
        summarize_query_header(
            sink,
            &json!({"task_status": "succeed", "task_status_msg": "done"}),
        );
        let lines = text_lines(&messages);
        assert_eq!(lines[1], "📊 task_status: succeed");
        assert_eq!(lines[2], "🧾 Status note: done");
        assert_eq!(lines[3], "🕒 Created: N/A");
    }
}
