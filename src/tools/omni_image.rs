//! Omni-Image tools: multimodal image task creation and query.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::emit::MessageSink;
use crate::error::ParameterError;
use crate::media::resolve_value_list;
use crate::params::{
    build_watermark_info, nonempty_str, opt_i64, parse_json_param, parsed_json_field,
    resolve_task_id, str_field, trimmed_str,
};

use super::flow::{
    acquire_client, announce_create, get_and_classify, post_and_classify, scalar_text,
    summarize_create, summarize_query_header, EXPIRY_REMINDER,
};
use super::spec::{ToolContext, ToolSpec};

const CREATE_PATH: &str = "/v1/images/omni-image";

// === Create ===

pub struct OmniImageCreateTool;

#[async_trait]
impl ToolSpec for OmniImageCreateTool {
    fn name(&self) -> &'static str {
        "omni_image_create"
    }

    fn description(&self) -> &'static str {
        "Create a Kling Omni-Image task mixing a prompt with reference images and elements"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Text prompt describing the image to generate"
                },
                "model_name": {
                    "type": "string",
                    "description": "Model to use (defaults to kling-image-o1)"
                },
                "image_list": {
                    "type": "string",
                    "description": "Reference images: an array of base64/data URI/URL strings, or a JSON string"
                },
                "element_list": {
                    "type": "string",
                    "description": "JSON array of custom element references"
                },
                "resolution": {
                    "type": "string",
                    "description": "Output resolution, e.g. 1k or 2k"
                },
                "result_type": {
                    "type": "string",
                    "description": "Result type, e.g. image or series"
                },
                "n": {
                    "type": "integer",
                    "description": "Number of images to generate"
                },
                "series_amount": {
                    "type": "integer",
                    "description": "Number of images in a series result"
                },
                "aspect_ratio": {
                    "type": "string",
                    "description": "Image aspect ratio, e.g. 16:9"
                },
                "watermark": {
                    "type": "string",
                    "description": "Whether the output carries a watermark"
                },
                "callback_url": {
                    "type": "string",
                    "description": "URL notified when the task finishes"
                },
                "external_task_id": {
                    "type": "string",
                    "description": "Caller-side task identifier"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink) {
        info!("starting Omni-Image create");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let Some(prompt) = trimmed_str(params, "prompt") else {
            warn!("Omni-Image create called without a prompt");
            sink.text("❌ A prompt is required");
            return;
        };
        let model_name = str_field(params, "model_name")
            .unwrap_or("kling-image-o1")
            .to_string();

        let payload = match build_create_payload(params, &model_name, &prompt) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("invalid parameter: {e}");
                sink.text(format!("❌ {e}"));
                return;
            }
        };

        announce_create(
            sink,
            "🚀 Starting Omni-Image task...",
            &model_name,
            Some(&prompt),
        );

        let Some(envelope) =
            post_and_classify(&client, CREATE_PATH, &payload, "Creation failed", sink).await
        else {
            return;
        };

        summarize_create(
            sink,
            envelope,
            "✅ Omni-Image task created",
            "💡 Use the omni_image_query tool to fetch the result",
            false,
        );
    }
}

fn build_create_payload(
    params: &Value,
    model_name: &str,
    prompt: &str,
) -> Result<Value, ParameterError> {
    let mut payload = json!({
        "model_name": model_name,
        "prompt": prompt,
    });
    match params.get("image_list") {
        Some(Value::Array(items)) => {
            let entries = resolve_value_list(items, "image")?;
            if !entries.is_empty() {
                payload["image_list"] = json!(entries);
            }
        }
        other => {
            if let Some(v) = parse_json_param(other, "image_list")?.filter(crate::params::json_truthy) {
                payload["image_list"] = v;
            }
        }
    }
    if let Some(v) = parsed_json_field(params, "element_list")? {
        payload["element_list"] = v;
    }
    if let Some(v) = nonempty_str(params, "resolution") {
        payload["resolution"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "result_type") {
        payload["result_type"] = json!(v);
    }
    if let Some(v) = opt_i64(params, "n")? {
        payload["n"] = json!(v);
    }
    if let Some(v) = opt_i64(params, "series_amount")? {
        payload["series_amount"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "aspect_ratio") {
        payload["aspect_ratio"] = json!(v);
    }
    if let Some(v) = build_watermark_info(params.get("watermark")) {
        payload["watermark_info"] = v;
    }
    if let Some(v) = nonempty_str(params, "callback_url") {
        payload["callback_url"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "external_task_id") {
        payload["external_task_id"] = json!(v);
    }
    Ok(payload)
}

// === Query ===

pub struct OmniImageQueryTool;

#[async_trait]
impl ToolSpec for OmniImageQueryTool {
    fn name(&self) -> &'static str {
        "omni_image_query"
    }

    fn description(&self) -> &'static str {
        "Query a Kling Omni-Image task and list the generated images"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "string",
                    "description": "Task identifier returned by omni_image_create"
                },
                "external_task_id": {
                    "type": "string",
                    "description": "Caller-side task identifier, used when task_id is absent"
                }
            }
        })
    }

    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink) {
        info!("starting Omni-Image query");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let task_id = match resolve_task_id(params) {
            Ok(id) => id,
            Err(e) => {
                warn!("{e}");
                sink.text(format!("❌ {e}"));
                return;
            }
        };

        sink.text("🔍 Querying Omni-Image task...");
        sink.text(format!("📋 task_id: {task_id}"));

        let path = format!("{CREATE_PATH}/{task_id}");
        let Some(envelope) = get_and_classify(&client, &path, "Query failed", sink).await else {
            return;
        };

        let data = envelope.get("data").cloned().unwrap_or_else(|| json!({}));
        summarize_query_header(sink, &data);
        emit_image_results(&data, sink);
        sink.json(envelope);
    }
}

fn emit_image_results(data: &Value, sink: &mut dyn MessageSink) {
    let images = result_list(data, "images");
    let series = result_list(data, "series_images");

    if !images.is_empty() {
        sink.text("🖼️ Generated images:");
        for item in &images {
            emit_image_line(item, sink);
        }
    }
    if !series.is_empty() {
        sink.text("🖼️ Series results:");
        for item in &series {
            emit_image_line(item, sink);
        }
    }
    if !images.is_empty() || !series.is_empty() {
        sink.text(EXPIRY_REMINDER);
    }
}

fn result_list(data: &Value, field: &str) -> Vec<Value> {
    data.get("task_result")
        .and_then(|tr| tr.get(field))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn emit_image_line(item: &Value, sink: &mut dyn MessageSink) {
    let index = scalar_text(item.get("index")).unwrap_or_else(|| "?".to_string());
    let url = item.get("url").and_then(Value::as_str).unwrap_or("");
    sink.text(format!("#{index} {url}"));
    if let Some(watermark_url) = item.get("watermark_url").and_then(Value::as_str) {
        sink.text(format!("Watermark URL: {watermark_url}"));
    }
}
