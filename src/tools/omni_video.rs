//! Omni-Video multimodal video task creation.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::emit::MessageSink;
use crate::error::ParameterError;
use crate::media::resolve_value_list;
use crate::params::{
    build_watermark_info, json_truthy, nonempty_str, parse_json_param, parsed_json_field,
    str_field, string_bool_flag, stringified, trimmed_str,
};

use super::flow::{acquire_client, announce_create, post_and_classify, summarize_create};
use super::spec::{ToolContext, ToolSpec};

const CREATE_PATH: &str = "/v1/videos/omni-video";

pub struct OmniVideoCreateTool;

#[async_trait]
impl ToolSpec for OmniVideoCreateTool {
    fn name(&self) -> &'static str {
        "omni_video_create"
    }

    fn description(&self) -> &'static str {
        "Create a Kling Omni-Video task mixing prompts, reference images, videos, and elements"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Optional text prompt describing the video"
                },
                "model_name": {
                    "type": "string",
                    "description": "Model to use (defaults to kling-video-o1)"
                },
                "multi_shot": {
                    "type": "string",
                    "description": "Enable multi-shot generation when set to 'true'"
                },
                "shot_type": {
                    "type": "string",
                    "description": "Shot type for multi-shot generation"
                },
                "multi_prompt": {
                    "type": "string",
                    "description": "JSON array of per-shot prompts"
                },
                "image_list": {
                    "type": "string",
                    "description": "Reference images: an array of base64/data URI/URL strings, or a JSON string"
                },
                "element_list": {
                    "type": "string",
                    "description": "JSON array of custom element references"
                },
                "video_list": {
                    "type": "string",
                    "description": "JSON array of reference videos"
                },
                "sound": {
                    "type": "string",
                    "description": "Sound generation switch"
                },
                "mode": {
                    "type": "string",
                    "description": "Generation mode, e.g. std or pro"
                },
                "aspect_ratio": {
                    "type": "string",
                    "description": "Frame aspect ratio, e.g. 16:9"
                },
                "duration": {
                    "type": "string",
                    "description": "Video duration in seconds"
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
            }
        })
    }

    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink) {
        info!("starting Omni-Video create");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let model_name = str_field(params, "model_name")
            .unwrap_or("kling-video-o1")
            .to_string();
        let prompt = trimmed_str(params, "prompt");

        let payload = match build_create_payload(params, &model_name, prompt.as_deref()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("invalid parameter: {e}");
                sink.text(format!("❌ {e}"));
                return;
            }
        };

        announce_create(
            sink,
            "🚀 Starting Omni-Video task...",
            &model_name,
            prompt.as_deref(),
        );

        let Some(envelope) =
            post_and_classify(&client, CREATE_PATH, &payload, "Creation failed", sink).await
        else {
            return;
        };

        summarize_create(
            sink,
            envelope,
            "✅ Omni-Video task created",
            "💡 Use the Omni-Video query tool to fetch the result",
            true,
        );
    }
}

fn build_create_payload(
    params: &Value,
    model_name: &str,
    prompt: Option<&str>,
) -> Result<Value, ParameterError> {
    let mut payload = json!({ "model_name": model_name });
    if let Some(prompt) = prompt {
        payload["prompt"] = json!(prompt);
    }
    if let Some(flag) = string_bool_flag(params, "multi_shot") {
        payload["multi_shot"] = json!(flag);
    }
    if let Some(v) = nonempty_str(params, "shot_type") {
        payload["shot_type"] = json!(v);
    }
    if let Some(v) = parsed_json_field(params, "multi_prompt")? {
        payload["multi_prompt"] = v;
    }
    match params.get("image_list") {
        Some(Value::Array(items)) => {
            let entries = resolve_value_list(items, "image_url")?;
            if !entries.is_empty() {
                payload["image_list"] = json!(entries);
            }
        }
        other => {
            if let Some(v) = parse_json_param(other, "image_list")?.filter(json_truthy) {
                payload["image_list"] = v;
            }
        }
    }
    if let Some(v) = parsed_json_field(params, "element_list")? {
        payload["element_list"] = v;
    }
    if let Some(v) = parsed_json_field(params, "video_list")? {
        payload["video_list"] = v;
    }
    if let Some(v) = nonempty_str(params, "sound") {
        payload["sound"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "mode") {
        payload["mode"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "aspect_ratio") {
        payload["aspect_ratio"] = json!(v);
    }
    if let Some(v) = stringified(params, "duration") {
        payload["duration"] = json!(v);
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
