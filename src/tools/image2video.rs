//! Image-to-video task creation.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::emit::MessageSink;
use crate::error::ParameterError;
use crate::media::resolve_media_param;
use crate::params::{
    build_watermark_info, nonempty_str, opt_f64, parsed_json_field, str_field, string_bool_flag,
    stringified, trimmed_str,
};

use super::flow::{acquire_client, announce_create, post_and_classify, summarize_create};
use super::spec::{ToolContext, ToolSpec};

const CREATE_PATH: &str = "/v1/videos/image2video";

pub struct Image2VideoCreateTool;

#[async_trait]
impl ToolSpec for Image2VideoCreateTool {
    fn name(&self) -> &'static str {
        "image2video_create"
    }

    fn description(&self) -> &'static str {
        "Create a Kling image-to-video generation task from a first and/or last frame image"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image": {
                    "type": "string",
                    "description": "First frame image: base64, data URI, or URL"
                },
                "image_tail": {
                    "type": "string",
                    "description": "Last frame image: base64, data URI, or URL"
                },
                "prompt": {
                    "type": "string",
                    "description": "Optional text prompt guiding the motion"
                },
                "model_name": {
                    "type": "string",
                    "description": "Model to use (defaults to kling-v1)"
                },
                "negative_prompt": {
                    "type": "string",
                    "description": "What the video should avoid"
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
                "element_list": {
                    "type": "string",
                    "description": "JSON array of custom element references"
                },
                "voice_list": {
                    "type": "string",
                    "description": "JSON array of voice configurations"
                },
                "sound": {
                    "type": "string",
                    "description": "Sound generation switch"
                },
                "cfg_scale": {
                    "type": "number",
                    "description": "Prompt adherence, 0 to 1"
                },
                "mode": {
                    "type": "string",
                    "description": "Generation mode, e.g. std or pro"
                },
                "duration": {
                    "type": "string",
                    "description": "Video duration in seconds"
                },
                "aspect_ratio": {
                    "type": "string",
                    "description": "Frame aspect ratio, e.g. 16:9"
                },
                "static_mask": {
                    "type": "string",
                    "description": "Static brush mask image"
                },
                "dynamic_masks": {
                    "type": "string",
                    "description": "JSON array of dynamic brush masks with trajectories"
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
        info!("starting image-to-video create");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let (image, image_tail) = match resolve_frames(params) {
            Ok(frames) => frames,
            Err(e) => {
                warn!("invalid media parameter: {e}");
                sink.text(format!("❌ {e}"));
                return;
            }
        };
        if image.is_none() && image_tail.is_none() {
            warn!("image-to-video create called without any frame image");
            sink.text("❌ Provide a first frame image or a last frame image_tail");
            return;
        }

        let model_name = str_field(params, "model_name")
            .unwrap_or("kling-v1")
            .to_string();
        let prompt = trimmed_str(params, "prompt");

        let payload =
            match build_create_payload(params, &model_name, image.as_deref(), image_tail.as_deref())
            {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("invalid parameter: {e}");
                    sink.text(format!("❌ {e}"));
                    return;
                }
            };

        announce_create(
            sink,
            "🚀 Starting image-to-video task...",
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
            "✅ Image-to-video task created",
            "💡 Use the video query tool to fetch the result",
            false,
        );
    }
}

fn resolve_frames(params: &Value) -> Result<(Option<String>, Option<String>), ParameterError> {
    let image = resolve_media_param(params, "image")?;
    let image_tail = resolve_media_param(params, "image_tail")?;
    Ok((image, image_tail))
}

fn build_create_payload(
    params: &Value,
    model_name: &str,
    image: Option<&str>,
    image_tail: Option<&str>,
) -> Result<Value, ParameterError> {
    let mut payload = json!({ "model_name": model_name });
    if let Some(image) = image {
        payload["image"] = json!(image);
    }
    if let Some(image_tail) = image_tail {
        payload["image_tail"] = json!(image_tail);
    }
    if let Some(v) = trimmed_str(params, "prompt") {
        payload["prompt"] = json!(v);
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
    if let Some(v) = nonempty_str(params, "negative_prompt") {
        payload["negative_prompt"] = json!(v);
    }
    if let Some(v) = parsed_json_field(params, "element_list")? {
        payload["element_list"] = v;
    }
    if let Some(v) = parsed_json_field(params, "voice_list")? {
        payload["voice_list"] = v;
    }
    if let Some(v) = nonempty_str(params, "sound") {
        payload["sound"] = json!(v);
    }
    if let Some(v) = opt_f64(params, "cfg_scale")? {
        payload["cfg_scale"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "mode") {
        payload["mode"] = json!(v);
    }
    if let Some(v) = stringified(params, "duration") {
        payload["duration"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "aspect_ratio") {
        payload["aspect_ratio"] = json!(v);
    }
    if let Some(v) = resolve_media_param(params, "static_mask")? {
        payload["static_mask"] = json!(v);
    }
    if let Some(v) = parsed_json_field(params, "dynamic_masks")? {
        payload["dynamic_masks"] = v;
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
