//! Image generation task creation.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::emit::MessageSink;
use crate::error::ParameterError;
use crate::media::resolve_media_param;
use crate::params::{
    build_watermark_info, json_truthy, nonempty_str, opt_i64, str_field, trimmed_str,
};

use super::flow::{acquire_client, announce_create, post_and_classify, summarize_create};
use super::spec::{ToolContext, ToolSpec};

const CREATE_PATH: &str = "/v1/images/generations";

pub struct ImageGenerationCreateTool;

#[async_trait]
impl ToolSpec for ImageGenerationCreateTool {
    fn name(&self) -> &'static str {
        "image_generation_create"
    }

    fn description(&self) -> &'static str {
        "Create a Kling image generation task from a text prompt and optional reference image"
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
                    "description": "Model to use (defaults to kling-v1)"
                },
                "negative_prompt": {
                    "type": "string",
                    "description": "What the image should avoid"
                },
                "image": {
                    "type": "string",
                    "description": "Reference image: base64, data URI, or URL"
                },
                "element_list": {
                    "type": "string",
                    "description": "Custom element references, passed through as supplied"
                },
                "resolution": {
                    "type": "string",
                    "description": "Output resolution, e.g. 1k or 2k"
                },
                "n": {
                    "type": "integer",
                    "description": "Number of images to generate"
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
        info!("starting image generation create");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let Some(prompt) = trimmed_str(params, "prompt") else {
            warn!("image generation create called without a prompt");
            sink.text("❌ A prompt is required");
            return;
        };
        let model_name = str_field(params, "model_name")
            .unwrap_or("kling-v1")
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
            "🚀 Starting image generation task...",
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
            "✅ Image generation task created",
            "💡 Use the image query tool to fetch the result",
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
    if let Some(v) = nonempty_str(params, "negative_prompt") {
        payload["negative_prompt"] = json!(v);
    }
    if let Some(v) = resolve_media_param(params, "image")? {
        payload["image"] = json!(v);
    }
    // element_list is forwarded exactly as supplied; the endpoint accepts
    // either a JSON array or a pre-serialized string here.
    if let Some(v) = params.get("element_list").filter(|v| json_truthy(v)) {
        payload["element_list"] = v.clone();
    }
    if let Some(v) = nonempty_str(params, "resolution") {
        payload["resolution"] = json!(v);
    }
    if let Some(v) = opt_i64(params, "n")? {
        payload["n"] = json!(v);
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_payload_has_model_and_prompt() {
        let payload = build_create_payload(&json!({}), "kling-v1", "a cat").unwrap();
        assert_eq!(payload, json!({"model_name": "kling-v1", "prompt": "a cat"}));
    }

    #[test]
    fn element_list_passes_through_unparsed() {
        let params = json!({"element_list": "[{\"id\": 1}]", "n": "2"});
        let payload = build_create_payload(&params, "kling-v1", "a cat").unwrap();
        assert_eq!(payload["element_list"], json!("[{\"id\": 1}]"));
        assert_eq!(payload["n"], json!(2));
    }

    #[test]
    fn reference_image_data_uri_is_unwrapped() {
        let params = json!({"image": "data:image/png;base64,QUJD"});
        let payload = build_create_payload(&params, "kling-v1", "a cat").unwrap();
        assert_eq!(payload["image"], json!("QUJD"));
    }
}
