//! Text-to-video tools: task creation and task query with optional download.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::KlingClient;
use crate::emit::MessageSink;
use crate::error::ParameterError;
use crate::params::{
    build_watermark_info, nonempty_str, opt_f64, parsed_json_field, resolve_task_id, str_field,
    string_bool_flag, stringified, trimmed_str,
};

use super::flow::{
    acquire_client, announce_create, get_and_classify, post_and_classify, scalar_text,
    summarize_create, summarize_query_header, EXPIRY_REMINDER,
};
use super::spec::{ToolContext, ToolSpec};

const CREATE_PATH: &str = "/v1/videos/text2video";

// === Create ===

pub struct Text2VideoCreateTool;

#[async_trait]
impl ToolSpec for Text2VideoCreateTool {
    fn name(&self) -> &'static str {
        "text2video_create"
    }

    fn description(&self) -> &'static str {
        "Create a Kling text-to-video generation task and return its task metadata"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Text prompt describing the video to generate"
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
                "aspect_ratio": {
                    "type": "string",
                    "description": "Frame aspect ratio, e.g. 16:9"
                },
                "duration": {
                    "type": "string",
                    "description": "Video duration in seconds, e.g. 5 or 10"
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
        info!("starting text-to-video create");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let Some(prompt) = trimmed_str(params, "prompt") else {
            warn!("text-to-video create called without a prompt");
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
            "🚀 Starting text-to-video task...",
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
            "✅ Text-to-video task created",
            "💡 Use the text2video_query tool to fetch the result",
            false,
        );
    }
}

/// Assemble the creation payload, including only fields the caller supplied.
fn build_create_payload(
    params: &Value,
    model_name: &str,
    prompt: &str,
) -> Result<Value, ParameterError> {
    let mut payload = json!({
        "model_name": model_name,
        "prompt": prompt,
    });
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

// === Query ===

pub struct Text2VideoQueryTool;

#[async_trait]
impl ToolSpec for Text2VideoQueryTool {
    fn name(&self) -> &'static str {
        "text2video_query"
    }

    fn description(&self) -> &'static str {
        "Query a Kling text-to-video task and optionally download the generated video"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "string",
                    "description": "Task identifier returned by text2video_create"
                },
                "external_task_id": {
                    "type": "string",
                    "description": "Caller-side task identifier, used when task_id is absent"
                },
                "download_video": {
                    "type": "string",
                    "description": "Download generated videos as file output when set to 'true'"
                }
            }
        })
    }

    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink) {
        info!("starting text-to-video query");
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
        let download = download_flag(params);

        sink.text("🔍 Querying text-to-video task...");
        sink.text(format!("📋 task_id: {task_id}"));
        if download {
            sink.text("⬇️ Download option enabled");
        }

        let path = format!("{CREATE_PATH}/{task_id}");
        let Some(envelope) = get_and_classify(&client, &path, "Query failed", sink).await else {
            return;
        };

        let data = envelope.get("data").cloned().unwrap_or_else(|| json!({}));
        summarize_query_header(sink, &data);
        emit_video_results(&client, &data, &task_id, download, sink).await;
        sink.json(envelope);
    }
}

/// Accepts the boolean `true` or any casing of the string `"true"`, the two
/// shapes hosts actually send for this flag.
pub(super) fn download_flag(params: &Value) -> bool {
    match params.get("download_video") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.to_lowercase() == "true",
        _ => false,
    }
}

/// Render the `task_result.videos` list and optionally fetch each file.
pub(super) async fn emit_video_results(
    client: &KlingClient,
    data: &Value,
    task_id: &str,
    download: bool,
    sink: &mut dyn MessageSink,
) {
    let videos = data
        .pointer("/task_result/videos")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if videos.is_empty() {
        return;
    }

    sink.text("🎬 Generated videos:");
    for (idx, video) in videos.iter().enumerate() {
        let idx = idx + 1;
        let duration = scalar_text(video.get("duration")).unwrap_or_else(|| "?".to_string());
        sink.text(format!("#{idx} duration: {duration}s"));
        if let Some(url) = video.get("url").and_then(Value::as_str) {
            sink.text(format!("URL: {url}"));
            if download {
                download_video(client, url, task_id, idx, sink).await;
            }
        }
        if let Some(watermark_url) = video.get("watermark_url").and_then(Value::as_str) {
            sink.text(format!("Watermark URL: {watermark_url}"));
        }
    }
    sink.text(EXPIRY_REMINDER);
}

/// A failed download is reported but never aborts the query output.
async fn download_video(
    client: &KlingClient,
    url: &str,
    task_id: &str,
    idx: usize,
    sink: &mut dyn MessageSink,
) {
    sink.text("⬇️ Downloading video file...");
    match client.download(url).await {
        Ok(result) if result.status == 200 => {
            sink.blob("video/mp4", format!("{task_id}_{idx}.mp4"), result.bytes);
            sink.text("✅ Video download complete");
        }
        Ok(result) => {
            warn!(status = result.status, "video download failed");
            sink.text(format!("❌ Video download failed, status: {}", result.status));
        }
        Err(e) => {
            warn!("video download failed: {e}");
            sink.text(format!("❌ Video download failed: {e}"));
        }
    }
}
