//! Custom element tools: create, delete, and query advanced custom elements.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::emit::MessageSink;
use crate::error::ParameterError;
use crate::media::{resolve_media_param, resolve_value_list};
use crate::params::{nonempty_str, parsed_json_field, resolve_task_id, trimmed_str};

use super::flow::{
    acquire_client, get_and_classify, post_and_classify, scalar_text, summarize_create,
    summarize_query_header,
};
use super::spec::{ToolContext, ToolSpec};

const ELEMENT_PATH: &str = "/v1/general/advanced-custom-elements";
const DELETE_PATH: &str = "/v1/general/delete-elements";

// === Create ===

pub struct ElementCreateTool;

#[async_trait]
impl ToolSpec for ElementCreateTool {
    fn name(&self) -> &'static str {
        "element_create"
    }

    fn description(&self) -> &'static str {
        "Create a Kling custom element from reference images, videos, or a voice"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "element_name": {
                    "type": "string",
                    "description": "Name of the custom element"
                },
                "element_description": {
                    "type": "string",
                    "description": "Description of the custom element"
                },
                "reference_type": {
                    "type": "string",
                    "description": "Reference type, e.g. image, video, or voice"
                },
                "element_image_list": {
                    "type": "string",
                    "description": "JSON object with frontal_image and refer_images entries"
                },
                "element_frontal_image": {
                    "type": "string",
                    "description": "Frontal reference image: base64, data URI, or URL (overrides element_image_list)"
                },
                "element_refer_images": {
                    "type": "array",
                    "description": "Additional reference images (overrides element_image_list)"
                },
                "element_video_list": {
                    "type": "string",
                    "description": "JSON array of reference videos"
                },
                "element_voice_id": {
                    "type": "string",
                    "description": "Voice identifier for voice elements"
                },
                "tag_list": {
                    "type": "string",
                    "description": "JSON array of tags"
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
            "required": ["element_name", "element_description", "reference_type"]
        })
    }

    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink) {
        info!("starting element create");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let name = trimmed_str(params, "element_name");
        let description = trimmed_str(params, "element_description");
        let reference_type = trimmed_str(params, "reference_type");
        let (Some(name), Some(description), Some(reference_type)) =
            (name, description, reference_type)
        else {
            warn!("element create called without name, description, or reference type");
            sink.text("❌ element_name, element_description and reference_type are required");
            return;
        };

        let payload = match build_create_payload(params, &name, &description, &reference_type) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("invalid parameter: {e}");
                sink.text(format!("❌ {e}"));
                return;
            }
        };

        sink.text("🚀 Starting element create task...");
        sink.text(format!("🏷️ Element name: {name}"));
        sink.text("⏳ Connecting to the Kling AI API...");

        let Some(envelope) =
            post_and_classify(&client, ELEMENT_PATH, &payload, "Creation failed", sink).await
        else {
            return;
        };

        summarize_create(
            sink,
            envelope,
            "✅ Element create task submitted",
            "💡 Use the element_query tool to fetch the result",
            false,
        );
    }
}

fn build_create_payload(
    params: &Value,
    name: &str,
    description: &str,
    reference_type: &str,
) -> Result<Value, ParameterError> {
    let mut payload = json!({
        "element_name": name,
        "element_description": description,
        "reference_type": reference_type,
    });
    if let Some(v) = parsed_json_field(params, "element_image_list")? {
        payload["element_image_list"] = v;
    }

    // Directly supplied reference images take precedence over a pre-built
    // element_image_list.
    let frontal = resolve_media_param(params, "element_frontal_image")?;
    let refer_images = match params.get("element_refer_images").and_then(Value::as_array) {
        Some(items) => resolve_value_list(items, "image_url")?,
        None => Vec::new(),
    };
    if frontal.is_some() || !refer_images.is_empty() {
        let mut image_list = json!({});
        if let Some(frontal) = frontal {
            image_list["frontal_image"] = json!(frontal);
        }
        if !refer_images.is_empty() {
            image_list["refer_images"] = json!(refer_images);
        }
        payload["element_image_list"] = image_list;
    }

    if let Some(v) = parsed_json_field(params, "element_video_list")? {
        payload["element_video_list"] = v;
    }
    if let Some(v) = nonempty_str(params, "element_voice_id") {
        payload["element_voice_id"] = json!(v);
    }
    if let Some(v) = parsed_json_field(params, "tag_list")? {
        payload["tag_list"] = v;
    }
    if let Some(v) = nonempty_str(params, "callback_url") {
        payload["callback_url"] = json!(v);
    }
    if let Some(v) = nonempty_str(params, "external_task_id") {
        payload["external_task_id"] = json!(v);
    }
    Ok(payload)
}

// === Delete ===

pub struct ElementDeleteTool;

#[async_trait]
impl ToolSpec for ElementDeleteTool {
    fn name(&self) -> &'static str {
        "element_delete"
    }

    fn description(&self) -> &'static str {
        "Delete a Kling custom element by its element id"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "element_id": {
                    "type": "string",
                    "description": "Identifier of the element to delete"
                }
            },
            "required": ["element_id"]
        })
    }

    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink) {
        info!("starting element delete");
        let Some(client) = acquire_client(context, sink) else {
            return;
        };

        let Some(element_id) = trimmed_str(params, "element_id") else {
            warn!("element delete called without an element id");
            sink.text("❌ element_id is required");
            return;
        };

        sink.text("🚀 Starting element delete task...");
        sink.text(format!("🧩 element_id: {element_id}"));

        let payload = json!({ "element_id": element_id });
        let Some(envelope) =
            post_and_classify(&client, DELETE_PATH, &payload, "Deletion failed", sink).await
        else {
            return;
        };

        sink.text("✅ Element delete task submitted");
        sink.json(envelope);
    }
}

// === Query ===

pub struct ElementQueryTool;

#[async_trait]
impl ToolSpec for ElementQueryTool {
    fn name(&self) -> &'static str {
        "element_query"
    }

    fn description(&self) -> &'static str {
        "Query a Kling custom element task and show the element detail"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "string",
                    "description": "Task identifier returned by element_create"
                },
                "external_task_id": {
                    "type": "string",
                    "description": "Caller-side task identifier, used when task_id is absent"
                }
            }
        })
    }

    async fn invoke(&self, context: &ToolContext, params: &Value, sink: &mut dyn MessageSink) {
        info!("starting element query");
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

        sink.text("🔍 Querying element task...");
        sink.text(format!("📋 task_id: {task_id}"));

        let path = format!("{ELEMENT_PATH}/{task_id}");
        let Some(envelope) = get_and_classify(&client, &path, "Query failed", sink).await else {
            return;
        };

        let data = envelope.get("data").cloned().unwrap_or_else(|| json!({}));
        summarize_query_header(sink, &data);
        emit_element_detail(&data, sink);
        sink.json(envelope);
    }
}

/// Element detail may live in `task_result.elements[0]`, in `task_result`
/// itself, or directly on `data` depending on task age and status.
fn emit_element_detail(data: &Value, sink: &mut dyn MessageSink) {
    let task_result = data.get("task_result");
    let source = match task_result {
        Some(tr @ Value::Object(_)) => tr
            .get("elements")
            .and_then(Value::as_array)
            .and_then(|elements| elements.first())
            .unwrap_or(tr),
        _ => data,
    };
    if !source.is_object() {
        sink.text("ℹ️ No element detail in the response");
        return;
    }

    let mut emitted = false;
    let mut line = |sink: &mut dyn MessageSink, label: &str, value: Option<String>| {
        if let Some(value) = value {
            sink.text(format!("{label}{value}"));
            emitted = true;
        }
    };

    line(sink, "🧩 element_id: ", scalar_text(source.get("element_id")));
    line(sink, "🏷️ Element name: ", scalar_text(source.get("element_name")));
    line(
        sink,
        "📝 Element description: ",
        scalar_text(source.get("element_description")),
    );
    line(
        sink,
        "🔧 Reference type: ",
        scalar_text(source.get("reference_type"))
            .or_else(|| scalar_text(source.get("element_type"))),
    );
    line(sink, "✅ Element status: ", scalar_text(source.get("status")));
    line(sink, "👤 Owned by: ", scalar_text(source.get("owned_by")));

    if !emitted {
        sink.text("ℹ️ No element detail in the response");
    }
}
