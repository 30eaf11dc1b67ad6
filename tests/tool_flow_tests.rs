//! End-to-end tool invocations against a mock Kling API.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kling_tools::config::Credentials;
use kling_tools::emit::{text_lines, ToolMessage};
use kling_tools::tools::{ToolContext, ToolRegistry};

async fn invoke(base_url: &str, tool: &str, params: Value) -> Vec<ToolMessage> {
    let registry = ToolRegistry::with_defaults();
    let tool = registry.get(tool).expect("tool registered");
    let context = ToolContext::new(Credentials::new("ak", "sk")).with_base_url(base_url);
    let mut messages: Vec<ToolMessage> = Vec::new();
    tool.invoke(&context, &params, &mut messages).await;
    messages
}

fn json_messages(messages: &[ToolMessage]) -> Vec<&Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            ToolMessage::Json(v) => Some(v),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn text2video_create_happy_path_message_order() {
    let server = MockServer::start().await;
    let envelope = json!({
        "code": 0,
        "message": "SUCCEED",
        "data": {"task_id": "t1", "task_status": "submitted"}
    });
    Mock::given(method("POST"))
        .and(path("/v1/videos/text2video"))
        .and(body_json(json!({"model_name": "kling-v1", "prompt": "a fox in the snow"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let messages = invoke(
        &server.uri(),
        "text2video_create",
        json!({"prompt": "a fox in the snow"}),
    )
    .await;

    assert_eq!(
        text_lines(&messages),
        vec![
            "🚀 Starting text-to-video task...",
            "🤖 Model: kling-v1",
            "📝 Prompt: a fox in the snow",
            "⏳ Connecting to the Kling AI API...",
            "✅ Text-to-video task created",
            "📋 task_id: t1",
            "📊 task_status: submitted",
            "💡 Use the text2video_query tool to fetch the result",
        ]
    );
    assert_eq!(json_messages(&messages), vec![&envelope]);
}

#[tokio::test]
async fn create_without_prompt_fails_before_any_request() {
    // Nothing listens here; the tool must not reach the network.
    let messages = invoke("http://127.0.0.1:1", "text2video_create", json!({})).await;
    assert_eq!(text_lines(&messages), vec!["❌ A prompt is required"]);
    assert!(json_messages(&messages).is_empty());
}

#[tokio::test]
async fn rejected_envelope_is_reported_and_echoed() {
    let server = MockServer::start().await;
    let envelope = json!({"code": 1102, "message": "Account balance not enough", "data": null});
    Mock::given(method("POST"))
        .and(path("/v1/videos/text2video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope.clone()))
        .mount(&server)
        .await;

    let messages = invoke(&server.uri(), "text2video_create", json!({"prompt": "p"})).await;

    let lines = text_lines(&messages);
    assert_eq!(
        lines.last(),
        Some(&"❌ Creation failed: Account balance not enough")
    );
    assert_eq!(json_messages(&messages), vec![&envelope]);
}

#[tokio::test]
async fn query_http_500_reports_status_without_structured_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/videos/text2video/t1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let messages = invoke(&server.uri(), "text2video_query", json!({"task_id": "t1"})).await;

    assert_eq!(
        text_lines(&messages),
        vec![
            "🔍 Querying text-to-video task...",
            "📋 task_id: t1",
            "❌ API response status: 500",
        ]
    );
    assert!(json_messages(&messages).is_empty());
}

#[tokio::test]
async fn query_with_download_emits_video_blob() {
    let server = MockServer::start().await;
    let video_url = format!("{}/files/clip.mp4", server.uri());
    let envelope = json!({
        "code": 0,
        "message": "SUCCEED",
        "data": {
            "task_id": "t1",
            "task_status": "succeed",
            "created_at": 1_700_000_000_000_i64,
            "updated_at": 1_700_000_060_000_i64,
            "task_result": {
                "videos": [{"id": "v1", "url": video_url, "duration": "5"}]
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/v1/videos/text2video/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MP4DATA".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let messages = invoke(
        &server.uri(),
        "text2video_query",
        json!({"task_id": "t1", "download_video": "true"}),
    )
    .await;

    let lines = text_lines(&messages);
    assert!(lines.contains(&"⬇️ Download option enabled"));
    assert!(lines.contains(&"#1 duration: 5s"));
    assert!(lines.contains(&"✅ Video download complete"));
    assert!(lines
        .iter()
        .any(|l| l.starts_with("⚠️ Generated media is cleaned up after 30 days")));

    let blob = messages
        .iter()
        .find_map(|m| match m {
            ToolMessage::Blob {
                mime_type,
                filename,
                bytes,
            } => Some((mime_type.clone(), filename.clone(), bytes.clone())),
            _ => None,
        })
        .expect("blob emitted");
    assert_eq!(blob.0, "video/mp4");
    assert_eq!(blob.1, "t1_1.mp4");
    assert_eq!(blob.2, b"MP4DATA");
    assert_eq!(json_messages(&messages), vec![&envelope]);
}

#[tokio::test]
async fn failed_download_does_not_abort_the_query() {
    let server = MockServer::start().await;
    let video_url = format!("{}/files/missing.mp4", server.uri());
    let envelope = json!({
        "code": 0,
        "data": {
            "task_id": "t1",
            "task_status": "succeed",
            "task_result": {"videos": [{"url": video_url, "duration": 5}]}
        }
    });
    Mock::given(method("GET"))
        .and(path("/v1/videos/text2video/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/missing.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let messages = invoke(
        &server.uri(),
        "text2video_query",
        json!({"task_id": "t1", "download_video": true}),
    )
    .await;

    let lines = text_lines(&messages);
    assert!(lines.contains(&"❌ Video download failed, status: 404"));
    // The envelope is still echoed after the failed download.
    assert_eq!(json_messages(&messages), vec![&envelope]);
}

#[tokio::test]
async fn image2video_requires_a_frame_image() {
    let messages = invoke(
        "http://127.0.0.1:1",
        "image2video_create",
        json!({"prompt": "pan left"}),
    )
    .await;
    assert_eq!(
        text_lines(&messages),
        vec!["❌ Provide a first frame image or a last frame image_tail"]
    );
}

#[tokio::test]
async fn image2video_sends_resolved_frames() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/videos/image2video"))
        .and(body_json(json!({
            "model_name": "kling-v1",
            "image": "QUJD",
            "prompt": "pan left"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"code": 0, "data": {"task_id": "t2", "task_status": "submitted"}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let messages = invoke(
        &server.uri(),
        "image2video_create",
        json!({"image": "data:image/png;base64,QUJD", "prompt": "pan left"}),
    )
    .await;

    let lines = text_lines(&messages);
    assert!(lines.contains(&"✅ Image-to-video task created"));
    assert!(lines.contains(&"📋 task_id: t2"));
}

#[tokio::test]
async fn omni_video_create_echoes_created_at() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/videos/omni-video"))
        .and(body_json(json!({"model_name": "kling-video-o1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"task_id": "t3", "task_status": "submitted", "created_at": 1_700_000_000_000_i64}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = invoke(&server.uri(), "omni_video_create", json!({})).await;

    let lines = text_lines(&messages);
    assert!(lines.contains(&"✅ Omni-Video task created"));
    assert!(lines.contains(&"🕒 Created: 1700000000000"));
}

#[tokio::test]
async fn element_delete_round_trip() {
    let server = MockServer::start().await;
    let envelope = json!({"code": 0, "message": "SUCCEED", "data": {}});
    Mock::given(method("POST"))
        .and(path("/v1/general/delete-elements"))
        .and(body_json(json!({"element_id": "e9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let messages = invoke(&server.uri(), "element_delete", json!({"element_id": " e9 "})).await;

    assert_eq!(
        text_lines(&messages),
        vec![
            "🚀 Starting element delete task...",
            "🧩 element_id: e9",
            "✅ Element delete task submitted",
        ]
    );
    assert_eq!(json_messages(&messages), vec![&envelope]);
}

#[tokio::test]
async fn element_query_renders_detail_lines() {
    let server = MockServer::start().await;
    let envelope = json!({
        "code": 0,
        "data": {
            "task_status": "succeed",
            "task_result": {
                "elements": [{
                    "element_id": "e9",
                    "element_name": "hero",
                    "element_description": "main character",
                    "reference_type": "image",
                    "status": "active"
                }]
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/v1/general/advanced-custom-elements/t9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope.clone()))
        .mount(&server)
        .await;

    let messages = invoke(&server.uri(), "element_query", json!({"task_id": "t9"})).await;

    let lines = text_lines(&messages);
    assert!(lines.contains(&"🧩 element_id: e9"));
    assert!(lines.contains(&"🏷️ Element name: hero"));
    assert!(lines.contains(&"📝 Element description: main character"));
    assert!(lines.contains(&"🔧 Reference type: image"));
    assert!(lines.contains(&"✅ Element status: active"));
    assert_eq!(json_messages(&messages), vec![&envelope]);
}

#[tokio::test]
async fn query_without_task_id_fails_before_any_request() {
    let messages = invoke("http://127.0.0.1:1", "omni_image_query", json!({})).await;
    assert_eq!(
        text_lines(&messages),
        vec!["❌ Provide task_id or external_task_id"]
    );
}

#[tokio::test]
async fn external_task_id_is_used_when_task_id_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/images/omni-image/ext-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"code": 0, "data": {"task_status": "processing"}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let messages = invoke(
        &server.uri(),
        "omni_image_query",
        json!({"external_task_id": "ext-7"}),
    )
    .await;

    let lines = text_lines(&messages);
    assert!(lines.contains(&"📋 task_id: ext-7"));
    assert!(lines.contains(&"📊 task_status: processing"));
}

#[tokio::test]
async fn non_json_body_is_a_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let messages = invoke(
        &server.uri(),
        "image_generation_create",
        json!({"prompt": "a cat"}),
    )
    .await;

    assert_eq!(
        text_lines(&messages).last(),
        Some(&"❌ Failed to parse API response (non-JSON)")
    );
    assert!(json_messages(&messages).is_empty());
}
