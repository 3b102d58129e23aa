use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use intentlens_core::mocks::{MockResponseCache, Reply, ScriptedInference};
use intentlens_core::traits::Generation;
use intentlens_gateway::{GatewayConfig, GatewayServer, LruResponseCache, MediaPipeline};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "intentlens-test-boundary";

/// Hand-built multipart form body.
#[derive(Default)]
struct Form {
    body: Vec<u8>,
}

impl Form {
    fn new() -> Self {
        Self::default()
    }

    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, file_name: &str, content_type: Option<&str>, data: &[u8]) -> Self {
        let mut head = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
        );
        if let Some(content_type) = content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("\r\n");
        self.body.extend_from_slice(head.as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn into_request(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/api/process")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

fn app_with(client: Arc<ScriptedInference>, config: GatewayConfig) -> Router {
    let pipeline = Arc::new(MediaPipeline::new(client, Arc::new(LruResponseCache::new(64))));
    GatewayServer::new(config, pipeline).build_router()
}

fn app(client: Arc<ScriptedInference>) -> Router {
    app_with(client, GatewayConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn photo(intent: &str) -> Request<Body> {
    Form::new()
        .file("photo.jpg", Some("image/jpeg"), &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
        .text("intent", intent)
        .into_request()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(Arc::new(ScriptedInference::new()));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let client = Arc::new(ScriptedInference::new());
    let app = app(client.clone());

    let (status, body) = send(&app, Form::new().text("intent", "describe").into_request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file uploaded." }));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_missing_file() {
    let client = Arc::new(ScriptedInference::new());
    let app = app(client.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"intent":"describe"}"#))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded.");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_missing_intent_is_rejected() {
    let client = Arc::new(ScriptedInference::new());
    let app = app(client.clone());

    let request = Form::new()
        .file("photo.jpg", Some("image/jpeg"), b"jpeg")
        .into_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Intent is required." }));

    let (status, _) = send(&app, photo("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_pdf_is_unsupported() {
    let client = Arc::new(ScriptedInference::new());
    let app = app(client.clone());

    let request = Form::new()
        .file("report.pdf", Some("application/pdf"), b"%PDF-1.7")
        .text("intent", "summarize")
        .into_request();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Unsupported file type"));
    assert!(error.contains("application/pdf"));
    assert!(body.get("details").is_none());
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_file_without_content_type_is_unsupported() {
    let client = Arc::new(ScriptedInference::new());
    let app = app(client.clone());

    let request = Form::new()
        .file("blob", None, b"1234")
        .text("intent", "describe")
        .into_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("application/octet-stream"));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_two_files_are_rejected() {
    let client = Arc::new(ScriptedInference::new());
    let app = app(client.clone());

    let request = Form::new()
        .file("a.png", Some("image/png"), b"a")
        .file("b.png", Some("image/png"), b"b")
        .text("intent", "describe")
        .into_request();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_summarize_photo_then_repeat_hits_cache() {
    let client = Arc::new(
        ScriptedInference::new()
            .with_media_reply(Reply::text("A red bicycle leaning on a brick wall."))
            .with_text_reply(Reply::text("Validation: ok\nDetailed Analysis: a bicycle"))
            .with_text_reply(Reply::text("A red bike rests against a wall.")),
    );
    let app = app(client.clone());

    let (status, first) = send(&app, photo("summarize")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert_eq!(first["result"], "A red bike rests against a wall.");
    assert_eq!(first["intermediateText"], "A red bicycle leaning on a brick wall.");
    // ceil(32 / 4)
    assert_eq!(first["tokenEstimate"], 8);
    assert!(first["latencyMs"].is_u64());

    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].prompt, "Describe this image in detail.");
    assert_eq!(calls[0].mime_type.as_deref(), Some("image/jpeg"));
    assert!(calls[1].prompt.contains("raw output from a image-to-text model"));
    assert!(calls[2].prompt.contains("User Intent: summarize"));
    assert!(calls[2]
        .prompt
        .contains("Provide a concise summary in 1-2 sentences."));

    let (status, second) = send(&app, photo("summarize")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["result"], first["result"]);
    assert_eq!(second["tokenEstimate"], first["tokenEstimate"]);
    assert_eq!(second["intermediateText"], first["intermediateText"]);
    // Only the reduction ran again.
    assert_eq!(client.text_calls().len(), 2);
    assert_eq!(client.media_calls().len(), 2);
}

#[tokio::test]
async fn test_reported_usage_becomes_token_estimate() {
    let client = Arc::new(
        ScriptedInference::new()
            .with_text_reply(Reply::text("analysis"))
            .with_text_reply(Reply::Ok(Generation::text("answer").with_total_tokens(1234))),
    );
    let app = app(client);

    let (status, body) = send(&app, photo("explain technically")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenEstimate"], 1234);
}

#[tokio::test]
async fn test_audio_uses_transcription() {
    let client = Arc::new(ScriptedInference::new().with_media_reply(Reply::text("hello world")));
    let app = app(client.clone());

    let request = Form::new()
        .file("memo.ogg", Some("audio/ogg"), b"OggS\x00\x02")
        .text("intent", "Simplify for a beginner")
        .into_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intermediateText"], "hello world");

    let calls = client.calls();
    assert_eq!(calls[0].prompt, "Transcribe this audio file exactly as spoken.");
    assert!(calls[1].prompt.contains("audio-to-text"));
    assert!(calls[2].prompt.contains("Use analogies."));
}

#[tokio::test(start_paused = true)]
async fn test_latency_reflects_slow_service() {
    let client = Arc::new(ScriptedInference::new().with_latency(Duration::from_millis(200)));
    let app = app(client);

    let (status, body) = send(&app, photo("describe")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["latencyMs"].as_u64().unwrap() >= 200);
}

#[tokio::test]
async fn test_reduction_failure_is_500_with_details() {
    let client = Arc::new(ScriptedInference::new().with_media_reply(Reply::fail("API key not valid.")));
    let app = app(client.clone());

    let (status, body) = send(&app, photo("describe")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to caption image: API key not valid.");
    assert!(body["details"].is_null());
    assert!(client.text_calls().is_empty());
}

#[tokio::test]
async fn test_reasoning_failure_is_not_cached() {
    let client = Arc::new(ScriptedInference::new().with_text_reply(Reply::fail("Resource exhausted")));
    let app = app(client.clone());

    let (status, body) = send(&app, photo("describe")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Reasoning failed: Resource exhausted");
    assert!(body.as_object().unwrap().contains_key("details"));

    // The retry computes again rather than replaying the failure.
    let (status, _) = send(&app, photo("describe")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(client.text_calls().len(), 2);
}

#[tokio::test]
async fn test_oversized_file_is_413() {
    let client = Arc::new(ScriptedInference::new());
    let config = GatewayConfig {
        max_upload_bytes: 1024,
        ..GatewayConfig::default()
    };
    let app = app_with(client.clone(), config);

    let request = Form::new()
        .file("big.png", Some("image/png"), &vec![0u8; 4096])
        .text("intent", "describe")
        .into_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("1024"));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_uploads_reason_once() {
    let client = Arc::new(
        ScriptedInference::new()
            .with_latency(Duration::from_millis(50))
            .with_text_reply(Reply::text("analysis"))
            .with_text_reply(Reply::text("shared answer")),
    );
    let cache = Arc::new(MockResponseCache::new());
    let pipeline = Arc::new(MediaPipeline::new(client.clone(), cache.clone()));
    let app = GatewayServer::new(GatewayConfig::default(), pipeline).build_router();

    let (a, b) = tokio::join!(send(&app, photo("describe")), send(&app, photo("describe")));
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(a.1["result"], "shared answer");
    assert_eq!(b.1["result"], "shared answer");
    assert_ne!(a.1["cached"], b.1["cached"]);

    assert_eq!(client.text_calls().len(), 2);
    assert_eq!(cache.write_count(), 1);
}
