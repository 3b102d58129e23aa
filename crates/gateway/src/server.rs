//! Axum-based HTTP server for the gateway.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Json, Multipart, State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use bytes::BytesMut;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use intentlens_core::{
    config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES},
    types::{PipelineResult, UploadedMedia},
    Error, Result,
};
use intentlens_governance::track_request;

use crate::pipeline::{MediaPipeline, ProcessRequest};

/// Headroom for multipart boundaries, part headers and the intent field.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Content type assumed for a file part that declares none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
    /// Allowed CORS origins; `*` allows any.
    pub allowed_origins: Vec<String>,
    /// Largest accepted file part, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            enable_tracing: true,
            allowed_origins: vec!["*".to_string()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES as usize,
        }
    }
}

impl From<&ServerConfig> for GatewayConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            enable_cors: server.enable_cors,
            enable_tracing: true,
            allowed_origins: server.allowed_origins.clone(),
            max_upload_bytes: usize::try_from(server.max_upload_bytes).unwrap_or(usize::MAX),
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub pipeline: Arc<MediaPipeline>,
    pub max_upload_bytes: usize,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(config: GatewayConfig, pipeline: Arc<MediaPipeline>) -> Self {
        let state = Arc::new(AppState {
            pipeline,
            max_upload_bytes: config.max_upload_bytes,
        });
        Self {
            config,
            state,
            metrics_handle: None,
        }
    }

    /// Set metrics handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let body_limit = self
            .config
            .max_upload_bytes
            .saturating_add(MULTIPART_OVERHEAD_BYTES);

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route(
                "/api/process",
                post(process_handler).layer(DefaultBodyLimit::max(body_limit)),
            )
            .with_state(self.state.clone());

        if let Some(handle) = &self.metrics_handle {
            let handle = handle.clone();
            router = router.route("/metrics", get(move || async move { handle.render() }));
        }

        if self.config.enable_cors {
            router = router.layer(cors_layer(&self.config.allowed_origins));
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Bind the configured address and run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::gateway(format!("Failed to bind: {}", e)))?;

        self.serve(listener).await
    }

    /// Run the server on an already bound listener.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> Result<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| Error::gateway(format!("Failed to read local address: {}", e)))?;
        tracing::info!(addr = %addr, "Gateway server starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::gateway(format!("Server error: {}", e)))?;

        Ok(())
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Error mapped to a JSON response.
///
/// Client errors carry `{error}`. Server errors carry `{error, details}`,
/// with `details` null when the service sent no body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if status.is_server_error() {
            json!({ "error": self.0.to_string(), "details": self.0.details() })
        } else {
            json!({ "error": self.0.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Upload handler: one `file` part plus one `intent` part.
async fn process_handler(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let trace_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("process", trace_id = %trace_id);

    let outcome = async {
        // Anything that is not a multipart body carries no file.
        let multipart = multipart.map_err(|rejection| {
            tracing::debug!(reason = %rejection.body_text(), "Rejected non-multipart body");
            Error::MissingFile
        })?;
        let request = read_process_form(multipart, state.max_upload_bytes).await?;
        state.pipeline.process(request).await
    }
    .instrument(span)
    .await;

    let response = respond(&trace_id, outcome);
    track_request(
        "POST",
        "/api/process",
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

fn respond(trace_id: &str, outcome: Result<PipelineResult>) -> Response {
    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            if e.is_client_error() {
                tracing::info!(trace_id = %trace_id, code = e.code(), error = %e, "Request rejected");
            } else {
                tracing::error!(trace_id = %trace_id, code = e.code(), error = %e, "Request failed");
            }
            ApiError(e).into_response()
        }
    }
}

/// Read the `file` and `intent` parts of an upload form.
///
/// Unknown parts are skipped. Missing parts are left as `None` for the
/// pipeline to reject.
async fn read_process_form(mut multipart: Multipart, max_upload_bytes: usize) -> Result<ProcessRequest> {
    let mut request = ProcessRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if request.file.is_some() {
                    return Err(Error::invalid_request("Only one file may be uploaded."));
                }
                request.file = Some(read_file(field, max_upload_bytes).await?);
            }
            "intent" => {
                let intent = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                request.intent = Some(intent);
            }
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(request)
}

async fn read_file(mut field: Field<'_>, max_upload_bytes: usize) -> Result<UploadedMedia> {
    let mime_type = field
        .content_type()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();
    let file_name = field.file_name().map(str::to_string);

    let mut data = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        if data.len() + chunk.len() > max_upload_bytes {
            return Err(Error::PayloadTooLarge {
                limit: max_upload_bytes,
            });
        }
        data.extend_from_slice(&chunk);
    }

    let media = UploadedMedia::new(mime_type, data.freeze());
    Ok(match file_name {
        Some(name) => media.with_file_name(name),
        None => media,
    })
}

fn multipart_error(e: MultipartError, max_upload_bytes: usize) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            limit: max_upload_bytes,
        }
    } else {
        Error::invalid_request(e.body_text())
    }
}
