//! REST API routes for the web server
//!
//! Provides the two filter endpoints plus health and stats.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::metrics::{MetricsCollector, StatsResponse};
use super::{staging, IMAGE_FIELD, THRESHOLD_FIELD};
use crate::codec::{CodecError, OutputFormat};
use crate::filters::FilterKind;
use crate::pipeline::{self, PipelineError, PipelineOptions, Processed};

/// Application state shared across handlers
pub struct AppState {
    /// Filter defaults; the threshold can be overridden per request
    pub options: PipelineOptions,
    /// Where uploads are staged, if anywhere
    pub staging_dir: Option<PathBuf>,
    pub metrics: MetricsCollector,
    pub version: String,
}

impl AppState {
    pub fn new(options: PipelineOptions, staging_dir: Option<PathBuf>) -> Self {
        Self {
            options,
            staging_dir,
            metrics: MetricsCollector::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PipelineOptions::default(), None)
    }
}

/// Build the API router
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/denoise", post(denoise))
        .route("/remove-background", post(remove_background))
        .route("/health", get(health_check))
        .route("/stats", get(stats))
}

/// Root-level aliases of the filter endpoints
pub fn legacy_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(denoise))
        .route("/bg", post(remove_background))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Request counters
async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(state.metrics.snapshot(&state.version))
}

async fn denoise(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<ImageResponse, AppError> {
    run_filter(state, FilterKind::Denoise, multipart).await
}

async fn remove_background(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<ImageResponse, AppError> {
    run_filter(state, FilterKind::RemoveBackground, multipart).await
}

/// Fields read from the multipart form
#[derive(Debug)]
struct Upload {
    data: Bytes,
    file_name: Option<String>,
    threshold: Option<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let mut data = None;
    let mut file_name = None;
    let mut threshold = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            IMAGE_FIELD => {
                file_name = field.file_name().map(str::to_string);
                data = Some(field.bytes().await.map_err(upload_error)?);
            }
            THRESHOLD_FIELD => {
                let text = field.text().await.map_err(upload_error)?;
                threshold = Some(parse_threshold(&text)?);
            }
            _ => {}
        }
    }

    let data = data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Error retrieving image: no `{}` file field", IMAGE_FIELD)))?;

    Ok(Upload {
        data,
        file_name,
        threshold,
    })
}

fn upload_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(format!("Error retrieving image: {}", err.body_text()))
    }
}

fn parse_threshold(text: &str) -> Result<u8, AppError> {
    text.trim()
        .parse::<u8>()
        .map_err(|_| AppError::BadRequest(format!("Invalid threshold {:?}: expected 0-255", text)))
}

async fn run_filter(
    state: Arc<AppState>,
    kind: FilterKind,
    mut multipart: Multipart,
) -> Result<ImageResponse, AppError> {
    let request_id = Uuid::new_v4();
    let active = state.metrics.record_started(kind);

    let result = filter_upload(&state, kind, request_id, &mut multipart).await;

    match &result {
        Ok(response) => {
            active.completed(response.elapsed_ms, response.pixels);
            info!(%request_id, filter = %kind, "Result sent to client");
        }
        Err(err) => {
            active.failed();
            warn!(%request_id, filter = %kind, error = %err, "Request failed");
        }
    }

    result
}

async fn filter_upload(
    state: &AppState,
    kind: FilterKind,
    request_id: Uuid,
    multipart: &mut Multipart,
) -> Result<ImageResponse, AppError> {
    let upload = read_upload(multipart).await?;
    info!(
        %request_id,
        filter = %kind,
        file_name = upload.file_name.as_deref().unwrap_or("-"),
        bytes = upload.data.len(),
        "Upload received"
    );

    let mut options = state.options;
    if let Some(threshold) = upload.threshold {
        options = options.with_threshold(threshold);
    }
    let staging_dir = state.staging_dir.clone();

    let processed = tokio::task::spawn_blocking(move || -> pipeline::Result<Processed> {
        match staging_dir {
            Some(dir) => {
                let staged = staging::stage_and_read(&dir, request_id, &upload.data)
                    .map_err(PipelineError::Staging)?;
                pipeline::process(&staged, kind, &options)
            }
            None => pipeline::process(&upload.data, kind, &options),
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("Processing task failed: {}", e)))??;

    Ok(ImageResponse::new(processed, kind, request_id))
}

/// Encoded image response
#[derive(Debug)]
pub struct ImageResponse {
    data: Vec<u8>,
    format: OutputFormat,
    filename: String,
    request_id: Uuid,
    elapsed_ms: u64,
    pixels: u64,
}

impl ImageResponse {
    fn new(processed: Processed, kind: FilterKind, request_id: Uuid) -> Self {
        let pixels = processed.pixel_count();
        Self {
            filename: format!("{}-{}.{}", kind, request_id, processed.format.extension()),
            format: processed.format,
            elapsed_ms: processed.elapsed_ms,
            data: processed.data,
            request_id,
            pixels,
        }
    }
}

impl IntoResponse for ImageResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                ("Content-Type", self.format.mime_type().to_string()),
                (
                    "Content-Disposition",
                    format!("inline; filename=\"{}\"", self.filename),
                ),
                ("X-Request-Id", self.request_id.to_string()),
            ],
            self.data,
        )
            .into_response()
    }
}

/// API error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    Unprocessable(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Unprocessable(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.status())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Staging(e) => AppError::Internal(format!("Error saving file: {}", e)),
            PipelineError::Codec(CodecError::Decode(msg)) => {
                AppError::Unprocessable(format!("Error loading image: {}", msg))
            }
            PipelineError::Codec(e) => AppError::Internal(format!("Error saving image: {}", e)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let body = ErrorResponse {
            error: self.message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
