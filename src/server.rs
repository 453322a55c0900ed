//! HTTP surface for one-shot analysis of an uploaded file.
//!
//! Every request carries its own upload as the multipart field `file`; the
//! server keeps no per-user state.
//!
//! # Endpoints
//!
//! - `GET  /v1/health`                 server status and version
//! - `POST /v1/profile`                shape, missing/unique counts and a preview
//! - `POST /v1/analyze?kind=describe`  one analysis report
//! - `POST /v1/export?format=xlsx`     the table as a downloadable file

use crate::app::session::{Preview, Session};
use crate::config::AppConfig;
use crate::domain::export::ExportFormat;
use crate::domain::ports::ConfigProvider;
use crate::domain::report::{AnalysisKind, Profile, Report};
use crate::utils::error::{PipelineError, Result};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub type SharedConfig = Arc<AppConfig>;

/// Headroom on top of the upload limit for multipart framing.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(config: AppConfig) -> Router {
    let body_limit = config
        .max_upload_mb()
        .saturating_mul(1024 * 1024)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/v1/health", get(health_handler))
        .route("/v1/profile", post(profile_handler))
        .route("/v1/analyze", post(analyze_handler))
        .route("/v1/export", post(export_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(config))
}

// GET /v1/health

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// POST /v1/profile

#[derive(Debug, Serialize)]
struct ProfileResponse {
    file_name: String,
    profile: Profile,
    preview: Preview,
}

async fn profile_handler(
    State(config): State<SharedConfig>,
    multipart: Multipart,
) -> std::result::Result<Json<ProfileResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let response = run_blocking(move || {
        let session = ingest(&config, &upload)?;
        Ok(ProfileResponse {
            file_name: upload.file_name,
            profile: session.profile()?,
            preview: session.preview()?,
        })
    })
    .await?;

    Ok(Json(response))
}

// POST /v1/analyze

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    kind: Option<String>,
}

async fn analyze_handler(
    State(config): State<SharedConfig>,
    Query(params): Query<AnalyzeParams>,
    multipart: Multipart,
) -> std::result::Result<Json<Report>, AppError> {
    let kind: AnalysisKind = required(params.kind, "kind")?.parse()?;
    let upload = read_upload(multipart).await?;

    let report = run_blocking(move || ingest(&config, &upload)?.analyze(kind)).await?;
    Ok(Json(report))
}

// POST /v1/export

#[derive(Debug, Deserialize)]
struct ExportParams {
    format: Option<String>,
}

async fn export_handler(
    State(config): State<SharedConfig>,
    Query(params): Query<ExportParams>,
    multipart: Multipart,
) -> std::result::Result<Response, AppError> {
    let format: ExportFormat = required(params.format, "format")?.parse()?;
    let upload = read_upload(multipart).await?;

    let payload = run_blocking(move || ingest(&config, &upload)?.export(format)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, payload.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&payload.filename),
            ),
        ],
        payload.bytes,
    )
        .into_response())
}

// Helpers

#[derive(Debug)]
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Pulls the `file` field out of the form; other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> std::result::Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::new(e.status(), e.body_text()))?;
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::bad_request(
        "multipart field 'file' is required".to_string(),
    ))
}

fn ingest(config: &AppConfig, upload: &Upload) -> Result<Session> {
    let mut session = Session::new(config);
    session.upload(&upload.file_name, &upload.bytes)?;
    Ok(session)
}

fn required(value: Option<String>, name: &str) -> std::result::Result<String, AppError> {
    value.ok_or_else(|| AppError::bad_request(format!("query parameter '{name}' is required")))
}

/// Offloads parsing and statistics to the blocking pool.
async fn run_blocking<T, F>(work: F) -> std::result::Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::internal(format!("task panicked: {e}")))?
        .map_err(AppError::from)
}

/// Non-ASCII filenames go in the RFC 5987 `filename*` form.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() && !filename.contains('"') {
        return format!("attachment; filename=\"{filename}\"");
    }
    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_') {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();
    format!("attachment; filename*=UTF-8''{encoded}")
}

// Error type

/// Structured JSON error response: `{error, hint}`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    hint: Option<String>,
}

impl AppError {
    fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            hint: None,
        }
    }

    fn bad_request(message: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal(message: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        let status = match &e {
            PipelineError::Ingestion(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::InvalidSelector { .. } | PipelineError::NoTable => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "Request failed");
        }
        Self {
            status,
            message: e.to_string(),
            hint: Some(e.recovery_suggestion().to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "hint": self.hint,
        });
        (self.status, Json(body)).into_response()
    }
}
