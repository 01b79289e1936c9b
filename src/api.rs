//! HTTP surface for Docvec.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /process` – Accept one multipart file upload (field `file`), run the
//!   extraction → chunking → embedding pipeline, and return the chunk/embedding
//!   pairs. Nothing is persisted; the response is the only output.
//! - `GET /health` – Liveness probe reporting the loaded model's dimensionality.
//! - `GET /metrics` – Observe pipeline counters and the last chunk size used.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Upload size is bounded before the pipeline runs: bodies over
//! `MAX_UPLOAD_BYTES` are rejected by the body-limit layer, never mid-pipeline.

use crate::config::get_config;
use crate::processing::{PipelineApi, PipelineError, UploadedFile};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the pipeline API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/process", post(process_document::<S>))
        .route("/health", get(get_health::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(get_config().max_upload_bytes))
        .with_state(service)
}

/// Success response for the `POST /process` endpoint.
#[derive(Serialize)]
struct ProcessResponse {
    /// Original filename of the upload.
    filename: String,
    /// SHA-256 of the uploaded bytes, hex encoded.
    file_hash: String,
    /// Number of chunks produced for the document.
    chunks_extracted: usize,
    /// Chunk size in effect for this document.
    chunk_size: usize,
    /// Chunk/embedding pairs in document order.
    chunks: Vec<ChunkPayload>,
}

/// One chunk with its embedding, as serialized on the wire.
#[derive(Serialize)]
struct ChunkPayload {
    chunk_index: usize,
    chunk_text: String,
    embedding: Vec<f32>,
}

/// Run the pipeline over one uploaded file.
///
/// The multipart body must carry exactly one `file` field; its filename and
/// declared content type drive format detection.
async fn process_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, AppError>
where
    S: PipelineApi,
{
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map_or_else(|| "upload".to_string(), str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        upload = Some(UploadedFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }
    let upload = upload.ok_or(AppError::MissingFile)?;

    let result = service.process_upload(upload).await?;
    tracing::info!(
        filename = %result.filename,
        chunks = result.chunks.len(),
        chunk_size = result.chunk_size,
        "Process request completed"
    );

    Ok(Json(ProcessResponse {
        filename: result.filename,
        file_hash: result.file_hash,
        chunks_extracted: result.chunks.len(),
        chunk_size: result.chunk_size,
        chunks: result
            .chunks
            .into_iter()
            .map(|chunk| ChunkPayload {
                chunk_index: chunk.index,
                chunk_text: chunk.text,
                embedding: chunk.embedding,
            })
            .collect(),
    }))
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    embedding_dimension: usize,
}

/// Report liveness and the loaded model's vector dimensionality.
async fn get_health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: PipelineApi,
{
    Json(HealthResponse {
        status: "ok",
        embedding_dimension: service.embedding_dimension(),
    })
}

/// Return a concise metrics snapshot with document/chunk counters and the last chunk size.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: PipelineApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        documents_processed: snapshot.documents_processed,
        chunks_embedded: snapshot.chunks_embedded,
        last_chunk_size: snapshot.last_chunk_size,
    })
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    documents_processed: u64,
    chunks_embedded: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_chunk_size: Option<u64>,
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "process",
                method: "POST",
                path: "/process",
                description: "Upload one file (multipart field 'file'); extract its text, chunk it, and return one embedding per chunk.",
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Liveness probe reporting the loaded embedding model's dimensionality.",
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters useful for observability dashboards.",
            },
        ],
    })
}

enum AppError {
    Pipeline(PipelineError),
    Multipart(MultipartError),
    MissingFile,
}

impl AppError {
    fn status(error: &PipelineError) -> StatusCode {
        match error {
            PipelineError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PipelineError::Extraction(_) | PipelineError::EmptyContent => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::Chunking(_) | PipelineError::Embedding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Pipeline(error) => {
                let body = json!({
                    "error": error.category(),
                    "stage": error.stage(),
                    "message": error.to_string(),
                });
                (Self::status(&error), Json(body)).into_response()
            }
            Self::Multipart(error) => {
                let status = error.status();
                let body = json!({
                    "error": "invalid_request",
                    "message": error.body_text(),
                });
                (status, Json(body)).into_response()
            }
            Self::MissingFile => {
                let body = json!({
                    "error": "invalid_request",
                    "message": "multipart field 'file' is required",
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}
