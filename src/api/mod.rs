use axum::{
    routing::{get, post},
    Router,
    Json,
    BoxError,
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, Multipart, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower_http::cors::{CorsLayer, Any};
use validator::Validate;

use crate::config::RagConfig;
use crate::corpus::DocumentId;
use crate::document::DocumentFormat;
use crate::llm::{RagError, RetrievalPipeline};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<RetrievalPipeline>,
}

#[derive(Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default)]
    #[validate(length(max = 4000))]
    query: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    message: String,
    id: DocumentId,
}

#[derive(Serialize)]
pub struct StatsResponse {
    documents: usize,
    dimension: usize,
    top_k: usize,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Timeout,
    Internal(String),
    Rag(RagError),
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        ApiError::Rag(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timed out.".to_string())
            }
            ApiError::Internal(message) => {
                log::error!("Request failed in middleware: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.".to_string())
            }
            ApiError::Rag(err) if err.is_user_error() => {
                let message = match err {
                    RagError::EmptyQuery => "No query provided.",
                    _ => "File has no readable text.",
                };
                (StatusCode::BAD_REQUEST, message.to_string())
            }
            ApiError::Rag(err @ RagError::UpstreamFailure(_)) => {
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ApiError::Rag(err) => {
                log::error!("Request failed on an internal invariant: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.".to_string())
            }
        };

        if status.is_client_error() {
            log::warn!("Rejected request: {}", message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Create and configure the API router
pub fn create_api(pipeline: Arc<RetrievalPipeline>, config: &RagConfig) -> Router {
    let state = AppState { pipeline };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/upload", post(upload_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(HandleErrorLayer::new(handle_layer_error))
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state)
}

async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Invalid query: {}", e)))?;

    let response = state.pipeline.answer(&request.query).await?;
    Ok(Json(ChatResponse { response }))
}

async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let format = DocumentFormat::from_filename(&filename);
        let id = state.pipeline.ingest_bytes(&bytes, format).await?;
        log::info!("Uploaded {:?} indexed as document {}", filename, id);

        return Ok(Json(UploadResponse {
            message: "Document uploaded and indexed successfully.".to_string(),
            id,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded.".to_string()))
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let corpus = state.pipeline.corpus();
    Json(StatsResponse {
        documents: corpus.len(),
        dimension: corpus.dimension(),
        top_k: state.pipeline.top_k(),
    })
}

async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Server is running and healthy".to_string(),
    })
}
