//! HTTP routes: `GET /fetch-design` and `GET /health`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use design_fetch::{DesignError, DesignExtractor, ExtractedDesign};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<DesignExtractor>,
}

impl AppState {
    pub fn new(extractor: DesignExtractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }
}

/// Errors returned to HTTP clients as `{"message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No 'url' query param given.")]
    MissingUrl,

    #[error(transparent)]
    Design(#[from] DesignError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl => StatusCode::BAD_REQUEST,
            ApiError::Design(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Design(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("design extraction failed: {self}");
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchDesignParams {
    pub url: Option<String>,
}

/// `GET /fetch-design?url=...`
pub async fn fetch_design(
    State(state): State<AppState>,
    Query(params): Query<FetchDesignParams>,
) -> Result<Json<ExtractedDesign>, ApiError> {
    let url = params
        .url
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::MissingUrl)?;

    let request_id = Uuid::new_v4();
    let design = state
        .extractor
        .fetch_design(&url)
        .instrument(info_span!("fetch_design", %request_id))
        .await?;
    Ok(Json(design))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
    pub max_sessions: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let pool = state.extractor.pool();
    let body = HealthResponse {
        status: "ok",
        active_sessions: pool.active(),
        max_sessions: pool.max_sessions(),
    };
    (StatusCode::OK, Json(body))
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fetch-design", get(fetch_design))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
