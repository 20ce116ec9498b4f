//! HTTP routes
//!
//! Thin request layer over the index builder and query engine: input
//! validation, top-k defaulting and status-code mapping live here, ranking
//! does not.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use catalog_index::status::{self, Readiness};
use catalog_index::{
    CatalogStats, IndexBuilder, InitOutcome, InitStatus, PredictionResult, QueryEngine,
    StatusSnapshot,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};

const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub builder: IndexBuilder,
    pub engine: QueryEngine,
}

impl AppState {
    pub fn new(builder: IndexBuilder) -> Self {
        let engine = QueryEngine::new(builder.clone());
        Self { builder, engine }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/status", get(status_handler))
        .route("/stats", get(stats))
        .route("/initialize", post(initialize))
        .route("/predict", post(predict))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Body of `POST /predict`
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    /// Main complaint or symptom description
    #[serde(default, alias = "keluhan")]
    pub complaint: String,
    /// Additional history
    #[serde(default, alias = "anamnesa")]
    pub history: String,
    /// Anything but an integer in `[1, MAX_TOP_K]` falls back to the default
    #[serde(default)]
    pub top_k: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct QueryEcho {
    pub complaint: String,
    pub history: String,
    pub top_k: usize,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: &'static str,
    pub query: QueryEcho,
    pub predictions: Vec<PredictionResult>,
    pub total_results: usize,
    pub processing_time_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub data: StatusSnapshot,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub data: CatalogStats,
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let report = status::health(&state.builder.status());
    Json(json!({
        "status": "success",
        "message": "Catalog Matching API is running!",
        "version": API_VERSION,
        "ready": report.ready,
        "initialization_status": report.initialization_status,
        "endpoints": {
            "GET /": "Health check",
            "GET /health": "Health check",
            "GET /ready": "Readiness check",
            "POST /predict": "Rank catalog items for a free-text query",
            "GET /stats": "Get catalog statistics",
            "GET /status": "Get initialization status",
            "POST /initialize": "Force initialization",
        },
    }))
}

async fn ready(State(state): State<AppState>) -> Response {
    match status::readiness(&state.builder.status()) {
        Readiness::Ready => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "message": "API is ready to serve requests",
            })),
        )
            .into_response(),
        Readiness::NotReady { progress, message } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "message": format!("Initialization in progress: {message}"),
                "progress": progress,
            })),
        )
            .into_response(),
    }
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "success",
        data: state.builder.status(),
    })
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let data = state
        .builder
        .stats()
        .ok_or_else(|| ApiError::ServiceUnavailable("Catalog not loaded".to_string()))?;
    Ok(Json(StatsResponse {
        status: "success",
        data,
    }))
}

async fn initialize(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.builder.status();
    match snapshot.status {
        InitStatus::InProgress => return Json(already_running(snapshot.progress)),
        InitStatus::Completed => return Json(already_initialized()),
        InitStatus::NotStarted | InitStatus::Failed => {}
    }

    match state.builder.initialize(true).await {
        InitOutcome::AlreadyRunning => Json(already_running(state.builder.status().progress)),
        InitOutcome::AlreadyCompleted => Json(already_initialized()),
        _ => {
            tracing::info!("Initialization requested via API");
            Json(json!({
                "status": "success",
                "message": "Initialization started",
                "estimated_time": "2-5 minutes",
            }))
        }
    }
}

fn already_running(progress: u8) -> Value {
    json!({
        "status": "info",
        "message": "Initialization already in progress",
        "progress": progress,
    })
}

fn already_initialized() -> Value {
    json!({
        "status": "success",
        "message": "Model already initialized",
    })
}

async fn predict(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let snapshot = state.builder.status();
    match snapshot.status {
        InitStatus::Completed => {}
        InitStatus::NotStarted => {
            return Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": "Model not initialized. Please wait for auto-initialization or call POST /initialize.",
                    "initialization_status": snapshot,
                })),
            )
                .into_response())
        }
        InitStatus::InProgress => {
            return Ok((
                StatusCode::ACCEPTED,
                Json(json!({
                    "status": "info",
                    "message": format!(
                        "Model initialization in progress ({}%). Please wait...",
                        snapshot.progress
                    ),
                    "initialization_status": snapshot,
                })),
            )
                .into_response())
        }
        InitStatus::Failed => {
            return Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": "Model initialization failed",
                    "error": snapshot.error,
                })),
            )
                .into_response())
        }
    }

    let request = parse_predict_request(&body)?;
    let complaint = request.complaint.trim().to_string();
    let history = request.history.trim().to_string();
    if complaint.is_empty() && history.is_empty() {
        return Err(ApiError::BadRequest(
            "Either complaint or history must be provided".to_string(),
        ));
    }

    let policy = state.engine.top_k_policy();
    let top_k = request
        .top_k
        .as_ref()
        .and_then(Value::as_i64)
        .map_or(policy.default, |k| policy.resolve(k));

    let start = Instant::now();
    let predictions = state
        .engine
        .predict(&complaint, &history, top_k as i64)
        .await?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok(Json(PredictResponse {
        status: "success",
        query: QueryEcho {
            complaint,
            history,
            top_k,
        },
        total_results: predictions.len(),
        predictions,
        processing_time_ms: (elapsed_ms * 100.0).round() / 100.0,
    })
    .into_response())
}

/// Missing, malformed or empty JSON objects are rejected
fn parse_predict_request(body: &[u8]) -> ApiResult<PredictRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("No JSON data provided".to_string()))?;

    match &value {
        Value::Object(map) if !map.is_empty() => {}
        _ => return Err(ApiError::BadRequest("No JSON data provided".to_string())),
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
