//! HTTP API for the aria TTS engine.
//!
//! JSON envelopes follow the `{success: ...}` convention; pipeline errors
//! map onto status codes through [`ApiError`]. CORS-permissive so browser
//! clients can call from any origin.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::error;

use aria_core::error::TtsError;
use aria_core::types::{AudioPayload, ModelEntry, SynthesisRequest, validate_artifact_name};

use crate::sweep::{self, RETENTION_WINDOW};
use crate::synth::SpeechEngine;

/// Build the axum router with a shared [`SpeechEngine`].
pub fn router(engine: SpeechEngine) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/tts", post(tts))
        .route("/cleanup", post(cleanup))
        .route("/audio/{file}", get(audio))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

// ─── Error envelope ────────────────────────────────────────────────────────

/// Error response: `{"success": false, "kind": ..., "error": ...}`.
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    detail: String,
}

impl ApiError {
    fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            detail: err.to_string(),
        }
    }

    fn not_found(detail: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            detail: detail.to_string(),
        }
    }
}

impl From<TtsError> for ApiError {
    fn from(err: TtsError) -> Self {
        let status = match &err {
            TtsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TtsError::ProvisioningFailed(_) => StatusCode::BAD_GATEWAY,
            TtsError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TtsError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            TtsError::ModelNotFound(_)
            | TtsError::SynthesisFailed { .. }
            | TtsError::ArtifactUnreadable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "kind": self.kind,
            "error": self.detail,
        }));
        (self.status, body).into_response()
    }
}

// ─── Response types ────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsResponse {
    success: bool,
    text: String,
    model: String,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelsResponse {
    success: bool,
    models: Vec<ModelEntry>,
    default_model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResponse {
    success: bool,
    deleted_count: usize,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    engine: String,
    default_model: String,
}

// ─── Handlers ──────────────────────────────────────────────────────────────

async fn health(State(engine): State<SpeechEngine>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        engine: engine.config().engine.clone(),
        default_model: engine.config().default_model.clone(),
    })
}

async fn models(State(engine): State<SpeechEngine>) -> Result<Json<ModelsResponse>, ApiError> {
    let models = engine.registry().list().await.map_err(ApiError::internal)?;
    Ok(Json(ModelsResponse {
        success: true,
        models,
        default_model: engine.config().default_model.clone(),
    }))
}

async fn tts(
    State(engine): State<SpeechEngine>,
    Json(req): Json<SynthesisRequest>,
) -> Result<Json<TtsResponse>, ApiError> {
    let output = engine.synthesize(&req).await.inspect_err(|e| {
        error!(error = %e, kind = e.kind(), "synthesis request failed");
    })?;

    let (base64, file_name) = match output.audio {
        AudioPayload::Inline { base64 } => (Some(base64), None),
        AudioPayload::Stored { file_name } => (None, Some(file_name)),
    };
    Ok(Json(TtsResponse {
        success: true,
        text: req.text,
        model: output.model,
        size: output.size,
        base64,
        file_name,
    }))
}

async fn cleanup(State(engine): State<SpeechEngine>) -> Result<Json<CleanupResponse>, ApiError> {
    let deleted = sweep::sweep(&engine.config().audio_dir, RETENTION_WINDOW)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(CleanupResponse {
        success: true,
        deleted_count: deleted,
        message: format!("Cleaned up {deleted} old audio files"),
    }))
}

async fn audio(
    State(engine): State<SpeechEngine>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    validate_artifact_name(&file)?;
    let path = engine.config().audio_dir.join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            Ok(([(header::CONTENT_TYPE, content_type(&file))], bytes).into_response())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found("audio file not found"))
        }
        Err(e) => Err(ApiError::internal(e)),
    }
}

fn content_type(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
