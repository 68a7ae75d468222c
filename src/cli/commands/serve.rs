//! HTTP API server for integration with other systems.
//!
//! Provides the audio processing endpoints: transcription, cleanup, and
//! pipeline comparison. Every request must carry a bearer identity; AI
//! consent and the rate limit are checked before any expensive work starts.

use crate::access::{ConsentGate, RateLimiter, StaticConsentGate};
use crate::audio::AudioAsset;
use crate::cli::Output;
use crate::comparison::PipelinePath;
use crate::config::Settings;
use crate::enrichment::{LessonOptions, StorySource};
use crate::error::{FortellError, Result};
use crate::orchestrator::Orchestrator;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    limiter: RateLimiter,
    consent: Box<dyn ConsentGate>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let limiter = RateLimiter::new(
        settings.access.rate_limit_requests,
        Duration::from_secs(settings.access.rate_limit_window_secs),
    );
    let consent = Box::new(StaticConsentGate::new(settings.access.consent_denied.clone()));
    let max_body = settings.transcription.max_audio_bytes;
    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState {
        orchestrator,
        limiter,
        consent,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/transcribe", post(transcribe))
        .route("/clean", post(clean))
        .route("/compare", post(compare))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Fortell API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Transcribe", "POST /transcribe");
    Output::kv("Clean", "POST /clean");
    Output::kv("Compare", "POST /compare");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Response Types ===

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Latencies {
    transcription_ms: u64,
    enrichment_ms: u64,
    total_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoryMeta {
    provider: String,
    source: StorySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
    latencies: Latencies,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeResponse {
    transcription: String,
    /// Estimated duration in minutes.
    duration: f64,
    lesson_options: LessonOptions,
    #[serde(rename = "_meta")]
    meta: StoryMeta,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanMeta {
    provider: String,
    total_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanResponse {
    cleaned_audio_base64: String,
    production_id: String,
    #[serde(rename = "_meta")]
    meta: CleanMeta,
}

#[derive(Serialize)]
struct CompareResponse {
    results: BTreeMap<String, PipelinePath>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match handle_transcribe(&state, &headers, body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_transcribe(
    state: &AppState,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<TranscribeResponse> {
    let identity = require_identity(headers)?;
    check_access(state, &identity).await?;

    let asset = asset_from_request(headers, body);
    let outcome = state.orchestrator.tell_story(&asset).await?;

    Ok(TranscribeResponse {
        transcription: outcome.transcription,
        duration: outcome.duration_minutes,
        lesson_options: outcome.lesson_options,
        meta: StoryMeta {
            provider: outcome.provider.to_string(),
            source: outcome.source,
            confidence: outcome.confidence,
            latencies: Latencies {
                transcription_ms: outcome.transcription_ms,
                enrichment_ms: outcome.enrichment_ms,
                total_ms: outcome.total_ms,
            },
        },
    })
}

async fn clean(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    match handle_clean(&state, &headers, body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_clean(state: &AppState, headers: &HeaderMap, body: Bytes) -> Result<CleanResponse> {
    let identity = require_identity(headers)?;
    check_access(state, &identity).await?;

    let asset = asset_from_request(headers, body);
    let outcome = state.orchestrator.clean_audio(&asset).await?;

    Ok(CleanResponse {
        cleaned_audio_base64: base64::engine::general_purpose::STANDARD.encode(&outcome.bytes),
        production_id: outcome.production_id,
        meta: CleanMeta {
            provider: "production".to_string(),
            total_ms: outcome.total_ms,
        },
    })
}

async fn compare(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    match handle_compare(&state, &headers, body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e),
    }
}

async fn handle_compare(
    state: &AppState,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<CompareResponse> {
    let identity = require_identity(headers)?;
    check_access(state, &identity).await?;

    let asset = asset_from_request(headers, body);
    let paths = state.orchestrator.compare(&asset).await?;

    Ok(CompareResponse {
        results: paths.into_iter().map(|p| (p.name.clone(), p)).collect(),
    })
}

// === Request plumbing ===

/// Extract the caller identity from the Authorization header.
fn require_identity(headers: &HeaderMap) -> Result<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| FortellError::Auth("missing Authorization header".into()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| FortellError::Auth("expected bearer authorization".into()))?
        .trim();

    if token.is_empty() {
        return Err(FortellError::Auth("empty bearer token".into()));
    }

    Ok(token.to_string())
}

/// Rate limit and consent, before any expensive work.
async fn check_access(state: &AppState, identity: &str) -> Result<()> {
    state.limiter.check(identity).await?;

    if !state.consent.allows_ai(identity).await {
        return Err(FortellError::Consent(
            "caller has not consented to AI processing".into(),
        ));
    }

    Ok(())
}

fn asset_from_request(headers: &HeaderMap, body: Bytes) -> AudioAsset {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("audio/webm")
        .to_string();
    AudioAsset::new(body.to_vec(), content_type)
}

/// Map pipeline errors to status codes and safe messages. Provider
/// internals stay in the logs, never in the response body.
fn error_response(e: FortellError) -> Response {
    let (status, message) = match &e {
        FortellError::Auth(_) => (StatusCode::UNAUTHORIZED, e.to_string()),
        FortellError::Consent(_) => (StatusCode::FORBIDDEN, e.to_string()),
        FortellError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, e.to_string()),
        FortellError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        FortellError::Provider { provider, .. } => {
            error!("Provider failure: {e}");
            (
                StatusCode::BAD_GATEWAY,
                format!("{provider} service failed"),
            )
        }
        FortellError::Timeout(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            "processing timed out".to_string(),
        ),
        FortellError::Config(message) => {
            error!("Configuration error: {message}");
            (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
        }
        _ => {
            error!("Internal error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    };

    let mut response = (status, Json(ErrorResponse { error: message })).into_response();

    if let FortellError::RateLimited { retry_after_secs } = e {
        if let Ok(value) = retry_after_secs.to_string().parse() {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }

    response
}
