use super::state::AppState;
use crate::error::SessionError;
use crate::session::{SessionConfig, SessionStatus, SessionView, TransportMode};
use crate::transcript::Message;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: SessionStatus,
    pub message: String,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    pub agent_id: String,

    /// Keeps the current transport when omitted
    pub transport: Option<TransportMode>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub positive: bool,
}

#[derive(Debug, Serialize)]
pub struct TranscriptEntry {
    #[serde(flatten)]
    pub message: Message,
    /// Capture time in local display precision
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

fn error_response(err: SessionError) -> Response {
    let (status, kind) = match &err {
        SessionError::Configuration(_) => (StatusCode::BAD_REQUEST, "configuration"),
        SessionError::Permission(_) => (StatusCode::FORBIDDEN, "permission"),
        SessionError::Connection(_) => (StatusCode::BAD_GATEWAY, "connection"),
        SessionError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
        SessionError::FeedbackNotAccepted => (StatusCode::CONFLICT, "feedback_not_accepted"),
    };

    warn!("Request failed: {}", err);

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind,
        }),
    )
        .into_response()
}

async fn session_response(state: &AppState, message: String) -> Response {
    let session = state.controller.view().await;
    (
        StatusCode::OK,
        Json(SessionResponse {
            status: session.status,
            message,
            session,
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.view().await)
}

/// POST /session/start
/// Probe the microphone and connect to the configured agent
pub async fn start_call(State(state): State<AppState>) -> Response {
    info!("Start call requested");

    // Detached so a dropped request cannot strand the attempt mid-open
    let controller = Arc::clone(&state.controller);
    match tokio::spawn(async move { controller.start_call().await }).await {
        Ok(Ok(())) => session_response(&state, "Call started".to_string()).await,
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            error!("Start call task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /session/end
pub async fn end_call(State(state): State<AppState>) -> Response {
    info!("End call requested");

    match state.controller.end_call().await {
        Ok(()) => session_response(&state, "Call ended".to_string()).await,
        Err(e) => error_response(e),
    }
}

/// PUT /session/config
/// Only allowed while no call is in progress
pub async fn update_config(
    State(state): State<AppState>,
    Json(req): Json<UpdateConfigRequest>,
) -> Response {
    let transport = match req.transport {
        Some(transport) => transport,
        None => state.controller.config().await.transport,
    };

    match state
        .controller
        .set_config(SessionConfig::new(req.agent_id, transport))
        .await
    {
        Ok(()) => session_response(&state, "Configuration updated".to_string()).await,
        Err(e) => error_response(e),
    }
}

/// GET /session/transcript
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.controller.transcript().await;

    let entries: Vec<TranscriptEntry> = snapshot
        .iter()
        .map(|message| TranscriptEntry {
            time: message.display_time(),
            message: message.clone(),
        })
        .collect();

    Json(entries)
}

/// POST /session/feedback
pub async fn send_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Response {
    match state.controller.feedback().send_feedback(req.positive).await {
        Ok(()) => (StatusCode::NO_CONTENT, ()).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
