//! Route handler functions for all API endpoints.
//!
//! Handlers validate input at the boundary, call into the chat core, and
//! return JSON. Any error funnels into `ApiError`, so each request gets
//! exactly one response.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spur_core::types::Message;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::SendMessageRequest;

/// Plain-text banner served at `/` in development mode.
pub const DEV_BANNER: &str = "Spur Chat Agent API is running (Dev Mode)";

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub reply: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /chat/message - run one chat turn.
pub async fn send_message(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let body = body?;
    let request = SendMessageRequest::from_body(&body).map_err(|msg| {
        tracing::debug!(error = %msg, "Rejected chat message");
        ApiError::BadRequest(msg)
    })?;

    let conversation = state.resolver.resolve(request.session_id.as_deref())?;
    let turn = state
        .orchestrator
        .handle_turn(&conversation, &request.message)
        .await?;

    Ok(Json(SendMessageResponse {
        reply: turn.reply,
        session_id: echoed_session_id(request.session_id, conversation.id, turn.session_id),
    }))
}

/// GET /chat/history/{session_id} - full transcript of a session.
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    if session_id.is_empty() {
        return Err(session_id_required());
    }

    let messages = state.history.get_history(&session_id)?;
    Ok(Json(HistoryResponse { messages }))
}

/// GET /chat/history without a session id.
pub async fn history_missing_id() -> ApiError {
    session_id_required()
}

/// Fallback for unknown paths under `/chat`.
pub async fn chat_not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

/// GET /health - liveness and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET / in development mode.
pub async fn dev_banner() -> &'static str {
    DEV_BANNER
}

/// The caller's own spelling of the id when the session was resumed, so a
/// plain string comparison only signals rotation when one happened.
fn echoed_session_id(sent: Option<String>, resolved: Uuid, fallback: String) -> String {
    match sent {
        Some(sent) if Uuid::try_parse(&sent).ok() == Some(resolved) => sent,
        _ => fallback,
    }
}

fn session_id_required() -> ApiError {
    ApiError::BadRequest("Session ID required".to_string())
}
