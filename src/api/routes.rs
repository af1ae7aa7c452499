use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::archive::FinishedArchive;
use crate::auth::{AuthUser, TokenBinder};
use crate::config::MAX_SESSION_ID_LEN;
use crate::error::AppError;
use crate::state::SessionStore;
use crate::summary;
use crate::time;
use crate::types::{Event, EventType, Summary};

#[derive(Clone)]
pub struct ApiState {
    pub binder: Arc<TokenBinder>,
    pub sessions: Arc<SessionStore>,
    pub archive: Arc<FinishedArchive>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/session/event", post(record_event))
        .route("/session/end", post(end_session))
        .route("/session/latest", get(get_latest))
        .route("/session/export", get(export_session))
        .route("/ping", post(ping))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct EventIn {
    pub session_id: String,
    pub event_type: EventType,
    pub amount: f64,
    /// ISO-8601; defaults to now when omitted.
    pub timestamp: Option<String>,
}

#[derive(Deserialize)]
pub struct EndSessionIn {
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub session_id: Option<String>,
    /// Legacy clients still send `sess_id`.
    pub sess_id: Option<String>,
}

#[derive(Deserialize, Serialize)]
pub struct PingMessage {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct Ack {
    pub ok: bool,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct WrappedSummary {
    pub ok: bool,
    pub summary: Summary,
}

#[derive(Serialize)]
pub struct LatestResponse {
    pub ok: bool,
    pub summary: Option<Summary>,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "session-summary" }))
}

async fn record_event(
    State(state): State<ApiState>,
    user: AuthUser,
    Json(req): Json<EventIn>,
) -> Result<Json<Ack>, AppError> {
    validate_session_id(&req.session_id)?;
    if req.amount < 0.0 {
        return Err(AppError::InvalidArgument(
            "amount must be non-negative".to_string(),
        ));
    }

    // A supplied timestamp must parse; the validated string is stored verbatim.
    let timestamp = match req.timestamp {
        Some(ts) => {
            time::parse_iso(&ts)?;
            ts
        }
        None => time::now_iso(),
    };

    state.sessions.append_event(
        &user.user_id,
        &req.session_id,
        Event {
            event_type: req.event_type,
            amount: req.amount,
            timestamp,
        },
    );

    Ok(Json(Ack {
        ok: true,
        message: "Event recorded",
    }))
}

async fn end_session(
    State(state): State<ApiState>,
    user: AuthUser,
    Json(req): Json<EndSessionIn>,
) -> Result<Json<WrappedSummary>, AppError> {
    validate_session_id(&req.session_id)?;

    // Idempotent on end_time; the summary is recomputed and re-upserted on
    // every call, so a repeat end refreshes the archived entry in place.
    state
        .sessions
        .mark_ended(&user.user_id, &req.session_id, &time::now_iso())?;
    let summary = summary::compute(
        &state.sessions,
        &state.archive,
        &user.user_id,
        &req.session_id,
    )?;
    state.archive.upsert(&user.user_id, summary.clone())?;

    Ok(Json(WrappedSummary { ok: true, summary }))
}

async fn get_latest(State(state): State<ApiState>, user: AuthUser) -> Json<LatestResponse> {
    match state.archive.latest(&user.user_id) {
        Some(summary) => Json(LatestResponse {
            ok: true,
            summary: Some(summary),
            message: None,
        }),
        None => Json(LatestResponse {
            ok: false,
            summary: None,
            message: Some("No session summary found for this user.".to_string()),
        }),
    }
}

async fn export_session(
    State(state): State<ApiState>,
    user: AuthUser,
    Query(params): Query<ExportQuery>,
) -> Result<Json<Summary>, AppError> {
    let session_id = params
        .session_id
        .filter(|s| !s.is_empty())
        .or(params.sess_id.filter(|s| !s.is_empty()))
        .ok_or_else(|| {
            AppError::InvalidArgument("session_id query param is required".to_string())
        })?;

    // Prefer the finished entry verbatim; fall back to computing from an
    // active session.
    if let Some(summary) = state.archive.find(&user.user_id, &session_id) {
        return Ok(Json(summary));
    }
    let summary = summary::compute(&state.sessions, &state.archive, &user.user_id, &session_id)?;
    Ok(Json(summary))
}

async fn ping(Json(req): Json<PingMessage>) -> Json<PingMessage> {
    Json(PingMessage {
        message: req.message,
    })
}

fn validate_session_id(session_id: &str) -> Result<(), AppError> {
    if session_id.is_empty() || session_id.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::InvalidArgument(format!(
            "session_id must be 1-{MAX_SESSION_ID_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests — drive the real router end to end
// ---------------------------------------------------------------------------
