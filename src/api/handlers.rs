//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{ChatRequest, ChatResponse, ErrorResponse, SessionView};
use super::AppState;
use crate::artifact::AudioRef;
use crate::poller::PollError;
use crate::session::{SessionState, TurnRejected};
use crate::turn::TurnError;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat page
        .route("/", get(serve_page))
        .route("/assets/*path", get(serve_static))
        // Session lifecycle
        .route("/api/session", get(get_session))
        .route("/api/session/new", post(new_session))
        // Turns
        .route("/api/chat", post(send_chat))
        // Spoken replies
        .route("/audio/:name", get(get_audio))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_page() -> Response {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - chat page not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.lock().await;
    Json(SessionView::new(&session, state.handler.lifecycle()))
}

/// Start over with a fresh session on the same thread. Waits for any
/// turn in flight to finish first.
async fn new_session(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.lock().await;
    *session = SessionState::new(state.thread_id.clone());
    tracing::info!(thread_id = %state.thread_id, "Started new session");
    Json(SessionView::new(&session, state.handler.lifecycle()))
}

// ============================================================
// Turns
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    // The turn runs on its own task so a dropped request cannot abandon it
    // halfway; the session lock serialises turns.
    let task = tokio::spawn(async move {
        let mut session = state.session.lock_owned().await;
        let result = state.handler.handle(session.clone(), &req.text).await;
        *session = result.state;
        let view = SessionView::new(&session, state.handler.lifecycle());
        (view, result.outcome)
    });

    let (view, outcome) = task
        .await
        .map_err(|e| AppError::Internal(format!("Turn task failed: {e}")))?;

    match outcome {
        Ok(outcome) => {
            tracing::debug!(
                reply_chars = outcome.reply.chars().count(),
                has_audio = outcome.audio.is_some(),
                rest_notice = outcome.rest_notice,
                "Turn completed"
            );
            Ok(Json(ChatResponse {
                session: view,
                audio_error: outcome.audio_error,
            }))
        }
        Err(e) => Err(e.into()),
    }
}

// ============================================================
// Audio
// ============================================================

async fn get_audio(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let audio =
        AudioRef::parse(&name).ok_or_else(|| AppError::NotFound("Unknown audio".to_string()))?;
    let path = state.handler.artifacts().path_of(&audio);

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Audio artifact unavailable");
        AppError::NotFound("Audio not found".to_string())
    })?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.as_ref().to_string())], bytes).into_response())
}

async fn get_version() -> &'static str {
    concat!("lil-m ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    BadGateway(String),
    GatewayTimeout(String),
    Internal(String),
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        let message = e.to_string();
        match e {
            TurnError::Rejected(TurnRejected::EmptyMessage) => AppError::BadRequest(message),
            TurnError::Rejected(TurnRejected::Closed { .. }) => AppError::Conflict(message),
            TurnError::Poll(PollError::Timeout { .. }) => AppError::GatewayTimeout(message),
            TurnError::Poll(_) => AppError::BadGateway(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
