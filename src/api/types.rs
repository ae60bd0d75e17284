//! API request and response types

use super::render::markdown_to_html;
use crate::session::{LifecyclePolicy, Notice, Phase, Role, SessionState, Turn, FAREWELL_TEXT};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Everything the chat page needs to render the session
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub user_turns: u32,
    pub turn_limit: u32,
    pub accepting_input: bool,
    /// Shown in place of the input once the session is closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farewell: Option<&'static str>,
    pub turns: Vec<TurnView>,
}

impl SessionView {
    pub fn new(state: &SessionState, policy: &LifecyclePolicy) -> Self {
        let phase = policy.phase(state);
        Self {
            phase,
            user_turns: state.user_turn_count,
            turn_limit: policy.turn_limit,
            accepting_input: phase.accepts_input(),
            farewell: (!phase.accepts_input()).then_some(FAREWELL_TEXT),
            turns: state.turns().iter().map(TurnView::from).collect(),
        }
    }
}

/// One rendered turn
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub role: Role,
    pub text: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            text: turn.text.clone(),
            html: markdown_to_html(&turn.text),
            notice: turn.notice,
            audio_url: turn.audio.as_ref().map(crate::artifact::AudioRef::url),
        }
    }
}

/// Response for a completed chat turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session: SessionView,
    /// Present when the reply is shown without audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_error: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
