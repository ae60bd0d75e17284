//! Session state types

use super::log::ConversationLog;
use crate::artifact::AudioRef;
use crate::assistant::ThreadId;
use serde::Serialize;

pub const INTRO_TEXT: &str =
    "Hi, I\u{2019}m Lil M \u{2014} still becoming, but here to listen, reflect, and grow with you.";

pub const REST_TEXT: &str = "I\u{2019}m starting to feel a little tired. We have a couple more \
     exchanges before I need to rest, so let\u{2019}s make them count.";

pub const FAREWELL_TEXT: &str = "That\u{2019}s all I have in me for now. Thank you for talking \
     with me \u{2014} come back and find me again soon.";

/// Who a turn is attributed to when displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// System notices are assistant-voiced turns that never carry audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Intro,
    Rest,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Notice::Intro => INTRO_TEXT,
            Notice::Rest => REST_TEXT,
        }
    }
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            audio: None,
            notice: None,
        }
    }

    pub fn assistant(text: impl Into<String>, audio: Option<AudioRef>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            audio,
            notice: None,
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Self {
            role: Role::Assistant,
            text: notice.text().to_string(),
            audio: None,
            notice: Some(notice),
        }
    }
}

/// Where a session stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No accepted submission yet, intro not shown
    Fresh,
    /// Conversation under way
    Active,
    /// Rest threshold reached, notice shown
    Resting,
    /// Turn limit reached; terminal
    Closed,
}

impl Phase {
    pub fn accepts_input(self) -> bool {
        !matches!(self, Phase::Closed)
    }
}

/// State of one browser session. Owned by the caller and threaded through
/// each turn handler by value.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub thread_id: ThreadId,
    pub log: ConversationLog,
    pub user_turn_count: u32,
    pub intro_shown: bool,
}

impl SessionState {
    pub fn new(thread_id: ThreadId) -> Self {
        Self {
            thread_id,
            log: ConversationLog::new(),
            user_turn_count: 0,
            intro_shown: false,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        self.log.all()
    }
}
