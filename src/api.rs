//! HTTP surface for the chat page

mod assets;
mod handlers;
mod render;
mod types;

pub use handlers::create_router;

use crate::assistant::ThreadId;
use crate::session::SessionState;
use crate::turn::TurnHandler;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<TurnHandler>,
    /// The one live session. Held for the whole of a turn so submissions
    /// are processed one at a time.
    pub session: Arc<Mutex<SessionState>>,
    pub thread_id: ThreadId,
}

impl AppState {
    pub fn new(handler: TurnHandler, thread_id: ThreadId) -> Self {
        Self {
            handler: Arc::new(handler),
            session: Arc::new(Mutex::new(SessionState::new(thread_id.clone()))),
            thread_id,
        }
    }
}
