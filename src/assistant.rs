//! Hosted assistant and speech service abstraction
//!
//! The front-end consumes two remote services: a threaded assistant that
//! computes replies asynchronously, and a text-to-speech endpoint.

mod error;
mod openai;
mod types;

pub use error::{RemoteError, RemoteErrorKind};
pub use openai::OpenAIAssistant;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Threaded assistant service
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Create a new server-side conversation thread
    async fn create_thread(&self) -> Result<ThreadId, RemoteError>;

    /// Append a message to a thread
    async fn post_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), RemoteError>;

    /// Start the assistant on the thread's accumulated messages
    async fn start_run(&self, thread: &ThreadId) -> Result<RunId, RemoteError>;

    /// Query the current status of a run
    async fn get_run_status(&self, thread: &ThreadId, run: &RunId)
        -> Result<RunState, RemoteError>;

    /// List a thread's messages, most recent first
    async fn list_messages(&self, thread: &ThreadId) -> Result<Vec<ThreadMessage>, RemoteError>;
}

/// Text-to-speech service
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Synthesize `text` with the given voice, returning encoded audio bytes
    async fn synthesize_speech(
        &self,
        text: &str,
        voice: &VoiceProfile,
    ) -> Result<Vec<u8>, RemoteError>;
}

#[async_trait]
impl<T: AssistantService + ?Sized> AssistantService for Arc<T> {
    async fn create_thread(&self) -> Result<ThreadId, RemoteError> {
        (**self).create_thread().await
    }

    async fn post_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), RemoteError> {
        (**self).post_message(thread, role, text).await
    }

    async fn start_run(&self, thread: &ThreadId) -> Result<RunId, RemoteError> {
        (**self).start_run(thread).await
    }

    async fn get_run_status(
        &self,
        thread: &ThreadId,
        run: &RunId,
    ) -> Result<RunState, RemoteError> {
        (**self).get_run_status(thread, run).await
    }

    async fn list_messages(&self, thread: &ThreadId) -> Result<Vec<ThreadMessage>, RemoteError> {
        (**self).list_messages(thread).await
    }
}

#[async_trait]
impl<T: SpeechService + ?Sized> SpeechService for Arc<T> {
    async fn synthesize_speech(
        &self,
        text: &str,
        voice: &VoiceProfile,
    ) -> Result<Vec<u8>, RemoteError> {
        (**self).synthesize_speech(text, voice).await
    }
}
