//! One conversational turn, start to finish
//!
//! Control flow: lifecycle check → remote completion → speech synthesis →
//! log append. The session value goes in and comes back out; the handler
//! keeps no session state of its own.

#[cfg(test)]
pub mod testing;

use crate::artifact::{ArtifactPipeline, AudioRef};
use crate::assistant::AssistantService;
use crate::poller::{submit_and_await, PollError, PollPolicy};
use crate::session::{LifecyclePolicy, SessionState, Turn, TurnRejected};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TurnError {
    #[error(transparent)]
    Rejected(#[from] TurnRejected),
    #[error(transparent)]
    Poll(#[from] PollError),
}

/// What a completed turn produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub audio: Option<AudioRef>,
    /// Why audio is missing, when synthesis failed
    pub audio_error: Option<String>,
    pub rest_notice: bool,
}

/// Result of handling a submission: the updated session and the outcome
#[derive(Debug)]
pub struct TurnResult {
    pub state: SessionState,
    pub outcome: Result<TurnOutcome, TurnError>,
}

/// Runs turns against the remote services
pub struct TurnHandler {
    assistant: Arc<dyn AssistantService>,
    artifacts: ArtifactPipeline,
    poll: PollPolicy,
    lifecycle: LifecyclePolicy,
}

impl TurnHandler {
    pub fn new(
        assistant: Arc<dyn AssistantService>,
        artifacts: ArtifactPipeline,
        poll: PollPolicy,
        lifecycle: LifecyclePolicy,
    ) -> Self {
        Self {
            assistant,
            artifacts,
            poll,
            lifecycle,
        }
    }

    pub fn lifecycle(&self) -> &LifecyclePolicy {
        &self.lifecycle
    }

    pub fn artifacts(&self) -> &ArtifactPipeline {
        &self.artifacts
    }

    /// Handle one user submission.
    ///
    /// Rejected submissions return the state untouched and make no remote
    /// call. A remote failure keeps the user turn (the message may already
    /// be on the remote thread) but appends no reply. A synthesis failure
    /// still appends the reply, without audio.
    pub async fn handle(&self, mut state: SessionState, text: &str) -> TurnResult {
        if let Err(rejected) = self.lifecycle.open_turn(&mut state, text) {
            tracing::info!(
                user_turns = state.user_turn_count,
                reason = %rejected,
                "Submission rejected"
            );
            return TurnResult {
                state,
                outcome: Err(rejected.into()),
            };
        }

        tracing::info!(
            thread_id = %state.thread_id,
            user_turns = state.user_turn_count,
            "Accepted user turn"
        );

        let reply =
            match submit_and_await(self.assistant.as_ref(), &self.poll, &state.thread_id, text)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!(error = %e, "Turn failed waiting for assistant");
                    self.lifecycle.close_turn(&mut state, None);
                    return TurnResult {
                        state,
                        outcome: Err(e.into()),
                    };
                }
            };

        let (audio, audio_error) = match self.artifacts.synthesize(&reply).await {
            Ok(audio) => (Some(audio), None),
            Err(e) => {
                tracing::warn!(error = %e, "Reply will be shown without audio");
                (None, Some(e.to_string()))
            }
        };

        let rest_notice = self
            .lifecycle
            .close_turn(&mut state, Some(Turn::assistant(&reply, audio.clone())));

        TurnResult {
            state,
            outcome: Ok(TurnOutcome {
                reply,
                audio,
                audio_error,
                rest_notice,
            }),
        }
    }
}
