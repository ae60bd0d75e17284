//! Remote completion poller
//!
//! Posts the user's message, starts a run, and waits for the run to finish
//! by checking its status at a fixed interval. The wait is bounded by both
//! an attempt cap and a wall-clock deadline.

use crate::assistant::{AssistantService, MessageRole, RemoteError, RunStatus, ThreadId};
use std::time::{Duration, Instant};
use thiserror::Error;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MAX_ATTEMPTS: u32 = 240;
const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Error)]
pub enum PollError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("Assistant run ended with status {status}{}", detail_suffix(.message))]
    RunFailed {
        status: RunStatus,
        message: Option<String>,
    },
    #[error("Assistant did not finish after {attempts} status checks ({elapsed:?})")]
    Timeout { attempts: u32, elapsed: Duration },
    #[error("Assistant finished without a text reply")]
    EmptyReply,
}

#[allow(clippy::ref_option)] // error attribute fields are passed by reference
fn detail_suffix(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// Bounds on the status-polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Submit `text` to the thread and wait for the assistant's reply.
///
/// A failure after the message is posted leaves it on the remote thread;
/// nothing is rolled back.
pub async fn submit_and_await(
    assistant: &dyn AssistantService,
    policy: &PollPolicy,
    thread: &ThreadId,
    text: &str,
) -> Result<String, PollError> {
    assistant
        .post_message(thread, MessageRole::User, text)
        .await?;
    let run = assistant.start_run(thread).await?;
    tracing::info!(thread_id = %thread, run_id = %run, "Started assistant run");

    let start = Instant::now();
    let mut attempts = 0;
    loop {
        let state = assistant.get_run_status(thread, &run).await?;
        attempts += 1;
        tracing::debug!(run_id = %run, status = %state.status, attempts, "Polled run status");

        if state.status == RunStatus::Completed {
            break;
        }
        if state.status.is_dead_end() {
            return Err(PollError::RunFailed {
                status: state.status,
                message: state.last_error,
            });
        }

        let elapsed = start.elapsed();
        if attempts >= policy.max_attempts || elapsed + policy.interval > policy.deadline {
            tracing::warn!(
                run_id = %run,
                attempts,
                elapsed_ms = %elapsed.as_millis(),
                "Gave up waiting for run"
            );
            return Err(PollError::Timeout { attempts, elapsed });
        }
        tokio::time::sleep(policy.interval).await;
    }

    tracing::info!(
        run_id = %run,
        attempts,
        duration_ms = %start.elapsed().as_millis(),
        "Assistant run completed"
    );

    let messages = assistant.list_messages(thread).await?;
    messages
        .into_iter()
        .find(|m| m.role == MessageRole::Assistant)
        .map(|m| m.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(PollError::EmptyReply)
}
