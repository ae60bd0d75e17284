//! Mock implementations for testing
//!
//! These mocks stand in for the hosted services so turns can be exercised
//! without network access.

use crate::assistant::{
    AssistantService, MessageRole, RemoteError, RunId, RunState, RunStatus, SpeechService,
    ThreadId, ThreadMessage, VoiceProfile,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock Assistant
// ============================================================================

/// A remote call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantCall {
    CreateThread,
    PostMessage { thread: ThreadId, text: String },
    StartRun { thread: ThreadId },
    GetRunStatus { run: RunId },
    ListMessages { thread: ThreadId },
}

#[derive(Default)]
struct MockThread {
    threads_created: u32,
    runs_started: u32,
    /// Statuses handed out in order; `completed` once exhausted
    run_states: VecDeque<RunState>,
    /// Replies posted to the thread each time a run completes
    replies: VecDeque<String>,
    /// Thread contents, oldest first
    history: Vec<ThreadMessage>,
    /// Fixed answer for `list_messages`, most recent first
    listed: Option<Vec<ThreadMessage>>,
    post_failure: Option<RemoteError>,
    calls: Vec<AssistantCall>,
}

/// Scriptable assistant that records every call
#[derive(Default)]
pub struct MockAssistant {
    inner: Mutex<MockThread>,
}

#[allow(dead_code)]
impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// An assistant that completes each run immediately with the next reply
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for reply in replies {
            mock.queue_reply(reply);
        }
        mock
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.inner.lock().unwrap().replies.push_back(reply.into());
    }

    pub fn queue_statuses(&self, statuses: impl IntoIterator<Item = RunStatus>) {
        self.queue_run_states(statuses.into_iter().map(RunState::new));
    }

    pub fn queue_run_states(&self, states: impl IntoIterator<Item = RunState>) {
        self.inner.lock().unwrap().run_states.extend(states);
    }

    pub fn set_messages(&self, messages: Vec<ThreadMessage>) {
        self.inner.lock().unwrap().listed = Some(messages);
    }

    /// Make every `post_message` fail with `error`
    pub fn fail_post_message(&self, error: RemoteError) {
        self.inner.lock().unwrap().post_failure = Some(error);
    }

    pub fn calls(&self) -> Vec<AssistantCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn status_checks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, AssistantCall::GetRunStatus { .. }))
            .count()
    }

    pub fn threads_created(&self) -> u32 {
        self.inner.lock().unwrap().threads_created
    }

    pub fn posted_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                AssistantCall::PostMessage { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AssistantService for MockAssistant {
    async fn create_thread(&self) -> Result<ThreadId, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(AssistantCall::CreateThread);
        inner.threads_created += 1;
        Ok(ThreadId::new(format!(
            "thread_mock_{}",
            inner.threads_created
        )))
    }

    async fn post_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(AssistantCall::PostMessage {
            thread: thread.clone(),
            text: text.to_string(),
        });
        if let Some(error) = &inner.post_failure {
            return Err(error.clone());
        }
        inner.history.push(ThreadMessage::new(role, text));
        Ok(())
    }

    async fn start_run(&self, thread: &ThreadId) -> Result<RunId, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(AssistantCall::StartRun {
            thread: thread.clone(),
        });
        inner.runs_started += 1;
        Ok(RunId::new(format!("run_mock_{}", inner.runs_started)))
    }

    async fn get_run_status(
        &self,
        _thread: &ThreadId,
        run: &RunId,
    ) -> Result<RunState, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .calls
            .push(AssistantCall::GetRunStatus { run: run.clone() });
        let state = inner
            .run_states
            .pop_front()
            .unwrap_or_else(|| RunState::new(RunStatus::Completed));
        if state.status == RunStatus::Completed {
            if let Some(reply) = inner.replies.pop_front() {
                inner
                    .history
                    .push(ThreadMessage::new(MessageRole::Assistant, reply));
            }
        }
        Ok(state)
    }

    async fn list_messages(&self, thread: &ThreadId) -> Result<Vec<ThreadMessage>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(AssistantCall::ListMessages {
            thread: thread.clone(),
        });
        if let Some(listed) = &inner.listed {
            return Ok(listed.clone());
        }
        Ok(inner.history.iter().rev().cloned().collect())
    }
}

// ============================================================================
// Mock Speech
// ============================================================================

/// Speech mock whose "audio" is the UTF-8 bytes of the input text
pub struct MockSpeech {
    requests: Mutex<Vec<String>>,
    fail: bool,
}

#[allow(dead_code)]
impl MockSpeech {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechService for MockSpeech {
    async fn synthesize_speech(
        &self,
        text: &str,
        _voice: &VoiceProfile,
    ) -> Result<Vec<u8>, RemoteError> {
        self.requests.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(RemoteError::server_error("voice service unavailable"));
        }
        Ok(text.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactPipeline;
    use crate::poller::{PollError, PollPolicy};
    use crate::session::{LifecyclePolicy, Notice, Role, SessionState, Turn, TurnRejected};
    use crate::turn::{TurnError, TurnHandler};
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_poll() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 20,
            deadline: Duration::from_secs(5),
        }
    }

    fn handler(assistant: &Arc<MockAssistant>, speech: &Arc<MockSpeech>, dir: &Path) -> TurnHandler {
        TurnHandler::new(
            assistant.clone(),
            ArtifactPipeline::new(speech.clone(), VoiceProfile::default(), dir),
            fast_poll(),
            LifecyclePolicy::default(),
        )
    }

    fn session_at(count: u32) -> SessionState {
        let mut state = SessionState::new(ThreadId::new("thread_1"));
        state.user_turn_count = count;
        state.intro_shown = count > 0;
        state
    }

    #[tokio::test]
    async fn test_fresh_session_hello() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = Arc::new(MockAssistant::replying(["hi there"]));
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(&assistant, &speech, dir.path());

        let result = handler.handle(session_at(0), "hello").await;
        let outcome = result.outcome.unwrap();
        let state = result.state;

        assert_eq!(state.user_turn_count, 1);
        assert_eq!(outcome.reply, "hi there");
        let audio = outcome.audio.clone().unwrap();

        let turns = state.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].notice, Some(Notice::Intro));
        assert_eq!(turns[1], Turn::user("hello"));
        assert_eq!(turns[2], Turn::assistant("hi there", Some(audio.clone())));

        // The artifact holds the synthesized reply
        let stored = std::fs::read(dir.path().join(audio.file_name())).unwrap();
        assert_eq!(stored, b"hi there");
        assert_eq!(speech.requests(), vec!["hi there"]);
    }

    #[tokio::test]
    async fn test_fifth_message_appends_rest_notice() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = Arc::new(MockAssistant::replying(["take a breath"]));
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(&assistant, &speech, dir.path());

        let result = handler.handle(session_at(4), "fifth").await;
        let outcome = result.outcome.unwrap();

        assert!(outcome.rest_notice);
        assert_eq!(result.state.user_turn_count, 5);
        let turns = result.state.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0], Turn::user("fifth"));
        assert_eq!(turns[1].text, "take a breath");
        assert!(turns[1].audio.is_some());
        assert_eq!(turns[2].notice, Some(Notice::Rest));
        assert!(turns[2].audio.is_none());
    }

    #[tokio::test]
    async fn test_closed_session_makes_no_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = Arc::new(MockAssistant::replying(["should not be used"]));
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(&assistant, &speech, dir.path());

        let result = handler.handle(session_at(7), "are you there?").await;

        assert!(matches!(
            result.outcome,
            Err(TurnError::Rejected(TurnRejected::Closed { limit: 7 }))
        ));
        assert_eq!(result.state.user_turn_count, 7);
        assert!(result.state.turns().is_empty());
        assert!(assistant.calls().is_empty());
        assert!(speech.requests().is_empty());
    }

    #[tokio::test]
    async fn test_full_session_runs_to_close() {
        let dir = tempfile::tempdir().unwrap();
        let replies: Vec<String> = (1..=7).map(|i| format!("reply {i}")).collect();
        let assistant = Arc::new(MockAssistant::replying(replies));
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(&assistant, &speech, dir.path());

        let mut state = session_at(0);
        for i in 1..=8 {
            let result = handler.handle(state, &format!("message {i}")).await;
            state = result.state;
            if i <= 7 {
                assert!(result.outcome.is_ok(), "turn {i} should succeed");
            } else {
                assert!(matches!(
                    result.outcome,
                    Err(TurnError::Rejected(TurnRejected::Closed { .. }))
                ));
            }
        }

        assert_eq!(state.user_turn_count, 7);
        assert_eq!(assistant.posted_texts().len(), 7);

        let turns = state.turns();
        // intro + 7 user + 7 assistant + rest notice
        assert_eq!(turns.len(), 16);
        assert_eq!(turns.iter().filter(|t| t.role == Role::User).count(), 7);
        assert_eq!(
            turns
                .iter()
                .filter(|t| t.notice == Some(Notice::Rest))
                .count(),
            1
        );

        // Every reply got its own artifact
        let refs: HashSet<_> = turns.iter().filter_map(|t| t.audio.clone()).collect();
        assert_eq!(refs.len(), 7);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 7);
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_text_reply() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = Arc::new(MockAssistant::replying(["words only"]));
        let speech = Arc::new(MockSpeech::failing());
        let handler = handler(&assistant, &speech, dir.path());

        let result = handler.handle(session_at(1), "hello").await;
        let outcome = result.outcome.unwrap();

        assert!(outcome.audio.is_none());
        assert!(outcome.audio_error.is_some());
        assert_eq!(
            result.state.turns().last(),
            Some(&Turn::assistant("words only", None))
        );
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_user_turn_only() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = Arc::new(MockAssistant::new());
        assistant.fail_post_message(RemoteError::network("connection refused"));
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(&assistant, &speech, dir.path());

        let result = handler.handle(session_at(2), "hello?").await;

        assert!(matches!(
            result.outcome,
            Err(TurnError::Poll(PollError::Remote(_)))
        ));
        assert_eq!(result.state.user_turn_count, 3);
        assert_eq!(result.state.turns(), &[Turn::user("hello?")]);
        assert!(speech.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_at_threshold_still_rests() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_run_states([RunState::failed("boom")]);
        let speech = Arc::new(MockSpeech::new());
        let handler = handler(&assistant, &speech, dir.path());

        let result = handler.handle(session_at(4), "fifth").await;

        assert!(matches!(
            result.outcome,
            Err(TurnError::Poll(PollError::RunFailed { .. }))
        ));
        let turns = result.state.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].notice, Some(Notice::Rest));
    }
}
