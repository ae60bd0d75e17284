//! `OpenAI` Assistants and speech implementation

use super::types::{
    MessageRole, RunId, RunState, RunStatus, ThreadId, ThreadMessage, VoiceProfile,
};
use super::{AssistantService, RemoteError, SpeechService};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MESSAGE_PAGE_SIZE: u32 = 20;

/// Client for the hosted assistant. One instance serves both the
/// threaded assistant endpoints and speech synthesis.
pub struct OpenAIAssistant {
    client: Client,
    api_key: SecretString,
    assistant_id: String,
    base_url: String,
}

impl OpenAIAssistant {
    pub fn new(
        api_key: SecretString,
        assistant_id: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            assistant_id: assistant_id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send(&self, op: &'static str, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let start = Instant::now();
        let result = self.authorized(builder).send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                RemoteError::network(format!("Connection failed: {e}"))
            } else {
                RemoteError::unknown(format!("Request failed: {e}"))
            }
        });

        let result = match result {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(error_from_response(response).await),
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => tracing::info!(
                op,
                duration_ms = %start.elapsed().as_millis(),
                "Remote call completed"
            ),
            Err(e) => tracing::error!(
                op,
                duration_ms = %start.elapsed().as_millis(),
                error = %e.message,
                transient = e.kind.is_transient(),
                "Remote call failed"
            ),
        }

        result
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = self.send(op, builder).await?;
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::network(format!("Failed to read response: {e}")))?;
        serde_json::from_str(&body).map_err(|e| {
            RemoteError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

async fn error_from_response(response: Response) -> RemoteError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return RemoteError::network(format!("Failed to read response: {e}")),
    };

    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => RemoteError::from_status(status.as_u16(), &parsed.error.message),
        Err(_) => RemoteError::from_status(status.as_u16(), &body),
    }
}

#[async_trait]
impl AssistantService for OpenAIAssistant {
    async fn create_thread(&self) -> Result<ThreadId, RemoteError> {
        let created: IdObject = self
            .send_json(
                "create_thread",
                self.client
                    .post(self.url("threads"))
                    .json(&serde_json::json!({})),
            )
            .await?;
        Ok(ThreadId::new(created.id))
    }

    async fn post_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), RemoteError> {
        let body = CreateMessageRequest {
            role: role.as_str(),
            content: text,
        };
        let _: IdObject = self
            .send_json(
                "post_message",
                self.client
                    .post(self.url(&format!("threads/{thread}/messages")))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn start_run(&self, thread: &ThreadId) -> Result<RunId, RemoteError> {
        let body = CreateRunRequest {
            assistant_id: &self.assistant_id,
        };
        let run: IdObject = self
            .send_json(
                "start_run",
                self.client
                    .post(self.url(&format!("threads/{thread}/runs")))
                    .json(&body),
            )
            .await?;
        Ok(RunId::new(run.id))
    }

    async fn get_run_status(
        &self,
        thread: &ThreadId,
        run: &RunId,
    ) -> Result<RunState, RemoteError> {
        let run: RunObject = self
            .send_json(
                "get_run_status",
                self.client
                    .get(self.url(&format!("threads/{thread}/runs/{run}"))),
            )
            .await?;
        Ok(RunState {
            status: run.status,
            last_error: run.last_error.map(|e| e.message),
        })
    }

    async fn list_messages(&self, thread: &ThreadId) -> Result<Vec<ThreadMessage>, RemoteError> {
        let list: MessageList = self
            .send_json(
                "list_messages",
                self.client
                    .get(self.url(&format!("threads/{thread}/messages")))
                    .query(&[("order", "desc")])
                    .query(&[("limit", MESSAGE_PAGE_SIZE)]),
            )
            .await?;
        Ok(list.data.into_iter().map(MessageObject::normalize).collect())
    }
}

#[async_trait]
impl SpeechService for OpenAIAssistant {
    async fn synthesize_speech(
        &self,
        text: &str,
        voice: &VoiceProfile,
    ) -> Result<Vec<u8>, RemoteError> {
        let body = SpeechRequest {
            model: &voice.model,
            voice: &voice.voice,
            input: text,
            response_format: "mp3",
        };
        let response = self
            .send(
                "synthesize_speech",
                self.client.post(self.url("audio/speech")).json(&body),
            )
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::network(format!("Failed to read audio: {e}")))?;
        Ok(bytes.to_vec())
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    status: RunStatus,
    #[serde(default)]
    last_error: Option<RunLastError>,
}

#[derive(Debug, Deserialize)]
struct RunLastError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: MessageRole,
    #[serde(default)]
    content: Vec<MessageContent>,
}

impl MessageObject {
    /// Flatten the text parts; other content kinds (images, files) are skipped
    fn normalize(self) -> ThreadMessage {
        let text = self
            .content
            .into_iter()
            .filter_map(|part| part.text.map(|t| t.value))
            .collect::<Vec<_>>()
            .join("\n");
        ThreadMessage::new(self.role, text)
    }
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
