//! Spoken reply artifacts
//!
//! Each assistant reply is synthesized once and written under a fresh
//! name, so no two replies (in this session or any earlier run) can share
//! or overwrite an artifact.

use crate::assistant::{RemoteError, SpeechService, VoiceProfile};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const ARTIFACT_PREFIX: &str = "lil_m_reply_";
const ARTIFACT_EXTENSION: &str = ".mp3";

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Speech synthesis failed: {0}")]
    Speech(#[from] RemoteError),
    #[error("Failed to store audio at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reference to a stored audio artifact, by file name within the artifact
/// directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AudioRef(String);

impl AudioRef {
    fn generate() -> Self {
        Self(format!(
            "{ARTIFACT_PREFIX}{}{ARTIFACT_EXTENSION}",
            uuid::Uuid::new_v4()
        ))
    }

    /// Accept only names this pipeline could have generated
    pub fn parse(name: &str) -> Option<Self> {
        let id = name
            .strip_prefix(ARTIFACT_PREFIX)?
            .strip_suffix(ARTIFACT_EXTENSION)?;
        uuid::Uuid::parse_str(id).ok()?;
        Some(Self(name.to_string()))
    }

    pub fn file_name(&self) -> &str {
        &self.0
    }

    /// URL the chat page plays this artifact from
    pub fn url(&self) -> String {
        format!("/audio/{}", self.0)
    }
}

/// Synthesizes replies and stores the audio in a directory
pub struct ArtifactPipeline {
    speech: Arc<dyn SpeechService>,
    voice: VoiceProfile,
    dir: PathBuf,
}

impl ArtifactPipeline {
    pub fn new(speech: Arc<dyn SpeechService>, voice: VoiceProfile, dir: impl Into<PathBuf>) -> Self {
        Self {
            speech,
            voice,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, audio: &AudioRef) -> PathBuf {
        self.dir.join(audio.file_name())
    }

    /// Synthesize the full reply text and store it under a new name
    pub async fn synthesize(&self, reply: &str) -> Result<AudioRef, SynthesisError> {
        let bytes = self.speech.synthesize_speech(reply, &self.voice).await?;

        let audio = AudioRef::generate();
        let path = self.path_of(&audio);
        let write_error = |source| SynthesisError::Write {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(write_error)?;
        tokio::fs::write(&path, &bytes).await.map_err(write_error)?;

        tracing::info!(
            artifact = %audio.file_name(),
            bytes = bytes.len(),
            voice = %self.voice.voice,
            "Stored spoken reply"
        );
        Ok(audio)
    }
}
