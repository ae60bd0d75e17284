//! Single-slot persistence for the conversation thread id
//!
//! The slot holds exactly one raw thread identifier. There is no schema and
//! no integrity check: a stale or invalid id surfaces as a remote failure on
//! first use, not here.

use crate::assistant::{AssistantService, RemoteError, ThreadId};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Thread store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Single-entry key-value store for the thread id
pub trait ThreadStore: Send + Sync {
    /// The stored id, or `None` if nothing has been saved yet
    fn load(&self) -> StoreResult<Option<ThreadId>>;

    /// Overwrite the stored id
    fn save(&self, id: &ThreadId) -> StoreResult<()>;
}

/// Thread store backed by a single text file
#[derive(Debug, Clone)]
pub struct FileThreadStore {
    path: PathBuf,
}

impl FileThreadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ThreadStore for FileThreadStore {
    fn load(&self) -> StoreResult<Option<ThreadId>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(ThreadId::new(trimmed)))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, id: &ThreadId) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, id.as_str()).map_err(|e| self.io_error(e))
    }
}

/// Load the persisted thread, or create one remotely and persist it.
///
/// A failed load is treated as "no prior thread". A failed save is logged
/// and the new id is still returned: persistence only decides whether the
/// next process reuses this thread.
pub async fn resolve_thread(
    store: &dyn ThreadStore,
    assistant: &dyn AssistantService,
) -> Result<ThreadId, RemoteError> {
    match store.load() {
        Ok(Some(id)) => {
            tracing::info!(thread_id = %id, "Reusing persisted thread");
            return Ok(id);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load thread id, creating a new thread");
        }
    }

    let id = assistant.create_thread().await?;
    tracing::info!(thread_id = %id, "Created new thread");

    if let Err(e) = store.save(&id) {
        tracing::warn!(error = %e, "Failed to persist thread id");
    }

    Ok(id)
}
