//! Single-flight file resolution rooted at a game directory.
//!
//! Each file name owns one record for the life of the store. The record is
//! registered and flipped to `Loading` synchronously, under the map lock,
//! before any asynchronous work starts — a concurrent request for the same
//! name finds the record and shares the one in-flight read. Resolution is
//! terminal: a record never reverts, and a failed read stays failed.

use crate::error::{StoreError, StoreResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// Resolved file contents, shared between all requesters of the name.
pub type FileBytes = Arc<[u8]>;

/// How a file's bytes are interpreted by the game-open pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Textual quest source that needs conversion before loading.
    Source,
    /// An already converted quest binary.
    Binary,
}

impl FileKind {
    /// Classify a file by name: anything mentioning `.qsps` is source.
    /// This substring check is the only format decision made from a name.
    pub fn of_name(name: &str) -> Self {
        if name.contains(".qsps") {
            Self::Source
        } else {
            Self::Binary
        }
    }
}

/// Lifecycle of one file's load.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// The record exists but no read has started.
    NotStarted,
    /// A read is in flight.
    Loading,
    /// The read finished; terminal.
    Resolved(Result<FileBytes, String>),
}

impl LoadState {
    /// Whether this state is terminal.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The resolution result, if resolved.
    pub fn resolved(&self) -> Option<&Result<FileBytes, String>> {
        match self {
            Self::Resolved(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct FileRecord {
    kind: FileKind,
    state: Arc<watch::Sender<LoadState>>,
}

/// The file cache. Explicitly owned and passed by reference; there is no
/// process-wide instance.
#[derive(Debug)]
pub struct FileStore {
    base: PathBuf,
    files: Mutex<HashMap<String, FileRecord>>,
}

impl FileStore {
    /// Create a store resolving names relative to `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            files: Mutex::new(HashMap::new()),
        }
    }

    /// The directory names are resolved against.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The classified kind of a (possibly not yet requested) file name.
    pub fn kind_of(&self, name: &str) -> FileKind {
        let files = self.lock_files();
        files
            .get(name)
            .map(|r| r.kind)
            .unwrap_or_else(|| FileKind::of_name(name))
    }

    /// Subscribe to a file's load state, starting the read if this is the
    /// first reference to the name. The receiver observes the terminal
    /// `Resolved` state at most once and immediately if already resolved.
    pub fn subscribe(&self, name: &str) -> watch::Receiver<LoadState> {
        let mut files = self.lock_files();
        if let Some(record) = files.get(name) {
            return record.state.subscribe();
        }

        let (tx, rx) = watch::channel(LoadState::NotStarted);
        let tx = Arc::new(tx);
        // Flip to Loading while still holding the map lock, so the read is
        // claimed before anyone else can observe the record.
        tx.send_replace(LoadState::Loading);
        files.insert(
            name.to_string(),
            FileRecord {
                kind: FileKind::of_name(name),
                state: Arc::clone(&tx),
            },
        );

        let path = self.base.join(name);
        let name = name.to_string();
        tokio::spawn(async move {
            let result = match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(FileBytes::from(bytes)),
                Err(err) => Err(err.to_string()),
            };
            debug!(file = %name, ok = result.is_ok(), "file read resolved");
            tx.send_replace(LoadState::Resolved(result));
        });
        rx
    }

    /// Resolve a file's bytes, awaiting the shared read if necessary.
    pub async fn fetch(&self, name: &str) -> StoreResult<FileBytes> {
        let mut rx = self.subscribe(name);
        let state = rx
            .wait_for(LoadState::is_resolved)
            .await
            .map_err(|_| StoreError::RecordDropped {
                name: name.to_string(),
            })?;
        match state.resolved() {
            Some(Ok(bytes)) => Ok(Arc::clone(bytes)),
            Some(Err(message)) => Err(StoreError::Read {
                name: name.to_string(),
                message: message.clone(),
            }),
            // wait_for only returns resolved states.
            None => Err(StoreError::RecordDropped {
                name: name.to_string(),
            }),
        }
    }

    fn lock_files(&self) -> std::sync::MutexGuard<'_, HashMap<String, FileRecord>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
