//! Error types for file resolution and the game server.

use ql_engine::EngineError;
use thiserror::Error;

/// Result type for file store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors from the file resolver.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The underlying read failed; carries the I/O message. Terminal for
    /// the file's record — the store does not retry.
    #[error("failed to read {name:?}: {message}")]
    Read {
        /// The requested file name.
        name: String,
        /// The underlying I/O error message.
        message: String,
    },

    /// The file's record disappeared before resolving. Records live for
    /// the whole process, so this only happens if the store is torn down
    /// mid-fetch.
    #[error("file record for {name:?} was dropped before resolving")]
    RecordDropped {
        /// The requested file name.
        name: String,
    },
}

/// Errors from the game-open pipeline and server startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// File resolution failed. Fatal for the open operation, no retry.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The engine rejected the binary or the script failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A source-classified file did not contain UTF-8 text.
    #[error("game file {name:?} is not valid UTF-8 quest source")]
    SourceNotUtf8 {
        /// The offending file name.
        name: String,
    },

    /// `start` was called a second time on the same server.
    #[error("server already started")]
    AlreadyStarted,
}
