//! Server side of Questlab: resolves game files and binds engine events to
//! the observable client state.
//!
//! The flow is one-directional. The engine publishes typed events; a single
//! binding task overwrites the corresponding client-state field for each,
//! so updates to any one field are serialized. The only request the engine
//! makes of the host — "open this game file" — is answered by running the
//! same open pipeline the initial load uses.

/// Error types for file resolution and the server.
pub mod error;
/// The single-flight file resolver.
pub mod files;
/// The game server and event-binding loop.
pub mod server;

/// Re-export error types.
pub use error::{ServerError, ServerResult, StoreError, StoreResult};
/// Re-export file resolver types.
pub use files::{FileBytes, FileKind, FileStore, LoadState};
/// Re-export server types.
pub use server::{GameServer, StartingLocation};
