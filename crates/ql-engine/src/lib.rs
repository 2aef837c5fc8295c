//! Quest-script runtime for Questlab.
//!
//! This crate is the engine boundary of the harness: a parser for textual
//! quest source, the binary game format, and a deterministic interpreter
//! that publishes every observable change on a typed event stream instead
//! of host-registered callbacks. The harness crates treat it as opaque —
//! they speak only the loader, the selection calls, and the events.

/// The quest binary format: encode for the loader, decode inside it.
pub mod codec;
/// The interpreter and its event stream.
pub mod engine;
/// Error types used throughout the crate.
pub mod error;
/// Typed engine events and script error details.
pub mod event;
/// Loaded games, locations, and list entries.
pub mod game;
/// Statement tokens.
pub mod lexer;
/// Quest source and statement parsers.
pub mod parser;

/// Re-export the interpreter types.
pub use engine::{Engine, VersionKind};
/// Re-export error types.
pub use error::{EngineError, EngineResult, ParseError};
/// Re-export event types.
pub use event::{EngineEvent, ErrorData};
/// Re-export model types.
pub use game::{GameData, GameLocation, ListItem, MenuEntry};
