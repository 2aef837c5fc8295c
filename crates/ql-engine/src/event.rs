//! Typed events the engine publishes instead of registering callbacks.
//!
//! The stream is one-directional (engine → consumer). The two file requests
//! are acknowledged implicitly: a completed load answers
//! [`EngineEvent::OpenGameRequested`], and
//! [`EngineEvent::CloseFileRequested`] needs no action at all.

use crate::game::{ListItem, MenuEntry};

/// Details of a script error hit while executing a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorData {
    /// Name of the location that was executing.
    pub location: String,
    /// Line number within the location body (1-based, 0 for injected code).
    pub line: usize,
    /// Human-readable description of the failure.
    pub description: String,
}

/// A notification published by the engine.
///
/// List- and text-valued events carry the full replacement value; consumers
/// overwrite their copy whole, never merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The main text changed; carries the complete new text.
    MainChanged(String),
    /// The action list changed; carries the complete new list.
    ActionsChanged(Vec<ListItem>),
    /// The object list changed; carries the complete new list.
    ObjectsChanged(Vec<ListItem>),
    /// A menu was opened with the given entries.
    MenuOpened(Vec<MenuEntry>),
    /// A message box was opened with the given text.
    MessageOpened(String),
    /// The script asked the host to load another game file.
    OpenGameRequested {
        /// Name of the file to load, relative to the game directory.
        path: String,
        /// Whether the file replaces the current game or merges into it.
        is_new_game: bool,
    },
    /// The engine is done with a previously requested file.
    CloseFileRequested {
        /// Name of the file that can be released.
        path: String,
    },
    /// A script error occurred while executing a location.
    RuntimeError(ErrorData),
}
