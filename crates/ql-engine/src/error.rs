//! Error types for the quest-script runtime.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while parsing quest source or single statements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lexer hit a character it cannot tokenize.
    #[error("unexpected character at byte {at}")]
    Lex {
        /// Byte offset of the offending character within the line.
        at: usize,
    },

    /// A `# name` header appeared while another location was still open.
    #[error("line {line}: location {name:?} opened inside location {outer:?}")]
    NestedLocation {
        /// Source line number (1-based).
        line: usize,
        /// Name of the location being opened.
        name: String,
        /// Name of the location that is still open.
        outer: String,
    },

    /// A statement appeared outside of any `# name` / `-` block.
    #[error("line {line}: statement outside of any location")]
    StrayStatement {
        /// Source line number (1-based).
        line: usize,
    },

    /// The source ended before the open location was closed with `-`.
    #[error("location {name:?} is never closed")]
    UnterminatedLocation {
        /// Name of the unterminated location.
        name: String,
    },

    /// The statement parser expected one token but found another.
    #[error("expected {expected}, found {found}")]
    Expected {
        /// Description of the expected token.
        expected: String,
        /// Description of the token actually found.
        found: String,
    },

    /// A statement keyword the runtime does not know.
    #[error("unknown statement {found:?}")]
    UnknownStatement {
        /// The unrecognized keyword.
        found: String,
    },

    /// A menu entry without a `label:location` binding.
    #[error("menu entry {entry:?} is missing a ':location' binding")]
    BadMenuEntry {
        /// The malformed entry text.
        entry: String,
    },
}

/// Errors raised by the engine itself: bad binaries, unknown locations,
/// invalid selections.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The binary does not start with the quest binary magic.
    #[error("not a quest binary: bad magic")]
    BadMagic,

    /// The binary ended in the middle of a record.
    #[error("quest binary is truncated")]
    TruncatedGame,

    /// A string inside the binary is not valid UTF-8.
    #[error("quest binary contains invalid UTF-8")]
    GameNotUtf8,

    /// An operation needed a loaded game but none is present.
    #[error("no game is loaded")]
    NoGameLoaded,

    /// A `gosub`/`goto`/selection referenced a location the game lacks.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// `exec_selected_action` was called with nothing selected.
    #[error("no {kind} is selected")]
    NothingSelected {
        /// What kind of entry was expected to be selected.
        kind: &'static str,
    },

    /// A selection index past the end of the current list.
    #[error("{kind} index {index} out of range ({len} available)")]
    InvalidSelection {
        /// What kind of list was indexed.
        kind: &'static str,
        /// The requested index.
        index: usize,
        /// The current list length.
        len: usize,
    },

    /// `select_menu` was called while no menu is open.
    #[error("no menu is open")]
    NoMenuOpen,

    /// Runaway `gosub`/`goto` recursion.
    #[error("call depth exceeded at location {0:?}")]
    CallDepthExceeded(String),

    /// A statement failed to parse at execution time.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
