//! Error types for the test harness.

use ql_engine::EngineError;
use ql_server::ServerError;
use std::time::Duration;
use thiserror::Error;

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// A failed assertion or a failed step underneath one.
///
/// Every variant renders a human-readable diagnostic; name lookups list
/// every currently available name in list order.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Starting the server or opening a game failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// A selection or execution call was rejected by the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// No fresh value arrived within the harness timeout.
    #[error("timed out after {0:?} waiting for a fresh value")]
    Timeout(Duration),

    /// A name lookup missed; lists everything that was available.
    #[error("Not found {name:?} in:\n{}", bullet_list(.available))]
    NotFound {
        /// The requested name.
        name: String,
        /// All names available at the time, in list order.
        available: Vec<String>,
    },

    /// A name was present that should not be.
    #[error("{what} list should not contain {name:?}")]
    Unexpected {
        /// Which list was checked.
        what: &'static str,
        /// The name that was unexpectedly present.
        name: String,
    },

    /// An observed value differed from the expected one.
    #[error("expected {what} {expected}, got {actual}")]
    Mismatch {
        /// What was compared.
        what: &'static str,
        /// The expected value, already rendered.
        expected: String,
        /// The observed value, already rendered.
        actual: String,
    },

    /// A menu assertion ran while no menu was open.
    #[error("no menu is open")]
    NoMenuOpen,

    /// A message assertion ran while no message box was open.
    #[error("no message box is open")]
    NoMessageOpen,
}

fn bullet_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("* {n}"))
        .collect::<Vec<_>>()
        .join("\n")
}
