//! Observable client state for Questlab.
//!
//! The server side pushes engine events into a [`GameClient`]; observers
//! detect changes by comparing each field's stamp against a baseline
//! moment. Nothing here blocks: getters clone, setters replace.

/// Time-stamped values.
pub mod stamped;
/// The observable client state and its shared handle.
pub mod state;

/// Re-export the stamped value type.
pub use stamped::Stamped;
/// Re-export the state types.
pub use state::{ClientState, GameClient};
