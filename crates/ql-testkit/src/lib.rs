//! Test harness for Questlab games.
//!
//! [`TestClient`] starts a full server around a game file and exposes
//! named assertions over the observable state. Assertions poll: each one
//! waits for a value stamped after the last selection, so a test reads as
//! a linear script even though the game runs on its own tasks.
//!
//! ```no_run
//! use ql_testkit::TestClient;
//!
//! # async fn demo() -> ql_testkit::HarnessResult<()> {
//! let mut game = TestClient::start("mocks", "helloWorld.qsps").await?;
//! game.main_equal("Hello world\r\n").await?;
//! # Ok(())
//! # }
//! ```

/// Harness error types.
pub mod error;
/// The polling test client.
pub mod harness;

/// Re-export error types.
pub use error::{HarnessError, HarnessResult};
/// Re-export the test client.
pub use harness::TestClient;
