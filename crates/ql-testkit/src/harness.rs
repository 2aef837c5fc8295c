//! The polling test client.
//!
//! A [`TestClient`] owns a started server and watches the observable state
//! for values stamped after a baseline moment. The baseline advances on
//! every selection, so an assertion after a selection always waits for the
//! update that selection triggered. Polling runs every 50 ms with an
//! explicit timeout; a game that never answers fails the assertion instead
//! of hanging until the test runner gives up.

use crate::error::{HarnessError, HarnessResult};
use ql_client::{GameClient, Stamped};
use ql_engine::{Engine, ErrorData, ListItem};
use ql_server::{GameServer, StartingLocation};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default delay between polls of the observable state.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default ceiling on any single wait for a fresh value.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// A started game plus the assertion surface of the harness.
pub struct TestClient {
    server: GameServer,
    engine: Arc<Mutex<Engine>>,
    client: GameClient,
    /// Stamp of the moment before the game was opened. Selections match
    /// names against lists fresher than this.
    started: Instant,
    /// Rolling baseline advanced by every selection; assertions wait for
    /// values fresher than this.
    baseline: Instant,
    poll_interval: Duration,
    timeout: Duration,
}

impl TestClient {
    /// Open `game_file` from `base_path` and launch it from its default
    /// starting location.
    pub async fn start(base_path: impl AsRef<Path>, game_file: &str) -> HarnessResult<Self> {
        Self::start_at(base_path, game_file, StartingLocation::Default).await
    }

    /// Open `game_file` from `base_path` with an explicit starting
    /// location.
    pub async fn start_at(
        base_path: impl AsRef<Path>,
        game_file: &str,
        starting: StartingLocation,
    ) -> HarnessResult<Self> {
        let started = Instant::now();
        let client = GameClient::new(started);
        let mut server = GameServer::new(base_path.as_ref());
        server.start(&client, game_file, starting).await?;
        let engine = server.engine();
        Ok(Self {
            server,
            engine,
            client,
            started,
            baseline: started,
            poll_interval: POLL_INTERVAL,
            timeout: POLL_TIMEOUT,
        })
    }

    /// Replace the per-wait timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The observable client state.
    pub fn client(&self) -> &GameClient {
        &self.client
    }

    /// The server driving the game.
    pub fn server(&self) -> &GameServer {
        &self.server
    }

    /// Poll until `get` returns a value stamped after the current
    /// baseline, then return it.
    pub async fn await_fresh<T: Clone>(
        &self,
        get: impl Fn(&GameClient) -> Stamped<T>,
    ) -> HarnessResult<Stamped<T>> {
        self.fresh_since(self.baseline, get).await
    }

    /// Assert that the main text settles to exactly `expected`.
    pub async fn main_equal(&self, expected: &str) -> HarnessResult<()> {
        let main = self.await_fresh(|c| c.main()).await?;
        if main.value() == expected {
            Ok(())
        } else {
            Err(HarnessError::Mismatch {
                what: "main text",
                expected: format!("{expected:?}"),
                actual: format!("{:?}", main.value()),
            })
        }
    }

    /// Assert that the action list settles to exactly `expected`.
    pub async fn actions_equal(&self, expected: &[ListItem]) -> HarnessResult<()> {
        let actions = self.await_fresh(|c| c.actions()).await?;
        Self::lists_equal("actions", expected, actions.value())
    }

    /// Assert that the object list settles to exactly `expected`.
    pub async fn objects_equal(&self, expected: &[ListItem]) -> HarnessResult<()> {
        let objects = self.await_fresh(|c| c.objects()).await?;
        Self::lists_equal("objects", expected, objects.value())
    }

    /// Assert that a fresh action list contains `name`.
    pub async fn has_action(&self, name: &str) -> HarnessResult<()> {
        let actions = self.await_fresh(|c| c.actions()).await?;
        Self::list_contains(name, actions.value())
    }

    /// Assert that a fresh action list does not contain `name`.
    pub async fn not_has_action(&self, name: &str) -> HarnessResult<()> {
        let actions = self.await_fresh(|c| c.actions()).await?;
        Self::list_lacks("action", name, actions.value())
    }

    /// Assert that a fresh object list contains `name`.
    pub async fn has_object(&self, name: &str) -> HarnessResult<()> {
        let objects = self.await_fresh(|c| c.objects()).await?;
        Self::list_contains(name, objects.value())
    }

    /// Assert that a fresh object list does not contain `name`.
    pub async fn not_has_object(&self, name: &str) -> HarnessResult<()> {
        let objects = self.await_fresh(|c| c.objects()).await?;
        Self::list_lacks("object", name, objects.value())
    }

    /// Assert that a fresh menu contains an entry labelled `name`.
    pub async fn has_menu(&self, name: &str) -> HarnessResult<()> {
        let labels = self.fresh_menu_labels().await?;
        if labels.iter().any(|l| l == name) {
            Ok(())
        } else {
            Err(HarnessError::NotFound {
                name: name.to_string(),
                available: labels,
            })
        }
    }

    /// Assert that a fresh menu has no entry labelled `name`.
    pub async fn not_has_menu(&self, name: &str) -> HarnessResult<()> {
        let labels = self.fresh_menu_labels().await?;
        if labels.iter().any(|l| l == name) {
            Err(HarnessError::Unexpected {
                what: "menu",
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Assert that a fresh message box shows exactly `expected`.
    pub async fn message_equal(&self, expected: &str) -> HarnessResult<()> {
        let message = self.await_fresh(|c| c.message()).await?;
        match message.value() {
            Some(text) if text == expected => Ok(()),
            Some(text) => Err(HarnessError::Mismatch {
                what: "message",
                expected: format!("{expected:?}"),
                actual: format!("{text:?}"),
            }),
            None => Err(HarnessError::NoMessageOpen),
        }
    }

    /// Dismiss the open message box.
    pub async fn dismiss_message(&self) {
        self.engine.lock().await.close_message();
    }

    /// Select the action named `name` and execute it.
    ///
    /// The name is matched exactly against the current action list; a miss
    /// fails with a diagnostic listing every available action.
    pub async fn select(&mut self, name: &str) -> HarnessResult<()> {
        let actions = self.fresh_since(self.started, |c| c.actions()).await?;
        let index = Self::index_of(name, actions.value())?;
        self.baseline = Instant::now();
        let mut engine = self.engine.lock().await;
        engine.select_action(index)?;
        engine.exec_selected_action()?;
        Ok(())
    }

    /// Select the object named `name`.
    pub async fn select_object(&mut self, name: &str) -> HarnessResult<()> {
        let objects = self.fresh_since(self.started, |c| c.objects()).await?;
        let index = Self::index_of(name, objects.value())?;
        self.baseline = Instant::now();
        self.engine.lock().await.select_object(index)?;
        Ok(())
    }

    /// Select the menu entry labelled `name`.
    pub async fn select_menu(&mut self, name: &str) -> HarnessResult<()> {
        let menu = self.fresh_since(self.started, |c| c.menu()).await?;
        let entries = menu.value().as_ref().ok_or(HarnessError::NoMenuOpen)?;
        let index = entries.iter().position(|e| e.label == name).ok_or_else(|| {
            HarnessError::NotFound {
                name: name.to_string(),
                available: entries.iter().map(|e| e.label.clone()).collect(),
            }
        })?;
        self.baseline = Instant::now();
        self.engine.lock().await.select_menu(index)?;
        Ok(())
    }

    /// Inject a code string into the running game.
    pub async fn exec_code(&mut self, code: &str) -> HarnessResult<()> {
        self.baseline = Instant::now();
        self.engine.lock().await.exec_code(code)?;
        Ok(())
    }

    /// Wait for a script error stamped after the current baseline.
    pub async fn await_error(&self) -> HarnessResult<Stamped<ErrorData>> {
        let poll = async {
            loop {
                if let Some(error) = self.client.error() {
                    if error.is_fresher_than(self.baseline) {
                        return error;
                    }
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };
        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| HarnessError::Timeout(self.timeout))
    }

    async fn fresh_since<T: Clone>(
        &self,
        baseline: Instant,
        get: impl Fn(&GameClient) -> Stamped<T>,
    ) -> HarnessResult<Stamped<T>> {
        let poll = async {
            loop {
                let value = get(&self.client);
                if value.is_fresher_than(baseline) {
                    return value;
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };
        tokio::time::timeout(self.timeout, poll)
            .await
            .map_err(|_| HarnessError::Timeout(self.timeout))
    }

    async fn fresh_menu_labels(&self) -> HarnessResult<Vec<String>> {
        let menu = self.await_fresh(|c| c.menu()).await?;
        let entries = menu.value().as_ref().ok_or(HarnessError::NoMenuOpen)?;
        Ok(entries.iter().map(|e| e.label.clone()).collect())
    }

    fn index_of(name: &str, items: &[ListItem]) -> HarnessResult<usize> {
        items
            .iter()
            .position(|item| item.name == name)
            .ok_or_else(|| HarnessError::NotFound {
                name: name.to_string(),
                available: items.iter().map(|i| i.name.clone()).collect(),
            })
    }

    fn lists_equal(
        what: &'static str,
        expected: &[ListItem],
        actual: &[ListItem],
    ) -> HarnessResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(HarnessError::Mismatch {
                what,
                expected: format!("{:?}", names(expected)),
                actual: format!("{:?}", names(actual)),
            })
        }
    }

    fn list_contains(name: &str, items: &[ListItem]) -> HarnessResult<()> {
        if items.iter().any(|i| i.name == name) {
            Ok(())
        } else {
            Err(HarnessError::NotFound {
                name: name.to_string(),
                available: names(items),
            })
        }
    }

    fn list_lacks(what: &'static str, name: &str, items: &[ListItem]) -> HarnessResult<()> {
        if items.iter().any(|i| i.name == name) {
            Err(HarnessError::Unexpected {
                what,
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn names(items: &[ListItem]) -> Vec<String> {
    items.iter().map(|i| i.name.clone()).collect()
}
