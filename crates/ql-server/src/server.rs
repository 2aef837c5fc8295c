//! The game server: the open pipeline and the event-binding loop.

use crate::error::{ServerError, ServerResult};
use crate::files::{FileKind, FileStore};
use ql_client::GameClient;
use ql_engine::{Engine, EngineEvent, ErrorData, codec, parser};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// How a freshly opened game is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartingLocation {
    /// Load only; nothing executes until told to.
    None,
    /// Restart the game, which runs the script's first location.
    Default,
    /// Execute the named location, without a restart.
    Custom(String),
}

/// Owns the engine and the file store, forwards engine events into a
/// [`GameClient`].
#[derive(Debug)]
pub struct GameServer {
    engine: Arc<Mutex<Engine>>,
    files: Arc<FileStore>,
    events: Option<mpsc::UnboundedReceiver<EngineEvent>>,
}

impl GameServer {
    /// Create a server resolving game files relative to `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let (engine, events) = Engine::create();
        Self {
            engine: Arc::new(Mutex::new(engine)),
            files: Arc::new(FileStore::new(base_path)),
            events: Some(events),
        }
    }

    /// A shared handle to the engine, for issuing selection calls.
    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }

    /// A shared handle to the file store.
    pub fn files(&self) -> Arc<FileStore> {
        Arc::clone(&self.files)
    }

    /// Resolve a game file and hand it to the engine's loader.
    ///
    /// A read failure fails the whole operation with the underlying
    /// message; there is no retry and no timeout.
    pub async fn open_game(&self, name: &str, is_new_game: bool) -> ServerResult<()> {
        open_into_engine(&self.files, &self.engine, name, is_new_game).await
    }

    /// Start the server: spawn the event-binding task, open the initial
    /// game file, and apply the starting location.
    ///
    /// Can only be called once per server.
    pub async fn start(
        &mut self,
        client: &GameClient,
        game_file: &str,
        starting: StartingLocation,
    ) -> ServerResult<()> {
        let events = self.events.take().ok_or(ServerError::AlreadyStarted)?;
        tokio::spawn(bind_events(
            events,
            client.clone(),
            Arc::clone(&self.engine),
            Arc::clone(&self.files),
        ));

        self.open_game(game_file, true).await?;

        let mut engine = self.engine.lock().await;
        match starting {
            StartingLocation::None => {}
            StartingLocation::Default => engine.restart_game()?,
            StartingLocation::Custom(name) => engine.exec_loc(&name)?,
        }
        Ok(())
    }
}

/// The shared open pipeline: fetch, convert source to binary when the name
/// says so, load.
async fn open_into_engine(
    files: &FileStore,
    engine: &Mutex<Engine>,
    name: &str,
    is_new_game: bool,
) -> ServerResult<()> {
    let bytes = files.fetch(name).await?;
    let binary = match FileKind::of_name(name) {
        FileKind::Source => {
            let source =
                std::str::from_utf8(&bytes).map_err(|_| ServerError::SourceNotUtf8 {
                    name: name.to_string(),
                })?;
            let game = parser::parse_game(source).map_err(ql_engine::EngineError::from)?;
            codec::encode(&game)
        }
        FileKind::Binary => bytes.to_vec(),
    };
    debug!(file = %name, is_new_game, "opening game");
    engine.lock().await.open_game(&binary, is_new_game)?;
    Ok(())
}

/// Forward engine events into the client state, one at a time. Field
/// updates are serialized by this single consumer; no field is ever
/// updated concurrently with itself.
async fn bind_events(
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    client: GameClient,
    engine: Arc<Mutex<Engine>>,
    files: Arc<FileStore>,
) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::MainChanged(text) => client.set_main(text),
            EngineEvent::ActionsChanged(actions) => client.set_actions(actions),
            EngineEvent::ObjectsChanged(objects) => client.set_objects(objects),
            EngineEvent::MenuOpened(entries) => client.set_menu(entries),
            EngineEvent::MessageOpened(text) => client.set_message(text),
            EngineEvent::RuntimeError(error) => client.set_error(error),
            EngineEvent::OpenGameRequested { path, is_new_game } => {
                // The completed load is the acknowledgement the engine
                // waits for; a failure has no awaiting caller, so it is
                // recorded as a client-visible error.
                if let Err(err) = open_into_engine(&files, &engine, &path, is_new_game).await {
                    warn!(file = %path, %err, "requested game file could not be opened");
                    client.set_error(ErrorData {
                        location: path,
                        line: 0,
                        description: err.to_string(),
                    });
                }
            }
            EngineEvent::CloseFileRequested { path } => {
                // Nothing is held open per file; acknowledge and move on.
                debug!(file = %path, "close file acknowledged");
            }
        }
    }
}
