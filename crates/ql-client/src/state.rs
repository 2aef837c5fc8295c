//! The observable client state fed by the event-binding loop.

use crate::stamped::Stamped;
use ql_engine::{ErrorData, ListItem, MenuEntry};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Everything the client can observe about the running game.
///
/// Each field is an independently replaceable [`Stamped`] value; setters
/// overwrite the whole field, never merge. Menu and message state hold data
/// only — selecting or dismissing is an engine call, not a stored callback.
#[derive(Debug, Clone)]
pub struct ClientState {
    /// The main text panel.
    pub main: Stamped<String>,
    /// The action list.
    pub actions: Stamped<Vec<ListItem>>,
    /// The object list.
    pub objects: Stamped<Vec<ListItem>>,
    /// Entries of the most recently opened menu, `None` before any menu.
    pub menu: Stamped<Option<Vec<MenuEntry>>>,
    /// Text of the most recently opened message box, `None` before any.
    pub message: Stamped<Option<String>>,
    /// The last script error, if any.
    pub error: Option<Stamped<ErrorData>>,
}

impl ClientState {
    /// Empty state with every field stamped at the given baseline moment.
    pub fn new(at: Instant) -> Self {
        Self {
            main: Stamped::new(at, String::new()),
            actions: Stamped::new(at, Vec::new()),
            objects: Stamped::new(at, Vec::new()),
            menu: Stamped::new(at, None),
            message: Stamped::new(at, None),
            error: None,
        }
    }
}

/// Shared handle over [`ClientState`] with typed getters and setters.
///
/// Getters return a clone of the stamped field so observers can poll
/// without holding the lock. Lock poisoning is ignored: every write is a
/// whole-field replacement, so a panicked writer cannot leave a field half
/// updated.
#[derive(Debug, Clone)]
pub struct GameClient {
    state: Arc<Mutex<ClientState>>,
}

impl GameClient {
    /// Create a client whose fields are all stamped at `at`.
    pub fn new(at: Instant) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClientState::new(at))),
        }
    }

    /// Replace the main text.
    pub fn set_main(&self, text: String) {
        self.with_state(|s| s.main = Stamped::now(text));
    }

    /// The current main text.
    pub fn main(&self) -> Stamped<String> {
        self.with_state(|s| s.main.clone())
    }

    /// Replace the action list.
    pub fn set_actions(&self, actions: Vec<ListItem>) {
        self.with_state(|s| s.actions = Stamped::now(actions));
    }

    /// The current action list.
    pub fn actions(&self) -> Stamped<Vec<ListItem>> {
        self.with_state(|s| s.actions.clone())
    }

    /// Replace the object list.
    pub fn set_objects(&self, objects: Vec<ListItem>) {
        self.with_state(|s| s.objects = Stamped::now(objects));
    }

    /// The current object list.
    pub fn objects(&self) -> Stamped<Vec<ListItem>> {
        self.with_state(|s| s.objects.clone())
    }

    /// Record a newly opened menu.
    pub fn set_menu(&self, entries: Vec<MenuEntry>) {
        self.with_state(|s| s.menu = Stamped::now(Some(entries)));
    }

    /// The most recently opened menu.
    pub fn menu(&self) -> Stamped<Option<Vec<MenuEntry>>> {
        self.with_state(|s| s.menu.clone())
    }

    /// Record a newly opened message box.
    pub fn set_message(&self, text: String) {
        self.with_state(|s| s.message = Stamped::now(Some(text)));
    }

    /// The most recently opened message box.
    pub fn message(&self) -> Stamped<Option<String>> {
        self.with_state(|s| s.message.clone())
    }

    /// Record a script error.
    pub fn set_error(&self, error: ErrorData) {
        self.with_state(|s| s.error = Some(Stamped::now(error)));
    }

    /// The last script error, if any.
    pub fn error(&self) -> Option<Stamped<ErrorData>> {
        self.with_state(|s| s.error.clone())
    }

    /// A full snapshot of the current state.
    pub fn snapshot(&self) -> ClientState {
        self.with_state(|s| s.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ClientState) -> R) -> R {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_start_stamped_at_the_baseline() {
        let at = Instant::now();
        let client = GameClient::new(at);
        assert_eq!(client.main().updated(), at);
        assert_eq!(client.actions().updated(), at);
        assert!(client.error().is_none());
    }

    #[test]
    fn setters_replace_whole_fields_with_fresh_stamps() {
        let at = Instant::now();
        let client = GameClient::new(at);

        client.set_main("hello".to_string());
        let main = client.main();
        assert_eq!(main.value(), "hello");
        assert!(main.updated() >= at);

        client.set_actions(vec![ListItem::new("start")]);
        assert_eq!(client.actions().value().len(), 1);
    }

    #[test]
    fn field_updates_are_independent() {
        let at = Instant::now();
        let client = GameClient::new(at);
        client.set_objects(vec![ListItem::new("Sword")]);

        assert!(client.objects().is_fresher_than(at));
        assert!(!client.main().is_fresher_than(at));
    }

    #[test]
    fn menu_and_message_hold_data_only() {
        let client = GameClient::new(Instant::now());
        client.set_menu(vec![MenuEntry {
            label: "Say goodbye".to_string(),
            location: "goodbye".to_string(),
        }]);
        client.set_message("You shout loudly".to_string());

        let menu = client.menu();
        assert_eq!(menu.value().as_ref().map(Vec::len), Some(1));
        assert_eq!(
            client.message().into_value().as_deref(),
            Some("You shout loudly")
        );
    }

    #[test]
    fn error_is_recorded_with_a_stamp() {
        let at = Instant::now();
        let client = GameClient::new(at);
        client.set_error(ErrorData {
            location: "begin".to_string(),
            line: 1,
            description: "unknown location: nowhere".to_string(),
        });
        let error = client.error().expect("error should be recorded");
        assert!(error.updated() >= at);
        assert_eq!(error.value().location, "begin");
    }
}
