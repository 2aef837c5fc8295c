//! The quest-script interpreter.
//!
//! The engine is a plain synchronous object: calls mutate it, and every
//! observable change is published on an unbounded event channel handed out
//! at construction. Text and list changes are coalesced per entry point and
//! only published when the value actually differs — including a change to
//! an empty list. Menu, message, file-request, and error events fire at the
//! statement that causes them.

use crate::codec;
use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEvent, ErrorData};
use crate::game::{GameData, ListItem, MenuEntry};
use crate::parser::{Statement, parse_menu_entries, parse_statements};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Which version a host is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    /// The player version the engine emulates.
    Player,
    /// The version of this library.
    Library,
}

/// Location executed when an object is selected, if the game defines it.
const OBJECT_SELECTED_LOCATION: &str = "onobjsel";

/// Maximum `gosub`/`goto` nesting before execution is aborted.
const MAX_CALL_DEPTH: usize = 100;

/// Name of a defined action together with its stored body.
#[derive(Debug, Clone)]
struct ActionSlot {
    item: ListItem,
    body: Vec<Statement>,
    origin: Origin,
}

/// Where a piece of code came from, for error reports.
#[derive(Debug, Clone)]
struct Origin {
    location: String,
    line: usize,
}

/// The quest-script execution engine.
#[derive(Debug)]
pub struct Engine {
    game: GameData,
    main: String,
    actions: Vec<ActionSlot>,
    objects: Vec<ListItem>,
    menu: Option<Vec<MenuEntry>>,
    message: Option<String>,
    vars: HashMap<String, String>,
    selected_action: Option<usize>,
    selected_object: Option<usize>,
    pending_include: Option<String>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl Engine {
    /// Create an engine and the receiving end of its event stream.
    pub fn create() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            game: GameData::default(),
            main: String::new(),
            actions: Vec::new(),
            objects: Vec::new(),
            menu: None,
            message: None,
            vars: HashMap::new(),
            selected_action: None,
            selected_object: None,
            pending_include: None,
            events,
        };
        (engine, rx)
    }

    /// Load a quest binary.
    ///
    /// With `is_new_game` the binary replaces the current game and resets
    /// all runtime state without executing anything; a restart (or an
    /// explicit location) starts play. Without it the binary is merged as
    /// an included library, answering a pending
    /// [`EngineEvent::OpenGameRequested`].
    pub fn open_game(&mut self, bytes: &[u8], is_new_game: bool) -> EngineResult<()> {
        let data = codec::decode(bytes)?;
        if is_new_game {
            self.with_notifications(|e| {
                e.game = data;
                e.reset_runtime();
                Ok(())
            })
        } else {
            self.game.merge(data);
            if let Some(path) = self.pending_include.take() {
                self.publish(EngineEvent::CloseFileRequested { path });
            }
            Ok(())
        }
    }

    /// Reset all runtime state and execute the game's first location.
    pub fn restart_game(&mut self) -> EngineResult<()> {
        let first = self
            .game
            .locations
            .first()
            .map(|l| l.name.clone())
            .ok_or(EngineError::NoGameLoaded)?;
        self.with_notifications(|e| {
            e.reset_runtime();
            e.run_location(&first, 0)
        })
    }

    /// Execute a location by name without a restart.
    pub fn exec_loc(&mut self, name: &str) -> EngineResult<()> {
        self.with_notifications(|e| e.run_location(name, 0))
    }

    /// Parse and execute a code string, as if it were a location line.
    pub fn exec_code(&mut self, code: &str) -> EngineResult<()> {
        let stmts = parse_statements(code)?;
        let origin = Origin {
            location: "(exec_code)".to_string(),
            line: 0,
        };
        self.with_notifications(|e| e.run_statements(&stmts, &origin, 0))
    }

    /// Mark an action as selected. Execution happens separately via
    /// [`Engine::exec_selected_action`].
    pub fn select_action(&mut self, index: usize) -> EngineResult<()> {
        if index >= self.actions.len() {
            return Err(EngineError::InvalidSelection {
                kind: "action",
                index,
                len: self.actions.len(),
            });
        }
        self.selected_action = Some(index);
        Ok(())
    }

    /// Execute the body of the currently selected action.
    pub fn exec_selected_action(&mut self) -> EngineResult<()> {
        let index = self
            .selected_action
            .ok_or(EngineError::NothingSelected { kind: "action" })?;
        let slot = self
            .actions
            .get(index)
            .ok_or(EngineError::InvalidSelection {
                kind: "action",
                index,
                len: self.actions.len(),
            })?;
        let body = slot.body.clone();
        let origin = slot.origin.clone();
        self.with_notifications(|e| e.run_statements(&body, &origin, 0))
    }

    /// Select an object. Binds `$selobj` to the object's name and runs the
    /// game's `onobjsel` location when it defines one.
    pub fn select_object(&mut self, index: usize) -> EngineResult<()> {
        let item = self
            .objects
            .get(index)
            .ok_or(EngineError::InvalidSelection {
                kind: "object",
                index,
                len: self.objects.len(),
            })?;
        self.vars.insert("$selobj".to_string(), item.name.clone());
        self.selected_object = Some(index);
        if self.game.find(OBJECT_SELECTED_LOCATION).is_none() {
            return Ok(());
        }
        self.with_notifications(|e| e.run_location(OBJECT_SELECTED_LOCATION, 0))
    }

    /// Select a menu entry: closes the menu and executes the entry's bound
    /// location.
    pub fn select_menu(&mut self, index: usize) -> EngineResult<()> {
        let entries = self.menu.as_ref().ok_or(EngineError::NoMenuOpen)?;
        let entry = entries
            .get(index)
            .cloned()
            .ok_or(EngineError::InvalidSelection {
                kind: "menu entry",
                index,
                len: entries.len(),
            })?;
        self.menu = None;
        self.with_notifications(|e| e.run_location(&entry.location, 0))
    }

    /// Dismiss the open message box, if any.
    pub fn close_message(&mut self) {
        self.message = None;
    }

    /// Report the requested version. Responds synchronously; there is no
    /// event involved.
    pub fn version(&self, kind: VersionKind) -> &'static str {
        match kind {
            VersionKind::Player => "5.8.0",
            VersionKind::Library => env!("CARGO_PKG_VERSION"),
        }
    }

    /// The accumulated main text.
    pub fn main_text(&self) -> &str {
        &self.main
    }

    /// The current action list.
    pub fn actions(&self) -> Vec<ListItem> {
        self.action_items()
    }

    /// The current object list.
    pub fn objects(&self) -> &[ListItem] {
        &self.objects
    }

    /// Whether a menu is currently open.
    pub fn is_menu_open(&self) -> bool {
        self.menu.is_some()
    }

    /// The text of the open message box, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Run `f` and publish coalesced change events for the main text and
    /// the two lists. Events fire even when `f` fails, so partial changes
    /// reach observers the way the real player would render them.
    fn with_notifications<F>(&mut self, f: F) -> EngineResult<()>
    where
        F: FnOnce(&mut Self) -> EngineResult<()>,
    {
        let main_before = self.main.clone();
        let actions_before = self.action_items();
        let objects_before = self.objects.clone();

        let result = f(self);

        if self.main != main_before {
            self.publish(EngineEvent::MainChanged(self.main.clone()));
        }
        let actions_now = self.action_items();
        if actions_now != actions_before {
            self.publish(EngineEvent::ActionsChanged(actions_now));
        }
        if self.objects != objects_before {
            self.publish(EngineEvent::ObjectsChanged(self.objects.clone()));
        }
        result
    }

    fn run_location(&mut self, name: &str, depth: usize) -> EngineResult<()> {
        let loc = self
            .game
            .find(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownLocation(name.to_string()))?;
        for (idx, line) in loc.lines.iter().enumerate() {
            let origin = Origin {
                location: loc.name.clone(),
                line: idx + 1,
            };
            let stmts = parse_statements(line)
                .map_err(|e| self.report(&origin, EngineError::Parse(e)))?;
            self.run_statements(&stmts, &origin, depth)?;
        }
        Ok(())
    }

    fn run_statements(
        &mut self,
        stmts: &[Statement],
        origin: &Origin,
        depth: usize,
    ) -> EngineResult<()> {
        for stmt in stmts {
            match stmt {
                Statement::Print(text) => {
                    let text = self.interpolate(text);
                    self.main.push_str(&text);
                    self.main.push_str("\r\n");
                }
                Statement::ClearMain => self.main.clear(),
                Statement::DefineAction { name, body } => {
                    let name = self.interpolate(name);
                    let slot = ActionSlot {
                        item: ListItem::new(name.clone()),
                        body: body.clone(),
                        origin: origin.clone(),
                    };
                    match self.actions.iter_mut().find(|s| s.item.name == name) {
                        Some(existing) => *existing = slot,
                        None => self.actions.push(slot),
                    }
                }
                Statement::AddObject(name) => {
                    let name = self.interpolate(name);
                    self.objects.push(ListItem::new(name));
                }
                Statement::DelObject(name) => {
                    let name = self.interpolate(name);
                    if let Some(pos) = self.objects.iter().position(|o| o.name == name) {
                        self.objects.remove(pos);
                        self.selected_object = shift_selection(self.selected_object, pos);
                    }
                }
                Statement::DelAction(name) => {
                    let name = self.interpolate(name);
                    if let Some(pos) = self.actions.iter().position(|s| s.item.name == name) {
                        self.actions.remove(pos);
                        self.selected_action = shift_selection(self.selected_action, pos);
                    }
                }
                Statement::IncludeLib(path) => {
                    let path = self.interpolate(path);
                    self.pending_include = Some(path.clone());
                    self.publish(EngineEvent::OpenGameRequested {
                        path,
                        is_new_game: false,
                    });
                }
                Statement::GoSub(target) => {
                    self.call_location(target, origin, depth)?;
                }
                Statement::GoTo(target) => {
                    self.actions.clear();
                    self.selected_action = None;
                    self.call_location(target, origin, depth)?;
                }
                Statement::Message(text) => {
                    let text = self.interpolate(text);
                    self.message = Some(text.clone());
                    self.publish(EngineEvent::MessageOpened(text));
                }
                Statement::Menu(spec) => {
                    let spec = self.interpolate(spec);
                    let entries = parse_menu_entries(&spec)
                        .map_err(|e| self.report(origin, EngineError::Parse(e)))?;
                    self.menu = Some(entries.clone());
                    self.publish(EngineEvent::MenuOpened(entries));
                }
                Statement::Assign { var, value } => {
                    let value = self.interpolate(value);
                    self.vars.insert(var.clone(), value);
                }
            }
        }
        Ok(())
    }

    fn call_location(&mut self, target: &str, origin: &Origin, depth: usize) -> EngineResult<()> {
        let target = self.interpolate(target);
        if self.game.find(&target).is_none() {
            return Err(self.report(origin, EngineError::UnknownLocation(target)));
        }
        if depth + 1 > MAX_CALL_DEPTH {
            return Err(self.report(origin, EngineError::CallDepthExceeded(target)));
        }
        self.run_location(&target, depth + 1)
    }

    /// Substitute `<<$var>>` references with the variable's current value.
    /// Unknown variables substitute as empty; non-variable expressions are
    /// passed through verbatim.
    fn interpolate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("<<") {
            out.push_str(&rest[..start]);
            let tail = &rest[start + 2..];
            match tail.find(">>") {
                Some(end) => {
                    let key = tail[..end].trim();
                    if key.starts_with('$') {
                        if let Some(value) = self.vars.get(key) {
                            out.push_str(value);
                        }
                    } else {
                        out.push_str(&tail[..end]);
                    }
                    rest = &tail[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn reset_runtime(&mut self) {
        self.main.clear();
        self.actions.clear();
        self.objects.clear();
        self.menu = None;
        self.message = None;
        self.vars.clear();
        self.selected_action = None;
        self.selected_object = None;
    }

    fn action_items(&self) -> Vec<ListItem> {
        self.actions.iter().map(|s| s.item.clone()).collect()
    }

    fn report(&self, origin: &Origin, err: EngineError) -> EngineError {
        self.publish(EngineEvent::RuntimeError(ErrorData {
            location: origin.location.clone(),
            line: origin.line,
            description: err.to_string(),
        }));
        err
    }

    /// Send an event, ignoring a dropped receiver: notifications are
    /// fire-and-forget.
    fn publish(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

/// Keep a selection index valid after removing the entry at `removed`.
fn shift_selection(selected: Option<usize>, removed: usize) -> Option<usize> {
    match selected {
        Some(sel) if sel == removed => None,
        Some(sel) if sel > removed => Some(sel - 1),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::parser::parse_game;

    fn load(source: &str) -> (Engine, mpsc::UnboundedReceiver<EngineEvent>) {
        let (mut engine, rx) = Engine::create();
        let game = parse_game(source).unwrap();
        engine.open_game(&encode(&game), true).unwrap();
        (engine, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn restart_runs_first_location() {
        let (mut engine, mut rx) = load("# begin\n  'Hello world'\n-\n");
        engine.restart_game().unwrap();
        assert_eq!(engine.main_text(), "Hello world\r\n");
        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::MainChanged("Hello world\r\n".to_string())]
        );
    }

    #[test]
    fn open_game_alone_executes_nothing() {
        let (engine, mut rx) = load("# begin\n  'Hello world'\n-\n");
        assert_eq!(engine.main_text(), "");
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn restart_without_game_fails() {
        let (mut engine, _rx) = Engine::create();
        assert!(matches!(
            engine.restart_game(),
            Err(EngineError::NoGameLoaded)
        ));
    }

    #[test]
    fn actions_are_defined_in_order_and_executable() {
        let (mut engine, mut rx) = load(
            "# begin\n  act 'First action': 'You click on the first action'\n  act 'Second action': 'two'\n-\n",
        );
        engine.restart_game().unwrap();
        let names: Vec<_> = engine.actions().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["First action", "Second action"]);

        engine.select_action(0).unwrap();
        engine.exec_selected_action().unwrap();
        assert_eq!(engine.main_text(), "You click on the first action\r\n");

        let events = drain(&mut rx);
        assert!(events.contains(&EngineEvent::MainChanged(
            "You click on the first action\r\n".to_string()
        )));
    }

    #[test]
    fn deleting_the_last_action_notifies_with_empty_list() {
        let (mut engine, mut rx) = load("# begin\n  act 'start': delact 'start'\n-\n");
        engine.restart_game().unwrap();
        drain(&mut rx);

        engine.select_action(0).unwrap();
        engine.exec_selected_action().unwrap();
        assert_eq!(drain(&mut rx), vec![EngineEvent::ActionsChanged(Vec::new())]);
    }

    #[test]
    fn objects_are_added_and_removed() {
        let (mut engine, mut rx) = load(
            "# begin\n  addobj 'Sword'\n  addobj 'Shield'\n  act 'Fight': delobj 'Shield' & 'End of fight'\n-\n",
        );
        engine.restart_game().unwrap();
        drain(&mut rx);

        engine.select_action(0).unwrap();
        engine.exec_selected_action().unwrap();
        assert_eq!(engine.objects(), &[ListItem::new("Sword")]);
        assert_eq!(engine.main_text(), "End of fight\r\n");
    }

    #[test]
    fn unchanged_fields_publish_nothing() {
        let (mut engine, mut rx) = load("# begin\n  'text'\n-\n# noop\n-\n");
        engine.restart_game().unwrap();
        drain(&mut rx);

        engine.exec_loc("noop").unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn select_object_runs_handler_with_selobj_bound() {
        let (mut engine, _rx) = load(
            "# begin\n  addobj 'Potion'\n-\n# onobjsel\n  '<<$selobj>> is selected'\n-\n",
        );
        engine.restart_game().unwrap();
        engine.select_object(0).unwrap();
        assert_eq!(engine.main_text(), "Potion is selected\r\n");
    }

    #[test]
    fn select_object_without_handler_is_silent() {
        let (mut engine, _rx) = load("# begin\n  addobj 'Potion'\n-\n");
        engine.restart_game().unwrap();
        engine.select_object(0).unwrap();
        assert_eq!(engine.main_text(), "");
    }

    #[test]
    fn inclib_requests_open_and_merge_answers_with_close() {
        let (mut engine, mut rx) = load("# begin\n  inclib 'lib.qsps'\n-\n");
        engine.restart_game().unwrap();
        let events = drain(&mut rx);
        assert!(events.contains(&EngineEvent::OpenGameRequested {
            path: "lib.qsps".to_string(),
            is_new_game: false,
        }));

        let lib = parse_game("# printHello\n  'Hello world'\n-\n").unwrap();
        engine.open_game(&encode(&lib), false).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::CloseFileRequested {
                path: "lib.qsps".to_string()
            }]
        );

        engine.exec_loc("printHello").unwrap();
        assert_eq!(engine.main_text(), "Hello world\r\n");
    }

    #[test]
    fn menu_opens_and_selection_runs_bound_location() {
        let (mut engine, mut rx) = load(
            "# begin\n  menu 'Say goodbye:goodbye;Ask:ask'\n-\n# goodbye\n  'Bye'\n-\n# ask\n-\n",
        );
        engine.restart_game().unwrap();
        let events = drain(&mut rx);
        assert!(matches!(events[0], EngineEvent::MenuOpened(ref e) if e.len() == 2));
        assert!(engine.is_menu_open());

        engine.select_menu(0).unwrap();
        assert!(!engine.is_menu_open());
        assert_eq!(engine.main_text(), "Bye\r\n");
    }

    #[test]
    fn select_menu_without_menu_fails() {
        let (mut engine, _rx) = load("# begin\n-\n");
        assert!(matches!(
            engine.select_menu(0),
            Err(EngineError::NoMenuOpen)
        ));
    }

    #[test]
    fn message_opens_and_dismisses() {
        let (mut engine, mut rx) = load("# begin\n  msg 'You shout loudly'\n-\n");
        engine.restart_game().unwrap();
        assert_eq!(engine.message(), Some("You shout loudly"));
        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::MessageOpened("You shout loudly".to_string())]
        );
        engine.close_message();
        assert_eq!(engine.message(), None);
    }

    #[test]
    fn goto_clears_actions_before_running_target() {
        let (mut engine, _rx) = load(
            "# begin\n  act 'Leave': goto 'outside'\n-\n# outside\n  'You are outside'\n-\n",
        );
        engine.restart_game().unwrap();
        engine.select_action(0).unwrap();
        engine.exec_selected_action().unwrap();
        assert!(engine.actions().is_empty());
        assert_eq!(engine.main_text(), "You are outside\r\n");
    }

    #[test]
    fn unknown_location_reports_a_runtime_error() {
        let (mut engine, mut rx) = load("# begin\n  act 'Break': gosub 'nowhere'\n-\n");
        engine.restart_game().unwrap();
        drain(&mut rx);

        engine.select_action(0).unwrap();
        let err = engine.exec_selected_action().unwrap_err();
        assert!(matches!(err, EngineError::UnknownLocation(ref name) if name == "nowhere"));

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::RuntimeError(data) if data.location == "begin" && data.description.contains("nowhere")
        )));
    }

    #[test]
    fn runaway_recursion_is_cut_off() {
        let (mut engine, _rx) = load("# begin\n  gosub 'begin'\n-\n");
        let err = engine.restart_game().unwrap_err();
        assert!(matches!(err, EngineError::CallDepthExceeded(_)));
    }

    #[test]
    fn clear_main_coalesces_into_one_change() {
        let (mut engine, mut rx) = load(
            "# begin\n  'before'\n  act 'Drink': *clr & '+hp'\n-\n",
        );
        engine.restart_game().unwrap();
        drain(&mut rx);

        engine.select_action(0).unwrap();
        engine.exec_selected_action().unwrap();
        assert_eq!(engine.main_text(), "+hp\r\n");
        assert_eq!(
            drain(&mut rx),
            vec![EngineEvent::MainChanged("+hp\r\n".to_string())]
        );
    }

    #[test]
    fn exec_code_runs_injected_statements() {
        let (mut engine, _rx) = load("# begin\n-\n");
        engine.exec_code("'none'").unwrap();
        assert_eq!(engine.main_text(), "none\r\n");
    }

    #[test]
    fn version_is_reported_synchronously() {
        let (engine, _rx) = Engine::create();
        assert_eq!(engine.version(VersionKind::Player), "5.8.0");
        assert!(!engine.version(VersionKind::Library).is_empty());
    }

    #[test]
    fn selection_survives_removal_of_earlier_entries() {
        assert_eq!(shift_selection(Some(2), 0), Some(1));
        assert_eq!(shift_selection(Some(1), 1), None);
        assert_eq!(shift_selection(Some(0), 1), Some(0));
        assert_eq!(shift_selection(None, 0), None);
    }
}
