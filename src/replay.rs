//! Scripted sessions: feed recorded pointer and key events through the
//! interaction handler and collect the resulting state.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SessionConfig};
use crate::handler::{Gesture, InteractionHandler};
use crate::keybindings::Key;
use crate::model::{Item, Vector2d};
use crate::state::{Action, Dispatch, State, Store, reducers};

/// One recorded input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Pointer moved without a button held, or while dragging
    Move { x: f32, y: f32 },
    /// Button pressed
    Down { x: f32, y: f32 },
    /// Button released
    Up { x: f32, y: f32 },
    KeyDown { key: Key },
    KeyUp { key: Key },
    /// Press and release of a key
    Key { key: Key },
    /// Action dispatched directly, bypassing the handler
    Dispatch(Action),
}

/// Items to annotate and the events to replay on them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    /// Item urls, one item per entry
    pub items: Vec<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Errors that can occur while replaying a script.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Script parsing error
    #[error("Failed to parse script: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error when reading the script
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Nothing to annotate
    #[error("Script has no items")]
    NoItems,
}

/// Load the session config from `path`, or from the default location when
/// none is given. A missing or broken default config falls back to defaults.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_config(path: Option<&std::path::Path>) -> Result<SessionConfig, ReplayError> {
    match path {
        Some(path) => Ok(SessionConfig::load(path)?),
        None => Ok(SessionConfig::load_from_default_path().unwrap_or_default()),
    }
}

/// Build the initial session for a script.
pub fn initial_state(config: &SessionConfig, script: &Script) -> Result<State, ReplayError> {
    if script.items.is_empty() {
        return Err(ReplayError::NoItems);
    }
    let mut state = State::new(config.task.clone());
    for url in &script.items {
        state = reducers::new_item(&state, |index, url| Item::new(index, url), url);
    }
    Ok(reducers::init_session(&state))
}

/// Replay every event and return the final state.
pub fn run(config: &SessionConfig, script: &Script) -> Result<State, ReplayError> {
    let mut store = Store::new(initial_state(config, script)?);
    let mut handler = InteractionHandler::new(
        config.keybindings.clone(),
        config.preferences.hit_radius,
    );
    handler.update_state(store.state());

    let mut gestures = (0, 0);
    for event in &script.events {
        match apply(&mut handler, &mut store, event) {
            Some(Gesture::Click) => gestures.0 += 1,
            Some(Gesture::DragEnd) => gestures.1 += 1,
            None => {}
        }
        handler.update_state(store.state());
    }

    log::info!(
        "▶️ Replayed {} events ({} clicks, {} drags), {} actions dispatched",
        script.events.len(),
        gestures.0,
        gestures.1,
        store.dispatched()
    );
    Ok(store.into_state())
}

fn apply(handler: &mut InteractionHandler, store: &mut Store, event: &Event) -> Option<Gesture> {
    let limit = handler.canvas_limit();
    match event {
        Event::Move { x, y } => {
            let coord = Vector2d::new(*x, *y);
            let hit = handler.hit_test(coord);
            handler.pointer_move(coord, limit, hit, store);
        }
        Event::Down { x, y } => {
            let coord = Vector2d::new(*x, *y);
            // Hover first so the label under the pointer is highlighted.
            let hit = handler.hit_test(coord);
            handler.pointer_move(coord, limit, hit, store);
            handler.pointer_down(coord);
        }
        Event::Up { x, y } => {
            let coord = Vector2d::new(*x, *y);
            let hit = handler.hit_test(coord);
            return handler.pointer_up(coord, limit, hit, store);
        }
        Event::KeyDown { key } => handler.key_down(*key, store),
        Event::KeyUp { key } => handler.key_up(*key),
        Event::Key { key } => {
            handler.key_down(*key, store);
            handler.update_state(store.state());
            handler.key_up(*key);
        }
        Event::Dispatch(action) => store.dispatch(action.clone()),
    }
    None
}
