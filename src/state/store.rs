//! The dispatch sink and its in-crate implementation.

use crate::track::TrackManager;

use super::action::{Action, reduce};
use super::session::State;

/// Receives intents produced by the interaction layer.
pub trait Dispatch {
    fn dispatch(&mut self, action: Action);
}

/// Single-writer holder of the latest state snapshot.
#[derive(Debug, Default)]
pub struct Store {
    state: State,
    tracks: TrackManager,
    dispatched: usize,
}

impl Store {
    pub fn new(state: State) -> Self {
        Self::with_tracks(state, TrackManager::default())
    }

    /// Create a store with a custom policy registry.
    pub fn with_tracks(state: State, tracks: TrackManager) -> Self {
        Self {
            state,
            tracks,
            dispatched: 0,
        }
    }

    /// Latest published snapshot.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }

    pub fn tracks(&self) -> &TrackManager {
        &self.tracks
    }

    /// Number of actions applied so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}

impl Dispatch for Store {
    fn dispatch(&mut self, action: Action) {
        log::debug!("dispatch {}", action.name());
        self.state = reduce(&self.state, action, &self.tracks);
        self.dispatched += 1;
    }
}

/// Records actions without applying them.
impl Dispatch for Vec<Action> {
    fn dispatch(&mut self, action: Action) {
        self.push(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::state::reducers::new_item;
    use crate::state::session::TaskConfig;

    #[test]
    fn test_store_applies_actions_in_order() {
        let state = new_item(
            &State::new(TaskConfig::default()),
            |index, url| Item::new(index, url),
            "a.jpg",
        );
        let state = new_item(&state, |index, url| Item::new(index, url), "b.jpg");
        let mut store = Store::new(state);
        store.dispatch(Action::GoToItem { item: 1 });
        store.dispatch(Action::ToggleAssistantView);
        store.dispatch(Action::GoToItem { item: 0 });

        assert_eq!(store.dispatched(), 3);
        assert_eq!(store.state().current.item, Some(0));
        assert!(store.state().layout.assistant_view);
        assert_eq!(store.state().active_count(), 1);
    }
}
