//! Intents dispatched by the interaction layer.
//!
//! Every change to the session goes through an `Action`, which `reduce` turns
//! into a new `State`.

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::model::{
    ItemIndex, Label, LabelId, LabelProps, ShapeGeometry, ShapeId, ShapeProps, TrackId,
    ViewerConfig,
};
use crate::track::{TrackManager, merge_tracks, terminate_track};

use super::links::{try_link_labels, try_unlink_labels};
use super::reducers;
use super::session::State;

/// Intents that can be applied to the session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    // Labels
    /// Add a label with its shapes to the current item
    AddLabel {
        label: Label,
        shapes: Vec<ShapeGeometry>,
    },
    /// Merge props into shapes of one item, pairwise
    ChangeShapes {
        item: ItemIndex,
        shapes: Vec<ShapeId>,
        props: Vec<ShapeProps>,
    },
    /// Merge non-geometry props into a label of the current item
    ChangeLabelProps { label: LabelId, props: LabelProps },
    /// Delete a label of the current item
    DeleteLabel { label: LabelId },

    // Selection
    /// Replace the selection
    SelectLabels { labels: Vec<LabelId> },
    /// Remove labels from the selection
    UnselectLabels { labels: Vec<LabelId> },

    // Link groups
    /// Link labels of one item into a single group
    LinkLabels { item: ItemIndex, labels: Vec<LabelId> },
    /// Dissolve the groups of labels of one item
    UnlinkLabels { item: ItemIndex, labels: Vec<LabelId> },

    // Tracks
    /// Start a track from a new label on an item
    AddTrack {
        item: ItemIndex,
        label: Label,
        shapes: Vec<ShapeGeometry>,
    },
    /// Record a manual edit of a track occurrence and propagate it
    UpdateTrack {
        track: TrackId,
        item: ItemIndex,
        shapes: Vec<ShapeGeometry>,
    },
    /// Delete every occurrence of a track after an item
    TerminateTrack { track: TrackId, item: ItemIndex },
    /// Merge tracks with disjoint occurrences into the first one
    MergeTracks { tracks: Vec<TrackId> },

    // Navigation
    /// Activate an item
    GoToItem { item: ItemIndex },
    /// Mark an item loaded
    LoadItem {
        item: ItemIndex,
        viewer_config: ViewerConfig,
    },

    // Layout and task
    /// Show or hide the assistant view
    ToggleAssistantView,
    /// Choose the label type for new labels
    SetLabelType { index: usize },
    /// Choose the category for new labels
    SetCategory { index: usize },
}

impl Action {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddLabel { .. } => "add_label",
            Action::ChangeShapes { .. } => "change_shapes",
            Action::ChangeLabelProps { .. } => "change_label_props",
            Action::DeleteLabel { .. } => "delete_label",
            Action::SelectLabels { .. } => "select_labels",
            Action::UnselectLabels { .. } => "unselect_labels",
            Action::LinkLabels { .. } => "link_labels",
            Action::UnlinkLabels { .. } => "unlink_labels",
            Action::AddTrack { .. } => "add_track",
            Action::UpdateTrack { .. } => "update_track",
            Action::TerminateTrack { .. } => "terminate_track",
            Action::MergeTracks { .. } => "merge_tracks",
            Action::GoToItem { .. } => "go_to_item",
            Action::LoadItem { .. } => "load_item",
            Action::ToggleAssistantView => "toggle_assistant_view",
            Action::SetLabelType { .. } => "set_label_type",
            Action::SetCategory { .. } => "set_category",
        }
    }
}

/// Apply an action strictly, reporting invalid references.
pub fn try_reduce(
    state: &State,
    action: Action,
    tracks: &TrackManager,
) -> Result<State, StateError> {
    match action {
        Action::AddLabel { label, shapes } => reducers::try_add_label(state, label, shapes),
        Action::ChangeShapes {
            item,
            shapes,
            props,
        } => reducers::try_change_shapes(state, item, &shapes, &props),
        Action::ChangeLabelProps { label, props } => {
            reducers::try_change_label_props(state, label, &props)
        }
        Action::DeleteLabel { label } => reducers::try_delete_label(state, label),
        Action::SelectLabels { labels } => Ok(reducers::select_labels(state, &labels)),
        Action::UnselectLabels { labels } => Ok(reducers::unselect_labels(state, &labels)),
        Action::LinkLabels { item, labels } => try_link_labels(state, item, &labels),
        Action::UnlinkLabels { item, labels } => try_unlink_labels(state, item, &labels),
        Action::AddTrack {
            item,
            label,
            shapes,
        } => tracks.on_label_created(state, item, label, shapes),
        Action::UpdateTrack {
            track,
            item,
            shapes,
        } => tracks.on_label_updated(state, track, item, &shapes),
        Action::TerminateTrack { track, item } => terminate_track(state, track, item),
        Action::MergeTracks { tracks: ids } => merge_tracks(state, &ids),
        Action::GoToItem { item } => reducers::try_go_to_item(state, item),
        Action::LoadItem {
            item,
            viewer_config,
        } => reducers::try_load_item(state, item, viewer_config),
        Action::ToggleAssistantView => Ok(reducers::toggle_assistant_view(state)),
        Action::SetLabelType { index } => Ok(reducers::set_label_type(state, index)),
        Action::SetCategory { index } => Ok(reducers::set_category(state, index)),
    }
}

/// Apply an action. Invalid references are logged and leave the state unchanged.
pub fn reduce(state: &State, action: Action, tracks: &TrackManager) -> State {
    let name = action.name();
    match try_reduce(state, action, tracks) {
        Ok(next) => next,
        Err(e) => {
            log::warn!("{} ignored: {}", name, e);
            state.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, LabelType, Vector2d, box2d_geometry};
    use crate::state::session::TaskConfig;

    fn session() -> State {
        let state = reducers::new_item(
            &State::new(TaskConfig::default()),
            |index, url| Item::new(index, url),
            "a.jpg",
        );
        reducers::init_session(&state)
    }

    fn add_box() -> Action {
        Action::AddLabel {
            label: Label::new(LabelType::Box2d),
            shapes: box2d_geometry([
                Vector2d::new(0.0, 0.0),
                Vector2d::new(4.0, 0.0),
                Vector2d::new(4.0, 4.0),
                Vector2d::new(0.0, 4.0),
            ]),
        }
    }

    #[test]
    fn test_reduce_add_then_delete() {
        let tracks = TrackManager::default();
        let state = reduce(&session(), add_box(), &tracks);
        let id = state.current.label.expect("label added");
        let state = reduce(&state, Action::DeleteLabel { label: id }, &tracks);
        assert!(state.items[0].labels.is_empty());
    }

    #[test]
    fn test_reduce_invalid_reference_is_noop() {
        let tracks = TrackManager::default();
        let state = session();
        let next = reduce(&state, Action::DeleteLabel { label: 42 }, &tracks);
        assert_eq!(next, state);
        assert_eq!(
            try_reduce(&state, Action::GoToItem { item: 3 }, &tracks),
            Err(StateError::ItemNotFound { index: 3 })
        );
    }

    #[test]
    fn test_action_json_is_tagged() {
        let json = serde_json::to_string(&Action::GoToItem { item: 2 })
            .expect("Failed to serialize action");
        assert_eq!(json, r#"{"action":"go_to_item","item":2}"#);
        let parsed: Action = serde_json::from_str(r#"{"action":"toggle_assistant_view"}"#)
            .expect("Failed to parse action");
        assert_eq!(parsed, Action::ToggleAssistantView);
    }
}
