//! Pointer and keyboard interaction state machine.
//!
//! The handler turns raw pointer and key events into drawable edits and
//! dispatched actions. It reads the latest state snapshot delivered through
//! `update_state` and never mutates the state directly.

mod context;
#[cfg(test)]
mod tests;

pub use context::{Hit, LabelContext};

use std::collections::HashSet;

use crate::constants::{DRAG_THRESHOLD_SQ, HANDLE_HIT_RADIUS};
use crate::drawable::{Drawable, make_drawable};
use crate::keybindings::{Key, KeyBindings, KeyCommand, key_to_string};
use crate::model::{ItemIndex, LabelId, LabelProps, ShapeProps, Size, Vector2d};
use crate::state::{Action, Dispatch, State, linked_label_ids};

/// Gesture classification of the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    /// No gesture in progress
    #[default]
    Idle,
    /// Button held, gesture not yet classified
    PointerDown,
    /// Button held and moved past the drag threshold
    Dragging,
    /// A selected label is mid-construction
    Editing,
}

/// How a completed pointer gesture was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Click,
    DragEnd,
}

/// Interaction state machine over one `LabelContext`.
#[derive(Debug, Clone)]
pub struct InteractionHandler {
    state: State,
    context: LabelContext,
    bindings: KeyBindings,
    hit_radius: f32,
    gesture: GestureState,
    down: Option<Vector2d>,
    held_keys: HashSet<Key>,
    synced_item: Option<ItemIndex>,
}

impl Default for InteractionHandler {
    fn default() -> Self {
        Self::new(KeyBindings::default(), HANDLE_HIT_RADIUS)
    }
}

impl InteractionHandler {
    pub fn new(bindings: KeyBindings, hit_radius: f32) -> Self {
        Self {
            state: State::default(),
            context: LabelContext::new(),
            bindings,
            hit_radius,
            gesture: GestureState::Idle,
            down: None,
            held_keys: HashSet::new(),
            synced_item: None,
        }
    }

    pub fn context(&self) -> &LabelContext {
        &self.context
    }

    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn hit_radius(&self) -> f32 {
        self.hit_radius
    }

    /// Default hit test against the current drawables.
    pub fn hit_test(&self, coord: Vector2d) -> Option<Hit> {
        self.context.hit_test(coord, self.hit_radius)
    }

    /// Canvas bounds of the active item.
    pub fn canvas_limit(&self) -> Size {
        self.state
            .current_item()
            .and_then(|item| item.viewer_config.as_ref())
            .map(|config| Size::new(config.image_width, config.image_height))
            .unwrap_or_default()
    }

    /// Receive a new state snapshot. Drawables are rebuilt unless a pointer
    /// gesture is in flight; drafts survive as long as the item stays active.
    pub fn update_state(&mut self, state: &State) {
        self.state = state.clone();
        if matches!(
            self.gesture,
            GestureState::PointerDown | GestureState::Dragging
        ) {
            return;
        }
        let same_item = self.synced_item == state.current.item;
        self.context.sync(
            state.current_item(),
            &state.current.selected_labels,
            same_item,
        );
        self.synced_item = state.current.item;
        self.gesture = self.resting_state();
    }

    fn multi_select_held(&self) -> bool {
        self.held_keys.iter().any(Key::is_multi_select)
    }

    fn resting_state(&self) -> GestureState {
        if self.context.selection_editing() {
            GestureState::Editing
        } else {
            GestureState::Idle
        }
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    pub fn pointer_down(&mut self, coord: Vector2d) {
        self.down = Some(coord);
        self.gesture = GestureState::PointerDown;
    }

    pub fn pointer_move(
        &mut self,
        coord: Vector2d,
        limit: Size,
        hit: Option<Hit>,
        dispatch: &mut dyn Dispatch,
    ) {
        log::trace!("pointer move ({}, {})", coord.x, coord.y);
        for i in self.context.selected().to_vec() {
            if let Some(label) = self.context.label_mut(i) {
                label.on_mouse_move(coord, limit);
            }
        }

        let Some(down) = self.down else {
            self.update_highlight(hit);
            self.gesture = self.resting_state();
            return;
        };
        if self.gesture != GestureState::Dragging {
            if (coord - down).length_sq() < DRAG_THRESHOLD_SQ {
                return;
            }
            self.gesture = GestureState::Dragging;
            log::debug!("Drag started at ({}, {})", down.x, down.y);
            self.resolve_selection(down, dispatch);
        }
        self.forward_drag(down, coord, limit);
    }

    /// Finish a pointer gesture. Returns `None` if no button was down.
    pub fn pointer_up(
        &mut self,
        coord: Vector2d,
        limit: Size,
        hit: Option<Hit>,
        dispatch: &mut dyn Dispatch,
    ) -> Option<Gesture> {
        let down = self.down.take()?;

        let gesture = if (coord - down).length_sq() < DRAG_THRESHOLD_SQ {
            self.on_click(coord, hit, dispatch);
            Gesture::Click
        } else {
            if self.gesture != GestureState::Dragging {
                self.resolve_selection(down, dispatch);
                self.forward_drag(down, coord, limit);
            }
            Gesture::DragEnd
        };

        let highlighted = self.context.highlighted();
        for i in self.context.selected().to_vec() {
            if Some(i) == highlighted {
                continue;
            }
            if let Some(label) = self.context.label_mut(i) {
                label.set_highlighted(false, None);
            }
        }
        if gesture == Gesture::DragEnd {
            for i in self.context.selected().to_vec() {
                if let Some(label) = self.context.label_mut(i) {
                    label.on_mouse_drag_end(coord);
                }
            }
        }

        let mut selected = self.context.selected().to_vec();
        selected.sort_unstable();
        for i in selected.into_iter().rev() {
            self.commit_label(i, dispatch);
        }

        self.gesture = self.resting_state();
        log::debug!("Pointer up resolved as {:?}", gesture);
        Some(gesture)
    }

    fn forward_drag(&mut self, down: Vector2d, coord: Vector2d, limit: Size) {
        for i in self.context.selected().to_vec() {
            if let Some(label) = self.context.label_mut(i) {
                label.on_mouse_drag(down, coord, limit);
            }
        }
    }

    fn update_highlight(&mut self, hit: Option<Hit>) {
        let hit = hit.filter(|hit| {
            self.context
                .label(hit.label)
                .is_some_and(|label| hit.handle < label.handle_count())
        });
        let previous = self.context.highlighted();
        let next = hit.map(|hit| hit.label);
        if let Some(previous) = previous.filter(|p| Some(*p) != next) {
            if let Some(label) = self.context.label_mut(previous) {
                label.set_highlighted(false, None);
            }
        }
        if let Some(hit) = hit {
            if let Some(label) = self.context.label_mut(hit.label) {
                label.set_highlighted(true, Some(hit.handle));
            }
        }
        self.context.set_highlighted(next);
    }

    fn on_click(&mut self, coord: Vector2d, hit: Option<Hit>, dispatch: &mut dyn Dispatch) {
        if !self.context.selection_editing() {
            self.update_highlight(hit);
        }
        self.resolve_selection(coord, dispatch);
        if !self.multi_select_held() {
            for i in self.context.selected().to_vec() {
                if let Some(label) = self.context.label_mut(i) {
                    label.on_mouse_click(coord);
                }
            }
        }
    }

    /// Select the highlighted label, or start a draft at `seed` when nothing
    /// is highlighted. Skipped while a selected label is mid-edit. A
    /// multi-select click on empty canvas keeps the selection as it is.
    fn resolve_selection(&mut self, seed: Vector2d, dispatch: &mut dyn Dispatch) {
        if self.context.selection_editing() {
            return;
        }
        if self.context.highlighted().is_some() {
            self.select_highlighted(dispatch);
        } else if !self.multi_select_held() {
            self.clear_selection(dispatch);
            self.start_draft(seed);
        }
    }

    fn clear_selection(&mut self, dispatch: &mut dyn Dispatch) {
        for i in self.context.selected().to_vec() {
            if let Some(label) = self.context.label_mut(i) {
                label.set_highlighted(false, None);
            }
        }
        let drafts: Vec<usize> = (0..self.context.labels().len())
            .filter(|i| {
                self.context
                    .label(*i)
                    .is_some_and(|label| label.label_id().is_none())
            })
            .collect();
        for i in drafts.into_iter().rev() {
            self.context.remove(i);
        }
        self.context.set_selected(Vec::new());
        if !self.state.current.selected_labels.is_empty() {
            dispatch.dispatch(Action::SelectLabels { labels: Vec::new() });
        }
    }

    fn start_draft(&mut self, seed: Vector2d) {
        let label_type = self.state.current_label_type();
        let Some(mut draft) = make_drawable(label_type) else {
            log::warn!("{} labels cannot be drawn", label_type.name());
            return;
        };
        draft.init_temp(&self.state, seed);
        draft.set_highlighted(true, None);
        let index = self.context.push(draft);
        self.context.set_selected(vec![index]);
        self.context.set_highlighted(Some(index));
        log::debug!("✏️ New {} draft at ({}, {})", label_type.name(), seed.x, seed.y);
    }

    fn select_highlighted(&mut self, dispatch: &mut dyn Dispatch) {
        let Some(highlighted) = self.context.highlighted() else {
            return;
        };
        let Some(id) = self
            .context
            .label(highlighted)
            .and_then(|label| label.label_id())
        else {
            if !self.context.selected().contains(&highlighted) {
                self.context.set_selected(vec![highlighted]);
            }
            return;
        };

        let mut linked: Vec<LabelId> = self
            .state
            .current_item()
            .map(|item| linked_label_ids(item, id))
            .unwrap_or_default();
        linked.retain(|member| *member != id);
        linked.insert(0, id);
        let indices: Vec<usize> = linked
            .iter()
            .filter_map(|member| self.context.index_of(*member))
            .collect();

        let mut selected = self.context.selected().to_vec();
        if self.multi_select_held() {
            if indices.iter().all(|i| selected.contains(i)) {
                selected.retain(|i| !indices.contains(i));
                self.context.set_selected(selected);
                dispatch.dispatch(Action::UnselectLabels { labels: linked });
            } else {
                for i in indices {
                    if !selected.contains(&i) {
                        selected.push(i);
                    }
                }
                self.context.set_selected(selected);
                dispatch.dispatch(Action::SelectLabels {
                    labels: self.context.selected_ids(),
                });
            }
            return;
        }

        let mut current = selected.clone();
        let mut wanted = indices.clone();
        current.sort_unstable();
        wanted.sort_unstable();
        if current != wanted {
            self.context.set_selected(indices);
            dispatch.dispatch(Action::SelectLabels { labels: linked });
        }
    }

    /// Persist the selected label at `index`, or drop it if it is neither
    /// valid nor being edited.
    fn commit_label(&mut self, index: usize, dispatch: &mut dyn Dispatch) {
        let Some(label) = self.context.label(index) else {
            return;
        };
        if !label.is_valid() && !label.editing() {
            log::debug!("Discarding invalid {} label", label.label_type().name());
            self.context.remove(index);
            return;
        }
        let Ok(item) = self.state.current_index() else {
            return;
        };
        let objects = label.shape_objects();

        match label.label_id() {
            None => {
                if label.editing() {
                    return;
                }
                let template = label.label().clone();
                if self.state.task.tracking {
                    dispatch.dispatch(Action::AddTrack {
                        item,
                        label: template,
                        shapes: objects.geometry,
                    });
                } else {
                    dispatch.dispatch(Action::AddLabel {
                        label: template,
                        shapes: objects.geometry,
                    });
                }
                self.context.remove(index);
            }
            Some(id) => {
                if !label.changed() {
                    return;
                }
                let track = label
                    .track()
                    .filter(|track| self.state.task.tracking && self.state.tracks.contains_key(track));
                dispatch.dispatch(Action::ChangeShapes {
                    item,
                    shapes: objects.ids.iter().flatten().copied().collect(),
                    props: objects.geometry.iter().map(ShapeProps::from_geometry).collect(),
                });
                dispatch.dispatch(Action::ChangeLabelProps {
                    label: id,
                    props: LabelProps::manual(),
                });
                if let Some(track) = track {
                    dispatch.dispatch(Action::UpdateTrack {
                        track,
                        item,
                        shapes: objects.geometry,
                    });
                }
            }
        }
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    pub fn key_down(&mut self, key: Key, dispatch: &mut dyn Dispatch) {
        self.held_keys.insert(key);
        let command = self.bindings.command_for_key(key);

        let key = self.bindings.normalize(key);
        let mut selected = self.context.selected().to_vec();
        selected.sort_unstable();
        let mut outcomes = Vec::with_capacity(selected.len());
        for i in selected {
            let Some(label) = self.context.label_mut(i) else {
                continue;
            };
            let viable = label.on_key_down(key);
            let finished = label.label_id().is_none() && !label.editing() && label.is_valid();
            outcomes.push((i, viable, finished));
        }
        // Highest index first so removals never shift a pending index.
        for (i, viable, finished) in outcomes.into_iter().rev() {
            if !viable {
                log::debug!("Removing label no longer viable after {}", key_to_string(key));
                self.context.remove(i);
            } else if finished {
                self.commit_label(i, dispatch);
            }
        }

        match command {
            Some(KeyCommand::Link) => self.link_selected(dispatch),
            Some(KeyCommand::Unlink) => self.unlink_selected(dispatch),
            _ => {}
        }
        self.gesture = self.resting_state();
    }

    pub fn key_up(&mut self, key: Key) {
        self.held_keys.remove(&key);
        let key = self.bindings.normalize(key);
        for i in self.context.selected().to_vec() {
            if let Some(label) = self.context.label_mut(i) {
                label.on_key_up(key);
            }
        }
    }

    fn link_selected(&mut self, dispatch: &mut dyn Dispatch) {
        let (Ok(item), labels) = (self.state.current_index(), self.context.selected_ids()) else {
            return;
        };
        if labels.len() < 2 {
            log::debug!("Link needs at least two selected labels");
            return;
        }
        dispatch.dispatch(Action::LinkLabels { item, labels });
    }

    fn unlink_selected(&mut self, dispatch: &mut dyn Dispatch) {
        let (Ok(item), labels) = (self.state.current_index(), self.context.selected_ids()) else {
            return;
        };
        if labels.is_empty() {
            return;
        }
        dispatch.dispatch(Action::UnlinkLabels { item, labels });
    }
}
