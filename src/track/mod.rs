//! Temporal tracks: one physical object followed across items.
//!
//! A track maps item indices to label ids. Occurrences edited by the user are
//! flagged `manual` and act as keyframes; every other occurrence is predicted
//! by the track's policy and recomputed whenever a keyframe changes.

mod policy;

pub use policy::{HoldLast, Keyframe, LinearInterpolation, PolicyKind, TrackPolicy};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::model::{ItemIndex, Label, LabelId, ShapeGeometry, TrackId};
use crate::state::State;
use crate::state::reducers::{derive_box_geometry, insert_label, remove_label};

/// Occurrences of one object across items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(default)]
    pub policy: PolicyKind,
    /// Label id per item index, at most one per item
    pub occurrences: BTreeMap<ItemIndex, LabelId>,
}

impl Track {
    pub fn new(id: TrackId, policy: PolicyKind) -> Self {
        Self {
            id,
            policy,
            occurrences: BTreeMap::new(),
        }
    }

    /// First and last item index covered by this track.
    pub fn span(&self) -> Option<(ItemIndex, ItemIndex)> {
        let first = self.occurrences.keys().next()?;
        let last = self.occurrences.keys().next_back()?;
        Some((*first, *last))
    }
}

/// Registry of propagation policies.
pub struct TrackManager {
    policies: BTreeMap<PolicyKind, Box<dyn TrackPolicy>>,
}

impl Default for TrackManager {
    fn default() -> Self {
        let mut manager = Self::empty();
        manager.register(Box::new(LinearInterpolation));
        manager.register(Box::new(HoldLast));
        manager
    }
}

impl std::fmt::Debug for TrackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackManager")
            .field("policies", &self.policies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TrackManager {
    /// A manager without any policy; every track update degrades to a no-op.
    pub fn empty() -> Self {
        Self {
            policies: BTreeMap::new(),
        }
    }

    /// Register a policy, replacing any policy of the same kind.
    pub fn register(&mut self, policy: Box<dyn TrackPolicy>) {
        self.policies.insert(policy.kind(), policy);
    }

    pub fn policy(&self, kind: PolicyKind) -> Option<&dyn TrackPolicy> {
        self.policies.get(&kind).map(|policy| policy.as_ref())
    }

    /// Start a track with a manual occurrence at `item_index` and predicted
    /// copies on the items chosen by the session's policy.
    pub fn on_label_created(
        &self,
        state: &State,
        item_index: ItemIndex,
        label: Label,
        shapes: Vec<ShapeGeometry>,
    ) -> Result<State, StateError> {
        state.item(item_index)?;
        let kind = state.task.policy;
        let mut next = state.clone();
        let track_id = next.allocate_ids(1);
        let mut track = Track::new(track_id, kind);

        let mut template = label;
        template.track = Some(track_id);
        template.manual = true;
        let id = insert_label(&mut next, item_index, template.clone(), shapes.clone())?;
        track.occurrences.insert(item_index, id);

        match self.policy(kind) {
            Some(policy) => {
                template.manual = false;
                for index in policy.initial_range(item_index, next.items.len()) {
                    let predicted =
                        insert_label(&mut next, index, template.clone(), shapes.clone())?;
                    track.occurrences.insert(index, predicted);
                }
            }
            None => log::warn!("No {} policy registered, track {} not propagated", kind.name(), track_id),
        }

        log::info!(
            "🎞️ Track {} created on item {} with {} occurrences",
            track_id,
            item_index,
            track.occurrences.len()
        );
        next.tracks.insert(track_id, track);
        if next.current.item == Some(item_index) {
            next.current.label = Some(id);
            next.current.shape = None;
            next.current.selected_labels = vec![id];
        }
        Ok(next)
    }

    /// Write `shapes` as a manual keyframe at `item_index` and recompute every
    /// predicted occurrence of the track. Unknown tracks or policies leave the
    /// state unchanged.
    pub fn on_label_updated(
        &self,
        state: &State,
        track_id: TrackId,
        item_index: ItemIndex,
        shapes: &[ShapeGeometry],
    ) -> Result<State, StateError> {
        let Some(track) = state.tracks.get(&track_id) else {
            log::debug!("Track {} not registered, update not propagated", track_id);
            return Ok(state.clone());
        };
        let Some(policy) = self.policy(track.policy) else {
            log::debug!("No {} policy registered, update not propagated", track.policy.name());
            return Ok(state.clone());
        };
        let Some(&edited) = track.occurrences.get(&item_index) else {
            log::warn!("Track {} has no occurrence on item {}", track_id, item_index);
            return Ok(state.clone());
        };
        let track = track.clone();

        let mut next = state.clone();
        write_occurrence(&mut next, item_index, edited, shapes, true)?;

        let mut keyframes: Vec<(ItemIndex, Vec<ShapeGeometry>)> = Vec::new();
        for (&index, &id) in &track.occurrences {
            let label = next.label(index, id)?;
            if label.manual {
                let item = next.item(index)?;
                let geometry = item
                    .label_shapes(label)
                    .iter()
                    .map(|shape| shape.geometry)
                    .collect();
                keyframes.push((index, geometry));
            }
        }

        let mut recomputed = 0;
        for (&index, &id) in &track.occurrences {
            if next.label(index, id)?.manual {
                continue;
            }
            let before = keyframes
                .iter()
                .rev()
                .find(|(k, _)| *k < index)
                .map(|(k, shapes)| Keyframe {
                    index: *k,
                    shapes: shapes.as_slice(),
                });
            let after = keyframes
                .iter()
                .find(|(k, _)| *k > index)
                .map(|(k, shapes)| Keyframe {
                    index: *k,
                    shapes: shapes.as_slice(),
                });
            if let Some(predicted) = policy.predict(index, before, after) {
                write_occurrence(&mut next, index, id, &predicted, false)?;
                recomputed += 1;
            }
        }

        log::debug!(
            "Track {} updated on item {}, {} occurrences recomputed",
            track_id,
            item_index,
            recomputed
        );
        Ok(next)
    }
}

/// Overwrite an occurrence's geometry slot by slot and re-derive box shapes.
fn write_occurrence(
    next: &mut State,
    index: ItemIndex,
    id: LabelId,
    shapes: &[ShapeGeometry],
    manual: bool,
) -> Result<(), StateError> {
    let item = next.item_mut(index)?;
    let label = item
        .labels
        .get_mut(&id)
        .ok_or(StateError::LabelNotFound { id, item: index })?;
    if manual {
        label.manual = true;
    }
    if label.shapes.len() != shapes.len() {
        return Err(StateError::TemplateMismatch {
            label_type: label.label_type.name().to_string(),
            count: shapes.len(),
        });
    }
    let shape_ids = label.shapes.clone();
    for (shape_id, geometry) in shape_ids.iter().zip(shapes) {
        if let Some(shape) = item.shapes.get_mut(shape_id) {
            shape.geometry = *geometry;
        }
    }
    derive_box_geometry(item, id)
}

/// Delete every occurrence after `item_index`.
pub fn terminate_track(
    state: &State,
    track_id: TrackId,
    item_index: ItemIndex,
) -> Result<State, StateError> {
    let track = state
        .tracks
        .get(&track_id)
        .ok_or(StateError::TrackNotFound { id: track_id })?;
    let doomed: Vec<(ItemIndex, LabelId)> = track
        .occurrences
        .range(item_index + 1..)
        .map(|(index, id)| (*index, *id))
        .collect();

    let mut next = state.clone();
    for (index, id) in &doomed {
        remove_label(&mut next, *index, *id)?;
        if next.current.item == Some(*index) {
            next.current.selected_labels.retain(|selected| selected != id);
            if next.current.label == Some(*id) {
                next.current.label = None;
                next.current.shape = None;
            }
        }
    }
    log::info!(
        "⏹️ Track {} terminated after item {}, {} occurrences removed",
        track_id,
        item_index,
        doomed.len()
    );
    Ok(next)
}

/// Merge tracks with disjoint occurrences into the first one.
pub fn merge_tracks(state: &State, ids: &[TrackId]) -> Result<State, StateError> {
    let mut merged: BTreeMap<ItemIndex, LabelId> = BTreeMap::new();
    for id in ids {
        let track = state
            .tracks
            .get(id)
            .ok_or(StateError::TrackNotFound { id: *id })?;
        for (index, label) in &track.occurrences {
            if merged.insert(*index, *label).is_some() {
                return Err(StateError::TracksOverlap { item: *index });
            }
        }
    }
    let Some((&target, rest)) = ids.split_first() else {
        return Ok(state.clone());
    };
    if rest.is_empty() {
        return Ok(state.clone());
    }

    let mut next = state.clone();
    for id in rest {
        next.tracks.remove(id);
    }
    for (index, label) in &merged {
        let item = next.item_mut(*index)?;
        if let Some(label) = item.labels.get_mut(label) {
            if label.track != Some(target) {
                label.track = Some(target);
            }
        }
    }
    if let Some(track) = next.tracks.get_mut(&target) {
        track.occurrences = merged;
    }
    log::info!("🎞️ Merged tracks {:?} into {}", rest, target);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, LabelType, Vector2d, box2d_geometry};
    use crate::state::reducers::{delete_label, go_to_item, init_session, new_item};
    use crate::state::TaskConfig;

    fn square(x: f32) -> Vec<ShapeGeometry> {
        box2d_geometry([
            Vector2d::new(x, 0.0),
            Vector2d::new(x + 10.0, 0.0),
            Vector2d::new(x + 10.0, 10.0),
            Vector2d::new(x, 10.0),
        ])
    }

    fn tracked_session(items: usize, policy: PolicyKind) -> State {
        let mut state = State::new(TaskConfig {
            tracking: true,
            policy,
            ..Default::default()
        });
        for i in 0..items {
            state = new_item(&state, |index, url| Item::new(index, url), &format!("{i}.jpg"));
        }
        init_session(&state)
    }

    fn rect_x(state: &State, track: TrackId, index: ItemIndex) -> f32 {
        let id = state.tracks[&track].occurrences[&index];
        let label = state.label(index, id).expect("occurrence");
        let item = state.item(index).expect("item");
        item.shapes[&label.shapes[0]].geometry.position().x
    }

    fn created(items: usize, policy: PolicyKind) -> (State, TrackId) {
        let manager = TrackManager::default();
        let state = manager
            .on_label_created(
                &tracked_session(items, policy),
                0,
                Label::new(LabelType::Box2d),
                square(0.0),
            )
            .expect("track created");
        let track = *state.tracks.keys().next().expect("one track");
        (state, track)
    }

    #[test]
    fn test_created_track_fills_later_items() {
        let (state, track) = created(5, PolicyKind::LinearInterpolation);
        let occurrences = &state.tracks[&track].occurrences;
        assert_eq!(occurrences.len(), 5);
        for (index, id) in occurrences {
            let label = state.label(*index, *id).expect("occurrence");
            assert_eq!(label.manual, *index == 0);
            assert_eq!(label.track, Some(track));
        }
        assert_eq!(state.current.label, Some(occurrences[&0]));
    }

    #[test]
    fn test_linear_reinterpolates_predicted_occurrences() {
        let manager = TrackManager::default();
        let (state, track) = created(5, PolicyKind::LinearInterpolation);
        let state = manager
            .on_label_updated(&state, track, 4, &square(40.0))
            .expect("update");

        assert_eq!(rect_x(&state, track, 2), 20.0);
        assert_eq!(rect_x(&state, track, 1), 10.0);
        assert_eq!(rect_x(&state, track, 4), 40.0);
    }

    #[test]
    fn test_manual_occurrences_are_never_overwritten() {
        let manager = TrackManager::default();
        let (state, track) = created(5, PolicyKind::LinearInterpolation);
        let state = manager
            .on_label_updated(&state, track, 4, &square(40.0))
            .expect("update");
        let state = manager
            .on_label_updated(&state, track, 0, &square(20.0))
            .expect("update");

        assert_eq!(rect_x(&state, track, 4), 40.0);
        assert_eq!(rect_x(&state, track, 0), 20.0);
        assert_eq!(rect_x(&state, track, 2), 30.0);
    }

    #[test]
    fn test_hold_last_copies_forward() {
        let manager = TrackManager::default();
        let (state, track) = created(5, PolicyKind::HoldLast);
        let state = manager
            .on_label_updated(&state, track, 2, &square(30.0))
            .expect("update");

        assert_eq!(rect_x(&state, track, 1), 0.0);
        assert_eq!(rect_x(&state, track, 3), 30.0);
        assert_eq!(rect_x(&state, track, 4), 30.0);
    }

    #[test]
    fn test_unknown_track_leaves_state_unchanged() {
        let manager = TrackManager::default();
        let (state, track) = created(3, PolicyKind::LinearInterpolation);
        let updated = manager
            .on_label_updated(&state, track + 100, 1, &square(50.0))
            .expect("no-op");
        assert_eq!(updated, state);

        let without_policies = TrackManager::empty()
            .on_label_updated(&state, track, 1, &square(50.0))
            .expect("no-op");
        assert_eq!(without_policies, state);
    }

    #[test]
    fn test_predicted_boxes_keep_derived_midpoints() {
        let manager = TrackManager::default();
        let (state, track) = created(3, PolicyKind::LinearInterpolation);
        let state = manager
            .on_label_updated(&state, track, 2, &square(20.0))
            .expect("update");
        let id = state.tracks[&track].occurrences[&1];
        let item = state.item(1).expect("item");
        let label = state.label(1, id).expect("occurrence");
        assert_eq!(
            item.shapes[&label.shapes[2]].geometry.position(),
            Vector2d::new(15.0, 0.0)
        );
    }

    #[test]
    fn test_terminate_track_removes_later_occurrences() {
        let (state, track) = created(5, PolicyKind::LinearInterpolation);
        let state = terminate_track(&state, track, 1).expect("terminate");
        let occurrences = &state.tracks[&track].occurrences;
        assert_eq!(occurrences.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(state.items[3].labels.is_empty());
        assert!(state.items[3].shapes.is_empty());
        assert!(state.items.iter().all(|item| item.dangling_shape_ids().is_empty()));
        assert_eq!(
            terminate_track(&state, track + 1, 0),
            Err(StateError::TrackNotFound { id: track + 1 })
        );
    }

    #[test]
    fn test_deleting_every_occurrence_drops_track() {
        let (mut state, track) = created(2, PolicyKind::LinearInterpolation);
        for index in 0..2 {
            state = go_to_item(&state, index);
            let id = state.tracks[&track].occurrences[&index];
            state = delete_label(&state, id);
        }
        assert!(state.tracks.is_empty());
        assert!(state.items.iter().all(|item| item.dangling_shape_ids().is_empty()));
    }

    #[test]
    fn test_merge_tracks_requires_disjoint_occurrences() {
        let manager = TrackManager::default();
        let (state, first) = created(4, PolicyKind::LinearInterpolation);
        let state = terminate_track(&state, first, 1).expect("terminate");
        let state = manager
            .on_label_created(&state, 2, Label::new(LabelType::Box2d), square(5.0))
            .expect("second track");
        let second = *state.tracks.keys().last().expect("two tracks");

        let merged = merge_tracks(&state, &[first, second]).expect("merge");
        assert_eq!(merged.tracks.len(), 1);
        assert_eq!(merged.tracks[&first].span(), Some((0, 3)));
        let id = merged.tracks[&first].occurrences[&3];
        assert_eq!(merged.label(3, id).expect("label").track, Some(first));
        assert!(merged.items.iter().all(|item| item.dangling_shape_ids().is_empty()));

        let (overlapping, other) = created(2, PolicyKind::LinearInterpolation);
        let overlapping = manager
            .on_label_created(&overlapping, 1, Label::new(LabelType::Box2d), square(0.0))
            .expect("second track");
        let newest = *overlapping.tracks.keys().last().expect("two tracks");
        assert_eq!(
            merge_tracks(&overlapping, &[other, newest]),
            Err(StateError::TracksOverlap { item: 1 })
        );
    }
}
