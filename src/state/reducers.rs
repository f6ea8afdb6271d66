//! Pure state transitions.
//!
//! Each operation takes the current `State` and returns a new one; the input
//! is never mutated. Operations that take ids come in two flavours: a strict
//! `try_*` variant that reports unknown references as `StateError`, and a
//! lenient variant that logs the error and returns the input unchanged.

use crate::color_utils::label_color;
use crate::constants::BOX2D_SHAPE_COUNT;
use crate::error::StateError;
use crate::model::{
    Item, ItemIndex, Label, LabelId, LabelProps, LabelType, Shape, ShapeGeometry, ShapeId,
    ShapeProps, Vector2d, ViewerConfig, box2d_geometry,
};

use super::links::{detach_from_group, dissolve_group};
use super::session::State;

/// Absorb a strict result into a no-op.
fn or_noop(state: &State, operation: &str, result: Result<State, StateError>) -> State {
    match result {
        Ok(next) => next,
        Err(e) => {
            log::warn!("{} ignored: {}", operation, e);
            state.clone()
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Mark every item unloaded and activate item 0 when nothing is selected.
pub fn init_session(state: &State) -> State {
    let mut next = state.clone();
    for item in next.items.iter_mut() {
        if item.loaded {
            std::sync::Arc::make_mut(item).loaded = false;
        }
    }
    if next.current.item.is_none() && !next.items.is_empty() {
        next.current.item = Some(0);
        if let Ok(item) = next.item_mut(0) {
            item.active = true;
        }
        log::debug!("Session initialised on item 0");
    }
    next
}

/// Append an item built by `create_item` at index `items.len()`.
pub fn new_item(
    state: &State,
    create_item: impl FnOnce(ItemIndex, &str) -> Item,
    url: &str,
) -> State {
    let mut next = state.clone();
    let index = next.items.len();
    let mut item = create_item(index, url);
    item.index = index;
    next.items.push(std::sync::Arc::new(item));
    log::debug!("➕ New item {} ({})", index, url);
    next
}

/// Activate item `index`, deactivating the previous one.
pub fn try_go_to_item(state: &State, index: ItemIndex) -> Result<State, StateError> {
    if index >= state.items.len() {
        return Err(StateError::ItemNotFound { index });
    }
    if state.current.item == Some(index) {
        return Ok(state.clone());
    }

    let mut next = state.clone();
    for (i, item) in next.items.iter_mut().enumerate() {
        if item.active != (i == index) {
            std::sync::Arc::make_mut(item).active = i == index;
        }
    }
    next.current.item = Some(index);
    next.current.label = None;
    next.current.shape = None;
    next.current.selected_labels.clear();
    log::debug!("Go to item {}", index);
    Ok(next)
}

/// Lenient [`try_go_to_item`].
pub fn go_to_item(state: &State, index: ItemIndex) -> State {
    or_noop(state, "go_to_item", try_go_to_item(state, index))
}

/// Mark an item loaded and store its viewer configuration.
pub fn try_load_item(
    state: &State,
    index: ItemIndex,
    viewer_config: ViewerConfig,
) -> Result<State, StateError> {
    let mut next = state.clone();
    let item = next.item_mut(index)?;
    item.loaded = true;
    item.viewer_config = Some(viewer_config);
    Ok(next)
}

/// Lenient [`try_load_item`].
pub fn load_item(state: &State, index: ItemIndex, viewer_config: ViewerConfig) -> State {
    or_noop(state, "load_item", try_load_item(state, index, viewer_config))
}

/// Flip the assistant view flag.
pub fn toggle_assistant_view(state: &State) -> State {
    let mut next = state.clone();
    next.layout.assistant_view = !next.layout.assistant_view;
    next
}

/// Choose the label type used for new labels.
pub fn set_label_type(state: &State, index: usize) -> State {
    if index >= state.task.label_types.len() {
        log::warn!("set_label_type ignored: no label type {}", index);
        return state.clone();
    }
    let mut next = state.clone();
    next.current.label_type = index;
    next
}

/// Choose the category used for new labels.
pub fn set_category(state: &State, index: usize) -> State {
    if index >= state.task.categories.len() {
        log::warn!("set_category ignored: no category {}", index);
        return state.clone();
    }
    let mut next = state.clone();
    next.current.category = index;
    next
}

// ============================================================================
// Labels
// ============================================================================

/// Insert a label and its shapes into an item, allocating fresh ids.
///
/// Shape ids come first, the label id is the last allocated id.
pub(crate) fn insert_label(
    next: &mut State,
    item_index: ItemIndex,
    mut label: Label,
    shapes: Vec<ShapeGeometry>,
) -> Result<LabelId, StateError> {
    if !label.label_type.accepts_shape_count(shapes.len()) {
        return Err(StateError::TemplateMismatch {
            label_type: label.label_type.name().to_string(),
            count: shapes.len(),
        });
    }
    next.item(item_index)?;

    let first = next.allocate_ids(shapes.len() as u64 + 1);
    let label_id = first + shapes.len() as u64;
    let shape_ids: Vec<ShapeId> = (first..label_id).collect();

    label.id = label_id;
    label.item = item_index;
    label.color = label_color(label_id);
    label.shapes = shape_ids.clone();
    label.parent = None;
    label.children.clear();

    let item = next.item_mut(item_index)?;
    for (id, geometry) in shape_ids.into_iter().zip(shapes) {
        let mut shape = Shape::new(id, item_index, geometry);
        shape.label.push(label_id);
        item.shapes.insert(id, shape);
    }
    item.labels.insert(label_id, label);
    Ok(label_id)
}

/// Add a label with its shapes to the current item and select it.
pub fn try_add_label(
    state: &State,
    label: Label,
    shapes: Vec<ShapeGeometry>,
) -> Result<State, StateError> {
    let index = state.current_index()?;
    let mut next = state.clone();
    let id = insert_label(&mut next, index, label, shapes)?;
    next.current.label = Some(id);
    next.current.shape = None;
    next.current.selected_labels = vec![id];
    log::info!("🏷️ Added label {} on item {}", id, index);
    Ok(next)
}

/// Lenient [`try_add_label`].
pub fn add_label(state: &State, label: Label, shapes: Vec<ShapeGeometry>) -> State {
    or_noop(state, "add_label", try_add_label(state, label, shapes))
}

/// Remove a label and the shapes only it references. Detaches it from its
/// link group and its track.
pub(crate) fn remove_label(
    next: &mut State,
    item_index: ItemIndex,
    id: LabelId,
) -> Result<Label, StateError> {
    let item = next.item_mut(item_index)?;
    let Some(label) = item.label(id).cloned() else {
        return Err(StateError::LabelNotFound {
            id,
            item: item_index,
        });
    };
    if label.label_type == LabelType::Group {
        dissolve_group(item, id);
    } else {
        detach_from_group(item, id);
        item.labels.remove(&id);
    }
    for shape_id in &label.shapes {
        let orphaned = match item.shapes.get_mut(shape_id) {
            Some(shape) => {
                shape.label.retain(|owner| *owner != id);
                shape.label.is_empty()
            }
            None => false,
        };
        if orphaned {
            item.shapes.remove(shape_id);
        }
    }

    if let Some(track_id) = label.track {
        let emptied = match next.tracks.get_mut(&track_id) {
            Some(track) => {
                track.occurrences.remove(&item_index);
                track.occurrences.is_empty()
            }
            None => false,
        };
        if emptied {
            next.tracks.remove(&track_id);
            log::debug!("Track {} dropped with its last occurrence", track_id);
        }
    }
    Ok(label)
}

/// Delete a label from the current item.
pub fn try_delete_label(state: &State, id: LabelId) -> Result<State, StateError> {
    let index = state.current_index()?;
    let mut next = state.clone();
    remove_label(&mut next, index, id)?;
    if next.current.label == Some(id) {
        next.current.label = None;
        next.current.shape = None;
    }
    next.current.selected_labels.retain(|selected| *selected != id);
    log::info!("🗑️ Deleted label {} on item {}", id, index);
    Ok(next)
}

/// Lenient [`try_delete_label`].
pub fn delete_label(state: &State, id: LabelId) -> State {
    or_noop(state, "delete_label", try_delete_label(state, id))
}

/// Merge non-geometry props into a label of the current item.
pub fn try_change_label_props(
    state: &State,
    id: LabelId,
    props: &LabelProps,
) -> Result<State, StateError> {
    let index = state.current_index()?;
    let mut next = state.clone();
    let item = next.item_mut(index)?;
    let label = item
        .labels
        .get_mut(&id)
        .ok_or(StateError::LabelNotFound { id, item: index })?;
    label.merge(props);
    Ok(next)
}

/// Lenient [`try_change_label_props`].
pub fn change_label_props(state: &State, id: LabelId, props: &LabelProps) -> State {
    or_noop(
        state,
        "change_label_props",
        try_change_label_props(state, id, props),
    )
}

// ============================================================================
// Shapes
// ============================================================================

/// Merge props into shapes of an item.
pub(crate) fn merge_shapes(
    item: &mut Item,
    shape_ids: &[ShapeId],
    props: &[ShapeProps],
) -> Result<(), StateError> {
    for (id, props) in shape_ids.iter().zip(props) {
        let shape = item.shapes.get_mut(id).ok_or(StateError::ShapeNotFound {
            id: *id,
            item: item.index,
        })?;
        shape.geometry.merge(props);
    }
    Ok(())
}

/// Merge `props` into one shape of the current item.
pub fn try_change_label_shape(
    state: &State,
    shape_id: ShapeId,
    props: &ShapeProps,
) -> Result<State, StateError> {
    let index = state.current_index()?;
    try_change_shapes(state, index, &[shape_id], std::slice::from_ref(props))
}

/// Lenient [`try_change_label_shape`].
pub fn change_label_shape(state: &State, shape_id: ShapeId, props: &ShapeProps) -> State {
    or_noop(
        state,
        "change_label_shape",
        try_change_label_shape(state, shape_id, props),
    )
}

/// Merge props into several shapes of one item, pairwise.
pub fn try_change_shapes(
    state: &State,
    item_index: ItemIndex,
    shape_ids: &[ShapeId],
    props: &[ShapeProps],
) -> Result<State, StateError> {
    let mut next = state.clone();
    merge_shapes(next.item_mut(item_index)?, shape_ids, props)?;
    Ok(next)
}

/// Lenient [`try_change_shapes`].
pub fn change_shapes(
    state: &State,
    item_index: ItemIndex,
    shape_ids: &[ShapeId],
    props: &[ShapeProps],
) -> State {
    or_noop(
        state,
        "change_shapes",
        try_change_shapes(state, item_index, shape_ids, props),
    )
}

/// Re-derive the midpoints and rect of a box label from its corners.
pub(crate) fn derive_box_geometry(item: &mut Item, id: LabelId) -> Result<(), StateError> {
    let label = item.label(id).ok_or(StateError::LabelNotFound {
        id,
        item: item.index,
    })?;
    if label.label_type != LabelType::Box2d {
        return Ok(());
    }
    if label.shapes.len() != BOX2D_SHAPE_COUNT {
        return Err(StateError::TemplateMismatch {
            label_type: label.label_type.name().to_string(),
            count: label.shapes.len(),
        });
    }
    let shape_ids = label.shapes.clone();

    let mut corners = [Vector2d::default(); 4];
    for (k, corner) in corners.iter_mut().enumerate() {
        let id = shape_ids[1 + 2 * k];
        let shape = item.shapes.get(&id).ok_or(StateError::ShapeNotFound {
            id,
            item: item.index,
        })?;
        *corner = shape.geometry.position();
    }

    for (id, geometry) in shape_ids.iter().zip(box2d_geometry(corners)) {
        if let Some(shape) = item.shapes.get_mut(id) {
            shape.geometry = geometry;
        }
    }
    Ok(())
}

/// Recompute a box label's midpoints and rect on the current item.
pub fn try_update_midpoint(state: &State, id: LabelId) -> Result<State, StateError> {
    let index = state.current_index()?;
    let mut next = state.clone();
    derive_box_geometry(next.item_mut(index)?, id)?;
    Ok(next)
}

/// Lenient [`try_update_midpoint`].
pub fn update_midpoint(state: &State, id: LabelId) -> State {
    or_noop(state, "update_midpoint", try_update_midpoint(state, id))
}

// ============================================================================
// Selection
// ============================================================================

/// Set the primary selected label.
pub fn select_label(state: &State, id: Option<LabelId>) -> State {
    let mut next = state.clone();
    next.current.label = id;
    next
}

/// Set the selected shape.
pub fn select_shape(state: &State, id: Option<ShapeId>) -> State {
    let mut next = state.clone();
    next.current.shape = id;
    next
}

/// Replace the selection. The first id becomes the primary label and its
/// category and attributes become the defaults for new labels.
pub fn select_labels(state: &State, ids: &[LabelId]) -> State {
    let mut next = state.clone();
    next.current.selected_labels = ids.to_vec();
    next.current.label = ids.first().copied();
    next.current.shape = None;

    let primary = ids
        .first()
        .and_then(|id| state.current_item()?.label(*id));
    if let Some(label) = primary {
        let category = label
            .category
            .last()
            .and_then(|category| category.parse::<usize>().ok())
            .filter(|category| *category < state.task.categories.len());
        if let Some(category) = category {
            next.current.category = category;
        }
        next.current.attributes = label.attributes.clone();
    }
    next
}

/// Remove ids from the selection.
pub fn unselect_labels(state: &State, ids: &[LabelId]) -> State {
    let mut next = state.clone();
    next.current
        .selected_labels
        .retain(|selected| !ids.contains(selected));
    if next.current.label.is_some_and(|label| ids.contains(&label)) {
        next.current.label = next.current.selected_labels.first().copied();
        next.current.shape = None;
    }
    next
}
