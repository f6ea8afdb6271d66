//! Link groups: labels describing the same object on one item.
//!
//! A group is a parent label of type `Group` that owns no shapes. Every
//! member carries the parent id; the parent lists its members. Groups are
//! always one level deep, linking merges existing groups.

use crate::error::StateError;
use crate::model::{Item, ItemIndex, Label, LabelId, LabelType};

use super::session::State;

/// All labels linked to `id`, including `id` itself (symmetric closure).
pub fn linked_label_ids(item: &Item, id: LabelId) -> Vec<LabelId> {
    let Some(label) = item.label(id) else {
        return Vec::new();
    };
    if label.label_type == LabelType::Group {
        return label.children.clone();
    }
    match label.parent.and_then(|parent| item.label(parent)) {
        Some(parent) => parent.children.clone(),
        None => vec![id],
    }
}

/// Link the groups of every given label into one new group.
pub fn try_link_labels(
    state: &State,
    item_index: ItemIndex,
    ids: &[LabelId],
) -> Result<State, StateError> {
    let item = state.item(item_index)?;

    let mut members: Vec<LabelId> = Vec::new();
    let mut old_parents: Vec<LabelId> = Vec::new();
    for &id in ids {
        let label = item
            .label(id)
            .ok_or(StateError::LabelNotFound { id, item: item_index })?;
        let group = if label.label_type == LabelType::Group {
            Some(id)
        } else {
            label.parent
        };
        if let Some(group) = group {
            if !old_parents.contains(&group) {
                old_parents.push(group);
            }
        }
        for member in linked_label_ids(item, id) {
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }
    if members.len() < 2 {
        return Err(StateError::NotEnoughLabels {
            count: members.len(),
        });
    }

    let template = item.label(members[0]).cloned();
    let mut next = state.clone();
    let group_id = next.allocate_ids(1);
    let item = next.item_mut(item_index)?;
    for parent in old_parents {
        item.labels.remove(&parent);
    }
    for member in &members {
        if let Some(label) = item.labels.get_mut(member) {
            label.parent = Some(group_id);
        }
    }

    let mut group = Label::new(LabelType::Group);
    group.id = group_id;
    group.item = item_index;
    group.color = crate::color_utils::label_color(group_id);
    group.children = members.clone();
    if let Some(template) = template {
        group.category = template.category;
        group.attributes = template.attributes;
    }
    item.labels.insert(group_id, group);

    log::debug!("🔗 Linked labels {:?} into group {}", members, group_id);
    Ok(next)
}

/// Dissolve the groups of every given label.
pub fn try_unlink_labels(
    state: &State,
    item_index: ItemIndex,
    ids: &[LabelId],
) -> Result<State, StateError> {
    let item = state.item(item_index)?;
    let mut groups: Vec<LabelId> = Vec::new();
    for &id in ids {
        let label = item
            .label(id)
            .ok_or(StateError::LabelNotFound { id, item: item_index })?;
        let group = if label.label_type == LabelType::Group {
            Some(id)
        } else {
            label.parent
        };
        if let Some(group) = group {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
    }

    let mut next = state.clone();
    let item = next.item_mut(item_index)?;
    for group in groups {
        dissolve_group(item, group);
        log::debug!("✂️ Unlinked group {}", group);
    }
    Ok(next)
}

/// Remove a group label and clear the parent of its members.
pub(crate) fn dissolve_group(item: &mut Item, group: LabelId) {
    let Some(parent) = item.labels.remove(&group) else {
        return;
    };
    for child in parent.children {
        if let Some(label) = item.labels.get_mut(&child) {
            label.parent = None;
        }
    }
}

/// Drop `id` from its group, dissolving groups left with fewer than two members.
pub(crate) fn detach_from_group(item: &mut Item, id: LabelId) {
    let Some(parent_id) = item.label(id).and_then(|label| label.parent) else {
        return;
    };
    let remaining = match item.labels.get_mut(&parent_id) {
        Some(parent) => {
            parent.children.retain(|child| *child != id);
            parent.children.len()
        }
        None => return,
    };
    if let Some(label) = item.labels.get_mut(&id) {
        label.parent = None;
    }
    if remaining < 2 {
        dissolve_group(item, parent_id);
    }
}
