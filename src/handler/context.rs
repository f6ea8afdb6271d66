//! Drawables and selection owned by the interaction handler.

use crate::drawable::{Drawable, DrawableLabel, Handle};
use crate::model::{Item, LabelId, Vector2d};

/// A label and handle under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Index into `LabelContext::labels`
    pub label: usize,
    pub handle: Handle,
}

/// The drawable list of the active item plus the selection into it.
#[derive(Debug, Clone, Default)]
pub struct LabelContext {
    labels: Vec<DrawableLabel>,
    selected: Vec<usize>,
    highlighted: Option<usize>,
}

impl LabelContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &[DrawableLabel] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<&DrawableLabel> {
        self.labels.get(index)
    }

    pub(crate) fn label_mut(&mut self, index: usize) -> Option<&mut DrawableLabel> {
        self.labels.get_mut(index)
    }

    /// Indices of selected labels.
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Ids of selected labels that exist in the state.
    pub fn selected_ids(&self) -> Vec<LabelId> {
        self.selected
            .iter()
            .filter_map(|i| self.labels.get(*i))
            .filter_map(|label| label.label_id())
            .collect()
    }

    pub fn index_of(&self, id: LabelId) -> Option<usize> {
        self.labels
            .iter()
            .position(|label| label.label_id() == Some(id))
    }

    /// Topmost label and handle within `radius` of `coord`. Selected labels
    /// take precedence, later labels are drawn on top.
    pub fn hit_test(&self, coord: Vector2d, radius: f32) -> Option<Hit> {
        let hit = |index: usize| {
            self.labels[index]
                .hit_test(coord, radius)
                .map(|handle| Hit {
                    label: index,
                    handle,
                })
        };
        self.selected
            .iter()
            .rev()
            .copied()
            .filter(|i| *i < self.labels.len())
            .find_map(hit)
            .or_else(|| (0..self.labels.len()).rev().find_map(hit))
    }

    /// Append a label and return its index.
    pub(crate) fn push(&mut self, label: DrawableLabel) -> usize {
        self.labels.push(label);
        self.labels.len() - 1
    }

    /// Remove a label, shifting selection and highlight indices.
    pub(crate) fn remove(&mut self, index: usize) -> Option<DrawableLabel> {
        if index >= self.labels.len() {
            return None;
        }
        let label = self.labels.remove(index);
        self.selected.retain(|i| *i != index);
        for i in self.selected.iter_mut() {
            if *i > index {
                *i -= 1;
            }
        }
        self.highlighted = match self.highlighted {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        Some(label)
    }

    pub(crate) fn set_selected(&mut self, selected: Vec<usize>) {
        self.selected = selected
            .into_iter()
            .filter(|i| *i < self.labels.len())
            .collect();
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: Option<usize>) {
        self.highlighted = highlighted.filter(|i| *i < self.labels.len());
    }

    /// Whether any selected label is mid-edit.
    pub fn selection_editing(&self) -> bool {
        self.selected
            .iter()
            .filter_map(|i| self.labels.get(*i))
            .any(|label| label.editing())
    }

    /// Rebuild committed labels from an item, keeping drafts without an id.
    /// Selection follows `selected_ids`; drafts keep their own selection.
    pub(crate) fn sync(&mut self, item: Option<&Item>, selected_ids: &[LabelId], keep_drafts: bool) {
        let highlighted = self
            .highlighted
            .and_then(|i| self.labels.get(i))
            .map(|label| (label.label_id(), label.highlighted_handle()));

        let mut drafts = Vec::new();
        if keep_drafts {
            for (i, label) in self.labels.iter().enumerate() {
                if label.label_id().is_none() {
                    drafts.push((label.clone(), self.selected.contains(&i), self.highlighted == Some(i)));
                }
            }
        }

        self.labels = item
            .map(|item| {
                item.labels
                    .values()
                    .filter(|label| label.label_type.is_drawable())
                    .filter_map(|label| DrawableLabel::from_state(item, label))
                    .collect()
            })
            .unwrap_or_default();

        self.selected = selected_ids
            .iter()
            .filter_map(|id| self.index_of(*id))
            .collect();
        self.highlighted = None;
        if let Some((Some(id), handle)) = highlighted {
            if let Some(index) = self.index_of(id) {
                self.labels[index].set_highlighted(true, handle);
                self.highlighted = Some(index);
            }
        }

        for (draft, selected, is_highlighted) in drafts {
            let index = self.push(draft);
            if selected {
                self.selected.push(index);
            }
            if is_highlighted {
                self.highlighted = Some(index);
            }
        }
    }
}
