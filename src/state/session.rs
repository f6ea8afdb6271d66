//! The immutable session root: items, tracks, cursor and layout.
//!
//! Items are shared through `Arc`, so producing a new `State` copies only the
//! item being edited; untouched items stay pointer-equal to the previous
//! snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ASSISTANT_VIEW_RATIO;
use crate::error::StateError;
use crate::model::{Attributes, Item, ItemIndex, Label, LabelId, LabelType, ShapeId, TrackId};
use crate::track::{PolicyKind, Track};

/// Task-level settings shared by every item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Label types the user can draw, chosen by `Cursor::label_type`
    pub label_types: Vec<LabelType>,
    /// Category names, chosen by `Cursor::category`
    pub categories: Vec<String>,
    /// Whether new labels start a track across items
    #[serde(default)]
    pub tracking: bool,
    /// Propagation policy for new tracks
    #[serde(default)]
    pub policy: PolicyKind,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            label_types: vec![LabelType::Box2d, LabelType::Polygon2d],
            categories: vec!["object".to_string()],
            tracking: false,
            policy: PolicyKind::default(),
        }
    }
}

/// Selection cursor and global id counter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// Active item index
    pub item: Option<ItemIndex>,
    /// Primary selected label
    pub label: Option<LabelId>,
    /// Selected shape
    pub shape: Option<ShapeId>,
    /// Highest id handed out so far
    pub max_object_id: u64,
    /// Every selected label on the active item
    #[serde(default)]
    pub selected_labels: Vec<LabelId>,
    /// Index into `TaskConfig::label_types` used for new labels
    #[serde(default)]
    pub label_type: usize,
    /// Index into `TaskConfig::categories` used for new labels
    #[serde(default)]
    pub category: usize,
    /// Attributes used for new labels
    #[serde(default)]
    pub attributes: Attributes,
}

/// Layout flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Whether the assistant view is shown next to the main view
    pub assistant_view: bool,
    /// Width ratio of the assistant view
    pub assistant_view_ratio: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            assistant_view: false,
            assistant_view_ratio: DEFAULT_ASSISTANT_VIEW_RATIO,
        }
    }
}

/// The session root. Every reducer maps `&State` to a new `State`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    pub task: Arc<TaskConfig>,
    pub items: Vec<Arc<Item>>,
    #[serde(default)]
    pub tracks: BTreeMap<TrackId, Track>,
    pub current: Cursor,
    #[serde(default)]
    pub layout: Layout,
}

impl State {
    /// Create an empty session for a task.
    pub fn new(task: TaskConfig) -> Self {
        Self {
            task: Arc::new(task),
            ..Default::default()
        }
    }

    /// Index of the active item.
    pub fn current_index(&self) -> Result<ItemIndex, StateError> {
        let index = self.current.item.ok_or(StateError::NoCurrentItem)?;
        if index >= self.items.len() {
            return Err(StateError::ItemNotFound { index });
        }
        Ok(index)
    }

    /// The active item, if any.
    pub fn current_item(&self) -> Option<&Item> {
        self.current
            .item
            .and_then(|index| self.items.get(index))
            .map(Arc::as_ref)
    }

    /// Get an item by index.
    pub fn item(&self, index: ItemIndex) -> Result<&Item, StateError> {
        self.items
            .get(index)
            .map(Arc::as_ref)
            .ok_or(StateError::ItemNotFound { index })
    }

    /// Copy-on-write access to an item.
    pub(crate) fn item_mut(&mut self, index: ItemIndex) -> Result<&mut Item, StateError> {
        self.items
            .get_mut(index)
            .map(Arc::make_mut)
            .ok_or(StateError::ItemNotFound { index })
    }

    /// Get a label of an item.
    pub fn label(&self, item: ItemIndex, id: LabelId) -> Result<&Label, StateError> {
        self.item(item)?
            .label(id)
            .ok_or(StateError::LabelNotFound { id, item })
    }

    /// Reserve `count` consecutive ids and return the first one.
    pub(crate) fn allocate_ids(&mut self, count: u64) -> u64 {
        let first = self.current.max_object_id + 1;
        self.current.max_object_id += count;
        first
    }

    /// Label type chosen for new labels.
    pub fn current_label_type(&self) -> LabelType {
        self.task
            .label_types
            .get(self.current.label_type)
            .copied()
            .unwrap_or(LabelType::Box2d)
    }

    /// Category chosen for new labels, as stored on labels.
    pub fn current_category(&self) -> Vec<String> {
        if self.task.categories.is_empty() {
            Vec::new()
        } else {
            vec![self.current.category.to_string()]
        }
    }

    /// Number of items flagged active.
    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|item| item.active).count()
    }

    /// Serialize the session to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a session from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
