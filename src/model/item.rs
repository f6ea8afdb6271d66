//! Per-frame storage of labels and shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ItemIndex, Label, LabelId, Shape, ShapeId};

/// Viewer snapshot stored when an item finishes loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Source image width in pixels
    pub image_width: f32,
    /// Source image height in pixels
    pub image_height: f32,
    /// Zoom factor
    pub zoom: f32,
    /// Pan offset X
    pub pan_x: f32,
    /// Pan offset Y
    pub pan_y: f32,
}

impl ViewerConfig {
    /// Unzoomed viewer for an image of the given size.
    pub fn for_image(width: f32, height: f32) -> Self {
        Self {
            image_width: width,
            image_height: height,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// One frame/image of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item id
    pub id: usize,
    /// Position in the session's item sequence
    pub index: ItemIndex,
    /// Source URL or path
    #[serde(default)]
    pub url: String,
    /// Labels on this item
    #[serde(default)]
    pub labels: BTreeMap<LabelId, Label>,
    /// Shapes on this item
    #[serde(default)]
    pub shapes: BTreeMap<ShapeId, Shape>,
    /// Whether the item's media has loaded
    #[serde(default)]
    pub loaded: bool,
    /// Whether this is the item under the cursor
    #[serde(default)]
    pub active: bool,
    /// Viewer state captured on load
    #[serde(default)]
    pub viewer_config: Option<ViewerConfig>,
}

impl Item {
    pub fn new(index: ItemIndex, url: impl Into<String>) -> Self {
        Self {
            id: index,
            index,
            url: url.into(),
            labels: BTreeMap::new(),
            shapes: BTreeMap::new(),
            loaded: false,
            active: false,
            viewer_config: None,
        }
    }

    /// Get a label by ID.
    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.get(&id)
    }

    /// Resolve the ordered shapes of a label. Missing ids are skipped.
    pub fn label_shapes(&self, label: &Label) -> Vec<&Shape> {
        label
            .shapes
            .iter()
            .filter_map(|id| self.shapes.get(id))
            .collect()
    }

    /// Ids of every shape referenced by a label but absent from the shape map.
    pub fn dangling_shape_ids(&self) -> Vec<ShapeId> {
        self.labels
            .values()
            .flat_map(|label| label.shapes.iter())
            .filter(|id| !self.shapes.contains_key(id))
            .copied()
            .collect()
    }
}
