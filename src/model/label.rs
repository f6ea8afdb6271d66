//! Annotation records referencing one or more shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::{ItemIndex, LabelId, ShapeId, TrackId};
use crate::constants::{BOX2D_SHAPE_COUNT, MIN_POLYGON_VERTICES};

/// Attribute values keyed by attribute index.
pub type Attributes = BTreeMap<u32, Vec<u32>>;

/// Geometry template a label conforms to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    /// Bounding box: 1 rect + 4 corner vertices + 4 midpoint vertices.
    Box2d,
    /// Closed polygon made of vertex shapes.
    Polygon2d,
    /// Link-group parent, owns no shapes.
    Group,
}

impl LabelType {
    /// Get the display name for this label type.
    pub fn name(&self) -> &'static str {
        match self {
            LabelType::Box2d => "Bounding Box",
            LabelType::Polygon2d => "Polygon",
            LabelType::Group => "Group",
        }
    }

    /// Check whether `count` shape slots satisfy this template.
    pub fn accepts_shape_count(&self, count: usize) -> bool {
        match self {
            LabelType::Box2d => count == BOX2D_SHAPE_COUNT,
            LabelType::Polygon2d => count >= MIN_POLYGON_VERTICES,
            LabelType::Group => count == 0,
        }
    }

    /// Whether drawables exist for this type.
    pub fn is_drawable(&self) -> bool {
        !matches!(self, LabelType::Group)
    }
}

/// A persisted label owned by exactly one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Unique identifier, drawn from the session-wide id counter.
    pub id: LabelId,
    /// Index of the owning item.
    pub item: ItemIndex,
    /// Geometry template.
    pub label_type: LabelType,
    /// Category indices as strings, most specific last.
    #[serde(default)]
    pub category: Vec<String>,
    /// Attribute values.
    #[serde(default)]
    pub attributes: Attributes,
    /// Ordered shape ids.
    #[serde(default)]
    pub shapes: Vec<ShapeId>,
    /// Track this label belongs to.
    #[serde(default)]
    pub track: Option<TrackId>,
    /// Set once a user edited this occurrence; propagation never overwrites it.
    #[serde(default)]
    pub manual: bool,
    /// Rendering color, a pure function of the id.
    #[serde(default)]
    pub color: [u8; 3],
    /// Link-group parent.
    #[serde(default)]
    pub parent: Option<LabelId>,
    /// Link-group children (only set on group labels).
    #[serde(default)]
    pub children: Vec<LabelId>,
}

impl Label {
    /// Create a label template. Id, item and color are assigned on insertion.
    pub fn new(label_type: LabelType) -> Self {
        Self {
            id: 0,
            item: 0,
            label_type,
            category: Vec::new(),
            attributes: Attributes::new(),
            shapes: Vec::new(),
            track: None,
            manual: true,
            color: [0, 0, 0],
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: Vec<String>) -> Self {
        self.category = category;
        self
    }

    /// Set the attributes.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Merge non-geometry properties with shallow overwrite semantics.
    pub fn merge(&mut self, props: &LabelProps) {
        if let Some(category) = &props.category {
            self.category = category.clone();
        }
        if let Some(attributes) = &props.attributes {
            self.attributes = attributes.clone();
        }
        if let Some(manual) = props.manual {
            self.manual = manual;
        }
        if let Some(track) = props.track {
            self.track = track;
        }
    }
}

/// Partial label update. `track: Some(None)` detaches the label from its track.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present_track",
        skip_serializing_if = "Option::is_none"
    )]
    pub track: Option<Option<TrackId>>,
}

/// A present `track` key, `null` included, deserializes to `Some`.
fn present_track<'de, D>(deserializer: D) -> Result<Option<Option<TrackId>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TrackId>::deserialize(deserializer).map(Some)
}

impl LabelProps {
    /// Props marking a label as manually edited.
    pub fn manual() -> Self {
        Self {
            manual: Some(true),
            ..Default::default()
        }
    }
}
