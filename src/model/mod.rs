//! Data models: shapes, labels and items.

mod geometry;
mod item;
mod label;
mod shape;

pub use geometry::{Size, Vector2d, idx, lerp, polygon_contains};
pub use item::{Item, ViewerConfig};
pub use label::{Attributes, Label, LabelProps, LabelType};
pub use shape::{Shape, ShapeGeometry, ShapeProps, ShapeType, VertexRole, box2d_geometry};

/// Unique identifier for a label, shared id space with shapes.
pub type LabelId = u64;

/// Unique identifier for a shape, shared id space with labels.
pub type ShapeId = u64;

/// Unique identifier for a track.
pub type TrackId = u64;

/// Position of an item in the session.
pub type ItemIndex = usize;
