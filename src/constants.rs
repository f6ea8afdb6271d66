//! Global constants for the annotation core

/// Squared pointer displacement at which a held button becomes a drag.
pub const DRAG_THRESHOLD_SQ: f32 = 10.0;

/// Minimum width/height for a valid bounding box (in image pixels).
pub const MIN_BOX_SIZE: f32 = 1.0;

/// Minimum number of vertices required for a valid polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Distance threshold for closing a polygon by clicking near the first vertex.
pub const POLYGON_CLOSE_THRESHOLD: f32 = 15.0;

/// Default hit radius for handles (in image pixels).
pub const HANDLE_HIT_RADIUS: f32 = 8.0;

/// Number of shape slots owned by a box label (1 rect + 4 corners + 4 midpoints).
pub const BOX2D_SHAPE_COUNT: usize = 9;

/// Number of vertex slots walked cyclically around a box.
pub const BOX2D_VERTEX_COUNT: usize = 8;

/// Default width ratio of the assistant view.
pub const DEFAULT_ASSISTANT_VIEW_RATIO: f32 = 0.3;
