//! Shape primitives addressed by stable integer id.

use serde::{Deserialize, Serialize};

use super::geometry::{Vector2d, idx, lerp};
use super::{ItemIndex, LabelId, ShapeId};
use crate::constants::BOX2D_VERTEX_COUNT;

/// Role of a vertex within its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexRole {
    /// Box corner, source of truth for box geometry.
    Corner,
    /// Box edge midpoint, derived from adjacent corners.
    Midpoint,
    /// Polygon vertex.
    Polygon,
}

/// Discriminant of a shape's geometry, reported by drawables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rect,
    Vertex,
}

/// Geometry payload of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeGeometry {
    /// Axis-aligned rectangle defined by top-left corner and size.
    Rect { x: f32, y: f32, w: f32, h: f32 },
    /// Single vertex.
    Vertex { x: f32, y: f32, role: VertexRole },
}

impl ShapeGeometry {
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        ShapeGeometry::Rect { x, y, w, h }
    }

    pub fn vertex(point: Vector2d, role: VertexRole) -> Self {
        ShapeGeometry::Vertex {
            x: point.x,
            y: point.y,
            role,
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeGeometry::Rect { .. } => ShapeType::Rect,
            ShapeGeometry::Vertex { .. } => ShapeType::Vertex,
        }
    }

    /// Anchor point: the vertex itself or the rect's top-left corner.
    pub fn position(&self) -> Vector2d {
        match *self {
            ShapeGeometry::Rect { x, y, .. } | ShapeGeometry::Vertex { x, y, .. } => {
                Vector2d::new(x, y)
            }
        }
    }

    /// Shallow-merge `props` into this geometry. Fields that do not apply to
    /// the geometry kind are ignored.
    pub fn merge(&mut self, props: &ShapeProps) {
        match self {
            ShapeGeometry::Rect { x, y, w, h } => {
                if let Some(v) = props.x {
                    *x = v;
                }
                if let Some(v) = props.y {
                    *y = v;
                }
                if let Some(v) = props.w {
                    *w = v;
                }
                if let Some(v) = props.h {
                    *h = v;
                }
            }
            ShapeGeometry::Vertex { x, y, .. } => {
                if let Some(v) = props.x {
                    *x = v;
                }
                if let Some(v) = props.y {
                    *y = v;
                }
            }
        }
    }

    /// Interpolate towards `other` at `t`. Returns `None` when the kinds differ.
    pub fn interpolate(&self, other: &ShapeGeometry, t: f32) -> Option<ShapeGeometry> {
        match (*self, *other) {
            (
                ShapeGeometry::Rect { x, y, w, h },
                ShapeGeometry::Rect {
                    x: x2,
                    y: y2,
                    w: w2,
                    h: h2,
                },
            ) => Some(ShapeGeometry::rect(
                lerp(x, x2, t),
                lerp(y, y2, t),
                lerp(w, w2, t),
                lerp(h, h2, t),
            )),
            (ShapeGeometry::Vertex { x, y, role }, ShapeGeometry::Vertex { x: x2, y: y2, .. }) => {
                Some(ShapeGeometry::Vertex {
                    x: lerp(x, x2, t),
                    y: lerp(y, y2, t),
                    role,
                })
            }
            _ => None,
        }
    }
}

/// Partial shape update with shallow-key overwrite semantics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f32>,
}

impl ShapeProps {
    /// Move to an absolute position.
    pub fn position(point: Vector2d) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
            ..Default::default()
        }
    }

    /// Full overwrite of the geometry's fields.
    pub fn from_geometry(geometry: &ShapeGeometry) -> Self {
        match *geometry {
            ShapeGeometry::Rect { x, y, w, h } => Self {
                x: Some(x),
                y: Some(y),
                w: Some(w),
                h: Some(h),
            },
            ShapeGeometry::Vertex { x, y, .. } => Self::position(Vector2d::new(x, y)),
        }
    }
}

/// A shape owned by one item and referenced by labels via id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier, drawn from the session-wide id counter.
    pub id: ShapeId,
    /// Index of the owning item.
    pub item: ItemIndex,
    /// Labels referencing this shape.
    pub label: Vec<LabelId>,
    /// The geometry.
    pub geometry: ShapeGeometry,
}

impl Shape {
    pub fn new(id: ShapeId, item: ItemIndex, geometry: ShapeGeometry) -> Self {
        Self {
            id,
            item,
            label: Vec::new(),
            geometry,
        }
    }
}

/// Box geometry in slot order: rect, then 8 vertices walked clockwise from
/// the top-left corner. Corners are `[top_left, top_right, bottom_right,
/// bottom_left]`; midpoints and the rect are derived from them.
pub fn box2d_geometry(corners: [Vector2d; 4]) -> Vec<ShapeGeometry> {
    let mut vertices = [Vector2d::default(); BOX2D_VERTEX_COUNT];
    for (k, corner) in corners.iter().enumerate() {
        vertices[2 * k] = *corner;
    }
    for i in (1..BOX2D_VERTEX_COUNT as isize).step_by(2) {
        let prev = vertices[idx(i - 1, BOX2D_VERTEX_COUNT)];
        let next = vertices[idx(i + 1, BOX2D_VERTEX_COUNT)];
        vertices[i as usize] = prev.midpoint(&next);
    }

    let top_left = vertices[0];
    let bottom_right = vertices[4];
    let mut geometry = Vec::with_capacity(BOX2D_VERTEX_COUNT + 1);
    geometry.push(ShapeGeometry::rect(
        top_left.x,
        top_left.y,
        bottom_right.x - top_left.x,
        bottom_right.y - top_left.y,
    ));
    geometry.extend(vertices.iter().enumerate().map(|(i, v)| {
        let role = if i % 2 == 0 {
            VertexRole::Corner
        } else {
            VertexRole::Midpoint
        };
        ShapeGeometry::vertex(*v, role)
    }));
    geometry
}
