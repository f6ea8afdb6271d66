//! Core geometry types in image coordinates.

use serde::{Deserialize, Serialize};

/// A 2D point or displacement in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2d {
    pub x: f32,
    pub y: f32,
}

impl Vector2d {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Vector2d) -> f32 {
        (*self - *other).length_sq().sqrt()
    }

    /// Squared length, used for threshold checks without a square root.
    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Arithmetic mean of two points.
    pub fn midpoint(&self, other: &Vector2d) -> Vector2d {
        Vector2d::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Clamp into `[0, limit]` on both axes.
    pub fn clamp_to(&self, limit: Size) -> Vector2d {
        Vector2d::new(
            self.x.clamp(0.0, limit.width.max(0.0)),
            self.y.clamp(0.0, limit.height.max(0.0)),
        )
    }
}

impl std::ops::Add for Vector2d {
    type Output = Vector2d;

    fn add(self, rhs: Vector2d) -> Vector2d {
        Vector2d::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vector2d {
    type Output = Vector2d;

    fn sub(self, rhs: Vector2d) -> Vector2d {
        Vector2d::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Canvas or image extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Unbounded canvas, no clamping is applied.
    pub fn unbounded() -> Self {
        Self::new(f32::INFINITY, f32::INFINITY)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Cyclic index: `idx(i, n) = ((i % n) + n) % n`.
pub fn idx(i: isize, n: usize) -> usize {
    let n = n as isize;
    (((i % n) + n) % n) as usize
}

/// Linear interpolation.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Check if a point is inside a polygon (ray casting algorithm).
pub fn polygon_contains(vertices: &[Vector2d], point: &Vector2d) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = &vertices[i];
        let vj = &vertices[j];
        if ((vi.y > point.y) != (vj.y > point.y))
            && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
