//! Axis-aligned bounding box drawable.

use super::{BODY_HANDLE, Drawable, Handle, ShapeObjects, draft_label, nearest_point};
use crate::constants::{BOX2D_SHAPE_COUNT, BOX2D_VERTEX_COUNT, MIN_BOX_SIZE};
use crate::keybindings::Key;
use crate::model::{
    Item, Label, LabelId, LabelType, ShapeId, Size, Vector2d, box2d_geometry, idx,
};
use crate::state::State;

/// Geometry captured when a drag on an existing box starts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragOrigin {
    handle: Handle,
    min: Vector2d,
    max: Vector2d,
}

/// A box spanned by its top-left and bottom-right corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Box2dLabel {
    label: Label,
    id: Option<LabelId>,
    shape_ids: Vec<Option<ShapeId>>,
    min: Vector2d,
    max: Vector2d,
    seed: Vector2d,
    highlighted: bool,
    highlighted_handle: Option<Handle>,
    drag: Option<DragOrigin>,
    drawing: bool,
    cancelled: bool,
    changed: bool,
}

impl Default for Box2dLabel {
    fn default() -> Self {
        Self::new()
    }
}

impl Box2dLabel {
    pub fn new() -> Self {
        Self {
            label: Label::new(LabelType::Box2d),
            id: None,
            shape_ids: vec![None; BOX2D_SHAPE_COUNT],
            min: Vector2d::default(),
            max: Vector2d::default(),
            seed: Vector2d::default(),
            highlighted: false,
            highlighted_handle: None,
            drag: None,
            drawing: false,
            cancelled: false,
            changed: false,
        }
    }

    /// Wrap a persisted box. Returns `None` if the label does not own 9 shapes.
    pub fn from_state(item: &Item, label: &Label) -> Option<Self> {
        if label.shapes.len() != BOX2D_SHAPE_COUNT {
            return None;
        }
        let top_left = item.shapes.get(&label.shapes[1])?.geometry.position();
        let bottom_right = item.shapes.get(&label.shapes[5])?.geometry.position();

        let mut drawable = Self::new();
        drawable.label = label.clone();
        drawable.id = Some(label.id);
        drawable.shape_ids = label.shapes.iter().copied().map(Some).collect();
        drawable.set_span(top_left, bottom_right);
        Some(drawable)
    }

    /// Corners clockwise from the top-left.
    pub fn corners(&self) -> [Vector2d; 4] {
        [
            self.min,
            Vector2d::new(self.max.x, self.min.y),
            self.max,
            Vector2d::new(self.min.x, self.max.y),
        ]
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    fn vertices(&self) -> [Vector2d; BOX2D_VERTEX_COUNT] {
        let corners = self.corners();
        let mut vertices = [Vector2d::default(); BOX2D_VERTEX_COUNT];
        for i in 0..BOX2D_VERTEX_COUNT as isize {
            vertices[i as usize] = if i % 2 == 0 {
                corners[i as usize / 2]
            } else {
                let prev = corners[idx(i - 1, BOX2D_VERTEX_COUNT) / 2];
                let next = corners[idx(i + 1, BOX2D_VERTEX_COUNT) / 2];
                prev.midpoint(&next)
            };
        }
        vertices
    }

    /// Span the box between two arbitrary points.
    fn set_span(&mut self, a: Vector2d, b: Vector2d) {
        self.min = Vector2d::new(a.x.min(b.x), a.y.min(b.y));
        self.max = Vector2d::new(a.x.max(b.x), a.y.max(b.y));
    }

    fn apply_drag(&mut self, origin: DragOrigin, delta: Vector2d, limit: Size) {
        let (min, max) = (origin.min, origin.max);
        match origin.handle {
            BODY_HANDLE => {
                let size = max - min;
                let top_left = (min + delta).clamp_to(Size::new(
                    limit.width - size.x,
                    limit.height - size.y,
                ));
                self.min = top_left;
                self.max = top_left + size;
            }
            handle if handle <= BOX2D_VERTEX_COUNT => {
                let vertex = handle - 1;
                let corners = [
                    min,
                    Vector2d::new(max.x, min.y),
                    max,
                    Vector2d::new(min.x, max.y),
                ];
                if vertex % 2 == 0 {
                    let moved = (corners[vertex / 2] + delta).clamp_to(limit);
                    let opposite = corners[(vertex / 2 + 2) % 4];
                    self.set_span(moved, opposite);
                } else {
                    let (mut a, mut b) = (min, max);
                    match vertex {
                        1 => a.y = (min.y + delta.y).clamp(0.0, limit.height),
                        3 => b.x = (max.x + delta.x).clamp(0.0, limit.width),
                        5 => b.y = (max.y + delta.y).clamp(0.0, limit.height),
                        _ => a.x = (min.x + delta.x).clamp(0.0, limit.width),
                    }
                    self.set_span(a, b);
                }
            }
            _ => {}
        }
    }
}

impl Drawable for Box2dLabel {
    fn init_temp(&mut self, state: &State, coord: Vector2d) {
        *self = Self::new();
        self.label = draft_label(state, LabelType::Box2d);
        self.seed = coord;
        self.min = coord;
        self.max = coord;
    }

    fn is_valid(&self) -> bool {
        !self.cancelled && self.width() > MIN_BOX_SIZE && self.height() > MIN_BOX_SIZE
    }

    fn editing(&self) -> bool {
        self.drawing || self.drag.is_some()
    }

    fn changed(&self) -> bool {
        self.changed
    }

    fn label(&self) -> &Label {
        &self.label
    }

    fn label_id(&self) -> Option<LabelId> {
        self.id
    }

    fn shape_objects(&self) -> ShapeObjects {
        ShapeObjects::from_geometry(self.shape_ids.clone(), box2d_geometry(self.corners()))
    }

    fn set_highlighted(&mut self, highlighted: bool, handle: Option<Handle>) {
        self.highlighted = highlighted;
        self.highlighted_handle = if highlighted { handle } else { None };
    }

    fn highlighted(&self) -> bool {
        self.highlighted
    }

    fn highlighted_handle(&self) -> Option<Handle> {
        self.highlighted_handle
    }

    fn on_mouse_click(&mut self, _coord: Vector2d) {}

    fn on_mouse_drag(&mut self, start: Vector2d, end: Vector2d, limit: Size) {
        if self.cancelled {
            return;
        }
        if self.id.is_none() {
            self.drawing = true;
            self.set_span(self.seed, end.clamp_to(limit));
            self.changed = true;
            return;
        }

        let origin = match self.drag {
            Some(origin) => origin,
            None => {
                let handle = self.highlighted_handle.unwrap_or(BODY_HANDLE);
                if !self.highlighted || handle >= self.handle_count() {
                    return;
                }
                let origin = DragOrigin {
                    handle,
                    min: self.min,
                    max: self.max,
                };
                self.drag = Some(origin);
                origin
            }
        };
        self.apply_drag(origin, end - start, limit);
        self.changed = true;
    }

    fn on_mouse_drag_end(&mut self, _coord: Vector2d) {
        self.drawing = false;
        self.drag = None;
    }

    fn on_mouse_move(&mut self, _coord: Vector2d, _limit: Size) {}

    fn on_key_down(&mut self, key: Key) -> bool {
        if key == Key::Escape && self.id.is_none() {
            self.cancelled = true;
            self.drawing = false;
            return false;
        }
        true
    }

    fn on_key_up(&mut self, _key: Key) {}

    fn hit_test(&self, coord: Vector2d, radius: f32) -> Option<Handle> {
        if let Some(vertex) = nearest_point(&self.vertices(), coord, radius) {
            return Some(vertex + 1);
        }
        let inside = coord.x >= self.min.x
            && coord.x <= self.max.x
            && coord.y >= self.min.y
            && coord.y <= self.max.y;
        inside.then_some(BODY_HANDLE)
    }

    fn handle_count(&self) -> usize {
        BOX2D_VERTEX_COUNT + 1
    }
}
