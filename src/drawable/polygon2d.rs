//! Closed polygon drawable.

use super::{BODY_HANDLE, Drawable, Handle, ShapeObjects, draft_label, nearest_point};
use crate::constants::{MIN_POLYGON_VERTICES, POLYGON_CLOSE_THRESHOLD};
use crate::keybindings::Key;
use crate::model::{
    Item, Label, LabelId, LabelType, ShapeGeometry, ShapeId, Size, Vector2d, VertexRole,
    polygon_contains,
};
use crate::state::State;

#[derive(Debug, Clone, PartialEq)]
struct DragOrigin {
    handle: Handle,
    vertices: Vec<Vector2d>,
}

/// A polygon built vertex by vertex, closed once complete.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2dLabel {
    label: Label,
    id: Option<LabelId>,
    shape_ids: Vec<ShapeId>,
    vertices: Vec<Vector2d>,
    /// Live cursor position while placing vertices
    cursor: Option<Vector2d>,
    closed: bool,
    cancelled: bool,
    highlighted: bool,
    highlighted_handle: Option<Handle>,
    drag: Option<DragOrigin>,
    changed: bool,
}

impl Default for Polygon2dLabel {
    fn default() -> Self {
        Self::new()
    }
}

impl Polygon2dLabel {
    pub fn new() -> Self {
        Self {
            label: Label::new(LabelType::Polygon2d),
            id: None,
            shape_ids: Vec::new(),
            vertices: Vec::new(),
            cursor: None,
            closed: false,
            cancelled: false,
            highlighted: false,
            highlighted_handle: None,
            drag: None,
            changed: false,
        }
    }

    /// Wrap a persisted polygon. Returns `None` if a shape is missing.
    pub fn from_state(item: &Item, label: &Label) -> Option<Self> {
        if label.shapes.len() < MIN_POLYGON_VERTICES {
            return None;
        }
        let vertices = label
            .shapes
            .iter()
            .map(|id| item.shapes.get(id).map(|shape| shape.geometry.position()))
            .collect::<Option<Vec<_>>>()?;

        let mut drawable = Self::new();
        drawable.label = label.clone();
        drawable.id = Some(label.id);
        drawable.shape_ids = label.shapes.clone();
        drawable.vertices = vertices;
        drawable.closed = true;
        Some(drawable)
    }

    pub fn vertices(&self) -> &[Vector2d] {
        &self.vertices
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Preview position of the next vertex while drawing.
    pub fn cursor(&self) -> Option<Vector2d> {
        self.cursor
    }

    fn drawing(&self) -> bool {
        !self.closed && !self.cancelled && !self.vertices.is_empty()
    }

    fn close(&mut self) -> bool {
        if self.vertices.len() < MIN_POLYGON_VERTICES {
            return false;
        }
        self.closed = true;
        self.cursor = None;
        log::debug!("Polygon closed with {} vertices", self.vertices.len());
        true
    }

    fn add_vertex(&mut self, coord: Vector2d) {
        let closes = self
            .vertices
            .first()
            .is_some_and(|first| first.distance_to(&coord) <= POLYGON_CLOSE_THRESHOLD);
        if closes && self.close() {
            return;
        }
        if self.vertices.last() == Some(&coord) {
            return;
        }
        self.vertices.push(coord);
        self.changed = true;
    }
}

impl Drawable for Polygon2dLabel {
    fn init_temp(&mut self, state: &State, coord: Vector2d) {
        *self = Self::new();
        self.label = draft_label(state, LabelType::Polygon2d);
        self.vertices.push(coord);
    }

    fn is_valid(&self) -> bool {
        self.closed && !self.cancelled && self.vertices.len() >= MIN_POLYGON_VERTICES
    }

    fn editing(&self) -> bool {
        self.drawing() || self.drag.is_some()
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
        let ids = (0..self.vertices.len())
            .map(|i| self.shape_ids.get(i).copied())
            .collect();
        let geometry = self
            .vertices
            .iter()
            .map(|vertex| ShapeGeometry::vertex(*vertex, VertexRole::Polygon))
            .collect();
        ShapeObjects::from_geometry(ids, geometry)
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

    fn on_mouse_click(&mut self, coord: Vector2d) {
        if self.drawing() {
            self.add_vertex(coord);
        }
    }

    fn on_mouse_drag(&mut self, start: Vector2d, end: Vector2d, limit: Size) {
        if self.drawing() {
            self.cursor = Some(end.clamp_to(limit));
            return;
        }
        if self.cancelled {
            return;
        }

        let origin = match &self.drag {
            Some(origin) => origin.clone(),
            None => {
                let handle = self.highlighted_handle.unwrap_or(BODY_HANDLE);
                if !self.highlighted || handle >= self.handle_count() {
                    return;
                }
                let origin = DragOrigin {
                    handle,
                    vertices: self.vertices.clone(),
                };
                self.drag = Some(origin.clone());
                origin
            }
        };

        let delta = end - start;
        match origin.handle {
            BODY_HANDLE => {
                // Allowed displacement keeping every vertex inside the limit.
                let bounds = origin.vertices.iter().fold(
                    (Vector2d::new(f32::MIN, f32::MIN), Vector2d::new(f32::MAX, f32::MAX)),
                    |(lo, hi), v| {
                        (
                            Vector2d::new(lo.x.max(-v.x), lo.y.max(-v.y)),
                            Vector2d::new(hi.x.min(limit.width - v.x), hi.y.min(limit.height - v.y)),
                        )
                    },
                );
                let delta = Vector2d::new(
                    delta.x.clamp(bounds.0.x, bounds.1.x.max(bounds.0.x)),
                    delta.y.clamp(bounds.0.y, bounds.1.y.max(bounds.0.y)),
                );
                self.vertices = origin.vertices.iter().map(|v| *v + delta).collect();
            }
            handle => {
                let start = origin.vertices.get(handle - 1).copied();
                if let (Some(vertex), Some(start)) = (self.vertices.get_mut(handle - 1), start) {
                    *vertex = (start + delta).clamp_to(limit);
                }
            }
        }
        self.changed = true;
    }

    fn on_mouse_drag_end(&mut self, coord: Vector2d) {
        if self.drawing() {
            self.add_vertex(coord);
            return;
        }
        self.drag = None;
    }

    fn on_mouse_move(&mut self, coord: Vector2d, limit: Size) {
        if self.drawing() {
            self.cursor = Some(coord.clamp_to(limit));
        }
    }

    fn on_key_down(&mut self, key: Key) -> bool {
        if !self.drawing() {
            return true;
        }
        match key {
            Key::Enter => {
                self.close();
                true
            }
            Key::Backspace => {
                self.vertices.pop();
                if self.vertices.is_empty() {
                    self.cancelled = true;
                    return false;
                }
                true
            }
            Key::Escape => {
                self.cancelled = true;
                false
            }
            _ => true,
        }
    }

    fn on_key_up(&mut self, _key: Key) {}

    fn hit_test(&self, coord: Vector2d, radius: f32) -> Option<Handle> {
        if let Some(vertex) = nearest_point(&self.vertices, coord, radius) {
            return Some(vertex + 1);
        }
        (self.closed && polygon_contains(&self.vertices, &coord)).then_some(BODY_HANDLE)
    }

    fn handle_count(&self) -> usize {
        self.vertices.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TaskConfig;

    fn draft() -> Polygon2dLabel {
        let mut drawable = Polygon2dLabel::new();
        drawable.init_temp(&State::new(TaskConfig::default()), Vector2d::new(0.0, 0.0));
        drawable
    }

    fn triangle() -> Polygon2dLabel {
        let mut drawable = draft();
        for point in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)] {
            drawable.on_mouse_click(Vector2d::new(point.0, point.1));
        }
        drawable
    }

    #[test]
    fn test_draft_is_seeded_with_first_vertex() {
        let mut drawable = Polygon2dLabel::new();
        assert!(!drawable.editing());
        assert!(!drawable.is_valid());

        drawable.init_temp(&State::new(TaskConfig::default()), Vector2d::new(7.0, 9.0));
        assert_eq!(drawable.vertices(), &[Vector2d::new(7.0, 9.0)]);
        assert!(drawable.editing());

        drawable.on_mouse_click(Vector2d::new(7.0, 9.0));
        assert_eq!(drawable.vertices().len(), 1);
    }

    #[test]
    fn test_clicks_add_vertices() {
        let drawable = triangle();
        assert_eq!(drawable.vertices().len(), 3);
        assert!(drawable.editing());
        assert!(!drawable.is_valid());
    }

    #[test]
    fn test_click_near_first_vertex_closes() {
        let mut drawable = triangle();
        drawable.on_mouse_click(Vector2d::new(5.0, 5.0));
        assert!(drawable.is_closed());
        assert!(drawable.is_valid());
        assert!(!drawable.editing());
        assert_eq!(drawable.vertices().len(), 3);
    }

    #[test]
    fn test_close_needs_three_vertices() {
        let mut drawable = draft();
        drawable.on_mouse_click(Vector2d::new(0.0, 0.0));
        drawable.on_mouse_click(Vector2d::new(100.0, 0.0));
        drawable.on_mouse_click(Vector2d::new(2.0, 2.0));
        assert!(!drawable.is_closed());
        assert_eq!(drawable.vertices().len(), 3);

        let mut short = draft();
        short.on_mouse_click(Vector2d::new(0.0, 0.0));
        assert!(short.on_key_down(Key::Enter));
        assert!(!short.is_closed());
    }

    #[test]
    fn test_enter_closes() {
        let mut drawable = triangle();
        assert!(drawable.on_key_down(Key::Enter));
        assert!(drawable.is_valid());
    }

    #[test]
    fn test_backspace_removes_last_vertex() {
        let mut drawable = draft();
        drawable.on_mouse_click(Vector2d::new(0.0, 0.0));
        drawable.on_mouse_click(Vector2d::new(50.0, 0.0));
        assert!(drawable.on_key_down(Key::Backspace));
        assert_eq!(drawable.vertices(), &[Vector2d::new(0.0, 0.0)]);
        assert!(!drawable.on_key_down(Key::Backspace));
        assert!(!drawable.editing());
    }

    #[test]
    fn test_escape_invalidates_draft() {
        let mut drawable = triangle();
        assert!(!drawable.on_key_down(Key::Escape));
        assert!(!drawable.is_valid());
    }

    #[test]
    fn test_shape_objects_of_draft_have_no_ids() {
        let drawable = triangle();
        let objects = drawable.shape_objects();
        assert_eq!(objects.ids, vec![None, None, None]);
        assert_eq!(
            objects.geometry[1],
            ShapeGeometry::vertex(Vector2d::new(100.0, 0.0), VertexRole::Polygon)
        );
    }

    #[test]
    fn test_vertex_handle_drag() {
        let mut drawable = triangle();
        drawable.on_key_down(Key::Enter);
        assert_eq!(drawable.hit_test(Vector2d::new(99.0, 1.0), 4.0), Some(2));
        assert_eq!(drawable.hit_test(Vector2d::new(70.0, 30.0), 4.0), Some(BODY_HANDLE));

        drawable.set_highlighted(true, Some(2));
        drawable.on_mouse_drag(Vector2d::new(100.0, 0.0), Vector2d::new(120.0, 10.0), Size::unbounded());
        drawable.on_mouse_drag_end(Vector2d::new(120.0, 10.0));
        assert_eq!(drawable.vertices()[1], Vector2d::new(120.0, 10.0));
        assert!(!drawable.editing());
    }

    #[test]
    fn test_out_of_range_handle_is_ignored() {
        let mut drawable = triangle();
        drawable.on_key_down(Key::Enter);
        drawable.set_highlighted(true, Some(12));
        drawable.on_mouse_drag(Vector2d::new(0.0, 0.0), Vector2d::new(30.0, 30.0), Size::unbounded());
        assert_eq!(drawable.vertices()[0], Vector2d::new(0.0, 0.0));
        assert!(!drawable.editing());
    }

    #[test]
    fn test_body_drag_stays_inside_limit() {
        let mut drawable = triangle();
        drawable.on_key_down(Key::Enter);
        drawable.set_highlighted(true, Some(BODY_HANDLE));
        drawable.on_mouse_drag(Vector2d::new(50.0, 20.0), Vector2d::new(500.0, 20.0), Size::new(150.0, 150.0));
        assert_eq!(drawable.vertices()[0], Vector2d::new(50.0, 0.0));
        assert_eq!(drawable.vertices()[1], Vector2d::new(150.0, 0.0));
    }
}
