//! Drawable labels: editable, hit-testable views over persisted labels.
//!
//! A drawable either wraps a label that already lives in the state (built
//! with `from_state`) or is a draft seeded by `init_temp` that has no id yet.
//! Handle 0 is the label body, handle `k >= 1` is vertex `k - 1`.

mod box2d;
mod polygon2d;

pub use box2d::Box2dLabel;
pub use polygon2d::Polygon2dLabel;

use crate::keybindings::Key;
use crate::model::{
    Attributes, Item, Label, LabelId, LabelType, ShapeGeometry, ShapeId, ShapeType, Size, TrackId,
    Vector2d,
};
use crate::state::State;

/// Handle index within a drawable.
pub type Handle = usize;

/// Handle index of the label body.
pub const BODY_HANDLE: Handle = 0;

/// Shape slots of a drawable. Draft slots have no id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeObjects {
    pub ids: Vec<Option<ShapeId>>,
    pub types: Vec<ShapeType>,
    pub geometry: Vec<ShapeGeometry>,
}

impl ShapeObjects {
    pub fn from_geometry(ids: Vec<Option<ShapeId>>, geometry: Vec<ShapeGeometry>) -> Self {
        Self {
            ids,
            types: geometry.iter().map(ShapeGeometry::shape_type).collect(),
            geometry,
        }
    }
}

/// Capabilities shared by every drawable label.
pub trait Drawable {
    /// Seed a draft at `coord` using the cursor's label defaults.
    fn init_temp(&mut self, state: &State, coord: Vector2d);

    fn is_valid(&self) -> bool;

    /// Whether the label is mid-construction or mid-edit.
    fn editing(&self) -> bool;

    /// Whether the geometry differs from the state it was built from.
    fn changed(&self) -> bool;

    fn label(&self) -> &Label;

    fn label_id(&self) -> Option<LabelId>;

    fn category(&self) -> &[String] {
        &self.label().category
    }

    fn attributes(&self) -> &Attributes {
        &self.label().attributes
    }

    fn track(&self) -> Option<TrackId> {
        self.label().track
    }

    fn shape_objects(&self) -> ShapeObjects;

    fn set_highlighted(&mut self, highlighted: bool, handle: Option<Handle>);

    fn highlighted(&self) -> bool;

    fn highlighted_handle(&self) -> Option<Handle>;

    fn on_mouse_click(&mut self, coord: Vector2d);

    fn on_mouse_drag(&mut self, start: Vector2d, end: Vector2d, limit: Size);

    fn on_mouse_drag_end(&mut self, coord: Vector2d);

    fn on_mouse_move(&mut self, coord: Vector2d, limit: Size);

    /// Returns false when the label is no longer viable.
    fn on_key_down(&mut self, key: Key) -> bool;

    fn on_key_up(&mut self, key: Key);

    fn hit_test(&self, coord: Vector2d, radius: f32) -> Option<Handle>;

    /// Number of valid handles, body included.
    fn handle_count(&self) -> usize;
}

/// Drawable variants, one per drawable label type.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawableLabel {
    Box2d(Box2dLabel),
    Polygon2d(Polygon2dLabel),
}

/// Build an empty drawable for a label type. Group labels are not drawable.
pub fn make_drawable(label_type: LabelType) -> Option<DrawableLabel> {
    match label_type {
        LabelType::Box2d => Some(DrawableLabel::Box2d(Box2dLabel::new())),
        LabelType::Polygon2d => Some(DrawableLabel::Polygon2d(Polygon2dLabel::new())),
        LabelType::Group => None,
    }
}

impl DrawableLabel {
    /// Build a drawable over a persisted label.
    pub fn from_state(item: &Item, label: &Label) -> Option<Self> {
        match label.label_type {
            LabelType::Box2d => Box2dLabel::from_state(item, label).map(DrawableLabel::Box2d),
            LabelType::Polygon2d => {
                Polygon2dLabel::from_state(item, label).map(DrawableLabel::Polygon2d)
            }
            LabelType::Group => None,
        }
    }

    pub fn label_type(&self) -> LabelType {
        match self {
            DrawableLabel::Box2d(_) => LabelType::Box2d,
            DrawableLabel::Polygon2d(_) => LabelType::Polygon2d,
        }
    }

    fn inner(&self) -> &dyn Drawable {
        match self {
            DrawableLabel::Box2d(label) => label,
            DrawableLabel::Polygon2d(label) => label,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Drawable {
        match self {
            DrawableLabel::Box2d(label) => label,
            DrawableLabel::Polygon2d(label) => label,
        }
    }
}

impl Drawable for DrawableLabel {
    fn init_temp(&mut self, state: &State, coord: Vector2d) {
        self.inner_mut().init_temp(state, coord)
    }

    fn is_valid(&self) -> bool {
        self.inner().is_valid()
    }

    fn editing(&self) -> bool {
        self.inner().editing()
    }

    fn changed(&self) -> bool {
        self.inner().changed()
    }

    fn label(&self) -> &Label {
        self.inner().label()
    }

    fn label_id(&self) -> Option<LabelId> {
        self.inner().label_id()
    }

    fn shape_objects(&self) -> ShapeObjects {
        self.inner().shape_objects()
    }

    fn set_highlighted(&mut self, highlighted: bool, handle: Option<Handle>) {
        self.inner_mut().set_highlighted(highlighted, handle)
    }

    fn highlighted(&self) -> bool {
        self.inner().highlighted()
    }

    fn highlighted_handle(&self) -> Option<Handle> {
        self.inner().highlighted_handle()
    }

    fn on_mouse_click(&mut self, coord: Vector2d) {
        self.inner_mut().on_mouse_click(coord)
    }

    fn on_mouse_drag(&mut self, start: Vector2d, end: Vector2d, limit: Size) {
        self.inner_mut().on_mouse_drag(start, end, limit)
    }

    fn on_mouse_drag_end(&mut self, coord: Vector2d) {
        self.inner_mut().on_mouse_drag_end(coord)
    }

    fn on_mouse_move(&mut self, coord: Vector2d, limit: Size) {
        self.inner_mut().on_mouse_move(coord, limit)
    }

    fn on_key_down(&mut self, key: Key) -> bool {
        self.inner_mut().on_key_down(key)
    }

    fn on_key_up(&mut self, key: Key) {
        self.inner_mut().on_key_up(key)
    }

    fn hit_test(&self, coord: Vector2d, radius: f32) -> Option<Handle> {
        self.inner().hit_test(coord, radius)
    }

    fn handle_count(&self) -> usize {
        self.inner().handle_count()
    }
}

/// Label template for a new draft, carrying the cursor's defaults.
pub(crate) fn draft_label(state: &State, label_type: LabelType) -> Label {
    let mut label = Label::new(label_type)
        .with_category(state.current_category())
        .with_attributes(state.current.attributes.clone());
    label.item = state.current.item.unwrap_or_default();
    label
}

/// Index of the first point within `radius` of `coord`, closest first.
pub(crate) fn nearest_point(points: &[Vector2d], coord: Vector2d, radius: f32) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, point)| (i, point.distance_to(&coord)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
