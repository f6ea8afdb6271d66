//! Propagation policies deciding how a track fills non-manual occurrences.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::{ItemIndex, ShapeGeometry};

/// Identifier of a registered propagation policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Interpolate between the nearest manual keyframes.
    #[default]
    LinearInterpolation,
    /// Repeat the last manual keyframe until the next one.
    HoldLast,
}

impl PolicyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::LinearInterpolation => "linear interpolation",
            PolicyKind::HoldLast => "hold last",
        }
    }
}

/// A manually edited occurrence used as propagation source.
#[derive(Debug, Clone, Copy)]
pub struct Keyframe<'a> {
    pub index: ItemIndex,
    pub shapes: &'a [ShapeGeometry],
}

/// Propagation behaviour of a track.
pub trait TrackPolicy {
    fn kind(&self) -> PolicyKind;

    /// Items that receive a predicted occurrence when a track starts at `created`.
    fn initial_range(&self, created: ItemIndex, item_count: usize) -> Range<ItemIndex> {
        (created + 1).min(item_count)..item_count
    }

    /// Predicted shapes at `target` from the nearest keyframe on each side.
    /// `None` leaves the occurrence untouched.
    fn predict(
        &self,
        target: ItemIndex,
        before: Option<Keyframe<'_>>,
        after: Option<Keyframe<'_>>,
    ) -> Option<Vec<ShapeGeometry>>;
}

/// Linear interpolation between keyframes, copying when one side is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearInterpolation;

impl TrackPolicy for LinearInterpolation {
    fn kind(&self) -> PolicyKind {
        PolicyKind::LinearInterpolation
    }

    fn predict(
        &self,
        target: ItemIndex,
        before: Option<Keyframe<'_>>,
        after: Option<Keyframe<'_>>,
    ) -> Option<Vec<ShapeGeometry>> {
        match (before, after) {
            (Some(b), Some(a)) if a.index > b.index && a.shapes.len() == b.shapes.len() => {
                let t = (target - b.index) as f32 / (a.index - b.index) as f32;
                b.shapes
                    .iter()
                    .zip(a.shapes)
                    .map(|(from, to)| from.interpolate(to, t))
                    .collect::<Option<Vec<_>>>()
                    .or_else(|| Some(b.shapes.to_vec()))
            }
            (Some(b), _) => Some(b.shapes.to_vec()),
            (None, Some(a)) => Some(a.shapes.to_vec()),
            (None, None) => None,
        }
    }
}

/// Hold the previous keyframe's shapes until the next keyframe.
#[derive(Debug, Default, Clone, Copy)]
pub struct HoldLast;

impl TrackPolicy for HoldLast {
    fn kind(&self) -> PolicyKind {
        PolicyKind::HoldLast
    }

    fn predict(
        &self,
        _target: ItemIndex,
        before: Option<Keyframe<'_>>,
        _after: Option<Keyframe<'_>>,
    ) -> Option<Vec<ShapeGeometry>> {
        before.map(|keyframe| keyframe.shapes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(x: f32) -> Vec<ShapeGeometry> {
        vec![ShapeGeometry::rect(x, 0.0, 10.0, 10.0)]
    }

    #[test]
    fn test_linear_interpolates_between_keyframes() {
        let (a, b) = (rects(0.0), rects(40.0));
        let predicted = LinearInterpolation.predict(
            1,
            Some(Keyframe { index: 0, shapes: &a }),
            Some(Keyframe { index: 4, shapes: &b }),
        );
        assert_eq!(predicted, Some(rects(10.0)));
    }

    #[test]
    fn test_linear_copies_single_side() {
        let a = rects(5.0);
        let predicted = LinearInterpolation.predict(3, None, Some(Keyframe { index: 4, shapes: &a }));
        assert_eq!(predicted, Some(a));
        assert_eq!(LinearInterpolation.predict(3, None, None), None);
    }

    #[test]
    fn test_hold_last_ignores_next_keyframe() {
        let (a, b) = (rects(0.0), rects(40.0));
        let predicted = HoldLast.predict(
            2,
            Some(Keyframe { index: 0, shapes: &a }),
            Some(Keyframe { index: 4, shapes: &b }),
        );
        assert_eq!(predicted, Some(a));
        assert_eq!(HoldLast.predict(2, None, Some(Keyframe { index: 4, shapes: &b })), None);
    }

    #[test]
    fn test_initial_range_is_forward() {
        assert_eq!(LinearInterpolation.initial_range(2, 5), 3..5);
        assert_eq!(HoldLast.initial_range(4, 5), 5..5);
    }
}
