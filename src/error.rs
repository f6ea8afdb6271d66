//! Error types for state operations.

use thiserror::Error;

use crate::model::{ItemIndex, LabelId, ShapeId, TrackId};

/// Errors reported by the strict (`try_*`) reducers.
///
/// The lenient reducers absorb these into a logged no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No item is selected yet
    #[error("No current item")]
    NoCurrentItem,

    /// Item index outside the session
    #[error("Item not found: {index}")]
    ItemNotFound {
        /// The missing item index
        index: ItemIndex,
    },

    /// Label id unknown to the item
    #[error("Label {id} not found in item {item}")]
    LabelNotFound {
        /// The missing label id
        id: LabelId,
        /// Item that was searched
        item: ItemIndex,
    },

    /// Shape id unknown to the item
    #[error("Shape {id} not found in item {item}")]
    ShapeNotFound {
        /// The missing shape id
        id: ShapeId,
        /// Item that was searched
        item: ItemIndex,
    },

    /// Track id unknown to the session
    #[error("Track not found: {id}")]
    TrackNotFound {
        /// The missing track id
        id: TrackId,
    },

    /// Shape count does not match the label type's template
    #[error("Label type '{label_type}' cannot own {count} shapes")]
    TemplateMismatch {
        /// Display name of the label type
        label_type: String,
        /// Number of shapes supplied
        count: usize,
    },

    /// Linking needs at least two distinct labels
    #[error("Linking requires at least two labels, got {count}")]
    NotEnoughLabels {
        /// Number of distinct labels supplied
        count: usize,
    },

    /// Tracks overlap on at least one item and cannot be merged
    #[error("Tracks overlap on item {item}")]
    TracksOverlap {
        /// First item carrying occurrences of two tracks
        item: ItemIndex,
    },
}
