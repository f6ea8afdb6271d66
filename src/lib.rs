//! VAT - Video and image Annotation Toolkit core
//!
//! Immutable annotation state, reducers, object tracks, drawable labels and
//! the pointer/keyboard interaction handler that turns gestures into actions.

pub mod color_utils;
pub mod config;
pub mod constants;
pub mod drawable;
pub mod error;
pub mod handler;
pub mod keybindings;
pub mod model;
pub mod replay;
pub mod state;
pub mod track;
