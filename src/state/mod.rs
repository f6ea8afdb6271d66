//! Session state: the immutable root, its reducers and the dispatch store.

mod action;
mod links;
pub mod reducers;
mod session;
mod store;

pub use action::{Action, reduce, try_reduce};
pub use links::{linked_label_ids, try_link_labels, try_unlink_labels};
pub use session::{Cursor, Layout, State, TaskConfig};
pub use store::{Dispatch, Store};
