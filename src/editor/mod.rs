//! Editor state for the three panes of a session.
//!
//! [`EditorBuffer`] is a rope-backed text buffer with a cursor;
//! [`EditorState`] owns the source, config and output buffers and tells
//! observers about every change.

mod buffer;
mod state;

pub use buffer::{Cursor, Direction, EditorBuffer};
pub use state::{Change, EditorState, InputPane, Pane};
