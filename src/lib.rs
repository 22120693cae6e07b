// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. service::ServiceError)
    clippy::module_name_repetitions
)]

//! # livefmt
//!
//! A live-preview code formatter for the terminal.
//!
//! livefmt keeps three buffers side by side: the source being formatted,
//! the formatter's config, and the formatted output. Edits to either input
//! are debounced and then run through an external formatting service; the
//! result replaces the output.
//!
//! ## Architecture
//!
//! - The service lives behind [`service::FormatService`], a handle-based
//!   boundary where every returned buffer is copied out and released
//!   exactly once.
//! - [`pipeline::Session`] owns the editor state, the debouncer and the
//!   orchestrator, and bootstraps once the service signals readiness.
//! - The terminal front end follows The Elm Architecture (TEA).
//!
//! ## Modules
//!
//! - [`app`]: Terminal event loop and state
//! - [`config`]: Saved command-line defaults
//! - [`editor`]: Text buffers and change notification
//! - [`perf`]: Timing and debug event log
//! - [`pipeline`]: Debounce, format runs and bootstrap
//! - [`service`]: Formatting service boundary
//! - [`ui`]: Terminal rendering
//! - [`watcher`]: File watching for re-import

pub mod app;
pub mod config;
pub mod editor;
pub mod perf;
pub mod pipeline;
pub mod service;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::editor::{EditorState, InputPane, Pane};
    pub use crate::pipeline::{RunOutcome, Session, SessionOptions};
    pub use crate::service::{CommandService, CommandSpec, FormatService, Handle, ServiceError};
}
