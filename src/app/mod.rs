//! Terminal front end and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state, including the session
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! The formatting pipeline itself lives in [`crate::pipeline`]; the event
//! loop only delivers the service's readiness and calls `Session::tick`.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use input::{handle_event, handle_key};
pub use model::{AppSession, Import, ImportPrompt, Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::pipeline::SessionOptions;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug, Default)]
pub struct App {
    source_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    options: SessionOptions,
    watch_enabled: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// File loaded into the source pane at startup.
    pub fn with_source(mut self, path: Option<PathBuf>) -> Self {
        self.source_path = path;
        self
    }

    /// File loaded into the config pane once the formatter is ready.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub const fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Re-import files when they change on disk.
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
