//! The three text buffers and change notification.

use std::fmt;

use super::EditorBuffer;

/// One of the three text buffers of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Source,
    Config,
    Output,
}

impl Pane {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Config => "Config",
            Self::Output => "Output",
        }
    }

    /// The user-editable counterpart, if any.
    pub const fn as_input(self) -> Option<InputPane> {
        match self {
            Self::Source => Some(InputPane::Source),
            Self::Config => Some(InputPane::Config),
            Self::Output => None,
        }
    }
}

/// A buffer the user may edit. The output is deliberately not one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputPane {
    Source,
    Config,
}

impl From<InputPane> for Pane {
    fn from(pane: InputPane) -> Self {
        match pane {
            InputPane::Source => Self::Source,
            InputPane::Config => Self::Config,
        }
    }
}

/// Notification that a buffer's text changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub pane: Pane,
    /// Revision of the buffer after the change.
    pub revision: u64,
}

impl Change {
    /// True for edits to source or config, the ones that warrant a reformat.
    pub const fn is_input(&self) -> bool {
        !matches!(self.pane, Pane::Output)
    }
}

type Observer = Box<dyn FnMut(&Change)>;

/// Owns the source, config and output text of a session.
///
/// Every mutation calls the registered observers before returning, in the
/// caller's context. Nothing is validated here: a malformed config is the
/// formatter's business.
pub struct EditorState {
    source: EditorBuffer,
    config: EditorBuffer,
    output: EditorBuffer,
    observers: Vec<Observer>,
}

impl EditorState {
    pub fn new() -> Self {
        Self {
            source: EditorBuffer::empty(),
            config: EditorBuffer::empty(),
            output: EditorBuffer::empty(),
            observers: Vec::new(),
        }
    }

    pub fn source(&self) -> String {
        self.source.text()
    }

    pub fn config(&self) -> String {
        self.config.text()
    }

    pub fn output(&self) -> String {
        self.output.text()
    }

    pub fn set_source(&mut self, text: &str) {
        self.replace(Pane::Source, text);
    }

    pub fn set_config(&mut self, text: &str) {
        self.replace(Pane::Config, text);
    }

    pub fn set_output(&mut self, text: &str) {
        self.replace(Pane::Output, text);
    }

    pub const fn buffer(&self, pane: Pane) -> &EditorBuffer {
        match pane {
            Pane::Source => &self.source,
            Pane::Config => &self.config,
            Pane::Output => &self.output,
        }
    }

    /// Cursor-only access to a buffer, e.g. to scroll the read-only output.
    ///
    /// Text edits made through this borrow are not announced; use
    /// [`edit`](Self::edit) for those.
    pub(crate) const fn buffer_mut(&mut self, pane: Pane) -> &mut EditorBuffer {
        match pane {
            Pane::Source => &mut self.source,
            Pane::Config => &mut self.config,
            Pane::Output => &mut self.output,
        }
    }

    /// Apply an in-place edit (a keystroke) to an input buffer.
    ///
    /// Observers hear about it only if the text actually changed.
    pub fn edit<R>(&mut self, pane: InputPane, f: impl FnOnce(&mut EditorBuffer) -> R) -> R {
        let pane = Pane::from(pane);
        let buffer = self.buffer_mut(pane);
        let before = buffer.revision();
        let result = f(&mut *buffer);
        let after = buffer.revision();
        if after != before {
            self.notify(Change {
                pane,
                revision: after,
            });
        }
        result
    }

    /// Register an observer for every subsequent change.
    pub fn subscribe(&mut self, observer: impl FnMut(&Change) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn replace(&mut self, pane: Pane, text: &str) {
        let buffer = self.buffer_mut(pane);
        buffer.set_text(text);
        let revision = buffer.revision();
        self.notify(Change { pane, revision });
    }

    fn notify(&mut self, change: Change) {
        for observer in &mut self.observers {
            observer(&change);
        }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorState")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("output", &self.output)
            .field("observers", &self.observers.len())
            .finish()
    }
}
