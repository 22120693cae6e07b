use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ratatui::layout::Rect;

use crate::editor::{InputPane, Pane};
use crate::pipeline::{ConfigSeed, Session, SessionOptions, SystemClock};
use crate::service::{FormatService, ServiceError};

/// The session type the terminal front end drives.
pub type AppSession = Session<Box<dyn FormatService>>;

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The path prompt opened by Ctrl+O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPrompt {
    pub target: InputPane,
    pub input: String,
}

impl ImportPrompt {
    pub fn target_title(&self) -> &'static str {
        Pane::from(self.target).title()
    }
}

/// A file whose text was loaded into an input pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub pane: InputPane,
    /// Canonical when the file could be resolved, as typed otherwise.
    pub path: PathBuf,
}

/// The complete application state.
pub struct Model {
    pub session: AppSession,
    pub focus: Pane,
    /// Terminal size, used to size panes for scrolling.
    pub terminal_size: (u16, u16),
    /// First visible line of config, source and output.
    scroll: [usize; 3],
    pub help_visible: bool,
    pub help_scroll_offset: usize,
    pub prompt: Option<ImportPrompt>,
    pub imports: Vec<Import>,
    /// Config file to import once the service has signalled.
    pub deferred_config: Option<PathBuf>,
    pub watch_enabled: bool,
    pub config_global_path: Option<PathBuf>,
    pub config_local_path: Option<PathBuf>,
    pub should_quit: bool,
    toast: Option<Toast>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("phase", &self.session.phase())
            .field("focus", &self.focus)
            .field("imports", &self.imports)
            .field("watch_enabled", &self.watch_enabled)
            .finish_non_exhaustive()
    }
}

impl Model {
    pub fn new(session: AppSession, terminal_size: (u16, u16)) -> Self {
        Self {
            session,
            focus: Pane::Source,
            terminal_size,
            scroll: [0; 3],
            help_visible: false,
            help_scroll_offset: 0,
            prompt: None,
            imports: Vec::new(),
            deferred_config: None,
            watch_enabled: false,
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
            toast: None,
        }
    }

    /// A model over a fresh session on the system clock.
    pub fn with_options(options: SessionOptions, terminal_size: (u16, u16)) -> Self {
        Self::new(
            Session::new(Rc::new(SystemClock::new()), options),
            terminal_size,
        )
    }

    /// The input pane that imports and edits go to.
    ///
    /// With the output focused, imports go to the source.
    pub const fn import_target(&self) -> InputPane {
        match self.focus.as_input() {
            Some(pane) => pane,
            None => InputPane::Source,
        }
    }

    pub fn imported_path(&self, pane: InputPane) -> Option<&Path> {
        self.imports
            .iter()
            .find(|import| import.pane == pane)
            .map(|import| import.path.as_path())
    }

    /// Rows under the panes: status bar, plus toast and prompt when shown.
    pub fn footer_rows(&self) -> u16 {
        1 + u16::from(self.toast.is_some()) + u16::from(self.prompt.is_some())
    }

    pub const fn scroll_offset(&self, pane: Pane) -> usize {
        self.scroll[pane_index(pane)]
    }

    /// Visible text rows of a pane at the current terminal size.
    pub fn pane_height(&self, pane: Pane) -> usize {
        let (width, height) = self.terminal_size;
        let layout = crate::ui::pane_layout(Rect::new(0, 0, width, height), self.footer_rows());
        layout.content(pane).height as usize
    }

    pub fn scroll_by(&mut self, pane: Pane, delta: isize) {
        let max = self
            .session
            .editor()
            .buffer(pane)
            .line_count()
            .saturating_sub(1);
        let offset = &mut self.scroll[pane_index(pane)];
        *offset = offset.saturating_add_signed(delta).min(max);
    }

    /// Scroll `pane` so its cursor line is on screen.
    pub fn ensure_cursor_visible(&mut self, pane: Pane) {
        let line = self.session.editor().buffer(pane).cursor().line;
        let height = self.pane_height(pane).max(1);
        let offset = &mut self.scroll[pane_index(pane)];
        if line < *offset {
            *offset = line;
        } else if line >= *offset + height {
            *offset = line + 1 - height;
        }
    }

    /// Clamp every pane's scroll after its text was replaced.
    pub fn clamp_scroll(&mut self) {
        for pane in [Pane::Config, Pane::Source, Pane::Output] {
            let max = self
                .session
                .editor()
                .buffer(pane)
                .line_count()
                .saturating_sub(1);
            let offset = &mut self.scroll[pane_index(pane)];
            *offset = (*offset).min(max);
        }
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.show_toast_for(level, message, TOAST_DURATION);
    }

    pub fn show_toast_for(
        &mut self,
        level: ToastLevel,
        message: impl Into<String>,
        duration: Duration,
    ) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + duration,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub(super) fn toast_deadline(&self) -> Option<Instant> {
        self.toast.as_ref().map(|toast| toast.expires_at)
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Deliver the ready service to the session.
    pub fn service_ready(&mut self, service: Box<dyn FormatService>) {
        let fallback = match self.session.on_service_ready(service) {
            Ok(report) => match &report.config {
                ConfigSeed::Fallback(reason) => Some(reason.clone()),
                ConfigSeed::Service => None,
            },
            Err(err) => {
                tracing::warn!("ignoring readiness signal: {err}");
                None
            }
        };
        if let Some(reason) = fallback {
            self.show_toast(
                ToastLevel::Warning,
                format!("Using fallback config: {reason}"),
            );
        }
        self.clamp_scroll();
    }

    /// The service could not be started.
    pub fn service_failed(&mut self, err: &ServiceError) {
        if let Err(signal_err) = self.session.on_service_failed(err) {
            tracing::warn!("ignoring failure signal: {signal_err}");
            return;
        }
        tracing::error!("formatting service unavailable: {err}");
        self.show_toast(ToastLevel::Error, format!("Formatter unavailable: {err}"));
    }

    /// Load a file's text into an input pane, replacing what was there.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read as UTF-8 text.
    pub fn import_file(&mut self, pane: InputPane, path: &Path) -> Result<PathBuf> {
        let _scope = crate::perf::scope("app.import_file");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.session.import(pane, &text);

        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.imports.retain(|import| import.pane != pane);
        self.imports.push(Import {
            pane,
            path: path.clone(),
        });
        self.clamp_scroll();
        crate::perf::log_event(
            "app.import",
            format!("pane={pane:?} path={} bytes={}", path.display(), text.len()),
        );
        Ok(path)
    }

    /// Re-read a changed file into every pane it was imported into.
    ///
    /// # Errors
    /// Returns an error if the file can no longer be read.
    pub fn reimport(&mut self, path: &Path) -> Result<Vec<InputPane>> {
        let panes: Vec<InputPane> = self
            .imports
            .iter()
            .filter(|import| import.path == path)
            .map(|import| import.pane)
            .collect();
        for &pane in &panes {
            self.import_file(pane, path)?;
        }
        Ok(panes)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::with_options(SessionOptions::default(), (80, 24))
    }
}

const fn pane_index(pane: Pane) -> usize {
    match pane {
        Pane::Config => 0,
        Pane::Source => 1,
        Pane::Output => 2,
    }
}
