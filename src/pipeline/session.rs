//! The session context: editor state, debouncer, orchestrator and service.

use std::rc::Rc;

use crate::editor::{EditorBuffer, EditorState, InputPane, Pane};
use crate::service::{FormatService, ServiceError};

use super::bootstrap::{BootstrapReport, BootstrapTargets, LoadingIndicator, bootstrap};
use super::debounce::{Clock, DEFAULT_DELAY_MS, Debouncer};
use super::orchestrator::{FormatOrchestrator, RunOutcome};

/// Tunables for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub debounce_ms: u64,
    pub max_wait_ms: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DELAY_MS,
            max_wait_ms: None,
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the service's readiness signal.
    Loading,
    /// Bootstrapped; edits schedule reformats.
    Ready,
    /// The service failed to start; edits are kept but never formatted.
    Unavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("the formatting service already signalled; the session is {0:?}")]
    AlreadySignalled(Phase),
}

/// Everything one live-preview session owns.
///
/// Initialization order is fixed: construct (phase [`Phase::Loading`]),
/// deliver the service with [`on_service_ready`](Self::on_service_ready)
/// (which bootstraps and arms the listener), then call
/// [`tick`](Self::tick) from the event loop to fire debounced runs.
#[derive(Debug)]
pub struct Session<S> {
    editor: EditorState,
    debouncer: Rc<Debouncer>,
    orchestrator: FormatOrchestrator,
    loading: LoadingIndicator,
    service: Option<S>,
    phase: Phase,
    bootstrap: Option<BootstrapReport>,
}

impl<S: FormatService> Session<S> {
    pub fn new(clock: Rc<dyn Clock>, options: SessionOptions) -> Self {
        let debouncer =
            Debouncer::new(options.debounce_ms, clock).with_max_wait(options.max_wait_ms);
        Self {
            editor: EditorState::new(),
            debouncer: Rc::new(debouncer),
            orchestrator: FormatOrchestrator::new(),
            loading: LoadingIndicator::shown(),
            service: None,
            phase: Phase::Loading,
            bootstrap: None,
        }
    }

    /// The service is ready: bootstrap the session with it.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadySignalled`] if readiness (or failure)
    /// was already delivered; the extra service is dropped untouched.
    pub fn on_service_ready(&mut self, service: S) -> Result<&BootstrapReport, SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::AlreadySignalled(self.phase));
        }
        let report = bootstrap(
            &service,
            BootstrapTargets {
                editor: &mut self.editor,
                orchestrator: &mut self.orchestrator,
                debouncer: &self.debouncer,
                loading: &mut self.loading,
            },
        );
        tracing::debug!(?report, "session bootstrapped");
        self.service = Some(service);
        self.phase = Phase::Ready;
        Ok(self.bootstrap.insert(report))
    }

    /// The service failed to start. The failure is shown in the output and
    /// the session keeps its text, but nothing is ever formatted.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadySignalled`] if readiness (or failure)
    /// was already delivered.
    pub fn on_service_failed(&mut self, err: &ServiceError) -> Result<(), SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::AlreadySignalled(self.phase));
        }
        self.loading.hide();
        self.orchestrator.report_unavailable(&mut self.editor, err);
        self.phase = Phase::Unavailable;
        Ok(())
    }

    /// Fire the pending trigger if it is due.
    pub fn tick(&mut self) -> Option<RunOutcome> {
        let service = self.service.as_ref()?;
        if !self.debouncer.take_ready() {
            return None;
        }
        Some(self.orchestrator.run(service, &mut self.editor))
    }

    /// Run right away, dropping any pending trigger. `None` until ready.
    pub fn format_now(&mut self) -> Option<RunOutcome> {
        let service = self.service.as_ref()?;
        self.debouncer.cancel();
        Some(self.orchestrator.run(service, &mut self.editor))
    }

    pub fn set_source(&mut self, text: &str) {
        self.fire_overdue();
        self.editor.set_source(text);
    }

    pub fn set_config(&mut self, text: &str) {
        self.fire_overdue();
        self.editor.set_config(text);
    }

    /// Replace an input pane's text, as a file import does.
    pub fn import(&mut self, pane: InputPane, text: &str) {
        match pane {
            InputPane::Source => self.set_source(text),
            InputPane::Config => self.set_config(text),
        }
    }

    /// Apply a keystroke-sized edit to an input pane.
    pub fn edit<R>(&mut self, pane: InputPane, f: impl FnOnce(&mut EditorBuffer) -> R) -> R {
        self.fire_overdue();
        self.editor.edit(pane, f)
    }

    /// A trigger that came due before anyone ticked belongs to the text as it
    /// is now; run it before the next edit reschedules the debouncer.
    fn fire_overdue(&mut self) {
        if let Some(outcome) = self.tick() {
            tracing::debug!(outcome = outcome.label(), "ran overdue trigger before edit");
        }
    }

    /// Move the output view's cursor. The output text itself stays read-only.
    pub fn navigate_output(&mut self, f: impl FnOnce(&mut EditorBuffer)) {
        let buffer = self.editor.buffer_mut(Pane::Output);
        let revision = buffer.revision();
        f(&mut *buffer);
        debug_assert_eq!(revision, buffer.revision(), "output is read-only");
    }

    pub const fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn is_loading(&self) -> bool {
        self.loading.is_visible()
    }

    pub const fn service(&self) -> Option<&S> {
        self.service.as_ref()
    }

    pub const fn orchestrator(&self) -> &FormatOrchestrator {
        &self.orchestrator
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub const fn bootstrap_report(&self) -> Option<&BootstrapReport> {
        self.bootstrap.as_ref()
    }

    /// How long the event loop may sleep before the next run is due.
    pub fn time_until_due(&self) -> Option<u64> {
        self.debouncer.time_until_due()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bootstrap::FALLBACK_CONFIG;
    use crate::pipeline::debounce::ManualClock;
    use crate::service::{BufferArena, Handle};

    #[derive(Default)]
    struct Upper {
        arena: BufferArena,
    }

    impl FormatService for Upper {
        fn default_config(&self) -> Result<Option<Handle>, ServiceError> {
            Ok(None)
        }

        fn format(&self, source: &str, _config: &str) -> Result<Option<Handle>, ServiceError> {
            Ok(Some(self.arena.alloc(source.to_uppercase().into_bytes())))
        }

        fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
            self.arena.read(handle)
        }

        fn release(&self, handle: Handle) {
            self.arena.free(handle).unwrap();
        }
    }

    fn session() -> (Session<Upper>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        (Session::new(clock.clone(), SessionOptions::default()), clock)
    }

    #[test]
    fn test_edits_before_readiness_never_format() {
        let (mut session, clock) = session();
        assert_eq!(session.phase(), Phase::Loading);
        assert!(session.is_loading());
        session.set_source("project(early)");
        clock.advance(1_000);
        assert_eq!(session.tick(), None);
        assert_eq!(session.orchestrator().runs(), 0);
    }

    #[test]
    fn test_ready_bootstraps_with_current_source() {
        let (mut session, _) = session();
        session.set_source("project(early)");
        let report = session.on_service_ready(Upper::default()).unwrap();
        assert!(report.initial_run.is_success());
        assert_eq!(session.editor().output(), "PROJECT(EARLY)");
        assert_eq!(session.editor().config(), FALLBACK_CONFIG);
        assert!(!session.is_loading());
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn test_second_readiness_signal_is_rejected() {
        let (mut session, _) = session();
        session.on_service_ready(Upper::default()).unwrap();
        let err = session.on_service_ready(Upper::default()).unwrap_err();
        assert!(matches!(err, SessionError::AlreadySignalled(Phase::Ready)));
        assert_eq!(session.orchestrator().runs(), 1);
    }

    #[test]
    fn test_tick_fires_debounced_run() {
        let (mut session, clock) = session();
        session.on_service_ready(Upper::default()).unwrap();
        session.edit(InputPane::Source, |buf| buf.insert_str("set(x 1)"));
        clock.advance(100);
        assert_eq!(session.tick(), None);
        clock.advance(100);
        assert!(session.tick().is_some_and(|o| o.is_success()));
        assert_eq!(session.editor().output(), "SET(X 1)");
    }

    #[test]
    fn test_overdue_trigger_runs_before_next_edit() {
        let (mut session, clock) = session();
        session.on_service_ready(Upper::default()).unwrap();
        session.set_source("a()");
        clock.advance(250);
        // No tick in between: the edit itself must not swallow the run.
        session.edit(InputPane::Source, |buf| buf.insert_str("b()"));
        assert_eq!(session.orchestrator().runs(), 2);
        assert_eq!(session.editor().output(), "A()");

        clock.advance(200);
        assert!(session.tick().is_some());
        assert_eq!(session.orchestrator().runs(), 3);
        assert_eq!(session.editor().output(), "B()A()");
    }

    #[test]
    fn test_format_now_runs_immediately_and_cancels_pending() {
        let (mut session, clock) = session();
        assert_eq!(session.format_now(), None);
        session.on_service_ready(Upper::default()).unwrap();
        session.set_config("IndentWidth: 8");
        assert!(session.debouncer().is_pending());

        assert!(session.format_now().is_some_and(|o| o.is_success()));
        assert!(!session.debouncer().is_pending());
        clock.advance(500);
        assert_eq!(session.tick(), None);
        assert_eq!(session.orchestrator().runs(), 2);
    }

    #[test]
    fn test_service_failure_is_shown_and_final() {
        let (mut session, clock) = session();
        session
            .on_service_failed(&ServiceError::Other("no formatter".to_string()))
            .unwrap();
        assert_eq!(session.phase(), Phase::Unavailable);
        assert!(!session.is_loading());
        assert!(session.editor().output().contains("no formatter"));

        session.set_source("x()");
        clock.advance(500);
        assert_eq!(session.tick(), None);
        assert!(session.on_service_ready(Upper::default()).is_err());
    }

    #[test]
    fn test_navigate_output_moves_cursor_only() {
        let (mut session, _) = session();
        session.set_source("a\nb\nc");
        session.on_service_ready(Upper::default()).unwrap();
        session.navigate_output(EditorBuffer::move_to_end);
        assert_eq!(session.editor().buffer(Pane::Output).cursor().line, 2);
        assert_eq!(session.editor().output(), "A\nB\nC");
    }
}
