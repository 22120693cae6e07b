//! One formatting pass: snapshot inputs, call the service, publish output.

use std::time::Duration;

use crate::editor::EditorState;
use crate::service::{BoundaryError, FormatService, ServiceError, take_text};

/// Shown when the formatter completes without producing text.
pub const NO_RESULT_MESSAGE: &str = "Error: Formatter returned no result.";

/// Prefix of the message shown when the service call itself fails.
pub const FATAL_PREFIX: &str = "Fatal error calling formatting service:\n";

/// What a single run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Output now holds the formatted text.
    Formatted { bytes: usize },
    /// The service returned a null handle.
    Declined,
    /// The service call failed; carries the failure detail.
    Unreachable(String),
}

impl RunOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Formatted { .. })
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Formatted { .. } => "ok",
            Self::Declined => "no result",
            Self::Unreachable(_) => "failed",
        }
    }
}

/// Summary of the most recent run, for the status bar.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub outcome: RunOutcome,
    pub elapsed: Duration,
}

/// Runs the formatter and is the only writer of the output buffer.
#[derive(Debug, Default)]
pub struct FormatOrchestrator {
    runs: u64,
    last: Option<RunRecord>,
}

impl FormatOrchestrator {
    pub const fn new() -> Self {
        Self {
            runs: 0,
            last: None,
        }
    }

    /// Format the current source with the current config.
    ///
    /// Both are read now, not when the run was scheduled. Exactly one
    /// output write happens whichever way the call goes; a failure is
    /// confined to this run.
    pub fn run<S: FormatService + ?Sized>(
        &mut self,
        service: &S,
        editor: &mut EditorState,
    ) -> RunOutcome {
        let scope = crate::perf::scope("orchestrator.run");
        let source = editor.source();
        let config = editor.config();

        let outcome = match take_text(service, |s| s.format(&source, &config)) {
            Ok(formatted) => {
                editor.set_output(&formatted);
                RunOutcome::Formatted {
                    bytes: formatted.len(),
                }
            }
            Err(BoundaryError::Declined) => {
                tracing::warn!("formatter returned no result");
                editor.set_output(NO_RESULT_MESSAGE);
                RunOutcome::Declined
            }
            Err(BoundaryError::Unreachable(err)) => Self::fail(editor, &err),
        };

        self.record(outcome.clone(), scope.elapsed_ms());
        crate::perf::log_event(
            "orchestrator.run",
            format!(
                "run={} outcome={} source_bytes={} config_bytes={}",
                self.runs,
                outcome.label(),
                source.len(),
                config.len()
            ),
        );
        outcome
    }

    /// Publish a failure that happened outside a run, such as the service
    /// never starting.
    pub fn report_unavailable(&mut self, editor: &mut EditorState, err: &ServiceError) {
        let outcome = Self::fail(editor, err);
        self.record(outcome, 0.0);
    }

    /// Number of runs so far.
    pub const fn runs(&self) -> u64 {
        self.runs
    }

    pub const fn last(&self) -> Option<&RunRecord> {
        self.last.as_ref()
    }

    fn fail(editor: &mut EditorState, err: &ServiceError) -> RunOutcome {
        tracing::error!("formatting service call failed: {err}");
        let detail = err.to_string();
        editor.set_output(&format!("{FATAL_PREFIX}{detail}"));
        RunOutcome::Unreachable(detail)
    }

    fn record(&mut self, outcome: RunOutcome, elapsed_ms: f64) {
        self.runs += 1;
        tracing::debug!(run = self.runs, outcome = outcome.label(), "format run finished");
        self.last = Some(RunRecord {
            outcome,
            elapsed: Duration::from_secs_f64(elapsed_ms.max(0.0) / 1000.0),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::service::{BufferArena, Handle};

    enum Reply {
        Echo,
        Null,
        Throw(&'static str),
    }

    struct Stub {
        arena: BufferArena,
        reply: Reply,
        seen: RefCell<Vec<(String, String)>>,
        releases: Cell<usize>,
    }

    impl Stub {
        fn new(reply: Reply) -> Self {
            Self {
                arena: BufferArena::new(),
                reply,
                seen: RefCell::new(Vec::new()),
                releases: Cell::new(0),
            }
        }
    }

    impl FormatService for Stub {
        fn default_config(&self) -> Result<Option<Handle>, ServiceError> {
            Ok(None)
        }

        fn format(&self, source: &str, config: &str) -> Result<Option<Handle>, ServiceError> {
            self.seen
                .borrow_mut()
                .push((source.to_string(), config.to_string()));
            match self.reply {
                Reply::Echo => Ok(Some(self.arena.alloc(source.as_bytes()))),
                Reply::Null => Ok(None),
                Reply::Throw(msg) => Err(ServiceError::Other(msg.to_string())),
            }
        }

        fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
            self.arena.read(handle)
        }

        fn release(&self, handle: Handle) {
            self.releases.set(self.releases.get() + 1);
            self.arena.free(handle).unwrap();
        }
    }

    fn editor(source: &str, config: &str) -> EditorState {
        let mut editor = EditorState::new();
        editor.set_source(source);
        editor.set_config(config);
        editor
    }

    #[test]
    fn test_success_writes_formatted_text_and_releases() {
        let stub = Stub::new(Reply::Echo);
        let mut editor = editor("project(demo)", "IndentWidth: 2");
        let mut orchestrator = FormatOrchestrator::new();

        let outcome = orchestrator.run(&stub, &mut editor);
        assert_eq!(outcome, RunOutcome::Formatted { bytes: 13 });
        assert_eq!(editor.output(), "project(demo)");
        assert_eq!(stub.releases.get(), 1);
        assert_eq!(stub.arena.live_count(), 0);
        assert_eq!(
            *stub.seen.borrow(),
            vec![("project(demo)".to_string(), "IndentWidth: 2".to_string())]
        );
    }

    #[test]
    fn test_null_result_writes_fixed_message() {
        let stub = Stub::new(Reply::Null);
        let mut editor = editor("x()", "");
        let mut orchestrator = FormatOrchestrator::new();

        assert_eq!(orchestrator.run(&stub, &mut editor), RunOutcome::Declined);
        assert_eq!(editor.output(), NO_RESULT_MESSAGE);
        assert_eq!(stub.releases.get(), 0);
    }

    #[test]
    fn test_failure_writes_fatal_message_with_detail() {
        let stub = Stub::new(Reply::Throw("RuntimeError: memory access out of bounds"));
        let mut editor = editor("x()", "");
        let mut orchestrator = FormatOrchestrator::new();

        let outcome = orchestrator.run(&stub, &mut editor);
        assert!(matches!(outcome, RunOutcome::Unreachable(_)));
        assert_eq!(
            editor.output(),
            format!("{FATAL_PREFIX}RuntimeError: memory access out of bounds")
        );
        assert_eq!(stub.releases.get(), 0);
    }

    #[test]
    fn test_each_run_writes_output_exactly_once() {
        let stub = Stub::new(Reply::Echo);
        let mut editor = editor("a()", "");
        let writes = std::rc::Rc::new(Cell::new(0));
        let counter = writes.clone();
        editor.subscribe(move |change| {
            if change.pane == crate::editor::Pane::Output {
                counter.set(counter.get() + 1);
            }
        });
        let mut orchestrator = FormatOrchestrator::new();
        orchestrator.run(&stub, &mut editor);
        orchestrator.run(&stub, &mut editor);
        assert_eq!(writes.get(), 2);
        assert_eq!(orchestrator.runs(), 2);
        assert!(orchestrator.last().is_some_and(|r| r.outcome.is_success()));
    }

    #[test]
    fn test_report_unavailable_uses_fatal_message() {
        let mut editor = EditorState::new();
        let mut orchestrator = FormatOrchestrator::new();
        orchestrator.report_unavailable(&mut editor, &ServiceError::Other("gone".to_string()));
        assert_eq!(editor.output(), format!("{FATAL_PREFIX}gone"));
    }
}
