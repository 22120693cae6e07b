//! First-run sequencing once the formatting service is ready.

use std::rc::Rc;

use crate::editor::EditorState;
use crate::service::{BoundaryError, FormatService, take_text};

use super::debounce::Debouncer;
use super::orchestrator::{FormatOrchestrator, RunOutcome};

/// Config used when the service cannot supply its own defaults.
pub const FALLBACK_CONFIG: &str = "IndentWidth: 4\nColumnLimit: 80";

/// Visibility of the "loading formatter" overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingIndicator {
    visible: bool,
}

impl LoadingIndicator {
    pub const fn shown() -> Self {
        Self { visible: true }
    }

    pub const fn hide(&mut self) {
        self.visible = false;
    }

    pub const fn is_visible(self) -> bool {
        self.visible
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::shown()
    }
}

/// Where the seeded config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSeed {
    Service,
    /// The fallback literal; carries why the service default was unusable.
    Fallback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub config: ConfigSeed,
    pub initial_run: RunOutcome,
}

/// Borrowed parts of a session that the bootstrap touches.
pub struct BootstrapTargets<'a> {
    pub editor: &'a mut EditorState,
    pub orchestrator: &'a mut FormatOrchestrator,
    pub debouncer: &'a Rc<Debouncer>,
    pub loading: &'a mut LoadingIndicator,
}

/// Seeds the config, formats once, then arms the change listener.
///
/// Listeners go last so that no edit can schedule a run against a config
/// that has not been seeded yet.
pub fn bootstrap<S: FormatService + ?Sized>(
    service: &S,
    targets: BootstrapTargets<'_>,
) -> BootstrapReport {
    let BootstrapTargets {
        editor,
        orchestrator,
        debouncer,
        loading,
    } = targets;

    loading.hide();

    let config = match take_text(service, FormatService::default_config) {
        Ok(text) => {
            editor.set_config(&text);
            ConfigSeed::Service
        }
        Err(err) => {
            let reason = match err {
                BoundaryError::Declined => "service returned no default config".to_string(),
                BoundaryError::Unreachable(err) => err.to_string(),
            };
            tracing::warn!("default config unavailable, using fallback: {reason}");
            editor.set_config(FALLBACK_CONFIG);
            ConfigSeed::Fallback(reason)
        }
    };
    crate::perf::log_event(
        "bootstrap.config",
        match &config {
            ConfigSeed::Service => "seed=service".to_string(),
            ConfigSeed::Fallback(reason) => format!("seed=fallback reason={reason}"),
        },
    );

    let initial_run = orchestrator.run(service, editor);

    let debouncer = Rc::clone(debouncer);
    editor.subscribe(move |change| {
        if change.is_input() {
            debouncer.on_change();
        }
    });
    crate::perf::log_event("bootstrap.armed", "listeners=source,config");

    BootstrapReport {
        config,
        initial_run,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::pipeline::debounce::ManualClock;
    use crate::service::{BufferArena, Handle, ServiceError};

    struct Defaults {
        arena: BufferArena,
        default_config: Result<Option<&'static str>, &'static str>,
        format_calls: Cell<usize>,
    }

    impl FormatService for Defaults {
        fn default_config(&self) -> Result<Option<Handle>, ServiceError> {
            match self.default_config {
                Ok(reply) => Ok(reply.map(|r| self.arena.alloc(r.as_bytes()))),
                Err(msg) => Err(ServiceError::Other(msg.to_string())),
            }
        }

        fn format(&self, source: &str, _config: &str) -> Result<Option<Handle>, ServiceError> {
            self.format_calls.set(self.format_calls.get() + 1);
            Ok(Some(self.arena.alloc(source.as_bytes())))
        }

        fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
            self.arena.read(handle)
        }

        fn release(&self, handle: Handle) {
            self.arena.free(handle).unwrap();
        }
    }

    fn run(
        default_config: Result<Option<&'static str>, &'static str>,
    ) -> (Defaults, EditorState, BootstrapReport, Rc<Debouncer>) {
        let service = Defaults {
            arena: BufferArena::new(),
            default_config,
            format_calls: Cell::new(0),
        };
        let mut editor = EditorState::new();
        let mut orchestrator = FormatOrchestrator::new();
        let debouncer = Rc::new(Debouncer::new(200, Rc::new(ManualClock::new())));
        let mut loading = LoadingIndicator::shown();
        let report = bootstrap(
            &service,
            BootstrapTargets {
                editor: &mut editor,
                orchestrator: &mut orchestrator,
                debouncer: &debouncer,
                loading: &mut loading,
            },
        );
        assert!(!loading.is_visible());
        (service, editor, report, debouncer)
    }

    #[test]
    fn test_seeds_service_default_config() {
        let (service, editor, report, _) = run(Ok(Some("---\nIndentWidth: 2\n...\n")));
        assert_eq!(report.config, ConfigSeed::Service);
        assert_eq!(editor.config(), "---\nIndentWidth: 2\n...\n");
        assert_eq!(service.format_calls.get(), 1);
        assert_eq!(service.arena.live_count(), 0);
    }

    #[test]
    fn test_throwing_default_config_falls_back() {
        let (service, editor, report, _) = run(Err("trap"));
        assert!(matches!(report.config, ConfigSeed::Fallback(_)));
        assert_eq!(editor.config(), FALLBACK_CONFIG);
        assert_eq!(service.format_calls.get(), 1);
        assert!(report.initial_run.is_success());
    }

    #[test]
    fn test_null_default_config_falls_back() {
        let (_, editor, report, _) = run(Ok(None));
        assert!(matches!(report.config, ConfigSeed::Fallback(_)));
        assert_eq!(editor.config(), FALLBACK_CONFIG);
    }

    #[test]
    fn test_listener_is_armed_only_after_seeding() {
        let (_, mut editor, _, debouncer) = run(Ok(Some("IndentWidth: 2")));
        assert!(
            !debouncer.is_pending(),
            "seeding and the initial run must not schedule a reformat"
        );
        assert_eq!(editor.observer_count(), 1);

        editor.set_source("project(x)");
        assert!(debouncer.is_pending());
    }

    #[test]
    fn test_output_changes_do_not_schedule_runs() {
        let (_, mut editor, _, debouncer) = run(Ok(None));
        editor.set_output("anything");
        assert!(!debouncer.is_pending());
    }
}
