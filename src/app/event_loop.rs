use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, input, update};
use crate::editor::InputPane;
use crate::service::{FormatService, ReadySignal};
use crate::watcher::FileWatcher;

/// Upper bound on how long the loop sleeps in `event::poll`.
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Poll interval while the service is still starting.
const LOADING_POLL: Duration = Duration::from_millis(50);

impl App {
    /// Run the terminal front end until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized or the event
    /// loop hits an I/O failure.
    pub fn run<S: FormatService + 'static>(&mut self, ready: ReadySignal<S>) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; livefmt needs an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let mut model = Model::with_options(self.options, (size.width, size.height));
        model.watch_enabled = self.watch_enabled;
        model.config_global_path.clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        model.deferred_config.clone_from(&self.config_path);

        let mut file_watcher = if model.watch_enabled {
            match Self::make_file_watcher() {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    None
                }
            }
        } else {
            None
        };

        if let Some(path) = self.source_path.clone() {
            Self::import_and_watch(&mut model, &mut file_watcher, InputPane::Source, &path);
        }

        let result = execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)
            .context("Failed to enable mouse capture")
            .and_then(|()| Self::event_loop(&mut terminal, &mut model, ready, &mut file_watcher));

        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Hand the readiness result to the model, then import the config file.
    fn deliver_readiness<S: FormatService + 'static>(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        result: Result<S, crate::service::ServiceError>,
    ) {
        match result {
            Ok(service) => model.service_ready(Box::new(service)),
            Err(err) => model.service_failed(&err),
        }
        if let Some(path) = model.deferred_config.take() {
            Self::import_and_watch(model, file_watcher, InputPane::Config, &path);
        }
    }

    fn dispatch(model: &mut Model, file_watcher: &mut Option<FileWatcher>, msg: Message) {
        let side_msg = msg.clone();
        update(model, msg);
        Self::handle_message_side_effects(model, file_watcher, &side_msg);
    }

    fn event_loop<S: FormatService + 'static>(
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        mut ready: ReadySignal<S>,
        file_watcher: &mut Option<FileWatcher>,
    ) -> Result<()> {
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if ready.is_pending()
                && let Some(result) = ready.try_take()
            {
                Self::deliver_readiness(model, file_watcher, result);
                needs_render = true;
            }

            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            if let Some(outcome) = model.session.tick() {
                crate::perf::log_event(
                    "frame.format",
                    format!("frame={frame_idx} outcome={}", outcome.label()),
                );
                model.clamp_scroll();
                needs_render = true;
            }

            let changed = file_watcher
                .as_mut()
                .map(FileWatcher::take_changed)
                .unwrap_or_default();
            for path in changed {
                Self::dispatch(model, file_watcher, Message::FileChanged(path));
                needs_render = true;
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }

            if event::poll(Self::poll_timeout(model, &ready, file_watcher.as_ref()))? {
                let msg = input::handle_event(&event::read()?, model);
                if let Some(msg) = msg {
                    crate::perf::log_event(
                        "event.message",
                        format!("frame={frame_idx} msg={msg:?}"),
                    );
                    Self::dispatch(model, file_watcher, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::ZERO)? {
                    if let Some(msg) = input::handle_event(&event::read()?, model) {
                        drained += 1;
                        Self::dispatch(model, file_watcher, msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }
        }
        Ok(())
    }

    /// Sleep until the next thing that can happen without input.
    fn poll_timeout<S>(
        model: &Model,
        ready: &ReadySignal<S>,
        file_watcher: Option<&FileWatcher>,
    ) -> Duration {
        let mut timeout = IDLE_POLL;
        if ready.is_pending() {
            timeout = timeout.min(LOADING_POLL);
        }
        if let Some(ms) = model.session.time_until_due() {
            timeout = timeout.min(Duration::from_millis(ms));
        }
        if let Some(wait) = file_watcher.and_then(FileWatcher::time_until_ready) {
            timeout = timeout.min(wait);
        }
        if let Some(deadline) = model.toast_deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }
        timeout
    }
}
