use std::io::{Write, stdout};
use std::path::Path;
use std::time::Duration;

use base64::Engine;

use crate::app::{App, Message, Model, ToastLevel};
use crate::editor::InputPane;
use crate::watcher::FileWatcher;

/// How long the "Copied!" confirmation stays up.
const COPIED_TOAST: Duration = Duration::from_millis(1500);

/// Settle time for on-disk changes before a re-import.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

impl App {
    pub(super) fn make_file_watcher() -> notify::Result<FileWatcher> {
        FileWatcher::new(WATCH_DEBOUNCE)
    }

    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        msg: &Message,
    ) {
        match msg {
            Message::ImportFile(pane, path) => {
                Self::import_and_watch(model, file_watcher, *pane, path);
            }
            Message::FileChanged(path) => match model.reimport(path) {
                Ok(panes) if !panes.is_empty() => {
                    model.show_toast(ToastLevel::Info, format!("Reloaded {}", display_name(path)));
                }
                Ok(_) => {}
                Err(err) => {
                    model.show_toast(ToastLevel::Error, format!("Reload failed: {err:#}"));
                    crate::perf::log_event(
                        "reload.error",
                        format!("path={} err={err}", path.display()),
                    );
                }
            },
            Message::CopyOutput => Self::copy_output(model),
            _ => {}
        }
    }

    /// Import `path` into `pane` and, when watching, start watching it.
    pub(super) fn import_and_watch(
        model: &mut Model,
        file_watcher: &mut Option<FileWatcher>,
        pane: InputPane,
        path: &Path,
    ) {
        let canonical = match model.import_file(pane, path) {
            Ok(canonical) => canonical,
            Err(err) => {
                tracing::warn!("import failed: {err:#}");
                model.show_toast(ToastLevel::Error, format!("Import failed: {err:#}"));
                return;
            }
        };
        model.show_toast(
            ToastLevel::Info,
            format!("Imported {} into {pane:?}", display_name(path)),
        );

        if let Some(watcher) = file_watcher.as_mut()
            && let Err(err) = watcher.watch(&canonical)
        {
            model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
            crate::perf::log_event(
                "watcher.error",
                format!("failed path={} err={err}", canonical.display()),
            );
        }
    }

    fn copy_output(model: &mut Model) {
        let text = model.session.editor().output();
        match copy_to_clipboard(&text) {
            Ok(()) => model.show_toast_for(ToastLevel::Info, "Copied!", COPIED_TOAST),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let mut out = stdout();
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

pub(super) fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
