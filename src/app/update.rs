use std::path::PathBuf;

use crate::app::Model;
use crate::editor::{Direction, EditorBuffer, InputPane, Pane};

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing (focused pane; text edits are ignored on the output)
    InsertChar(char),
    /// Bracketed paste
    Paste(String),
    SplitLine,
    DeleteBack,
    DeleteForward,
    MoveCursor(Direction),
    MoveHome,
    MoveEnd,
    MoveWordLeft,
    MoveWordRight,
    MoveToStart,
    MoveToEnd,
    PageUp,
    PageDown,
    /// Mouse click: focus a pane and place the cursor at (line, col).
    ClickAt(Pane, usize, usize),
    /// Mouse wheel: scroll a pane's viewport without moving its cursor.
    Scroll(Pane, isize),

    // Focus
    FocusNext,
    FocusPrev,

    // Formatting
    /// Run the formatter now instead of waiting for the debounce.
    FormatNow,
    /// Copy the output text to the clipboard.
    CopyOutput,

    // Import
    /// Open the path prompt for the focused input pane
    StartImport,
    PromptInput(char),
    PromptBackspace,
    PromptCancel,
    /// Load a file into an input pane
    ImportFile(InputPane, PathBuf),
    /// A watched file changed on disk
    FileChanged(PathBuf),

    // Help
    ToggleHelp,
    HideHelp,
    HelpScrollUp,
    HelpScrollDown,

    // Window
    Resize(u16, u16),

    Quit,
}

/// Apply a message to the model.
///
/// File and clipboard work for a message happens afterwards in the event
/// loop's side-effect step; this only changes state.
pub fn update(model: &mut Model, msg: Message) {
    match msg {
        Message::InsertChar(ch) => edit_focused(model, |buf| buf.insert_char(ch)),
        Message::Paste(text) => edit_focused(model, |buf| buf.insert_str(&text)),
        Message::SplitLine => edit_focused(model, EditorBuffer::split_line),
        Message::DeleteBack => edit_focused(model, |buf| {
            buf.delete_back();
        }),
        Message::DeleteForward => edit_focused(model, |buf| {
            buf.delete_forward();
        }),
        Message::MoveCursor(direction) => move_focused(model, |buf| buf.move_cursor(direction)),
        Message::MoveHome => move_focused(model, EditorBuffer::move_home),
        Message::MoveEnd => move_focused(model, EditorBuffer::move_end),
        Message::MoveWordLeft => move_focused(model, EditorBuffer::move_word_left),
        Message::MoveWordRight => move_focused(model, EditorBuffer::move_word_right),
        Message::MoveToStart => move_focused(model, EditorBuffer::move_to_start),
        Message::MoveToEnd => move_focused(model, EditorBuffer::move_to_end),
        Message::PageUp => page(model, Direction::Up),
        Message::PageDown => page(model, Direction::Down),
        Message::ClickAt(pane, line, col) => {
            model.focus = pane;
            move_focused(model, |buf| buf.move_to(line, col));
        }
        Message::Scroll(pane, delta) => model.scroll_by(pane, delta),

        Message::FocusNext => {
            model.focus = match model.focus {
                Pane::Config => Pane::Source,
                Pane::Source => Pane::Output,
                Pane::Output => Pane::Config,
            };
        }
        Message::FocusPrev => {
            model.focus = match model.focus {
                Pane::Config => Pane::Output,
                Pane::Source => Pane::Config,
                Pane::Output => Pane::Source,
            };
        }

        Message::FormatNow => {
            if model.session.format_now().is_none() {
                model.show_toast(
                    crate::app::ToastLevel::Warning,
                    "Formatter is not available",
                );
            }
            model.clamp_scroll();
        }

        Message::StartImport => {
            model.prompt = Some(crate::app::model::ImportPrompt {
                target: model.import_target(),
                input: String::new(),
            });
        }
        Message::PromptInput(ch) => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.input.push(ch);
            }
        }
        Message::PromptBackspace => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.input.pop();
            }
        }
        Message::PromptCancel | Message::ImportFile(..) => model.prompt = None,

        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
            model.help_scroll_offset = 0;
        }
        Message::HideHelp => model.help_visible = false,
        Message::HelpScrollUp => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_sub(1);
        }
        Message::HelpScrollDown => model.help_scroll_offset += 1,

        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            let focus = model.focus;
            model.ensure_cursor_visible(focus);
        }

        Message::Quit => model.should_quit = true,

        Message::CopyOutput | Message::FileChanged(_) => {}
    }
}

/// Text edit on the focused pane; a no-op when the output is focused.
fn edit_focused(model: &mut Model, f: impl FnOnce(&mut EditorBuffer)) {
    let Some(pane) = model.focus.as_input() else {
        return;
    };
    model.session.edit(pane, f);
    // The edit may have flushed an overdue run into the output.
    model.clamp_scroll();
    model.ensure_cursor_visible(pane.into());
}

fn page(model: &mut Model, direction: Direction) {
    let rows = model.pane_height(model.focus).max(1);
    move_focused(model, |buf| {
        for _ in 0..rows {
            buf.move_cursor(direction);
        }
    });
}

/// Cursor movement on the focused pane, output included.
fn move_focused(model: &mut Model, f: impl FnOnce(&mut EditorBuffer)) {
    match model.focus.as_input() {
        Some(pane) => {
            model.session.edit(pane, f);
        }
        None => model.session.navigate_output(f),
    }
    let focus = model.focus;
    model.ensure_cursor_visible(focus);
}
