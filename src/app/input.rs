use std::path::PathBuf;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{Message, Model};
use crate::editor::Direction;

/// Lines moved per mouse wheel notch.
const WHEEL_LINES: isize = 3;

pub fn handle_event(event: &Event, model: &Model) -> Option<Message> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(*key, model),
        Event::Mouse(mouse) => handle_mouse(*mouse, model),
        Event::Resize(width, height) => Some(Message::Resize(*width, *height)),
        Event::Paste(text) if model.prompt.is_none() && !model.help_visible => {
            Some(Message::Paste(text.clone()))
        }
        _ => None,
    }
}

pub fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && matches!(key.code, KeyCode::Char('c' | 'q')) {
        return Some(Message::Quit);
    }

    if let Some(prompt) = &model.prompt {
        return match key.code {
            KeyCode::Esc => Some(Message::PromptCancel),
            KeyCode::Backspace => Some(Message::PromptBackspace),
            KeyCode::Enter => {
                let path = prompt.input.trim();
                if path.is_empty() {
                    Some(Message::PromptCancel)
                } else {
                    Some(Message::ImportFile(prompt.target, PathBuf::from(path)))
                }
            }
            KeyCode::Char(ch) if !ctrl => Some(Message::PromptInput(ch)),
            _ => None,
        };
    }

    if model.help_visible {
        return match key.code {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => Some(Message::HideHelp),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::HelpScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::HelpScrollDown),
            _ => None,
        };
    }

    match (key.code, ctrl) {
        (KeyCode::F(1), _) => Some(Message::ToggleHelp),
        (KeyCode::Tab, _) => Some(Message::FocusNext),
        (KeyCode::BackTab, _) => Some(Message::FocusPrev),
        (KeyCode::Char('o'), true) => Some(Message::StartImport),
        (KeyCode::Char('y'), true) => Some(Message::CopyOutput),
        (KeyCode::Char('r'), true) => Some(Message::FormatNow),

        (KeyCode::Left, true) => Some(Message::MoveWordLeft),
        (KeyCode::Right, true) => Some(Message::MoveWordRight),
        (KeyCode::Home, true) => Some(Message::MoveToStart),
        (KeyCode::End, true) => Some(Message::MoveToEnd),
        (KeyCode::Up, _) => Some(Message::MoveCursor(Direction::Up)),
        (KeyCode::Down, _) => Some(Message::MoveCursor(Direction::Down)),
        (KeyCode::Left, _) => Some(Message::MoveCursor(Direction::Left)),
        (KeyCode::Right, _) => Some(Message::MoveCursor(Direction::Right)),
        (KeyCode::Home, _) => Some(Message::MoveHome),
        (KeyCode::End, _) => Some(Message::MoveEnd),
        (KeyCode::PageUp, _) => Some(Message::PageUp),
        (KeyCode::PageDown, _) => Some(Message::PageDown),

        (KeyCode::Enter, _) => Some(Message::SplitLine),
        (KeyCode::Backspace, _) => Some(Message::DeleteBack),
        (KeyCode::Delete, _) => Some(Message::DeleteForward),
        (KeyCode::Char(ch), false) if !key.modifiers.contains(KeyModifiers::ALT) => {
            Some(Message::InsertChar(ch))
        }
        _ => None,
    }
}

pub fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
    if model.help_visible || model.prompt.is_some() {
        return None;
    }
    let (width, height) = model.terminal_size;
    let layout = crate::ui::pane_layout(Rect::new(0, 0, width, height), model.footer_rows());
    let pane = layout.pane_at(mouse.column, mouse.row)?;

    match mouse.kind {
        MouseEventKind::ScrollUp => Some(Message::Scroll(pane, -WHEEL_LINES)),
        MouseEventKind::ScrollDown => Some(Message::Scroll(pane, WHEEL_LINES)),
        MouseEventKind::Down(MouseButton::Left) => {
            let content = layout.content(pane);
            if mouse.row < content.y || mouse.column < content.x {
                return None;
            }
            let buf = model.session.editor().buffer(pane);
            let gutter = crate::ui::line_number_width(buf.line_count()) + 1;
            let line = model.scroll_offset(pane) + (mouse.row - content.y) as usize;
            let col = mouse.column.saturating_sub(content.x + gutter) as usize;
            Some(Message::ClickAt(pane, line, col))
        }
        _ => None,
    }
}
