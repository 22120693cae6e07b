use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, ToastLevel};
use crate::pipeline::Phase;

/// Footer rows, bottom-up: status bar, toast, import prompt.
pub fn render_footer(model: &Model, frame: &mut Frame, area: Rect) {
    let mut rows = (0..area.height)
        .rev()
        .map(|offset| Rect::new(area.x, area.y + offset, area.width, 1));

    if let Some(row) = rows.next() {
        render_status_bar(model, frame, row);
    }
    if model.active_toast().is_some()
        && let Some(row) = rows.next()
    {
        render_toast_bar(model, frame, row);
    }
    if model.prompt.is_some()
        && let Some(row) = rows.next()
    {
        render_prompt_bar(model, frame, row);
    }
}

fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let cursor = model.session.editor().buffer(model.focus).cursor();
    let watch = if model.watch_enabled {
        "  [watching]"
    } else {
        ""
    };
    let left = format!(
        " {}  Ln {}, Col {}{watch}",
        model.focus.title(),
        cursor.line + 1,
        cursor.col + 1
    );
    let right = format!("{}  F1:help ", run_summary(model));

    let pad = (area.width as usize).saturating_sub(left.width() + right.width());
    let text = format!("{left}{}{right}", " ".repeat(pad));

    let failed = model.session.phase() == Phase::Unavailable
        || model
            .session
            .orchestrator()
            .last()
            .is_some_and(|record| !record.outcome.is_success());
    let style = if failed {
        Style::default().bg(Color::Red).fg(Color::White)
    } else {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn run_summary(model: &Model) -> String {
    match model.session.phase() {
        Phase::Loading => "loading formatter...".to_string(),
        Phase::Unavailable => "formatter unavailable".to_string(),
        Phase::Ready => {
            let orchestrator = model.session.orchestrator();
            let pending = if model.session.debouncer().is_pending() {
                "pending  "
            } else {
                ""
            };
            orchestrator.last().map_or_else(
                || format!("{pending}no runs"),
                |record| {
                    format!(
                        "{pending}last: {} {}ms  runs: {}",
                        record.outcome.label(),
                        record.elapsed.as_millis(),
                        orchestrator.runs()
                    )
                },
            )
        }
    }
}

fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    frame.render_widget(
        Paragraph::new(format!("{prefix} {message}")).style(style),
        area,
    );
}

fn render_prompt_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(prompt) = &model.prompt else {
        return;
    };
    let text = format!(
        "Import into {}: {}_  Enter: load  Esc: cancel",
        prompt.target_title(),
        prompt.input
    );
    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(Color::Blue).fg(Color::White)),
        area,
    );
}
