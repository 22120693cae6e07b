use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::Model;
use crate::editor::Pane;

use super::{CONFIG_PANE_PERCENT, INPUT_COLUMN_PERCENT, overlays, status};

/// Screen areas of the three panes and the footer below them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLayout {
    pub config: Rect,
    pub source: Rect,
    pub output: Rect,
    pub footer: Rect,
}

impl PaneLayout {
    pub const fn area(&self, pane: Pane) -> Rect {
        match pane {
            Pane::Config => self.config,
            Pane::Source => self.source,
            Pane::Output => self.output,
        }
    }

    /// The text area of a pane, inside its border.
    pub fn content(&self, pane: Pane) -> Rect {
        self.area(pane).inner(Margin::new(1, 1))
    }

    pub fn pane_at(&self, column: u16, row: u16) -> Option<Pane> {
        [Pane::Config, Pane::Source, Pane::Output]
            .into_iter()
            .find(|&pane| self.area(pane).contains(Position::new(column, row)))
    }
}

/// Config above source on the left, output on the right, footer at the bottom.
pub fn pane_layout(area: Rect, footer_rows: u16) -> PaneLayout {
    let [body, footer] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(footer_rows)]).areas(area);
    let [inputs, output] = Layout::horizontal([
        Constraint::Percentage(INPUT_COLUMN_PERCENT),
        Constraint::Percentage(100 - INPUT_COLUMN_PERCENT),
    ])
    .areas(body);
    let [config, source] = Layout::vertical([
        Constraint::Percentage(CONFIG_PANE_PERCENT),
        Constraint::Percentage(100 - CONFIG_PANE_PERCENT),
    ])
    .areas(inputs);
    PaneLayout {
        config,
        source,
        output,
        footer,
    }
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = pane_layout(area, model.footer_rows());

    for pane in [Pane::Config, Pane::Source, Pane::Output] {
        render_pane(model, frame, &layout, pane);
    }
    status::render_footer(model, frame, layout.footer);

    if model.session.is_loading() {
        overlays::render_loading_overlay(frame, layout.output);
    }
    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_pane(model: &Model, frame: &mut Frame, layout: &PaneLayout, pane: Pane) {
    let area = layout.area(pane);
    let focused = model.focus == pane;
    let block = Block::default()
        .title(pane_title(model, pane))
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });
    let content = block.inner(area);
    frame.render_widget(block, area);

    let buf = model.session.editor().buffer(pane);
    let total_lines = buf.line_count();
    let gutter_width = line_number_width(total_lines) as usize;
    let start = model.scroll_offset(pane);
    let end = (start + content.height as usize).min(total_lines);
    let cursor = buf.cursor();

    let lines: Vec<Line> = (start..end)
        .map(|line_idx| {
            let text = buf.line_at(line_idx).unwrap_or_default();
            let mut spans = vec![Span::styled(
                format!("{:>gutter_width$} ", line_idx + 1),
                Style::default().fg(Color::DarkGray),
            )];
            if focused && line_idx == cursor.line {
                spans.extend(cursor_spans(&text, cursor.col));
            } else {
                spans.push(Span::raw(text));
            }
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), content);
}

fn pane_title(model: &Model, pane: Pane) -> String {
    let name = pane
        .as_input()
        .and_then(|input| model.imported_path(input))
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned());
    match (pane, name) {
        (_, Some(name)) => format!(" {}: {name} ", pane.title()),
        (Pane::Output, None) => " Output (read-only) ".to_string(),
        (_, None) => format!(" {} ", pane.title()),
    }
}

/// Split a line so the character under the cursor gets its own span.
fn cursor_spans(text: &str, col: usize) -> Vec<Span<'static>> {
    let split = text.char_indices().nth(col).map_or(text.len(), |(idx, _)| idx);
    let (before, rest) = text.split_at(split);
    let mut chars = rest.chars();
    let under = chars.next().map_or_else(|| " ".to_string(), String::from);
    let after = chars.as_str();

    let mut spans = Vec::with_capacity(3);
    if !before.is_empty() {
        spans.push(Span::raw(before.to_string()));
    }
    spans.push(Span::styled(
        under,
        Style::default().bg(Color::White).fg(Color::Black),
    ));
    if !after.is_empty() {
        spans.push(Span::raw(after.to_string()));
    }
    spans
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
