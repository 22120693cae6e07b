use std::rc::Rc;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use super::*;
use crate::app::{Message, Model, ToastLevel, update};
use crate::editor::Pane;
use crate::pipeline::{ManualClock, Session, SessionOptions};
use crate::service::{BufferArena, FormatService, Handle, ServiceError};

struct Echo {
    arena: BufferArena,
}

impl FormatService for Echo {
    fn default_config(&self) -> Result<Option<Handle>, ServiceError> {
        Ok(Some(self.arena.alloc(b"IndentWidth: 4".as_slice())))
    }

    fn format(&self, source: &str, config: &str) -> Result<Option<Handle>, ServiceError> {
        let first = config.lines().next().unwrap_or_default();
        Ok(Some(self.arena.alloc(format!("# {first}\n{source}").into_bytes())))
    }

    fn read(&self, handle: &Handle) -> Result<String, ServiceError> {
        self.arena.read(handle)
    }

    fn release(&self, handle: Handle) {
        self.arena.free(handle).unwrap();
    }
}

fn create_test_model() -> Model {
    let session = Session::new(Rc::new(ManualClock::new()), SessionOptions::default());
    Model::new(session, (80, 24))
}

fn ready_model() -> Model {
    let mut model = create_test_model();
    model.service_ready(Box::new(Echo {
        arena: BufferArena::new(),
    }));
    model
}

fn draw(model: &Model) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect())
        .collect()
}

fn screen_contains(rows: &[String], needle: &str) -> bool {
    rows.iter().any(|row| row.contains(needle))
}

#[test]
fn test_layout_puts_inputs_left_and_output_right() {
    let layout = pane_layout(Rect::new(0, 0, 80, 24), 1);
    assert!(layout.config.y < layout.source.y);
    assert_eq!(layout.config.x, layout.source.x);
    assert!(layout.output.x > layout.source.x);
    assert_eq!(layout.output.height, 23);
    assert_eq!(layout.footer, Rect::new(0, 23, 80, 1));
}

#[test]
fn test_pane_at_maps_points_to_panes() {
    let layout = pane_layout(Rect::new(0, 0, 80, 24), 1);
    assert_eq!(layout.pane_at(1, 1), Some(Pane::Config));
    assert_eq!(layout.pane_at(1, 20), Some(Pane::Source));
    assert_eq!(layout.pane_at(60, 5), Some(Pane::Output));
    assert_eq!(layout.pane_at(1, 23), None);
}

#[test]
fn test_line_number_width_grows_with_line_count() {
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(12_345), 5);
}

#[test]
fn test_loading_overlay_until_ready() {
    let model = create_test_model();
    let rows = draw(&model);
    assert!(screen_contains(&rows, "Loading formatter..."));
    assert!(screen_contains(&rows, "loading formatter..."));

    let rows = draw(&ready_model());
    assert!(!screen_contains(&rows, "Loading formatter..."));
}

#[test]
fn test_renders_panes_with_gutters_and_output() {
    let mut model = ready_model();
    model.session.set_source("add_library(foo foo.cpp)");
    model.session.format_now();

    let rows = draw(&model);
    assert!(screen_contains(&rows, " Config "));
    assert!(screen_contains(&rows, " Source "));
    assert!(screen_contains(&rows, " Output (read-only) "));
    assert!(screen_contains(&rows, "1 IndentWidth: 4"));
    assert!(screen_contains(&rows, "1 add_library(foo foo.cpp)"));
    assert!(screen_contains(&rows, "1 # IndentWidth: 4"));
    assert!(screen_contains(&rows, "2 add_library(foo foo.cpp)"));
    assert!(screen_contains(&rows, "last: ok"));
}

#[test]
fn test_status_bar_shows_focus_and_cursor() {
    let mut model = ready_model();
    update(&mut model, Message::FocusPrev);
    update(&mut model, Message::MoveEnd);
    let rows = draw(&model);
    let status = rows.last().unwrap();
    assert!(status.contains("Config"));
    assert!(status.contains("Ln 1, Col 15"));
    assert!(status.contains("F1:help"));
}

#[test]
fn test_unavailable_service_is_shown() {
    let mut model = create_test_model();
    model.service_failed(&ServiceError::Other("no formatter".to_string()));
    let rows = draw(&model);
    assert!(screen_contains(&rows, "formatter unavailable"));
    assert!(screen_contains(&rows, "no formatter"));
}

#[test]
fn test_toast_and_prompt_rows_stack_above_status() {
    let mut model = ready_model();
    model.show_toast(ToastLevel::Info, "Copied!");
    update(&mut model, Message::StartImport);
    update(&mut model, Message::PromptInput('a'));
    let rows = draw(&model);
    assert!(rows[23].contains("F1:help"));
    assert!(rows[22].contains("[info] Copied!"));
    assert!(rows[21].contains("Import into Source: a_"));
}

#[test]
fn test_help_overlay_lists_keys() {
    let mut model = ready_model();
    update(&mut model, Message::ToggleHelp);
    let rows = draw(&model);
    assert!(screen_contains(&rows, "Help"));
    assert!(screen_contains(&rows, "Ctrl-o"));
}
