//! Terminal UI components.
//!
//! - [`render`]: the three panes and the frame layout
//! - `status`: status, prompt and toast bars
//! - `overlays`: loading and help popups

mod overlays;
mod render;
mod status;

pub use render::{PaneLayout, line_number_width, pane_layout, render};

/// Share of the width given to the config and source column.
pub const INPUT_COLUMN_PERCENT: u16 = 50;
/// Share of the input column's height given to the config pane.
pub const CONFIG_PANE_PERCENT: u16 = 35;

#[cfg(test)]
mod tests;
