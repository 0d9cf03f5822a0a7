//! Chart renderers.
//!
//! Renderers consume the timeseries/pie models and produce plain draw
//! primitives (polylines, rects, arcs, text, axis ticks) for whatever
//! surface hosts the dashboard. Every data change is a full redraw;
//! pointer interaction mutates only renderer-local hover state, never
//! the models.
//!
//! - [`prefs`]: shared presentation preferences and color schemes
//! - [`scale`]: linear and time scales with nice/ticks/invert
//! - [`line`]: multi-series line chart with hover hit-testing
//! - [`stacked_bar`]: stacked bar chart
//! - [`pie`]: pie chart with inline labels or a side legend

pub mod line;
pub mod pie;
pub mod prefs;
pub mod scale;
pub mod stacked_bar;

pub use line::MultiLineChart;
pub use pie::PieChart;
pub use prefs::ChartPrefs;
pub use scale::{LinearScale, TimeScale};
pub use stacked_bar::StackedBarChart;

/// Redraw lifecycle of a renderer. Re-enters `Drawn` on every data
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartState {
    Uninitialized,
    Drawn,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub position: Point,
    pub text: String,
    pub font_size: f64,
    pub anchor: TextAnchor,
    pub bold: bool,
}

/// One axis tick: pixel offset along the axis plus its label.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    pub offset: f64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub side: AxisSide,
    pub ticks: Vec<AxisTick>,
}

/// Legend entry pairing a series or slice name with its color swatch.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub name: String,
    pub color: String,
    /// Formatted value, present only for value-bearing legends (pie).
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

/// Plot margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}
