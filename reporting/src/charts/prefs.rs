//! Shared chart presentation preferences.

use crate::format::NumberFormat;

/// Categorical palette for area-style charts (bars, pies).
pub const COLORS: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

/// Categorical palette for line charts.
pub const LINE_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone)]
pub struct ChartPrefs {
    pub default_width: f64,
    pub default_height: f64,
    pub axis_font_size: f64,
    pub default_font_size: f64,
    pub label_font_size: f64,
    pub font_family: String,
    pub numbers: NumberFormat,
}

impl Default for ChartPrefs {
    fn default() -> Self {
        Self {
            default_width: 600.0,
            default_height: 400.0,
            axis_font_size: 12.0,
            default_font_size: 10.0,
            label_font_size: 12.0,
            font_family: "sans-serif".to_string(),
            numbers: NumberFormat::en(),
        }
    }
}

impl ChartPrefs {
    /// Defaults with the numeric separators swapped for another locale.
    pub fn with_numbers(numbers: NumberFormat) -> Self {
        Self {
            numbers,
            ..Self::default()
        }
    }

    pub fn color(index: usize) -> &'static str {
        COLORS[index % COLORS.len()]
    }

    pub fn line_color(index: usize) -> &'static str {
        LINE_COLORS[index % LINE_COLORS.len()]
    }
}
