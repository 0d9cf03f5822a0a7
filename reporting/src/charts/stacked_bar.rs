//! Stacked bar chart over a binned timeseries.
//!
//! Series stack in their given order. The y domain is the sum of each
//! series' maximum, so the tallest possible stack always fits.

use crate::charts::prefs::ChartPrefs;
use crate::charts::scale::{LinearScale, TimeScale};
use crate::charts::{Axis, AxisSide, AxisTick, ChartState, LegendEntry, Margin, Point, Rect, TextAnchor, TextLabel};
use crate::models::timeseries::TimeseriesData;

/// One bar segment, carrying the indices needed for hover lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSegment {
    pub series_idx: usize,
    pub bucket_idx: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackedBarBody {
    NoData(TextLabel),
    Bars(Vec<BarSegment>),
}

/// Hover result for a bar segment: bucket label plus `"name (value)"`.
#[derive(Debug, Clone, PartialEq)]
pub struct BarHover {
    pub bucket_label: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct StackedBarChart {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub state: ChartState,
    pub data: TimeseriesData,
    pub xscale: TimeScale,
    pub yscale: LinearScale,
    pub bar_width: f64,
    pub body: StackedBarBody,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub legend: Vec<LegendEntry>,
    prefs: ChartPrefs,
}

impl StackedBarChart {
    pub fn new(data: TimeseriesData, prefs: &ChartPrefs, width: f64, height: f64) -> Self {
        let margin = Margin {
            top: prefs.axis_font_size,
            bottom: prefs.axis_font_size * 2.0,
            left: prefs.axis_font_size * 3.0,
            right: prefs.axis_font_size,
        };
        let mut chart = Self {
            width,
            height,
            margin,
            state: ChartState::Uninitialized,
            xscale: TimeScale::new(data.range, (margin.left, width - margin.right)),
            yscale: LinearScale::new((0.0, 0.0), (height - margin.bottom, margin.top)),
            bar_width: 1.0,
            body: StackedBarBody::Bars(Vec::new()),
            x_axis: Axis {
                side: AxisSide::Bottom,
                ticks: Vec::new(),
            },
            y_axis: Axis {
                side: AxisSide::Left,
                ticks: Vec::new(),
            },
            legend: Vec::new(),
            data,
            prefs: prefs.clone(),
        };
        chart.draw();
        chart
    }

    pub fn set_data(&mut self, data: TimeseriesData) {
        self.data = data;
        self.draw();
    }

    fn draw(&mut self) {
        let x_domain = match (self.data.dates.first(), self.data.dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => self.data.range,
        };
        self.xscale = TimeScale::new(x_domain, (self.margin.left, self.width - self.margin.right))
            .nice((self.width / 80.0) as usize);
        self.bar_width = self.data.bar_width(self.xscale.range, 0.0);

        // sum of per-series maxima keeps the tallest stack inside the plot
        let y_max: f64 = self
            .data
            .series
            .iter()
            .map(|s| s.values.iter().copied().filter(|v| !v.is_nan()).fold(0.0, f64::max))
            .sum();
        self.yscale = LinearScale::new(
            (0.0, y_max),
            (self.height - self.margin.bottom, self.margin.top),
        );

        self.x_axis = Axis {
            side: AxisSide::Bottom,
            ticks: self
                .xscale
                .ticks((self.width / 80.0) as usize)
                .into_iter()
                .map(|t| AxisTick {
                    offset: self.xscale.scale(t),
                    label: self.data.bucket_label(&t, true),
                })
                .collect(),
        };
        self.y_axis = Axis {
            side: AxisSide::Left,
            ticks: self
                .yscale
                .ticks((self.height / 50.0) as usize)
                .into_iter()
                .map(|v| AxisTick {
                    offset: self.yscale.scale(v),
                    label: self.prefs.numbers.number(v),
                })
                .collect(),
        };
        self.legend = self
            .data
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| LegendEntry {
                name: s.name.clone(),
                color: ChartPrefs::color(i).to_string(),
                value: None,
            })
            .collect();

        if self.data.dates.is_empty() {
            self.body = StackedBarBody::NoData(TextLabel {
                position: Point {
                    x: self.width / 2.0,
                    y: self.height / 2.0,
                },
                text: "no data".to_string(),
                font_size: self.prefs.label_font_size,
                anchor: TextAnchor::Middle,
                bold: false,
            });
            self.state = ChartState::Drawn;
            return;
        }

        let mut bars = Vec::new();
        let mut stack_base = vec![0.0f64; self.data.dates.len()];
        for (series_idx, series) in self.data.series.iter().enumerate() {
            for (bucket_idx, value) in series.values.iter().enumerate() {
                // missing buckets contribute no height to the stack
                let value = if value.is_nan() { 0.0 } else { *value };
                let y0 = stack_base[bucket_idx];
                let y1 = y0 + value;
                stack_base[bucket_idx] = y1;
                let x = self.xscale.scale(self.data.dates[bucket_idx]) - self.bar_width / 2.0;
                bars.push(BarSegment {
                    series_idx,
                    bucket_idx,
                    rect: Rect {
                        x,
                        y: self.yscale.scale(y1),
                        width: self.bar_width,
                        height: self.yscale.scale(y0) - self.yscale.scale(y1),
                        color: ChartPrefs::color(series_idx).to_string(),
                    },
                });
            }
        }
        self.body = StackedBarBody::Bars(bars);
        self.state = ChartState::Drawn;
    }

    /// Hit-test a pointer position against the bar segments.
    pub fn bar_at(&self, x: f64, y: f64) -> Option<BarHover> {
        let StackedBarBody::Bars(bars) = &self.body else {
            return None;
        };
        bars.iter()
            .find(|b| {
                x >= b.rect.x
                    && x < b.rect.x + b.rect.width
                    && y >= b.rect.y
                    && y < b.rect.y + b.rect.height
            })
            .map(|b| {
                let series = &self.data.series[b.series_idx];
                let value = series.values[b.bucket_idx];
                BarHover {
                    bucket_label: self
                        .data
                        .bucket_label(&self.data.dates[b.bucket_idx], true),
                    label: format!("{} ({})", series.name, self.prefs.numbers.number(value)),
                }
            })
    }
}
