//! Multi-series line chart.
//!
//! NaN values break a series into separate polyline runs. Pointer moves
//! invert to data coordinates, bisect to the nearest bucket, and pick
//! the series whose value is closest to the pointer; the hover state
//! carries the highlight and the formatted label.

use chrono::{DateTime, Utc};

use crate::charts::prefs::{self, ChartPrefs};
use crate::charts::scale::{LinearScale, TimeScale};
use crate::charts::{Axis, AxisSide, AxisTick, ChartState, LegendEntry, Margin, Point, TextAnchor, TextLabel};
use crate::models::timeseries::TimeseriesData;

/// One series rendered as polyline runs, split at NaN gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPath {
    pub id: String,
    pub name: String,
    pub color: String,
    pub runs: Vec<Vec<Point>>,
}

/// Chart body by bucket count: none, a single marker column, or paths.
#[derive(Debug, Clone, PartialEq)]
pub enum LineBody {
    /// Zero buckets: a centered placeholder instead of empty geometry.
    NoData(TextLabel),
    /// Exactly one bucket: one marker per series, a line needs two points.
    Markers(Vec<(String, Point, String)>),
    Paths(Vec<SeriesPath>),
}

/// Hover interaction state. Reset on pointer leave.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hover {
    /// Id of the highlighted series; others render dimmed.
    pub series_id: Option<String>,
    pub dot: Option<Point>,
    /// `"<bucket label> (<value>)"`.
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MultiLineChart {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub state: ChartState,
    pub data: TimeseriesData,
    pub xscale: TimeScale,
    pub yscale: LinearScale,
    pub body: LineBody,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub legend: Vec<LegendEntry>,
    pub hover: Hover,
    prefs: ChartPrefs,
}

impl MultiLineChart {
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
            data,
            xscale: TimeScale::new(
                (Utc::now(), Utc::now()),
                (margin.left, width - margin.right),
            ),
            yscale: LinearScale::new((0.0, 0.0), (height - margin.bottom, margin.top)),
            body: LineBody::NoData(TextLabel {
                position: Point { x: 0.0, y: 0.0 },
                text: String::new(),
                font_size: 0.0,
                anchor: TextAnchor::Middle,
                bold: false,
            }),
            x_axis: Axis {
                side: AxisSide::Bottom,
                ticks: Vec::new(),
            },
            y_axis: Axis {
                side: AxisSide::Left,
                ticks: Vec::new(),
            },
            legend: Vec::new(),
            hover: Hover::default(),
            prefs: prefs.clone(),
        };
        chart.draw();
        chart
    }

    /// Replace the data and fully redraw.
    pub fn set_data(&mut self, data: TimeseriesData) {
        self.data = data;
        self.hover = Hover::default();
        self.draw();
    }

    fn draw(&mut self) {
        let (x_domain, y_domain) = self.domains();
        self.xscale = TimeScale::new(x_domain, (self.margin.left, self.width - self.margin.right))
            .nice((self.width / 80.0) as usize);
        self.yscale = LinearScale::new(y_domain, (self.height - self.margin.bottom, self.margin.top))
            .nice((self.height / 50.0) as usize);

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
                color: prefs::ChartPrefs::line_color(i).to_string(),
                value: None,
            })
            .collect();

        self.body = if self.data.dates.is_empty() {
            LineBody::NoData(TextLabel {
                position: Point {
                    x: self.width / 2.0,
                    y: self.height / 2.0,
                },
                text: "no data".to_string(),
                font_size: self.prefs.label_font_size,
                anchor: TextAnchor::Middle,
                bold: false,
            })
        } else if self.data.dates.len() == 1 {
            let x = self.xscale.scale(self.data.dates[0]);
            LineBody::Markers(
                self.data
                    .series
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| !s.values[0].is_nan())
                    .map(|(i, s)| {
                        (
                            s.id.clone(),
                            Point {
                                x,
                                y: self.yscale.scale(s.values[0]),
                            },
                            prefs::ChartPrefs::line_color(i).to_string(),
                        )
                    })
                    .collect(),
            )
        } else {
            LineBody::Paths(
                self.data
                    .series
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let mut runs: Vec<Vec<Point>> = Vec::new();
                        let mut run: Vec<Point> = Vec::new();
                        for (idx, v) in s.values.iter().enumerate() {
                            if v.is_nan() {
                                if !run.is_empty() {
                                    runs.push(std::mem::take(&mut run));
                                }
                                continue;
                            }
                            run.push(Point {
                                x: self.xscale.scale(self.data.dates[idx]),
                                y: self.yscale.scale(*v),
                            });
                        }
                        if !run.is_empty() {
                            runs.push(run);
                        }
                        SeriesPath {
                            id: s.id.clone(),
                            name: s.name.clone(),
                            color: prefs::ChartPrefs::line_color(i).to_string(),
                            runs,
                        }
                    })
                    .collect(),
            )
        };
        self.state = ChartState::Drawn;
    }

    fn domains(&self) -> ((DateTime<Utc>, DateTime<Utc>), (f64, f64)) {
        let x = match (self.data.dates.first(), self.data.dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => self.data.range,
        };
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for s in &self.data.series {
            for v in &s.values {
                if !v.is_nan() {
                    y_min = y_min.min(*v);
                    y_max = y_max.max(*v);
                }
            }
        }
        if !y_min.is_finite() {
            (x, (0.0, 0.0))
        } else {
            (x, (y_min, y_max))
        }
    }

    /// Pointer moved to pixel `(x, y)`: update the hover state with the
    /// nearest bucket and the closest series at that bucket.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if self.data.dates.is_empty() || self.data.series.is_empty() {
            self.hover = Hover::default();
            return;
        }
        let xvalue = self.xscale.invert(x);
        let yvalue = self.yscale.invert(y);
        let i = self
            .data
            .dates
            .partition_point(|d| *d <= xvalue)
            .min(self.data.dates.len() - 1);

        let mut closest = 0usize;
        let mut closest_dist = f64::INFINITY;
        for (sidx, s) in self.data.series.iter().enumerate() {
            let dist = (s.values[i] - yvalue).abs();
            if dist < closest_dist {
                closest = sidx;
                closest_dist = dist;
            }
        }
        let series = &self.data.series[closest];
        self.hover = Hover {
            series_id: Some(series.id.clone()),
            dot: Some(Point {
                x: self.xscale.scale(self.data.dates[i]),
                y: self.yscale.scale(series.values[i]),
            }),
            label: Some(format!(
                "{} ({})",
                self.data.bucket_label(&self.data.dates[i], true),
                self.prefs.numbers.number(series.values[i])
            )),
        };
    }

    /// Pointer left the chart: no highlight, no dot.
    pub fn pointer_left(&mut self) {
        self.hover = Hover::default();
    }
}
