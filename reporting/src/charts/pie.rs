//! Pie chart.
//!
//! A zero-sum dataset renders a single "no data" slice instead of
//! degenerate geometry. Slice labels sit on a radius that grows with the
//! slice count, and per-slice value labels appear only on slices wide
//! enough to hold them; with `labels` off a side legend sorted by
//! descending value is produced instead.

use std::f64::consts::TAU;

use crate::api::PieDatum;
use crate::charts::prefs::ChartPrefs;
use crate::charts::{ChartState, LegendEntry, Point};

/// Angle below which a slice gets no inline value label, radians.
const MIN_LABELED_ANGLE: f64 = 0.25;

/// One slice. Angles are clockwise from 12 o'clock, in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub name: String,
    pub value: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: String,
    /// `"name: value"` tooltip text.
    pub title: String,
    /// Inline label position, present only in labeled mode.
    pub label_at: Option<Point>,
    /// Formatted value under the name, omitted for narrow slices and
    /// for the "no data" slice.
    pub value_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PieChart {
    pub width: f64,
    pub height: f64,
    pub state: ChartState,
    pub radius: f64,
    pub slices: Vec<Slice>,
    /// Present only when inline labels are off.
    pub legend: Option<Vec<LegendEntry>>,
    /// True when the dataset summed to zero and a placeholder slice was
    /// substituted.
    pub no_data: bool,
}

impl PieChart {
    pub fn new(data: &[PieDatum], prefs: &ChartPrefs, width: f64, height: f64, labels: bool) -> Self {
        let total: f64 = data.iter().map(|d| d.value).sum();
        let no_data = total == 0.0;
        let placeholder = [PieDatum {
            name: "no data".to_string(),
            value: 100.0,
        }];
        let (slice_data, total) = if no_data {
            (&placeholder[..], 100.0)
        } else {
            (data, total)
        };

        let radius = width.min(height) / 2.0 - 1.0;
        let label_radius = width.min(height) / 2.0
            * match slice_data.len() {
                1 => 0.1,
                2..=3 => 0.65,
                4..=6 => 0.7,
                _ => 0.8,
            };

        let mut slices = Vec::with_capacity(slice_data.len());
        let mut angle = 0.0f64;
        for (i, d) in slice_data.iter().enumerate() {
            let sweep = d.value / total * TAU;
            let start_angle = angle;
            let end_angle = angle + sweep;
            angle = end_angle;

            let mid = (start_angle + end_angle) / 2.0;
            let label_at = labels.then(|| Point {
                x: mid.sin() * label_radius,
                y: -mid.cos() * label_radius,
            });
            let value_label = (labels && !no_data && sweep > MIN_LABELED_ANGLE)
                .then(|| prefs.numbers.number(d.value));
            slices.push(Slice {
                name: d.name.clone(),
                value: d.value,
                start_angle,
                end_angle,
                color: ChartPrefs::color(i).to_string(),
                title: format!("{}: {}", d.name, prefs.numbers.number(d.value)),
                label_at,
                value_label,
            });
        }

        let legend = (!labels).then(|| {
            let mut by_value: Vec<&Slice> = slices.iter().collect();
            by_value.sort_by(|a, b| {
                b.value
                    .partial_cmp(&a.value)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            by_value
                .into_iter()
                .map(|s| LegendEntry {
                    name: s.name.clone(),
                    color: s.color.clone(),
                    value: Some(prefs.numbers.number(s.value)),
                })
                .collect::<Vec<_>>()
        });

        Self {
            width,
            height,
            state: ChartState::Drawn,
            radius,
            slices,
            legend,
            no_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum(name: &str, value: f64) -> PieDatum {
        PieDatum {
            name: name.to_string(),
            value,
        }
    }

    fn pie(data: &[PieDatum], labels: bool) -> PieChart {
        PieChart::new(data, &ChartPrefs::default(), 400.0, 400.0, labels)
    }

    #[test]
    fn test_zero_sum_yields_single_no_data_slice() {
        let c = pie(&[datum("a", 0.0), datum("b", 0.0)], true);
        assert!(c.no_data);
        assert_eq!(c.slices.len(), 1);
        assert_eq!(c.slices[0].name, "no data");
        assert!((c.slices[0].end_angle - TAU).abs() < 1e-9);
        // the placeholder never carries a value label
        assert!(c.slices[0].value_label.is_none());
    }

    #[test]
    fn test_slices_are_proportional_and_contiguous() {
        let c = pie(&[datum("ok", 75.0), datum("reject", 25.0)], true);
        assert!(!c.no_data);
        assert_eq!(c.slices.len(), 2);
        assert_eq!(c.slices[0].start_angle, 0.0);
        assert!((c.slices[0].end_angle - 0.75 * TAU).abs() < 1e-9);
        assert_eq!(c.slices[0].end_angle, c.slices[1].start_angle);
        assert!((c.slices[1].end_angle - TAU).abs() < 1e-9);
    }

    #[test]
    fn test_narrow_slices_get_no_value_label() {
        let c = pie(&[datum("big", 99.0), datum("tiny", 1.0)], true);
        assert!(c.slices[0].value_label.is_some());
        assert!(c.slices[1].value_label.is_none());
        // names still label both slices
        assert!(c.slices[1].label_at.is_some());
    }

    #[test]
    fn test_legend_mode_sorts_descending() {
        let c = pie(
            &[datum("small", 10.0), datum("large", 80.0), datum("mid", 30.0)],
            false,
        );
        let legend = c.legend.as_ref().unwrap();
        let names: Vec<_> = legend.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["large", "mid", "small"]);
        // inline labels are off in legend mode
        assert!(c.slices.iter().all(|s| s.label_at.is_none()));
    }

    #[test]
    fn test_label_radius_scales_with_slice_count() {
        let few = pie(&[datum("a", 50.0), datum("b", 50.0)], true);
        let many = pie(
            &(0..8).map(|i| datum(&format!("s{i}"), 10.0)).collect::<Vec<_>>(),
            true,
        );
        let r = |c: &PieChart| {
            let p = c.slices[0].label_at.unwrap();
            (p.x * p.x + p.y * p.y).sqrt()
        };
        assert!(r(&many) > r(&few));
    }
}
