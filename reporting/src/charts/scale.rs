//! Linear and time scales.
//!
//! Continuous domain-to-pixel mappings with the usual extras: `nice`
//! rounds the domain outward to human-friendly bounds, `ticks` yields
//! round values inside the domain, `invert` maps a pixel back to a
//! domain value for hit-testing.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Tick step candidates are powers of ten times 1, 2, or 5, picked so
/// roughly `count` ticks cover the span.
fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count.max(1) as f64;
    if step <= 0.0 || !step.is_finite() {
        return 1.0;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * 10f64.powf(power)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Round the domain outward to multiples of the tick step.
    pub fn nice(mut self, count: usize) -> Self {
        let (start, stop) = self.domain;
        if start == stop {
            return self;
        }
        let step = tick_increment(start, stop, count);
        self.domain = (
            (start / step).floor() * step,
            (stop / step).ceil() * step,
        );
        self
    }

    pub fn scale(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r1 == r0 {
            return d0;
        }
        d0 + (px - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Round values covering the domain, ascending.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (start, stop) = self.domain;
        if start == stop {
            return vec![start];
        }
        let step = tick_increment(start.min(stop), start.max(stop), count);
        let lo = (start.min(stop) / step).ceil();
        let hi = (start.max(stop) / step).floor();
        let mut out = Vec::new();
        let mut i = lo;
        while i <= hi {
            out.push(i * step);
            i += 1.0;
        }
        out
    }
}

/// Calendar-aware tick interval for a time scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeInterval {
    Seconds(i64),
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Months(u32),
    Years(i64),
}

impl TimeInterval {
    fn approx_millis(self) -> i64 {
        match self {
            Self::Seconds(n) => n * 1000,
            Self::Minutes(n) => n * 60 * 1000,
            Self::Hours(n) => n * 3600 * 1000,
            Self::Days(n) => n * 86_400_000,
            Self::Months(n) => n as i64 * 30 * 86_400_000,
            Self::Years(n) => n * 365 * 86_400_000,
        }
    }

    const LADDER: [TimeInterval; 20] = [
        TimeInterval::Seconds(1),
        TimeInterval::Seconds(5),
        TimeInterval::Seconds(15),
        TimeInterval::Seconds(30),
        TimeInterval::Minutes(1),
        TimeInterval::Minutes(5),
        TimeInterval::Minutes(15),
        TimeInterval::Minutes(30),
        TimeInterval::Hours(1),
        TimeInterval::Hours(3),
        TimeInterval::Hours(6),
        TimeInterval::Hours(12),
        TimeInterval::Days(1),
        TimeInterval::Days(2),
        TimeInterval::Days(7),
        TimeInterval::Months(1),
        TimeInterval::Months(3),
        TimeInterval::Months(6),
        TimeInterval::Years(1),
        TimeInterval::Years(5),
    ];

    /// Pick the ladder interval whose tick count is closest to `count`
    /// over `span_ms`.
    fn pick(span_ms: i64, count: usize) -> Self {
        let target = (span_ms / count.max(1) as i64).max(1);
        let mut best = Self::LADDER[0];
        for candidate in Self::LADDER {
            if candidate.approx_millis() <= target {
                best = candidate;
            }
        }
        best
    }

    /// The latest boundary at or before `t`.
    fn floor(self, t: DateTime<Utc>) -> DateTime<Utc> {
        let ms = t.timestamp_millis();
        match self {
            Self::Seconds(_) | Self::Minutes(_) | Self::Hours(_) | Self::Days(_) => {
                let step = self.approx_millis();
                Utc.timestamp_millis_opt(ms.div_euclid(step) * step)
                    .single()
                    .unwrap_or(t)
            }
            Self::Months(n) => {
                let month0 = t.month0() - t.month0() % n;
                start_of(t.year(), month0 + 1)
            }
            Self::Years(n) => {
                let year = t.year() - (t.year().rem_euclid(n as i32));
                start_of(year, 1)
            }
        }
    }

    fn next(self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Seconds(n) => t + Duration::seconds(n),
            Self::Minutes(n) => t + Duration::minutes(n),
            Self::Hours(n) => t + Duration::hours(n),
            Self::Days(n) => t + Duration::days(n),
            Self::Months(n) => {
                let total = t.year() * 12 + t.month0() as i32 + n as i32;
                start_of(total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
            }
            Self::Years(n) => start_of(t.year() + n as i32, 1),
        }
    }
}

fn start_of(year: i32, month: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pub domain: (DateTime<Utc>, DateTime<Utc>),
    pub range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (DateTime<Utc>, DateTime<Utc>), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Round the domain outward to tick-interval boundaries.
    pub fn nice(mut self, count: usize) -> Self {
        let (start, stop) = self.domain;
        if start >= stop {
            return self;
        }
        let interval = TimeInterval::pick((stop - start).num_milliseconds(), count);
        let floored = interval.floor(start);
        let mut end = interval.floor(stop);
        if end < stop {
            end = interval.next(end);
        }
        self.domain = (floored, end);
        self
    }

    pub fn scale(&self, t: DateTime<Utc>) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = (d1 - d0).num_milliseconds() as f64;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (t - d0).num_milliseconds() as f64 / span * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> DateTime<Utc> {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r1 == r0 {
            return d0;
        }
        let span = (d1 - d0).num_milliseconds() as f64;
        d0 + Duration::milliseconds(((px - r0) / (r1 - r0) * span) as i64)
    }

    /// Interval boundaries inside the domain, ascending.
    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        let (start, stop) = self.domain;
        if start > stop {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        let interval = TimeInterval::pick((stop - start).num_milliseconds(), count);
        let mut t = interval.floor(start);
        if t < start {
            t = interval.next(t);
        }
        let mut out = Vec::new();
        while t <= stop {
            out.push(t);
            t = interval.next(t);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_linear_scale_and_invert() {
        let s = LinearScale::new((0.0, 100.0), (20.0, 420.0));
        assert_eq!(s.scale(0.0), 20.0);
        assert_eq!(s.scale(50.0), 220.0);
        assert_eq!(s.invert(420.0), 100.0);
        // inverted pixel range, as used by y axes
        let y = LinearScale::new((0.0, 10.0), (380.0, 12.0));
        assert_eq!(y.scale(0.0), 380.0);
        assert_eq!(y.scale(10.0), 12.0);
        assert!((y.invert(196.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_nice_rounds_outward() {
        let s = LinearScale::new((0.13, 9.87), (0.0, 100.0)).nice(10);
        assert_eq!(s.domain, (0.0, 10.0));
    }

    #[test]
    fn test_linear_ticks_are_round() {
        let s = LinearScale::new((0.0, 10.0), (0.0, 100.0));
        assert_eq!(s.ticks(5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let s = LinearScale::new((0.0, 1.0), (0.0, 100.0));
        assert_eq!(s.ticks(10).len(), 11);
    }

    #[test]
    fn test_time_scale_round_trip() {
        let d0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let d1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let s = TimeScale::new((d0, d1), (0.0, 240.0));
        let noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(s.scale(noon), 120.0);
        assert_eq!(s.invert(120.0), noon);
    }

    #[test]
    fn test_time_ticks_align_to_boundaries() {
        let d0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 17, 0).unwrap();
        let d1 = Utc.with_ymd_and_hms(2024, 1, 1, 23, 5, 0).unwrap();
        let ticks = TimeScale::new((d0, d1), (0.0, 600.0)).ticks(6);
        assert!(!ticks.is_empty());
        for t in &ticks {
            assert_eq!(t.minute(), 0, "tick {t} not on an hour boundary");
        }
        assert!(ticks[0] >= d0 && *ticks.last().unwrap() <= d1);
    }

    #[test]
    fn test_time_nice_extends_domain() {
        let d0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 17, 0).unwrap();
        let d1 = Utc.with_ymd_and_hms(2024, 1, 1, 23, 5, 0).unwrap();
        let s = TimeScale::new((d0, d1), (0.0, 600.0)).nice(6);
        assert!(s.domain.0 <= d0);
        assert!(s.domain.1 >= d1);
        assert_eq!(s.domain.0.minute(), 0);
        assert_eq!(s.domain.1.minute(), 0);
    }

    #[test]
    fn test_month_ticks_land_on_month_starts() {
        let d0 = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let d1 = Utc.with_ymd_and_hms(2024, 7, 20, 0, 0, 0).unwrap();
        let ticks = TimeScale::new((d0, d1), (0.0, 600.0)).ticks(6);
        for t in &ticks {
            assert_eq!(t.day(), 1);
            assert_eq!(t.hour(), 0);
        }
    }
}
