//! Axis tick generation and formatting.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::scale::{TimeScale, ValueScale};

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// Candidate time-tick intervals, ascending.
const TIME_INTERVALS: [f64; 19] = [
    SECOND,
    5.0 * SECOND,
    15.0 * SECOND,
    30.0 * SECOND,
    MINUTE,
    5.0 * MINUTE,
    15.0 * MINUTE,
    30.0 * MINUTE,
    HOUR,
    3.0 * HOUR,
    6.0 * HOUR,
    12.0 * HOUR,
    DAY,
    2.0 * DAY,
    7.0 * DAY,
    14.0 * DAY,
    30.0 * DAY,
    90.0 * DAY,
    365.0 * DAY,
];

/// Upper bound on generated ticks for a single axis.
const MAX_TICKS: usize = 1_000;

/// One time-axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTick {
    /// Tick time in epoch milliseconds.
    pub time: f64,
    /// Horizontal pixel position.
    pub x: f64,
    /// Year and day of year, e.g. `2024-153`.
    pub date: String,
    /// Time of day, e.g. `06:30:00`.
    pub time_of_day: String,
}

/// One value-axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTick {
    /// Tick value.
    pub value: f64,
    /// Vertical pixel position.
    pub y: f64,
    /// Formatted label.
    pub label: String,
}

/// Formatter for value tick labels.
#[derive(Clone, Default)]
pub enum AxisFormatter {
    /// Fixed precision derived from the tick step.
    #[default]
    Default,
    /// Custom formatter callback.
    Custom(Arc<dyn Fn(f64) -> String + Send + Sync>),
}

impl AxisFormatter {
    /// Format a value for display, given the spacing between ticks.
    pub fn format(&self, value: f64, step: f64) -> String {
        match self {
            Self::Default => {
                let decimals = if step > 0.0 && step < 1.0 {
                    (-step.log10()).ceil().clamp(0.0, 12.0) as usize
                } else {
                    0
                };
                let value = if value == 0.0 { 0.0 } else { value };
                format!("{value:.decimals$}")
            }
            Self::Custom(formatter) => formatter(value),
        }
    }
}

impl std::fmt::Debug for AxisFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "AxisFormatter::Default"),
            Self::Custom(_) => write!(f, "AxisFormatter::Custom(..)"),
        }
    }
}

/// Smallest nice interval whose ticks are at least `min_spacing_px` apart.
pub fn time_tick_interval(scale: &TimeScale, min_spacing_px: f64) -> f64 {
    let pixels_per_ms = scale.pixels_per_ms();
    if !(pixels_per_ms > 0.0) {
        return TIME_INTERVALS[TIME_INTERVALS.len() - 1];
    }
    let needed = min_spacing_px.max(1.0) / pixels_per_ms;
    TIME_INTERVALS
        .iter()
        .copied()
        .find(|interval| *interval >= needed)
        .unwrap_or_else(|| {
            let year = TIME_INTERVALS[TIME_INTERVALS.len() - 1];
            (needed / year).ceil() * year
        })
}

/// Ticks aligned to multiples of the chosen interval across the view.
pub fn time_ticks(scale: &TimeScale, min_spacing_px: f64) -> Vec<TimeTick> {
    let view = scale.view();
    let interval = time_tick_interval(scale, min_spacing_px);
    let mut ticks = Vec::new();
    let mut time = (view.start / interval).ceil() * interval;
    while time <= view.end && ticks.len() < MAX_TICKS {
        let (date, time_of_day) = format_time(time);
        ticks.push(TimeTick {
            time,
            x: scale.forward(time),
            date,
            time_of_day,
        });
        time += interval;
    }
    ticks
}

/// Format epoch milliseconds as `(date, time)` parts in UTC.
pub fn format_time(time: f64) -> (String, String) {
    let Some(datetime) = DateTime::<Utc>::from_timestamp_millis(time.round() as i64) else {
        return (String::new(), String::new());
    };
    (
        datetime.format("%Y-%j").to_string(),
        datetime.format("%H:%M:%S").to_string(),
    )
}

/// Nice step (1, 2 or 5 times a power of ten) splitting `span` into about
/// `count` intervals.
pub fn nice_step(span: f64, count: usize) -> f64 {
    if !(span > 0.0) || !span.is_finite() {
        return 0.0;
    }
    let raw = span / count.max(1) as f64;
    let magnitude = 10_f64.powi(raw.log10().floor() as i32);
    let residual = raw / magnitude;
    let factor = if residual >= 7.5 {
        10.0
    } else if residual >= 3.5 {
        5.0
    } else if residual >= 1.5 {
        2.0
    } else {
        1.0
    };
    factor * magnitude
}

/// Nice ticks inside the scale's domain.
pub fn value_ticks(scale: &ValueScale, count: usize, formatter: &AxisFormatter) -> Vec<ValueTick> {
    let domain = scale.domain();
    let step = nice_step(domain.span(), count);
    if step <= 0.0 {
        return Vec::new();
    }
    let first = (domain.min / step).ceil() as i64;
    let last = (domain.max / step).floor() as i64;
    (first..=last)
        .take(MAX_TICKS)
        .map(|multiple| {
            let value = multiple as f64 * step;
            ValueTick {
                value,
                y: scale.forward(value),
                label: formatter.format(value, step),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Range, TimeRange};

    #[test]
    fn interval_respects_minimum_spacing() {
        let scale = TimeScale::new(TimeRange::new(0.0, HOUR), 1200.0).expect("scale");
        let interval = time_tick_interval(&scale, 120.0);
        assert_eq!(interval, 15.0 * MINUTE);
        assert!(interval * scale.pixels_per_ms() >= 120.0);
    }

    #[test]
    fn ticks_are_aligned_and_formatted() {
        let start = 1_717_200_000_000.0;
        let scale = TimeScale::new(TimeRange::new(start + 1.0, start + 3.0 * HOUR), 600.0)
            .expect("scale");
        let ticks = time_ticks(&scale, 200.0);
        assert!(!ticks.is_empty());
        for tick in &ticks {
            assert_eq!(tick.time % HOUR, 0.0);
            assert!(tick.x >= 0.0 && tick.x <= 600.0);
        }
        assert_eq!(ticks[0].date, "2024-153");
        assert_eq!(ticks[0].time_of_day, "01:00:00");
    }

    #[test]
    fn very_wide_views_use_multi_year_intervals() {
        let scale = TimeScale::new(TimeRange::new(0.0, 100.0 * 365.0 * DAY), 100.0).expect("scale");
        let interval = time_tick_interval(&scale, 50.0);
        assert_eq!(interval % (365.0 * DAY), 0.0);
        assert!(time_ticks(&scale, 50.0).len() <= 3);
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(100.0, 5), 20.0);
        assert_eq!(nice_step(1.0, 4), 0.2);
        assert_eq!(nice_step(0.0, 4), 0.0);
    }

    #[test]
    fn value_ticks_cover_the_domain() {
        let scale = ValueScale::new(Range::new(0.0, 100.0), 200.0).expect("scale");
        let ticks = value_ticks(&scale, 5, &AxisFormatter::Default);
        let values: Vec<f64> = ticks.iter().map(|tick| tick.value).collect();
        assert_eq!(values, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(ticks[0].y, 200.0);
        assert_eq!(ticks[5].y, 0.0);
        assert_eq!(ticks[1].label, "20");
    }

    #[test]
    fn fractional_steps_keep_enough_decimals() {
        let formatter = AxisFormatter::Default;
        assert_eq!(formatter.format(0.25, 0.05), "0.25");
        assert_eq!(formatter.format(-0.0, 1.0), "0");
        let custom = AxisFormatter::Custom(Arc::new(|value| format!("{value} W")));
        assert_eq!(custom.format(3.0, 1.0), "3 W");
    }
}
