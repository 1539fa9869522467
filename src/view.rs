//! Numeric and time ranges.

use serde::{Deserialize, Serialize};

/// Numeric range with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Range {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut min: f64, mut max: f64) -> Self {
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self { min, max }
    }

    /// Span of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Check whether both bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Check whether the range has positive span and finite bounds.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.span() > 0.0
    }

    /// Clamp a value into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Check whether the value lies inside the inclusive bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Ensure the range has at least the given span.
    pub fn with_min_span(&self, min_span: f64) -> Self {
        let span = self.span();
        if span >= min_span {
            return *self;
        }
        let center = (self.min + self.max) * 0.5;
        let half = min_span * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// Inclusive epoch-millisecond window.
///
/// Two of these drive a timeline: the immutable plan bounds (`max`) and the
/// current zoom/pan window (`view`), which always stays inside the former.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Window start in epoch milliseconds.
    pub start: f64,
    /// Window end in epoch milliseconds.
    pub end: f64,
}

impl TimeRange {
    /// Create a new time range, swapping bounds if needed.
    pub fn new(start: f64, end: f64) -> Self {
        let range = Range::new(start, end);
        Self {
            start: range.min,
            end: range.max,
        }
    }

    /// Duration of the window in milliseconds.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Midpoint of the window.
    pub fn center(&self) -> f64 {
        (self.start + self.end) * 0.5
    }

    /// Check whether `time` lies inside the window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Clamp a time into the window.
    pub fn clamp(&self, time: f64) -> f64 {
        time.max(self.start).min(self.end)
    }

    /// Check whether the window overlaps `[start, end]`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        end >= self.start && start <= self.end
    }

    /// Intersection of two windows, if they overlap.
    pub fn intersect(&self, other: TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(TimeRange { start, end })
    }

    /// Fit this window inside `bounds`.
    ///
    /// The span is preserved when possible by sliding the window back inside;
    /// a window wider than the bounds collapses to the bounds.
    pub fn fit_within(&self, bounds: TimeRange) -> TimeRange {
        let span = self.span();
        if span >= bounds.span() {
            return bounds;
        }
        if self.start < bounds.start {
            return TimeRange::new(bounds.start, bounds.start + span);
        }
        if self.end > bounds.end {
            return TimeRange::new(bounds.end - span, bounds.end);
        }
        *self
    }

    /// Scale the window around `center` by `factor` (< 1 zooms in).
    pub fn zoomed(&self, center: f64, factor: f64) -> TimeRange {
        TimeRange::new(
            center + (self.start - center) * factor,
            center + (self.end - center) * factor,
        )
    }

    /// Shift the window by `delta` milliseconds.
    pub fn shifted(&self, delta: f64) -> TimeRange {
        TimeRange::new(self.start + delta, self.end + delta)
    }

    /// View the window as a plain numeric range.
    pub fn as_range(&self) -> Range {
        Range::new(self.start, self.end)
    }
}

impl From<Range> for TimeRange {
    fn from(range: Range) -> Self {
        Self::new(range.min, range.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_with_min_span_expands() {
        let range = Range::new(2.0, 2.0);
        let expanded = range.with_min_span(1.0);
        assert!(expanded.span() >= 1.0);
        assert!(((expanded.min + expanded.max) * 0.5 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn time_range_swaps_reversed_bounds() {
        let range = TimeRange::new(10.0, 2.0);
        assert_eq!(range.start, 2.0);
        assert_eq!(range.end, 10.0);
    }

    #[test]
    fn fit_within_slides_window_back_inside() {
        let bounds = TimeRange::new(0.0, 100.0);
        let fitted = TimeRange::new(90.0, 120.0).fit_within(bounds);
        assert_eq!(fitted, TimeRange::new(70.0, 100.0));
        let fitted = TimeRange::new(-10.0, 20.0).fit_within(bounds);
        assert_eq!(fitted, TimeRange::new(0.0, 30.0));
        let fitted = TimeRange::new(-10.0, 200.0).fit_within(bounds);
        assert_eq!(fitted, bounds);
    }

    #[test]
    fn zoom_keeps_center_fixed() {
        let range = TimeRange::new(0.0, 100_000.0);
        let zoomed = range.zoomed(50_000.0, 0.5);
        assert_eq!(zoomed, TimeRange::new(25_000.0, 75_000.0));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = TimeRange::new(0.0, 10.0);
        assert!(a.intersect(TimeRange::new(11.0, 20.0)).is_none());
        assert_eq!(
            a.intersect(TimeRange::new(5.0, 20.0)),
            Some(TimeRange::new(5.0, 10.0))
        );
    }
}
