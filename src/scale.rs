//! Coordinate scales between data space and pixel space.
//!
//! A scale is a monotonic linear mapping from a domain (time or value) onto a
//! pixel range together with its inverse. Scales never clamp; callers clamp.

use crate::view::{Range, TimeRange};

/// Smallest domain span a scale is built with, in domain units.
const MIN_SPAN: f64 = 1e-9;

/// Span used for time domains that collapse to a single instant.
const MIN_TIME_SPAN_MS: f64 = 1.0;

/// Linear mapping from a numeric domain to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: Range,
    range: Range,
    /// True when the pixel range runs from `range.max` down to `range.min`.
    flipped: bool,
}

impl LinearScale {
    /// Create a scale mapping `domain.min → range_start` and
    /// `domain.max → range_end`.
    ///
    /// Returns `None` for non-finite input. A zero-width domain is widened
    /// around its center so the scale stays usable.
    pub fn new(domain: Range, range_start: f64, range_end: f64) -> Option<Self> {
        if !domain.is_finite() || !range_start.is_finite() || !range_end.is_finite() {
            return None;
        }
        let domain = domain.with_min_span(MIN_SPAN);
        Some(Self {
            domain,
            range: Range::new(range_start, range_end),
            flipped: range_start > range_end,
        })
    }

    /// Domain of the scale.
    pub fn domain(&self) -> Range {
        self.domain
    }

    /// Pixel range of the scale, as `(start, end)`.
    pub fn range(&self) -> (f64, f64) {
        if self.flipped {
            (self.range.max, self.range.min)
        } else {
            (self.range.min, self.range.max)
        }
    }

    /// Map a domain value to pixels.
    pub fn forward(&self, value: f64) -> f64 {
        let (start, end) = self.range();
        start + (value - self.domain.min) / self.domain.span() * (end - start)
    }

    /// Map a pixel position back into the domain.
    pub fn invert(&self, pixel: f64) -> f64 {
        let (start, end) = self.range();
        let span = end - start;
        if span == 0.0 {
            return self.domain.min;
        }
        self.domain.min + (pixel - start) / span * self.domain.span()
    }
}

/// Time → horizontal pixel scale shared by every row of a timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    view: TimeRange,
    width: f64,
    linear: LinearScale,
}

impl TimeScale {
    /// Build the scale for a view window drawn across `width` pixels.
    ///
    /// Returns `None` when there is nothing to draw into.
    pub fn new(view: TimeRange, width: f64) -> Option<Self> {
        if !(width > 0.0) {
            return None;
        }
        let domain = view.as_range().with_min_span(MIN_TIME_SPAN_MS);
        let linear = LinearScale::new(domain, 0.0, width)?;
        Some(Self {
            view,
            width,
            linear,
        })
    }

    /// View window the scale was built for.
    pub fn view(&self) -> TimeRange {
        self.view
    }

    /// Pixel width of the drawing surface.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Map an epoch-millisecond time to an x pixel.
    pub fn forward(&self, time: f64) -> f64 {
        self.linear.forward(time)
    }

    /// Map an x pixel back to epoch milliseconds.
    pub fn invert(&self, x: f64) -> f64 {
        self.linear.invert(x)
    }

    /// Pixels per millisecond.
    pub fn pixels_per_ms(&self) -> f64 {
        self.width / self.linear.domain().span()
    }
}

/// Value → vertical pixel scale for one value axis of a row.
///
/// The domain maximum sits at the top of the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    linear: LinearScale,
}

impl ValueScale {
    /// Build the scale for a `[min, max]` domain drawn across `height` pixels.
    pub fn new(domain: Range, height: f64) -> Option<Self> {
        if !(height > 0.0) {
            return None;
        }
        let domain = normalize_value_domain(domain)?;
        let linear = LinearScale::new(domain, height, 0.0)?;
        Some(Self { linear })
    }

    /// Build the scale from an axis domain slice, which may be empty.
    pub fn from_axis_domain(domain: &[f64], height: f64) -> Option<Self> {
        match domain {
            [min, max] => Self::new(Range::new(*min, *max), height),
            _ => None,
        }
    }

    /// Normalized domain of the scale.
    pub fn domain(&self) -> Range {
        self.linear.domain()
    }

    /// Map a value to a y pixel.
    pub fn forward(&self, value: f64) -> f64 {
        self.linear.forward(value)
    }

    /// Map a y pixel back to a value.
    pub fn invert(&self, y: f64) -> f64 {
        self.linear.invert(y)
    }
}

/// Normalize a value-axis domain before building a scale.
///
/// A degenerate `[v, v]` domain is anchored at zero (`[0, v]` or `[v, 0]`)
/// and `[0, 0]` becomes `[-1, 1]`, so a single flat trace still draws as a
/// visible line instead of collapsing onto the row edge.
pub fn normalize_value_domain(domain: Range) -> Option<Range> {
    if !domain.is_finite() {
        return None;
    }
    if domain.span() > 0.0 {
        return Some(domain);
    }
    let value = domain.min;
    if value > 0.0 {
        Some(Range::new(0.0, value))
    } else if value < 0.0 {
        Some(Range::new(value, 0.0))
    } else {
        Some(Range::new(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_scale_centers_view() {
        let scale = TimeScale::new(TimeRange::new(0.0, 100_000.0), 1000.0).expect("scale");
        assert_eq!(scale.forward(50_000.0), 500.0);

        let zoomed = TimeScale::new(TimeRange::new(25_000.0, 75_000.0), 1000.0).expect("scale");
        assert_eq!(zoomed.forward(50_000.0), 500.0);
    }

    #[test]
    fn time_scale_roundtrip_and_monotonic() {
        let view = TimeRange::new(1_700_000_000_000.0, 1_700_086_400_000.0);
        let scale = TimeScale::new(view, 1234.0).expect("scale");
        let mut last = f64::NEG_INFINITY;
        for step in 0..=100 {
            let time = view.start + view.span() * step as f64 / 100.0;
            let x = scale.forward(time);
            assert!(x >= last);
            last = x;
            let roundtrip = scale.invert(x);
            assert!((roundtrip - time).abs() < 1e-2, "{roundtrip} vs {time}");
        }
    }

    #[test]
    fn zero_width_time_view_is_still_usable() {
        let scale = TimeScale::new(TimeRange::new(500.0, 500.0), 100.0).expect("scale");
        let x = scale.forward(500.0);
        assert!(x.is_finite());
        assert!((scale.invert(x) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn zero_width_surface_has_no_scale() {
        assert!(TimeScale::new(TimeRange::new(0.0, 10.0), 0.0).is_none());
    }

    #[test]
    fn value_scale_puts_max_on_top() {
        let scale = ValueScale::new(Range::new(0.0, 10.0), 100.0).expect("scale");
        assert_eq!(scale.forward(10.0), 0.0);
        assert_eq!(scale.forward(0.0), 100.0);
        assert!((scale.invert(25.0) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_value_domain_is_anchored_at_zero() {
        assert_eq!(
            normalize_value_domain(Range::new(5.0, 5.0)),
            Some(Range::new(0.0, 5.0))
        );
        assert_eq!(
            normalize_value_domain(Range::new(-3.0, -3.0)),
            Some(Range::new(-3.0, 0.0))
        );
        assert_eq!(
            normalize_value_domain(Range::new(0.0, 0.0)),
            Some(Range::new(-1.0, 1.0))
        );
    }

    #[test]
    fn empty_axis_domain_has_no_scale() {
        assert!(ValueScale::from_axis_domain(&[], 100.0).is_none());
        assert!(ValueScale::from_axis_domain(&[0.0, 1.0], 100.0).is_some());
    }
}
