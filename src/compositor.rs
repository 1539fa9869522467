//! Shared time axis, draw scheduling and constraint violations.
//!
//! The compositor owns everything rows have in common: the plan bounds, the
//! zoom/pan window, the time scale derived from them and the container width,
//! the time-axis ticks and the violation windows. It never draws row content.

use crate::axis::{TimeTick, time_ticks};
use crate::config::TimelineConfig;
use crate::geom::{ScreenPoint, ScreenRect};
use crate::model::ConstraintViolation;
use crate::render::{Canvas, LineStyle, RenderList, TextAlign, TextStyle};
use crate::scale::TimeScale;
use crate::style::Theme;
use crate::view::TimeRange;

/// Kind of pass the scheduler wants run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRequest {
    /// Surfaces must be reallocated; implies a redraw.
    Resize,
    /// Content changed at the current size.
    Redraw,
}

/// Coalesces draw requests arriving within one scheduling tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawScheduler {
    resize: bool,
    redraw: bool,
}

impl DrawScheduler {
    /// Ask for a resize pass.
    pub fn request_resize(&mut self) {
        self.resize = true;
    }

    /// Ask for a redraw pass.
    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Check whether any pass is pending.
    pub fn is_pending(&self) -> bool {
        self.resize || self.redraw
    }

    /// Take the pending pass, if any. A pending resize absorbs a pending redraw.
    pub fn take(&mut self) -> Option<DrawRequest> {
        let request = if self.resize {
            Some(DrawRequest::Resize)
        } else if self.redraw {
            Some(DrawRequest::Redraw)
        } else {
            None
        };
        *self = Self::default();
        request
    }
}

/// Shared time-domain state of a timeline.
#[derive(Debug, Clone)]
pub struct TimelineCompositor {
    config: TimelineConfig,
    theme: Theme,
    width: f64,
    max_time_range: TimeRange,
    view_time_range: TimeRange,
    scale: Option<TimeScale>,
    ticks: Vec<TimeTick>,
    violations: Vec<ConstraintViolation>,
    scheduler: DrawScheduler,
    axis: RenderList,
}

impl TimelineCompositor {
    /// Create a compositor spanning `max_time_range`, fully zoomed out.
    pub fn new(config: TimelineConfig, theme: Theme, max_time_range: TimeRange) -> Self {
        Self {
            config,
            theme,
            width: 0.0,
            max_time_range,
            view_time_range: max_time_range,
            scale: None,
            ticks: Vec::new(),
            violations: Vec::new(),
            scheduler: DrawScheduler::default(),
            axis: RenderList::new(),
        }
    }

    /// Layout tunables.
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Colors.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Container width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Plan bounds.
    pub fn max_time_range(&self) -> TimeRange {
        self.max_time_range
    }

    /// Current zoom/pan window.
    pub fn view_time_range(&self) -> TimeRange {
        self.view_time_range
    }

    /// Shared scale, once the container has a width.
    pub fn scale(&self) -> Option<&TimeScale> {
        self.scale.as_ref()
    }

    /// Ticks of the current scale.
    pub fn ticks(&self) -> &[TimeTick] {
        &self.ticks
    }

    /// Time-axis drawing of the last pass.
    pub fn axis(&self) -> &RenderList {
        &self.axis
    }

    /// Container resized.
    pub fn resize(&mut self, width: f64) {
        if width == self.width {
            return;
        }
        self.width = width.max(0.0);
        self.recompute();
        self.scheduler.request_resize();
    }

    /// Replace the plan bounds; the view is pulled back inside them.
    pub fn set_max_time_range(&mut self, range: TimeRange) {
        self.max_time_range = range;
        self.view_time_range = self.view_time_range.fit_within(range);
        self.recompute();
        self.scheduler.request_redraw();
    }

    /// Replace the view window, kept inside the plan bounds.
    pub fn set_view_time_range(&mut self, range: TimeRange) {
        let view = range.fit_within(self.max_time_range);
        if view == self.view_time_range {
            return;
        }
        self.view_time_range = view;
        self.recompute();
        self.scheduler.request_redraw();
    }

    /// Replace the constraint violations.
    pub fn set_violations(&mut self, violations: Vec<ConstraintViolation>) {
        self.violations = violations;
        self.scheduler.request_redraw();
    }

    /// Violations with a window covering `time`.
    pub fn violations_at(&self, time: f64) -> Vec<&ConstraintViolation> {
        self.violations
            .iter()
            .filter(|violation| violation.windows.iter().any(|window| window.contains(time)))
            .collect()
    }

    /// Every violation window clipped to the view.
    pub fn visible_violation_windows(&self) -> Vec<TimeRange> {
        self.violations
            .iter()
            .flat_map(|violation| violation.windows.iter())
            .filter_map(|window| window.intersect(self.view_time_range))
            .collect()
    }

    /// Ask for a redraw, e.g. after row data changed.
    pub fn request_redraw(&mut self) {
        self.scheduler.request_redraw();
    }

    /// Take the pending coalesced pass.
    pub fn take_draw_request(&mut self) -> Option<DrawRequest> {
        self.scheduler.take()
    }

    /// View window zoomed around `center` (epoch ms) by `factor`, clamped to
    /// the plan bounds.
    pub fn zoom_request(&self, center: f64, factor: f64) -> TimeRange {
        let factor = if factor > 0.0 { factor } else { 1.0 };
        let center = self.view_time_range.clamp(center);
        self.view_time_range
            .zoomed(center, factor)
            .fit_within(self.max_time_range)
    }

    /// One zoom-in step around the view center.
    pub fn zoom_in_request(&self) -> TimeRange {
        self.zoom_request(self.view_time_range.center(), self.config.zoom_step)
    }

    /// One zoom-out step around the view center.
    pub fn zoom_out_request(&self) -> TimeRange {
        let step = if self.config.zoom_step > 0.0 {
            1.0 / self.config.zoom_step
        } else {
            1.0
        };
        self.zoom_request(self.view_time_range.center(), step)
    }

    /// View window shifted by a pixel delta, clamped to the plan bounds.
    pub fn pan_request(&self, delta_px: f64) -> TimeRange {
        let delta = match &self.scale {
            Some(scale) => delta_px / scale.pixels_per_ms(),
            None => 0.0,
        };
        self.view_time_range
            .shifted(-delta)
            .fit_within(self.max_time_range)
    }

    /// View window selected by a horizontal brush between two pixels.
    ///
    /// Brushes narrower than two pixels are ignored.
    pub fn brush_request(&self, from_px: f64, to_px: f64) -> Option<TimeRange> {
        let scale = self.scale.as_ref()?;
        if (to_px - from_px).abs() < 2.0 {
            return None;
        }
        let range = TimeRange::new(scale.invert(from_px), scale.invert(to_px));
        range.intersect(self.max_time_range)
    }

    fn recompute(&mut self) {
        self.scale = TimeScale::new(self.view_time_range, self.width);
        self.ticks = match &self.scale {
            Some(scale) => time_ticks(scale, self.config.tick_min_spacing_px),
            None => Vec::new(),
        };
        tracing::trace!(
            width = self.width,
            start = self.view_time_range.start,
            end = self.view_time_range.end,
            ticks = self.ticks.len(),
            "time scale recomputed"
        );
    }

    /// Draw the time axis: a baseline, tick marks, and date and time labels.
    pub fn draw_axis(&mut self) {
        self.axis.clear();
        let size = self.config.tick_font_size;
        let height = size * 3.0;
        let width_px = self.width.ceil() as u32;
        if self.scale.is_none() || self.axis.resize(width_px, height.ceil() as u32).is_err() {
            return;
        }
        let stroke = LineStyle {
            color: self.theme.axis,
            width: 1.0,
        };
        let text = TextStyle {
            color: self.theme.tick_label,
            size,
            align: TextAlign::Center,
        };
        self.axis.fill_rect(
            ScreenRect::from_xywh(0.0, 0.0, self.width, height),
            self.theme.background,
        );
        self.axis
            .line(ScreenPoint::new(0.0, height), ScreenPoint::new(self.width, height), stroke);
        for tick in &self.ticks {
            self.axis.line(
                ScreenPoint::new(tick.x, height - 4.0),
                ScreenPoint::new(tick.x, height),
                stroke,
            );
            self.axis
                .fill_text(ScreenPoint::new(tick.x, size * 0.75), &tick.date, &text);
            self.axis
                .fill_text(ScreenPoint::new(tick.x, size * 1.9), &tick.time_of_day, &text);
        }
    }
}
