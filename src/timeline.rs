//! Timeline entry points and builders.

use std::collections::HashMap;

use crate::axis::AxisFormatter;
use crate::compositor::TimelineCompositor;
use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::event::{DragPayload, TimelineEvent};
use crate::geom::ScreenPoint;
use crate::guides::GuideChanges;
use crate::interaction::{InteractionController, PointerContext};
use crate::model::{ConstraintViolation, Row};
use crate::render::{FixedWidthMeasurer, TextMeasurer};
use crate::row::{DrawContext, RowRenderer};
use crate::style::Theme;
use crate::view::TimeRange;

struct RowEntry {
    row: Row,
    renderer: RowRenderer,
    controller: InteractionController,
}

impl RowEntry {
    fn new(row: Row) -> Self {
        Self {
            renderer: RowRenderer::new(row.id.clone()),
            controller: InteractionController::new(),
            row,
        }
    }
}

/// A stack of rows sharing one time axis.
///
/// The timeline never mutates host data. Inputs arrive through setters and
/// pointer methods, drawing happens in [`Timeline::flush`], and everything the
/// host must act on is queued as a [`TimelineEvent`].
pub struct Timeline {
    compositor: TimelineCompositor,
    rows: Vec<RowEntry>,
    measurer: Box<dyn TextMeasurer>,
    formatters: HashMap<String, AxisFormatter>,
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Create a timeline over `max_time_range` with default configuration.
    pub fn new(max_time_range: TimeRange) -> Self {
        Self::builder(max_time_range).build()
    }

    /// Start building a timeline with custom configuration.
    pub fn builder(max_time_range: TimeRange) -> TimelineBuilder {
        TimelineBuilder::new(max_time_range)
    }

    /// Shared time-domain state.
    pub fn compositor(&self) -> &TimelineCompositor {
        &self.compositor
    }

    /// Host rows, in display order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().map(|entry| &entry.row)
    }

    /// Host snapshot of one row.
    pub fn row(&self, row_id: &str) -> Option<&Row> {
        self.entry(row_id).map(|entry| &entry.row)
    }

    /// Renderer state of one row.
    pub fn renderer(&self, row_id: &str) -> Option<&RowRenderer> {
        self.entry(row_id).map(|entry| &entry.renderer)
    }

    /// Interaction state of one row.
    pub fn controller(&self, row_id: &str) -> Option<&InteractionController> {
        self.entry(row_id).map(|entry| &entry.controller)
    }

    /// Replace the label measurer and redraw with it.
    pub fn set_measurer(&mut self, measurer: impl TextMeasurer + 'static) {
        self.measurer = Box::new(measurer);
        self.compositor.request_redraw();
    }

    /// Format the tick labels of every value axis with this id.
    pub fn set_axis_formatter(&mut self, axis_id: impl Into<String>, formatter: AxisFormatter) {
        self.formatters.insert(axis_id.into(), formatter);
        self.compositor.request_redraw();
    }

    /// Replace every row. Renderer state is kept for ids that survive.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        let mut previous = std::mem::take(&mut self.rows);
        self.rows = rows
            .into_iter()
            .map(|row| match previous.iter().position(|entry| entry.row.id == row.id) {
                Some(index) => {
                    let mut entry = previous.swap_remove(index);
                    entry.renderer.clear_overrides();
                    entry.row = row;
                    entry
                }
                None => RowEntry::new(row),
            })
            .collect();
        self.compositor.request_redraw();
    }

    /// Insert or replace one row.
    ///
    /// Fresh data supersedes any optimistic drag position drawn for the row.
    pub fn upsert_row(&mut self, row: Row) {
        match self.rows.iter_mut().find(|entry| entry.row.id == row.id) {
            Some(entry) => {
                entry.renderer.clear_overrides();
                entry.row = row;
            }
            None => self.rows.push(RowEntry::new(row)),
        }
        self.compositor.request_redraw();
    }

    /// Remove one row.
    pub fn remove_row(&mut self, row_id: &str) -> Result<Row> {
        let index = self.index_of(row_id)?;
        let entry = self.rows.remove(index);
        self.compositor.request_redraw();
        Ok(entry.row)
    }

    /// Replace the constraint violations.
    pub fn set_violations(&mut self, violations: Vec<ConstraintViolation>) {
        self.compositor.set_violations(violations);
    }

    /// Container resized.
    pub fn resize(&mut self, width: f64) {
        self.compositor.resize(width);
    }

    /// Replace the plan bounds.
    pub fn set_max_time_range(&mut self, range: TimeRange) {
        self.compositor.set_max_time_range(range);
    }

    /// Replace the view window.
    pub fn set_view_time_range(&mut self, range: TimeRange) {
        self.compositor.set_view_time_range(range);
    }

    /// Ask for a redraw on the next flush.
    pub fn request_redraw(&mut self) {
        self.compositor.request_redraw();
    }

    /// Run the pending draw pass, if any.
    ///
    /// Returns `true` when rows were drawn. Nothing is drawn until the
    /// container has a width.
    pub fn flush(&mut self) -> bool {
        if self.compositor.scale().is_none() {
            return false;
        }
        let Some(request) = self.compositor.take_draw_request() else {
            return false;
        };
        self.compositor.draw_axis();
        let violations = self.compositor.visible_violation_windows();
        let Some(time) = self.compositor.scale() else {
            return false;
        };
        let ctx = DrawContext {
            time,
            config: self.compositor.config(),
            theme: self.compositor.theme(),
            measurer: self.measurer.as_ref(),
            ticks: self.compositor.ticks(),
            violations: &violations,
            formatters: &self.formatters,
        };
        for entry in &mut self.rows {
            match entry.renderer.draw(&entry.row, &ctx) {
                Ok(outcome) => {
                    if outcome.resized {
                        self.events.push(TimelineEvent::RowResized {
                            row_id: entry.row.id.clone(),
                            new_height: outcome.height,
                        });
                    }
                    if !outcome.guides.is_empty() {
                        let GuideChanges {
                            added,
                            removed,
                            changed,
                        } = outcome.guides;
                        self.events.push(TimelineEvent::GuidesChanged {
                            row_id: entry.row.id.clone(),
                            added,
                            removed,
                            changed,
                        });
                    }
                }
                Err(err) => {
                    tracing::error!(row = %entry.row.id, error = %err, "row draw failed");
                    self.events.push(TimelineEvent::RowFailed {
                        row_id: entry.row.id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        tracing::debug!(?request, rows = self.rows.len(), "draw pass finished");
        true
    }

    /// Pointer moved over a row, in row-local pixels.
    pub fn pointer_move(&mut self, row_id: &str, position: ScreenPoint) -> Result<()> {
        self.route(row_id, |controller, ctx| controller.pointer_move(position, ctx))
    }

    /// Pointer pressed over a row.
    pub fn pointer_down(&mut self, row_id: &str, position: ScreenPoint) -> Result<()> {
        self.route(row_id, |controller, ctx| controller.pointer_down(position, ctx))
    }

    /// Pointer released over a row.
    pub fn pointer_up(&mut self, row_id: &str, position: ScreenPoint) -> Result<()> {
        self.route(row_id, |controller, ctx| controller.pointer_up(position, ctx))
    }

    /// Pointer left a row.
    pub fn pointer_leave(&mut self, row_id: &str) -> Result<()> {
        self.route(row_id, |controller, ctx| controller.pointer_leave(ctx.row))
    }

    /// Abort any drag in progress, on every row.
    pub fn cancel_drag(&mut self) {
        let ids: Vec<String> = self
            .rows
            .iter()
            .filter(|entry| entry.controller.is_dragging())
            .map(|entry| entry.row.id.clone())
            .collect();
        for id in ids {
            if let Err(err) = self.route(&id, |controller, ctx| controller.cancel_drag(ctx.row)) {
                tracing::debug!(row = %id, error = %err, "drag cancel not routed");
            }
        }
    }

    /// Whether an external drag over a row would be accepted.
    pub fn drag_over(&self, row_id: &str) -> Result<bool> {
        let entry = self
            .entry(row_id)
            .ok_or_else(|| TimelineError::UnknownRow(row_id.to_string()))?;
        Ok(entry.controller.drag_over(&entry.row))
    }

    /// External payload dropped onto a row.
    pub fn drop_payload(
        &mut self,
        row_id: &str,
        position: ScreenPoint,
        payload: DragPayload,
    ) -> Result<()> {
        self.route(row_id, |controller, ctx| {
            controller
                .drop_payload(position, payload, ctx)
                .into_iter()
                .collect()
        })
    }

    /// Ask the host to zoom in one step.
    pub fn zoom_in(&mut self) {
        let range = self.compositor.zoom_in_request();
        self.request_view(range);
    }

    /// Ask the host to zoom out one step.
    pub fn zoom_out(&mut self) {
        let range = self.compositor.zoom_out_request();
        self.request_view(range);
    }

    /// Ask the host to pan by a pixel delta.
    pub fn pan(&mut self, delta_px: f64) {
        let range = self.compositor.pan_request(delta_px);
        self.request_view(range);
    }

    /// Ask the host to show the window brushed between two pixels.
    pub fn brush(&mut self, from_px: f64, to_px: f64) {
        if let Some(range) = self.compositor.brush_request(from_px, to_px) {
            self.request_view(range);
        }
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        std::mem::take(&mut self.events)
    }

    fn request_view(&mut self, range: TimeRange) {
        if range != self.compositor.view_time_range() {
            self.events.push(TimelineEvent::ViewTimeRangeRequested(range));
        }
    }

    fn entry(&self, row_id: &str) -> Option<&RowEntry> {
        self.rows.iter().find(|entry| entry.row.id == row_id)
    }

    fn index_of(&self, row_id: &str) -> Result<usize> {
        self.rows
            .iter()
            .position(|entry| entry.row.id == row_id)
            .ok_or_else(|| TimelineError::UnknownRow(row_id.to_string()))
    }

    fn route<F>(&mut self, row_id: &str, handle: F) -> Result<()>
    where
        F: FnOnce(
            &mut InteractionController,
            &PointerContext<'_, RowRenderer>,
        ) -> Vec<TimelineEvent>,
    {
        let index = self.index_of(row_id)?;
        let Some(time) = self.compositor.scale() else {
            return Ok(());
        };
        let entry = &mut self.rows[index];
        let ctx = PointerContext {
            row: &entry.row,
            hits: &entry.renderer,
            time,
            max_time_range: self.compositor.max_time_range(),
            tolerance: self.compositor.config().hover_tolerance_px,
        };
        let events = handle(&mut entry.controller, &ctx);

        let mut moved = false;
        for event in &events {
            if let TimelineEvent::Updated { id, value, .. }
            | TimelineEvent::Committed { id, value, .. } = event
            {
                entry.renderer.set_override(id.clone(), value.x);
                moved = true;
            }
        }
        if moved {
            self.compositor.request_redraw();
        }
        self.events.extend(events);
        Ok(())
    }
}

/// Builder for configuring a timeline before construction.
pub struct TimelineBuilder {
    config: TimelineConfig,
    theme: Theme,
    max_time_range: TimeRange,
    view_time_range: Option<TimeRange>,
    width: f64,
    measurer: Box<dyn TextMeasurer>,
    formatters: HashMap<String, AxisFormatter>,
    rows: Vec<Row>,
}

impl TimelineBuilder {
    fn new(max_time_range: TimeRange) -> Self {
        Self {
            config: TimelineConfig::default(),
            theme: Theme::default(),
            max_time_range,
            view_time_range: None,
            width: 0.0,
            measurer: Box::new(FixedWidthMeasurer::default()),
            formatters: HashMap::new(),
            rows: Vec::new(),
        }
    }

    /// Set the layout tunables.
    pub fn config(mut self, config: TimelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the theme.
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set the initial view window.
    pub fn view_time_range(mut self, range: TimeRange) -> Self {
        self.view_time_range = Some(range);
        self
    }

    /// Set the initial container width.
    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Set the label measurer, typically backed by the presenting backend's text system.
    pub fn measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    /// Format the tick labels of value axes with this id.
    pub fn axis_formatter(mut self, axis_id: impl Into<String>, formatter: AxisFormatter) -> Self {
        self.formatters.insert(axis_id.into(), formatter);
        self
    }

    /// Add a row.
    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Build the timeline.
    pub fn build(self) -> Timeline {
        let mut compositor = TimelineCompositor::new(self.config, self.theme, self.max_time_range);
        if let Some(view) = self.view_time_range {
            compositor.set_view_time_range(view);
        }
        compositor.resize(self.width);
        compositor.request_redraw();
        Timeline {
            compositor,
            rows: self.rows.into_iter().map(RowEntry::new).collect(),
            measurer: self.measurer,
            formatters: self.formatters,
            events: Vec::new(),
        }
    }
}
