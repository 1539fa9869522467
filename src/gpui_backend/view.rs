use std::sync::{Arc, RwLock};

use gpui::prelude::*;
use gpui::{
    MouseButton, MouseDownEvent, MouseMoveEvent, MouseUpEvent, Pixels, Point, ScrollWheelEvent,
    Window, canvas, div, px,
};

use crate::event::DragPayload;
use crate::geom::ScreenPoint;
use crate::render::Canvas;
use crate::timeline::Timeline;

use super::config::TimelineViewConfig;
use super::paint::{paint_frame, to_hsla};
use super::state::{RowSlot, TimelineFrame, TimelineUiState};
use super::text::GpuiTextMeasurer;

/// A GPUI view that paints a [`Timeline`] and routes gestures to it.
///
/// Left-button presses, moves and releases go to the row under the cursor
/// (the pressed row keeps receiving them until release), right-button drags
/// brush a new view window, and the scroll wheel zooms or pans. Events are
/// queued on the timeline; drain them through a [`TimelineHandle`].
#[derive(Clone)]
pub struct GpuiTimelineView {
    timeline: Arc<RwLock<Timeline>>,
    state: Arc<RwLock<TimelineUiState>>,
    config: TimelineViewConfig,
}

impl GpuiTimelineView {
    /// Create a new GPUI timeline view.
    ///
    /// Uses the default [`TimelineViewConfig`].
    pub fn new(timeline: Timeline) -> Self {
        Self::with_config(timeline, TimelineViewConfig::default())
    }

    /// Create a new GPUI timeline view with a custom configuration.
    pub fn with_config(timeline: Timeline, config: TimelineViewConfig) -> Self {
        Self {
            timeline: Arc::new(RwLock::new(timeline)),
            state: Arc::new(RwLock::new(TimelineUiState::default())),
            config,
        }
    }

    /// Get a handle for mutating the underlying timeline.
    pub fn timeline_handle(&self) -> TimelineHandle {
        TimelineHandle {
            timeline: Arc::clone(&self.timeline),
        }
    }

    /// Forward an external drop at a window position to the row under it.
    pub fn drop_payload(&self, position: Point<Pixels>, payload: DragPayload) {
        let Ok(state) = self.state.read() else {
            return;
        };
        let local = state.to_local(screen_point(position));
        let Some(slot) = state.row_at(local) else {
            return;
        };
        if let Ok(mut timeline) = self.timeline.write() {
            log_routing(timeline.drop_payload(&slot.id, slot.local(local), payload));
        }
    }

    fn on_mouse_down(&mut self, ev: &MouseDownEvent, cx: &mut Context<Self>) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        let local = state.to_local(screen_point(ev.position));
        state.last_cursor = Some(local);

        match ev.button {
            MouseButton::Left => {
                let Some(slot) = state.row_at(local).cloned() else {
                    return;
                };
                if let Ok(mut timeline) = self.timeline.write() {
                    log_routing(timeline.pointer_down(&slot.id, slot.local(local)));
                }
                state.captured = Some(slot.id);
            }
            MouseButton::Right => {
                state.brush_start = Some(local.x);
            }
            _ => return,
        }
        cx.notify();
    }

    fn on_mouse_move(&mut self, ev: &MouseMoveEvent, cx: &mut Context<Self>) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        let local = state.to_local(screen_point(ev.position));
        state.last_cursor = Some(local);
        let Ok(mut timeline) = self.timeline.write() else {
            return;
        };

        if let Some(slot) = state.captured.as_deref().and_then(|id| state.row(id)) {
            log_routing(timeline.pointer_move(&slot.id, slot.local(local)));
            cx.notify();
            return;
        }

        let slot = state.row_at(local).cloned();
        let next = slot.as_ref().map(|slot| slot.id.clone());
        if state.hovered != next {
            if let Some(previous) = state.hovered.take() {
                log_routing(timeline.pointer_leave(&previous));
            }
            state.hovered = next;
        }
        if let Some(slot) = slot {
            log_routing(timeline.pointer_move(&slot.id, slot.local(local)));
        }
        cx.notify();
    }

    fn on_mouse_up(&mut self, ev: &MouseUpEvent, cx: &mut Context<Self>) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        let local = state.to_local(screen_point(ev.position));
        let Ok(mut timeline) = self.timeline.write() else {
            return;
        };

        match ev.button {
            MouseButton::Left => {
                if let Some(id) = state.captured.take() {
                    if let Some(slot) = state.row(&id) {
                        log_routing(timeline.pointer_up(&id, slot.local(local)));
                    }
                }
            }
            MouseButton::Right => {
                if let Some(start) = state.brush_start.take() {
                    if (local.x - start).abs() >= self.config.brush_threshold_px {
                        timeline.brush(start, local.x);
                    }
                }
            }
            _ => return,
        }
        cx.notify();
    }

    fn on_scroll(&mut self, ev: &ScrollWheelEvent, cx: &mut Context<Self>) {
        let delta = ev.delta.pixel_delta(px(self.config.scroll_line_height));
        let (dx, dy) = (f32::from(delta.x), f32::from(delta.y));
        let threshold = self.config.scroll_threshold_px;
        let Ok(mut timeline) = self.timeline.write() else {
            return;
        };
        if dx.abs() > dy.abs() && dx.abs() >= threshold {
            timeline.pan(f64::from(dx));
        } else if dy >= threshold {
            timeline.zoom_in();
        } else if dy <= -threshold {
            timeline.zoom_out();
        } else {
            return;
        }
        cx.notify();
    }
}

impl Render for GpuiTimelineView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let background = self
            .timeline
            .read()
            .map(|timeline| timeline.compositor().theme().background)
            .unwrap_or(crate::render::Color::WHITE);
        let prepaint_timeline = Arc::clone(&self.timeline);
        let paint_timeline = Arc::clone(&self.timeline);
        let state = Arc::clone(&self.state);
        let row_gap = self.config.row_gap;

        div()
            .size_full()
            .bg(to_hsla(background))
            .child(
                canvas(
                    move |bounds, window, _| {
                        let (Ok(mut timeline), Ok(mut state)) =
                            (prepaint_timeline.write(), state.write())
                        else {
                            return TimelineFrame::default();
                        };
                        if !state.measurer_installed {
                            timeline.set_measurer(GpuiTextMeasurer::new(window));
                            state.measurer_installed = true;
                        }
                        timeline.resize(f64::from(f32::from(bounds.size.width)));
                        timeline.flush();
                        state.frame = layout_frame(&timeline, screen_point(bounds.origin), row_gap);
                        state.frame.clone()
                    },
                    move |_, frame, window, cx| {
                        if let Ok(timeline) = paint_timeline.read() {
                            paint_frame(&timeline, &frame, window, cx);
                        }
                    },
                )
                .size_full(),
            )
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_down(ev, cx);
                }),
            )
            .on_mouse_down(
                MouseButton::Right,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_down(ev, cx);
                }),
            )
            .on_mouse_move(cx.listener(|this, ev, _, cx| {
                this.on_mouse_move(ev, cx);
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_up(ev, cx);
                }),
            )
            .on_mouse_up(
                MouseButton::Right,
                cx.listener(|this, ev, _, cx| {
                    this.on_mouse_up(ev, cx);
                }),
            )
            .on_scroll_wheel(cx.listener(|this, ev, _, cx| {
                this.on_scroll(ev, cx);
            }))
    }
}

/// A handle for mutating a [`Timeline`] held inside a `GpuiTimelineView`.
///
/// The handle clones cheaply.
#[derive(Clone)]
pub struct TimelineHandle {
    timeline: Arc<RwLock<Timeline>>,
}

impl TimelineHandle {
    /// Read the timeline state.
    ///
    /// Returns `None` if the lock is poisoned.
    pub fn read<R>(&self, f: impl FnOnce(&Timeline) -> R) -> Option<R> {
        let timeline = self.timeline.read().ok()?;
        Some(f(&timeline))
    }

    /// Mutate the timeline state, e.g. to push rows or drain events.
    ///
    /// Returns `None` if the lock is poisoned.
    pub fn write<R>(&self, f: impl FnOnce(&mut Timeline) -> R) -> Option<R> {
        let mut timeline = self.timeline.write().ok()?;
        Some(f(&mut timeline))
    }
}

fn layout_frame(timeline: &Timeline, origin: ScreenPoint, row_gap: f64) -> TimelineFrame {
    let (_, axis_height) = timeline.compositor().axis().size();
    let axis_height = f64::from(axis_height);
    let mut top = axis_height;
    let rows = timeline
        .rows()
        .map(|row| {
            let drawn = timeline
                .renderer(&row.id)
                .map(|renderer| renderer.height())
                .unwrap_or(0.0);
            let height = if drawn > 0.0 { drawn } else { row.height };
            let slot = RowSlot {
                id: row.id.clone(),
                top,
                height,
            };
            top += height + row_gap;
            slot
        })
        .collect();
    TimelineFrame {
        origin,
        axis_height,
        rows,
    }
}

fn log_routing(result: crate::error::Result<()>) {
    if let Err(err) = result {
        tracing::debug!(error = %err, "pointer event not routed");
    }
}

fn screen_point(point: Point<Pixels>) -> ScreenPoint {
    ScreenPoint::new(
        f64::from(f32::from(point.x)),
        f64::from(f32::from(point.y)),
    )
}
