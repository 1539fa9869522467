//! Pointer interaction for one row.
//!
//! Raw pointer and drop events come in together with the row's hit tester;
//! semantic [`TimelineEvent`]s come out. The controller never mutates points:
//! drags are reported as provisional and committed values for the host.

use crate::event::{DragPayload, TimelineEvent};
use crate::geom::ScreenPoint;
use crate::model::{Point, PointKindTag, Row};
use crate::scale::TimeScale;
use crate::view::TimeRange;

/// Address of a drawn point: layer index and point index within the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointRef {
    /// Layer index within the row.
    pub layer: usize,
    /// Point index within the layer.
    pub index: usize,
}

impl PointRef {
    /// Resolve the point in a row snapshot.
    pub fn resolve<'a>(&self, row: &'a Row) -> Option<&'a Point> {
        row.layers.get(self.layer)?.points.get(self.index)
    }
}

/// Resolves pixels of a row's last draw pass to points.
pub trait HitTester {
    /// Topmost point drawn at `position`.
    fn pick(&self, position: ScreenPoint) -> Option<PointRef>;

    /// Every point under `position`, within `tolerance` for point-like layers.
    fn hovered(&self, position: ScreenPoint, tolerance: f64) -> Vec<PointRef>;

    /// Start time a point is currently drawn at.
    fn drawn_start(&self, point: &Point) -> f64 {
        point.x
    }
}

/// Inputs shared by every pointer event of a row.
pub struct PointerContext<'a, H: ?Sized> {
    /// Host snapshot of the row.
    pub row: &'a Row,
    /// Hit tester of the row's last draw pass.
    pub hits: &'a H,
    /// Shared time scale.
    pub time: &'a TimeScale,
    /// Plan bounds drags are clamped to.
    pub max_time_range: TimeRange,
    /// Hover radius for point-like layers.
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Drag {
    point: Point,
    offset_px: f64,
    original: f64,
    last: f64,
}

/// Interaction state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    /// Nothing under the cursor.
    #[default]
    Idle,
    /// The cursor is over one or more points.
    Hovering(Vec<PointRef>),
    /// A root activity is being dragged.
    Dragging {
        /// Dragged point id.
        id: String,
        /// Last emitted start time.
        candidate: f64,
    },
}

/// Row-level pointer state machine.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    hovered: Vec<PointRef>,
    drag: Option<Drag>,
}

impl InteractionController {
    /// Create an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> InteractionState {
        if let Some(drag) = &self.drag {
            InteractionState::Dragging {
                id: drag.point.id.clone(),
                candidate: drag.last,
            }
        } else if self.hovered.is_empty() {
            InteractionState::Idle
        } else {
            InteractionState::Hovering(self.hovered.clone())
        }
    }

    /// Check whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer moved over the row.
    pub fn pointer_move<H: HitTester + ?Sized>(
        &mut self,
        position: ScreenPoint,
        ctx: &PointerContext<'_, H>,
    ) -> Vec<TimelineEvent> {
        if self.drag.is_some() {
            return self.drag_to(position, ctx).into_iter().collect();
        }
        let hovered = ctx.hits.hovered(position, ctx.tolerance);
        self.set_hovered(hovered, ctx.row).into_iter().collect()
    }

    /// Pointer pressed over the row.
    ///
    /// Any pickable point is selected; root activities also start a drag.
    pub fn pointer_down<H: HitTester + ?Sized>(
        &mut self,
        position: ScreenPoint,
        ctx: &PointerContext<'_, H>,
    ) -> Vec<TimelineEvent> {
        let Some(point) = ctx.hits.pick(position).and_then(|hit| hit.resolve(ctx.row)) else {
            return Vec::new();
        };
        let events = vec![TimelineEvent::Selected {
            row_id: ctx.row.id.clone(),
            id: point.id.clone(),
            kind: point.kind_tag(),
        }];
        if point.is_root_activity() {
            let start = ctx.hits.drawn_start(point);
            let offset_px = position.x - ctx.time.forward(start);
            tracing::debug!(row = %ctx.row.id, id = %point.id, offset_px, "drag started");
            self.drag = Some(Drag {
                point: point.clone(),
                offset_px,
                original: start,
                last: start,
            });
        }
        events
    }

    /// Pointer released.
    ///
    /// Commits once when the final time differs from the original.
    pub fn pointer_up<H: HitTester + ?Sized>(
        &mut self,
        position: ScreenPoint,
        ctx: &PointerContext<'_, H>,
    ) -> Vec<TimelineEvent> {
        if self.drag.is_none() {
            return Vec::new();
        }
        let mut events: Vec<TimelineEvent> = self.drag_to(position, ctx).into_iter().collect();
        if let Some(drag) = self.drag.take() {
            if drag.last != drag.original {
                tracing::debug!(
                    row = %ctx.row.id,
                    id = %drag.point.id,
                    x = drag.last,
                    "drag committed"
                );
                events.push(TimelineEvent::Committed {
                    row_id: ctx.row.id.clone(),
                    id: drag.point.id.clone(),
                    kind: drag.point.kind_tag(),
                    value: moved(&drag.point, drag.last),
                });
            }
        }
        events
    }

    /// Pointer left the row. Clears hover; an active drag continues.
    pub fn pointer_leave(&mut self, row: &Row) -> Vec<TimelineEvent> {
        self.set_hovered(Vec::new(), row).into_iter().collect()
    }

    /// Abort the active drag without committing.
    ///
    /// When the point was moved, one update restores its original time.
    pub fn cancel_drag(&mut self, row: &Row) -> Vec<TimelineEvent> {
        let Some(drag) = self.drag.take() else {
            return Vec::new();
        };
        tracing::debug!(row = %row.id, id = %drag.point.id, "drag cancelled");
        if drag.last == drag.original {
            return Vec::new();
        }
        vec![TimelineEvent::Updated {
            row_id: row.id.clone(),
            id: drag.point.id.clone(),
            kind: drag.point.kind_tag(),
            value: moved(&drag.point, drag.original),
        }]
    }

    /// Whether an external drag over the row would be accepted.
    pub fn drag_over(&self, row: &Row) -> bool {
        row.hosts_activities()
    }

    /// External payload dropped at `position`.
    pub fn drop_payload<H: HitTester + ?Sized>(
        &mut self,
        position: ScreenPoint,
        payload: DragPayload,
        ctx: &PointerContext<'_, H>,
    ) -> Option<TimelineEvent> {
        if !self.drag_over(ctx.row) {
            tracing::debug!(row = %ctx.row.id, "drop rejected, row hosts no activities");
            return None;
        }
        let at_time = ctx.max_time_range.clamp(ctx.time.invert(position.x).round());
        Some(TimelineEvent::Created {
            row_id: ctx.row.id.clone(),
            kind: PointKindTag::Activity,
            at_time,
            payload,
        })
    }

    fn drag_to<H: HitTester + ?Sized>(
        &mut self,
        position: ScreenPoint,
        ctx: &PointerContext<'_, H>,
    ) -> Option<TimelineEvent> {
        let drag = self.drag.as_mut()?;
        let candidate = ctx.time.invert(position.x - drag.offset_px).round();
        let candidate = ctx.max_time_range.clamp(candidate);
        if !candidate.is_finite() || candidate == drag.last {
            return None;
        }
        drag.last = candidate;
        Some(TimelineEvent::Updated {
            row_id: ctx.row.id.clone(),
            id: drag.point.id.clone(),
            kind: drag.point.kind_tag(),
            value: moved(&drag.point, candidate),
        })
    }

    fn set_hovered(&mut self, hovered: Vec<PointRef>, row: &Row) -> Option<TimelineEvent> {
        if hovered == self.hovered {
            return None;
        }
        let points = hovered
            .iter()
            .filter_map(|hit| hit.resolve(row))
            .cloned()
            .collect();
        self.hovered = hovered;
        Some(TimelineEvent::HoverChanged {
            row_id: row.id.clone(),
            points,
        })
    }
}

fn moved(point: &Point, x: f64) -> Point {
    Point {
        x,
        ..point.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Layer;

    /// Hit tester over fixed pixel spans of layer 0, one per point.
    struct Spans(Vec<(f64, f64)>);

    impl HitTester for Spans {
        fn pick(&self, position: ScreenPoint) -> Option<PointRef> {
            self.0
                .iter()
                .rposition(|(start, end)| position.x >= *start && position.x < *end)
                .map(|index| PointRef { layer: 0, index })
        }

        fn hovered(&self, position: ScreenPoint, _tolerance: f64) -> Vec<PointRef> {
            self.pick(position).into_iter().collect()
        }
    }

    fn row() -> Row {
        Row::new("row", 50.0).with_layer(Layer::activities(
            "acts",
            vec![
                Point::activity("root", 1000.0, 500.0),
                Point::activity("child", 1000.0, 100.0).with_parent("root"),
            ],
        ))
    }

    struct Harness {
        row: Row,
        hits: Spans,
        time: TimeScale,
    }

    impl Harness {
        /// 10 ms per pixel: the root spans pixels 100..150, the child 300..310.
        fn new() -> Self {
            Self {
                row: row(),
                hits: Spans(vec![(100.0, 150.0), (300.0, 310.0)]),
                time: TimeScale::new(TimeRange::new(0.0, 10_000.0), 1000.0).expect("scale"),
            }
        }

        fn ctx(&self) -> PointerContext<'_, Spans> {
            PointerContext {
                row: &self.row,
                hits: &self.hits,
                time: &self.time,
                max_time_range: TimeRange::new(0.0, 10_000.0),
                tolerance: 4.0,
            }
        }
    }

    fn at(x: f64) -> ScreenPoint {
        ScreenPoint::new(x, 10.0)
    }

    fn committed(events: &[TimelineEvent]) -> Vec<&Point> {
        events
            .iter()
            .filter_map(|event| match event {
                TimelineEvent::Committed { value, .. } => Some(value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn drag_commits_once_with_the_new_time() {
        let harness = Harness::new();
        let mut controller = InteractionController::new();
        let mut events = controller.pointer_down(at(105.0), &harness.ctx());
        assert!(matches!(events[0], TimelineEvent::Selected { .. }));
        assert!(controller.is_dragging());

        events.extend(controller.pointer_move(at(155.0), &harness.ctx()));
        events.extend(controller.pointer_move(at(155.0), &harness.ctx()));
        events.extend(controller.pointer_move(at(205.0), &harness.ctx()));
        events.extend(controller.pointer_up(at(205.0), &harness.ctx()));

        let updates = events
            .iter()
            .filter(|event| matches!(event, TimelineEvent::Updated { .. }))
            .count();
        assert_eq!(updates, 2);
        let commits = committed(&events);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].x, 2000.0);
        assert_eq!(controller.state(), InteractionState::Idle);
    }

    #[test]
    fn release_without_net_change_commits_nothing() {
        let harness = Harness::new();
        let mut controller = InteractionController::new();
        controller.pointer_down(at(120.0), &harness.ctx());
        controller.pointer_move(at(170.0), &harness.ctx());
        let events = controller.pointer_up(at(120.0), &harness.ctx());
        assert!(committed(&events).is_empty());
        assert!(!controller.is_dragging());
    }

    #[test]
    fn drag_is_clamped_to_the_plan_bounds() {
        let harness = Harness::new();
        let mut controller = InteractionController::new();
        controller.pointer_down(at(100.0), &harness.ctx());
        let events = controller.pointer_up(at(-400.0), &harness.ctx());
        assert_eq!(committed(&events)[0].x, 0.0);
    }

    #[test]
    fn children_are_selected_but_not_dragged() {
        let harness = Harness::new();
        let mut controller = InteractionController::new();
        let events = controller.pointer_down(at(305.0), &harness.ctx());
        assert!(matches!(
            &events[0],
            TimelineEvent::Selected { id, .. } if id == "child"
        ));
        assert!(!controller.is_dragging());
        assert!(controller.pointer_up(at(400.0), &harness.ctx()).is_empty());
    }

    #[test]
    fn cancel_restores_the_original_time_without_commit() {
        let harness = Harness::new();
        let mut controller = InteractionController::new();
        controller.pointer_down(at(100.0), &harness.ctx());
        controller.pointer_move(at(300.0), &harness.ctx());
        let events = controller.cancel_drag(&harness.row);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            TimelineEvent::Updated { value, .. } if value.x == 1000.0
        ));
        assert!(controller.pointer_up(at(300.0), &harness.ctx()).is_empty());
    }

    #[test]
    fn hover_fires_only_when_the_set_changes() {
        let harness = Harness::new();
        let mut controller = InteractionController::new();
        assert_eq!(controller.pointer_move(at(110.0), &harness.ctx()).len(), 1);
        assert!(controller.pointer_move(at(120.0), &harness.ctx()).is_empty());
        assert!(matches!(controller.state(), InteractionState::Hovering(_)));

        let events = controller.pointer_move(at(600.0), &harness.ctx());
        assert!(matches!(
            &events[0],
            TimelineEvent::HoverChanged { points, .. } if points.is_empty()
        ));
        assert!(controller.pointer_leave(&harness.row).is_empty());
    }

    #[test]
    fn drops_create_only_on_activity_rows() {
        let harness = Harness::new();
        let mut controller = InteractionController::new();
        let created = controller
            .drop_payload(at(250.0), DragPayload::new("Bake"), &harness.ctx())
            .expect("created");
        assert!(matches!(created, TimelineEvent::Created { at_time, .. } if at_time == 2500.0));

        let mut harness = harness;
        harness.row = Row::new("empty", 50.0);
        assert!(!controller.drag_over(&harness.row));
        assert!(
            controller
                .drop_payload(at(250.0), DragPayload::new("Bake"), &harness.ctx())
                .is_none()
        );
    }
}
