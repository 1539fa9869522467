//! One timeline row: its layers' canvas pairs, spatial indexes and overlays.
//!
//! A draw pass runs to completion before anything else touches the row:
//! clear, lay out and pack, grow the row if needed, draw every layer's visible
//! and hidden canvas, then rebuild the layer indexes from the drawn geometry.

use std::collections::HashMap;

use crate::axis::{AxisFormatter, TimeTick, value_ticks};
use crate::config::TimelineConfig;
use crate::error::Result;
use crate::geom::{ScreenPoint, ScreenRect};
use crate::guides::{GuideChanges, GuideTracker};
use crate::interaction::{HitTester, PointRef};
use crate::layers::{ActivityLayout, HitMode, LayerContext, draw_layer, layout_activities};
use crate::model::{Layer, LayerStyle, Point, Row};
use crate::picking::PickingSurface;
use crate::render::{Canvas, LineStyle, RenderList, TextAlign, TextMeasurer, TextStyle};
use crate::scale::{TimeScale, ValueScale};
use crate::spatial::SpatialIndex;
use crate::style::Theme;
use crate::view::TimeRange;

/// Horizontal space reserved per value axis at the left edge.
const VALUE_AXIS_WIDTH: f64 = 40.0;
/// Length of value-axis tick marks.
const TICK_LENGTH: f64 = 4.0;

/// Shared inputs of a row draw pass, prepared by the compositor.
pub struct DrawContext<'a> {
    /// Shared time scale.
    pub time: &'a TimeScale,
    /// Layout tunables.
    pub config: &'a TimelineConfig,
    /// Colors.
    pub theme: &'a Theme,
    /// Label measurement.
    pub measurer: &'a dyn TextMeasurer,
    /// Time ticks, drawn as grid lines.
    pub ticks: &'a [TimeTick],
    /// Constraint violation windows already clipped to the view.
    pub violations: &'a [TimeRange],
    /// Value tick formatters keyed by axis id.
    pub formatters: &'a HashMap<String, AxisFormatter>,
}

/// Result of one row draw pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDrawOutcome {
    /// Drawing height used for the pass.
    pub height: f64,
    /// True when the row grew past its requested height, or shrank back to it,
    /// and the host must be told.
    pub resized: bool,
    /// Guides reconciled during the pass.
    pub guides: GuideChanges,
}

struct LayerSlot<V> {
    id: String,
    hit_mode: HitMode,
    surface: PickingSurface<V>,
    index: SpatialIndex,
    layout: Option<ActivityLayout>,
}

impl<V: Canvas + Default> LayerSlot<V> {
    fn new(layer: &Layer) -> Self {
        Self {
            id: layer.id.clone(),
            hit_mode: HitMode::for_style(&layer.style),
            surface: PickingSurface::default(),
            index: SpatialIndex::default(),
            layout: None,
        }
    }
}

/// Renderer state owned by one row.
pub struct RowRenderer<V = RenderList> {
    row_id: String,
    slots: Vec<LayerSlot<V>>,
    underlay: RenderList,
    overlay: RenderList,
    guides: GuideTracker,
    overrides: HashMap<String, f64>,
    height: f64,
}

impl<V: Canvas + Default> RowRenderer<V> {
    /// Create a renderer for a row id.
    pub fn new(row_id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            slots: Vec::new(),
            underlay: RenderList::new(),
            overlay: RenderList::new(),
            guides: GuideTracker::default(),
            overrides: HashMap::new(),
            height: 0.0,
        }
    }

    /// Id of the rendered row.
    pub fn row_id(&self) -> &str {
        &self.row_id
    }

    /// Height used by the last draw pass.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Run one draw pass.
    ///
    /// Fails only when a drawing surface cannot be allocated; the row then
    /// shows nothing until the next successful pass.
    pub fn draw(&mut self, row: &Row, ctx: &DrawContext<'_>) -> Result<RowDrawOutcome> {
        let base = if row.height > 0.0 {
            row.height
        } else {
            ctx.config.default_row_height
        };

        let layouts: Vec<Option<ActivityLayout>> = {
            let layer_ctx = layer_context(ctx, &self.overrides, base);
            row.layers
                .iter()
                .map(|layer| match &layer.style {
                    LayerStyle::Activity(style) => {
                        Some(layout_activities(layer, style, &layer_ctx))
                    }
                    _ => None,
                })
                .collect()
        };
        let required = layouts
            .iter()
            .flatten()
            .map(ActivityLayout::height)
            .fold(0.0, f64::max);
        let height = base.max(required);
        let resized = height != self.height && (height > base || self.height > base);

        let width_px = ctx.time.width().ceil() as u32;
        let height_px = height.ceil() as u32;
        let extent = ScreenRect::from_xywh(0.0, 0.0, ctx.time.width(), height);

        let stale = self.slots.len() != row.layers.len()
            || self
                .slots
                .iter()
                .zip(&row.layers)
                .any(|(slot, layer)| slot.id != layer.id);
        if stale {
            self.slots = row.layers.iter().map(LayerSlot::new).collect();
        }

        let layer_ctx = layer_context(ctx, &self.overrides, height);
        for ((slot, layer), layout) in self.slots.iter_mut().zip(&row.layers).zip(layouts) {
            slot.surface.begin_pass(width_px, height_px)?;
            slot.hit_mode = HitMode::for_style(&layer.style);
            let drawing = draw_layer(layer, row, layout.as_ref(), &mut slot.surface, &layer_ctx);
            slot.index = SpatialIndex::build(drawing.entries, extent);
            slot.layout = layout;
        }

        self.underlay.resize(width_px, height_px)?;
        self.overlay.resize(width_px, height_px)?;
        self.draw_underlay(ctx, height);
        let guides = self.guides.sync(row);
        self.guides
            .draw(&mut self.overlay, row, ctx.time, height, ctx.theme, ctx.config.tick_font_size);
        draw_value_axes(&mut self.overlay, row, height, ctx);

        self.height = height;
        tracing::debug!(
            row = %row.id,
            layers = row.layers.len(),
            height,
            resized,
            "row drawn"
        );
        Ok(RowDrawOutcome {
            height,
            resized,
            guides,
        })
    }

    fn draw_underlay(&mut self, ctx: &DrawContext<'_>, height: f64) {
        let width = ctx.time.width();
        let canvas = &mut self.underlay;
        canvas.fill_rect(ScreenRect::from_xywh(0.0, 0.0, width, height), ctx.theme.background);
        let grid = LineStyle {
            color: ctx.theme.grid,
            width: 1.0,
        };
        for tick in ctx.ticks {
            canvas.line(ScreenPoint::new(tick.x, 0.0), ScreenPoint::new(tick.x, height), grid);
        }
        for window in ctx.violations {
            let left = ctx.time.forward(window.start);
            let right = ctx.time.forward(window.end);
            let rect = ScreenRect::from_xywh(left, 0.0, (right - left).max(1.0), height);
            canvas.fill_rect(rect, ctx.theme.violation);
        }
    }

    /// Set the optimistic start time of a dragged point.
    pub fn set_override(&mut self, id: impl Into<String>, x: f64) {
        self.overrides.insert(id.into(), x);
    }

    /// Drop every optimistic position, e.g. when the host pushes fresh data.
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// Optimistic start times keyed by point id.
    pub fn overrides(&self) -> &HashMap<String, f64> {
        &self.overrides
    }

    /// Canvas pair of a layer.
    pub fn layer_surface(&self, layer: usize) -> Option<&PickingSurface<V>> {
        self.slots.get(layer).map(|slot| &slot.surface)
    }

    /// Spatial index of a layer.
    pub fn layer_index(&self, layer: usize) -> Option<&SpatialIndex> {
        self.slots.get(layer).map(|slot| &slot.index)
    }

    /// Packed geometry of an activity layer.
    pub fn activity_layout(&self, layer: usize) -> Option<&ActivityLayout> {
        self.slots.get(layer).and_then(|slot| slot.layout.as_ref())
    }

    /// Background, grid lines and violation windows, drawn below the layers.
    pub fn underlay(&self) -> &RenderList {
        &self.underlay
    }

    /// Guides and value axes, drawn above the layers.
    pub fn overlay(&self) -> &RenderList {
        &self.overlay
    }
}

impl<V: Canvas + Default> HitTester for RowRenderer<V> {
    fn pick(&self, position: ScreenPoint) -> Option<PointRef> {
        self.slots.iter().enumerate().rev().find_map(|(layer, slot)| {
            slot.surface
                .pick(position)
                .map(|index| PointRef { layer, index })
        })
    }

    fn hovered(&self, position: ScreenPoint, tolerance: f64) -> Vec<PointRef> {
        let mut hits: Vec<PointRef> = Vec::new();
        for (layer, slot) in self.slots.iter().enumerate() {
            let entries = match slot.hit_mode {
                HitMode::Nearest => slot.index.nearest(position, tolerance).into_iter().collect(),
                HitMode::Containing => slot.index.containing(position),
            };
            for entry in entries {
                let hit = PointRef {
                    layer,
                    index: entry.target,
                };
                if !hits.contains(&hit) {
                    hits.push(hit);
                }
            }
        }
        hits
    }

    fn drawn_start(&self, point: &Point) -> f64 {
        self.overrides.get(&point.id).copied().unwrap_or(point.x)
    }
}

fn layer_context<'a>(
    ctx: &DrawContext<'a>,
    overrides: &'a HashMap<String, f64>,
    height: f64,
) -> LayerContext<'a> {
    LayerContext {
        time: ctx.time,
        config: ctx.config,
        theme: ctx.theme,
        measurer: ctx.measurer,
        height,
        overrides,
    }
}

/// Draw each computable value axis along the left edge.
fn draw_value_axes(canvas: &mut RenderList, row: &Row, height: f64, ctx: &DrawContext<'_>) {
    let fallback = AxisFormatter::Default;
    let mut slot = 0.0;
    for axis in &row.y_axes {
        let Some(scale) = ValueScale::from_axis_domain(&axis.scale_domain, height) else {
            tracing::trace!(row = %row.id, axis = %axis.id, "axis domain pending, skipping");
            continue;
        };
        let x = slot * VALUE_AXIS_WIDTH;
        slot += 1.0;
        let color = axis.color.unwrap_or(ctx.theme.axis);
        let stroke = LineStyle { color, width: 1.0 };
        let text = TextStyle {
            color: ctx.theme.tick_label,
            size: ctx.config.tick_font_size,
            align: TextAlign::Left,
        };
        canvas.line(ScreenPoint::new(x, 0.0), ScreenPoint::new(x, height), stroke);
        let formatter = ctx.formatters.get(&axis.id).unwrap_or(&fallback);
        for tick in value_ticks(&scale, axis.tick_count, formatter) {
            canvas.line(
                ScreenPoint::new(x, tick.y),
                ScreenPoint::new(x + TICK_LENGTH, tick.y),
                stroke,
            );
            canvas.fill_text(ScreenPoint::new(x + TICK_LENGTH + 2.0, tick.y), &tick.label, &text);
        }
        if !axis.label.is_empty() {
            let label = TextStyle {
                color,
                ..text.clone()
            };
            canvas.fill_text(
                ScreenPoint::new(x + TICK_LENGTH + 2.0, ctx.config.tick_font_size),
                &axis.label,
                &label,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimelineError;
    use crate::model::Axis;
    use crate::render::FixedWidthMeasurer;
    use crate::surface::PixelCanvas;

    struct Fixture {
        time: TimeScale,
        config: TimelineConfig,
        theme: Theme,
        measurer: FixedWidthMeasurer,
        formatters: HashMap<String, AxisFormatter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                time: TimeScale::new(TimeRange::new(0.0, 1000.0), 1000.0).expect("scale"),
                config: TimelineConfig::default(),
                theme: Theme::default(),
                measurer: FixedWidthMeasurer::default(),
                formatters: HashMap::new(),
            }
        }

        fn ctx(&self) -> DrawContext<'_> {
            DrawContext {
                time: &self.time,
                config: &self.config,
                theme: &self.theme,
                measurer: &self.measurer,
                ticks: &[],
                violations: &[],
                formatters: &self.formatters,
            }
        }
    }

    fn stacked_row(count: usize) -> Row {
        let points = (0..count)
            .map(|i| Point::activity(format!("a{i}"), i as f64 * 10.0, 500.0))
            .collect();
        Row::new("acts", 50.0).with_layer(Layer::activities("layer", points))
    }

    #[test]
    fn row_grows_to_fit_packed_lanes_once() {
        let fixture = Fixture::new();
        let row = stacked_row(4);
        let mut renderer: RowRenderer = RowRenderer::new("acts");

        let outcome = renderer.draw(&row, &fixture.ctx()).expect("draw");
        assert!(outcome.resized);
        assert_eq!(outcome.height, 4.0 * fixture.config.activity_row_height());

        let again = renderer.draw(&row, &fixture.ctx()).expect("draw");
        assert!(!again.resized);
        assert_eq!(renderer.height(), outcome.height);
    }

    #[test]
    fn every_drawn_point_picks_at_its_centroid() {
        let fixture = Fixture::new();
        let row = stacked_row(12);
        let mut renderer: RowRenderer<PixelCanvas> = RowRenderer::new("acts");
        renderer.draw(&row, &fixture.ctx()).expect("draw");

        let layout = renderer.activity_layout(0).expect("layout");
        assert_eq!(layout.bars().len(), 12);
        for bar in layout.bars() {
            let hit = renderer.pick(bar.rect.center()).expect("hit");
            assert_eq!(hit, PointRef { layer: 0, index: bar.index });
        }
        assert!(renderer.pick(ScreenPoint::new(999.0, 1.0)).is_none());
    }

    #[test]
    fn topmost_layer_wins_picks_while_hover_reports_all() {
        let fixture = Fixture::new();
        let row = Row::new("mixed", 60.0)
            .with_layer(Layer::xranges("states", vec![Point::xrange("s", 0.0, "ON")]))
            .with_layer(Layer::activities("acts", vec![Point::activity("a", 100.0, 100.0)]));
        let mut renderer: RowRenderer = RowRenderer::new("mixed");
        renderer.draw(&row, &fixture.ctx()).expect("draw");

        let position = ScreenPoint::new(150.0, 10.0);
        assert_eq!(renderer.pick(position), Some(PointRef { layer: 1, index: 0 }));
        let hovered = renderer.hovered(position, 4.0);
        assert_eq!(
            hovered,
            vec![PointRef { layer: 0, index: 0 }, PointRef { layer: 1, index: 0 }]
        );
        assert_eq!(
            renderer.pick(ScreenPoint::new(500.0, 10.0)),
            Some(PointRef { layer: 0, index: 0 })
        );
    }

    #[test]
    fn overrides_move_bars_and_drawn_start() {
        let fixture = Fixture::new();
        let row = stacked_row(1);
        let mut renderer: RowRenderer = RowRenderer::new("acts");
        renderer.set_override("a0", 400.0);
        renderer.draw(&row, &fixture.ctx()).expect("draw");
        let bar = &renderer.activity_layout(0).expect("layout").bars()[0];
        assert_eq!(bar.rect.min.x, 400.0);
        assert_eq!(renderer.drawn_start(&row.layers[0].points[0]), 400.0);

        renderer.clear_overrides();
        assert_eq!(renderer.drawn_start(&row.layers[0].points[0]), 0.0);
    }

    #[test]
    fn pending_axes_are_skipped_and_ready_axes_drawn() {
        let fixture = Fixture::new();
        let row = Row::new("res", 100.0)
            .with_axis(Axis::pending("later"))
            .with_axis(Axis::new("watts", 0.0, 100.0))
            .with_layer(Layer::line("power", "watts", vec![Point::line("p", 500.0, 50.0)]));
        let mut renderer: RowRenderer = RowRenderer::new("res");
        renderer.draw(&row, &fixture.ctx()).expect("draw");
        let labels: Vec<&str> = renderer.overlay().texts().collect();
        assert!(labels.contains(&"0"));
        assert!(labels.contains(&"100"));
        assert_eq!(
            renderer.hovered(ScreenPoint::new(502.0, 51.0), 4.0),
            vec![PointRef { layer: 0, index: 0 }]
        );
    }

    #[test]
    fn oversized_rows_fail_as_a_whole() {
        let fixture = Fixture::new();
        let row = Row::new("huge", 40_000.0).with_layer(Layer::activities("acts", Vec::new()));
        let mut renderer: RowRenderer = RowRenderer::new("huge");
        let err = renderer.draw(&row, &fixture.ctx()).unwrap_err();
        assert!(matches!(err, TimelineError::SurfaceUnavailable { .. }));
    }

    #[test]
    fn violations_and_grid_land_in_the_underlay() {
        let fixture = Fixture::new();
        let windows = [TimeRange::new(100.0, 200.0)];
        let ctx = DrawContext {
            violations: &windows,
            ..fixture.ctx()
        };
        let mut renderer: RowRenderer = RowRenderer::new("row");
        renderer.draw(&Row::new("row", 30.0), &ctx).expect("draw");
        let rects = renderer
            .underlay()
            .commands()
            .iter()
            .filter(|command| matches!(command, crate::render::RenderCommand::Rect { .. }))
            .count();
        assert_eq!(rects, 2);
    }
}
