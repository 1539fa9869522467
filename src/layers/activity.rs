//! Activity bars with packed lanes, labels and decomposition children.

use std::collections::{HashMap, HashSet};

use crate::geom::{ScreenPoint, ScreenRect};
use crate::model::{ActivityStyle, Layer, Point};
use crate::packing::{PackItem, RowPacker};
use crate::picking::PickingSurface;
use crate::render::{Canvas, TextAlign, TextStyle};
use crate::spatial::IndexEntry;

use super::{LayerContext, LayerDrawing};

/// Label placed to the right of a bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarLabel {
    /// Label text.
    pub text: String,
    /// Measured label area, also the label's pick area.
    pub rect: ScreenRect,
}

/// One laid-out activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityBar {
    /// Index of the point in the layer.
    pub index: usize,
    /// Bar geometry.
    pub rect: ScreenRect,
    /// Nesting depth below its root.
    pub depth: usize,
    /// Label, when shown.
    pub label: Option<BarLabel>,
}

/// Packed geometry of an activity layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLayout {
    bars: Vec<ActivityBar>,
    height: f64,
}

/// Horizontal geometry resolved before packing.
struct Span {
    index: usize,
    x: f64,
    width: f64,
    label: Option<(String, f64, f64)>,
}

struct Forest<'a> {
    points: &'a [Point],
    children: HashMap<usize, Vec<usize>>,
    visited: HashSet<usize>,
    spans: Vec<Span>,
}

/// Clamp, size and pack every visible activity of a layer.
///
/// Children whose parent is missing are omitted with a warning. Cycles and
/// chains deeper than the configured limit are cut where detected.
pub fn layout_activities(
    layer: &Layer,
    style: &ActivityStyle,
    ctx: &LayerContext<'_>,
) -> ActivityLayout {
    let points = layer.points.as_slice();
    let ids: HashMap<&str, usize> = points
        .iter()
        .enumerate()
        .filter(|(_, point)| point.as_activity().is_some())
        .map(|(index, point)| (point.id.as_str(), index))
        .collect();

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    for (index, point) in points.iter().enumerate() {
        let Some(activity) = point.as_activity() else {
            continue;
        };
        for child in &activity.children {
            match ids.get(child.as_str()) {
                Some(child) => push_unique(children.entry(index).or_default(), *child),
                None => tracing::warn!(
                    layer = %layer.id,
                    parent = %point.id,
                    child = %child,
                    "activity lists a missing child"
                ),
            }
        }
        if let Some(parent) = activity.parent.as_deref() {
            match ids.get(parent) {
                Some(parent) => push_unique(children.entry(*parent).or_default(), index),
                None => tracing::warn!(
                    layer = %layer.id,
                    activity = %point.id,
                    parent = %parent,
                    "omitting activity with a missing parent"
                ),
            }
        }
    }

    let mut roots: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, point)| point.is_root_activity())
        .map(|(index, _)| index)
        .collect();
    roots.sort_by(|a, b| points[*a].x.total_cmp(&points[*b].x));

    let mut forest = Forest {
        points,
        children,
        visited: HashSet::new(),
        spans: Vec::new(),
    };
    let items: Vec<PackItem> = roots
        .into_iter()
        .filter_map(|root| {
            let point = &points[root];
            let delta = ctx.start_of(&point.id, point.x) - point.x;
            forest.build(root, 0, delta, style, ctx)
        })
        .collect();

    let config = ctx.config;
    let packing = RowPacker::new(config.activity_row_height()).pack(&items);
    let bars = packing
        .placements
        .iter()
        .map(|placement| {
            let span = &forest.spans[placement.key];
            let y = placement.y + config.activity_row_padding;
            let rect = ScreenRect::from_xywh(span.x, y, span.width, config.activity_height);
            let label = span.label.as_ref().map(|(text, width, height)| {
                let left = rect.max.x + config.label_gap;
                let middle = y + config.activity_height / 2.0;
                BarLabel {
                    text: text.clone(),
                    rect: ScreenRect::from_xywh(left, middle - height / 2.0, *width, *height),
                }
            });
            ActivityBar {
                index: span.index,
                rect,
                depth: placement.depth,
                label,
            }
        })
        .collect();

    ActivityLayout {
        bars,
        height: packing.height,
    }
}

fn push_unique(list: &mut Vec<usize>, index: usize) {
    if !list.contains(&index) {
        list.push(index);
    }
}

impl<'a> Forest<'a> {
    fn build(
        &mut self,
        index: usize,
        depth: usize,
        delta: f64,
        style: &ActivityStyle,
        ctx: &LayerContext<'_>,
    ) -> Option<PackItem> {
        let points: &'a [Point] = self.points;
        let point = &points[index];
        if depth > ctx.config.max_tree_depth {
            tracing::warn!(activity = %point.id, depth, "activity tree too deep, cutting subtree");
            return None;
        }
        if !self.visited.insert(index) {
            tracing::warn!(activity = %point.id, "activity reached twice, skipping cycle");
            return None;
        }
        let activity = point.as_activity()?;

        let view = ctx.time.view();
        let start = point.x + delta;
        let end = start + activity.duration.max(0.0);
        if !start.is_finite() || !end.is_finite() || !view.overlaps(start, end) {
            return None;
        }

        let x = ctx.time.forward(view.clamp(start));
        let right = ctx.time.forward(view.clamp(end));
        let width = (right - x).max(ctx.config.min_activity_width);

        let label_hidden =
            style.hide_labels || activity.label.hidden || activity.label.text.is_empty();
        let label = (!label_hidden).then(|| {
            let (label_width, label_height) = ctx
                .measurer
                .measure(&activity.label.text, ctx.config.label_font_size);
            (activity.label.text.clone(), label_width, label_height)
        });
        let reach = match &label {
            Some((_, label_width, _)) => x + width + ctx.config.label_gap + label_width,
            None => x + width,
        };

        let key = self.spans.len();
        self.spans.push(Span {
            index,
            x,
            width,
            label,
        });

        let child_indices = self.children.get(&index).cloned().unwrap_or_default();
        let children = child_indices
            .into_iter()
            .filter_map(|child| self.build(child, depth + 1, delta, style, ctx))
            .collect();

        Some(PackItem::new(key, x, reach).with_children(children))
    }
}

impl ActivityLayout {
    /// Laid-out bars in packing order.
    pub fn bars(&self) -> &[ActivityBar] {
        &self.bars
    }

    /// Height needed to show every lane.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Bar of a point, if it was laid out.
    pub fn bar(&self, index: usize) -> Option<&ActivityBar> {
        self.bars.iter().find(|bar| bar.index == index)
    }

    pub(super) fn draw<V: Canvas>(
        &self,
        layer: &Layer,
        style: &ActivityStyle,
        surface: &mut PickingSurface<V>,
        ctx: &LayerContext<'_>,
    ) -> LayerDrawing {
        let theme = ctx.theme;
        let label_style = TextStyle {
            color: style.label_color.unwrap_or(theme.activity_label),
            size: ctx.config.label_font_size,
            align: TextAlign::Left,
        };

        let mut entries = Vec::with_capacity(self.bars.len() * 2);
        for bar in &self.bars {
            let Some(point) = layer.points.get(bar.index) else {
                continue;
            };
            let selected = point.as_activity().is_some_and(|activity| activity.selected);
            let fill = if selected {
                style.selected_fill.unwrap_or(theme.activity_selected)
            } else {
                point.color.or(style.fill).unwrap_or(theme.activity)
            };

            let key = surface.register(bar.index);
            surface.fill_rect(bar.rect, fill, key);
            entries.push(IndexEntry::rect(bar.index, bar.rect));

            if let Some(label) = &bar.label {
                let anchor = ScreenPoint::new(label.rect.min.x, label.rect.center().y);
                surface.visible_mut().fill_text(anchor, &label.text, &label_style);
                surface.hidden_rect(label.rect, key);
                entries.push(IndexEntry::rect(bar.index, label.rect));
            }
        }
        LayerDrawing { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::test_support::Fixture;
    use crate::render::RenderList;

    fn activity_layer(points: Vec<Point>) -> Layer {
        Layer::activities("acts", points)
    }

    fn layout(fixture: &Fixture, layer: &Layer) -> ActivityLayout {
        layout_activities(layer, &ActivityStyle::default(), &fixture.ctx(50.0))
    }

    fn lane(fixture: &Fixture, layout: &ActivityLayout, index: usize) -> usize {
        let bar = layout.bar(index).expect("bar");
        let pitch = fixture.config.activity_row_height();
        ((bar.rect.min.y - fixture.config.activity_row_padding) / pitch).round() as usize
    }

    #[test]
    fn overlapping_activities_pack_into_separate_lanes() {
        let fixture = Fixture::new();
        let layer = activity_layer(vec![
            Point::activity("a", 0.0, 100.0),
            Point::activity("b", 50.0, 100.0),
            Point::activity("c", 200.0, 50.0),
        ]);
        let layout = layout(&fixture, &layer);
        assert_eq!(lane(&fixture, &layout, 0), 0);
        assert_eq!(lane(&fixture, &layout, 1), 1);
        assert_eq!(lane(&fixture, &layout, 2), 0);
        assert_eq!(layout.height(), 2.0 * fixture.config.activity_row_height());
    }

    #[test]
    fn bars_are_clamped_to_the_view_with_a_width_floor() {
        let fixture = Fixture::new();
        let layer = activity_layer(vec![
            Point::activity("early", -100.0, 150.0),
            Point::activity("instant", 500.0, 0.0),
            Point::activity("late", 900.0, 500.0),
            Point::activity("outside", 2000.0, 10.0),
        ]);
        let layout = layout(&fixture, &layer);
        let early = layout.bar(0).expect("early");
        assert_eq!(early.rect.min.x, 0.0);
        assert_eq!(early.rect.width(), 50.0);
        assert_eq!(layout.bar(1).expect("instant").rect.width(), 5.0);
        assert_eq!(layout.bar(2).expect("late").rect.max.x, 1000.0);
        assert!(layout.bar(3).is_none());
    }

    #[test]
    fn labels_extend_the_packed_extent() {
        let fixture = Fixture::new();
        let layer = activity_layer(vec![
            Point::activity("a", 0.0, 10.0).with_label("a long label"),
            Point::activity("b", 20.0, 10.0),
        ]);
        let layout = layout(&fixture, &layer);
        assert_eq!(lane(&fixture, &layout, 1), 1);
        let label = layout.bar(0).and_then(|bar| bar.label.as_ref()).expect("label");
        assert_eq!(label.rect.min.x, 10.0 + fixture.config.label_gap);
        assert_eq!(label.text, "a long label");
    }

    #[test]
    fn hidden_labels_are_not_laid_out() {
        let fixture = Fixture::new();
        let mut point = Point::activity("a", 0.0, 10.0).with_label("hidden");
        if let crate::model::PointKind::Activity(activity) = &mut point.kind {
            activity.label.hidden = true;
        }
        let layout = layout(&fixture, &activity_layer(vec![point]));
        assert!(layout.bar(0).expect("bar").label.is_none());
    }

    #[test]
    fn children_stack_below_their_parent() {
        let fixture = Fixture::new();
        let layer = activity_layer(vec![
            Point::activity("root", 0.0, 100.0).with_children(["c1", "c2"]),
            Point::activity("c1", 0.0, 40.0).with_parent("root"),
            Point::activity("c2", 50.0, 40.0).with_parent("root"),
            Point::activity("other", 10.0, 10.0),
        ]);
        let layout = layout(&fixture, &layer);
        assert_eq!(lane(&fixture, &layout, 0), 0);
        assert_eq!(lane(&fixture, &layout, 1), 1);
        assert_eq!(lane(&fixture, &layout, 2), 2);
        assert_eq!(lane(&fixture, &layout, 3), 3);
        assert_eq!(layout.bar(2).expect("c2").depth, 1);
    }

    #[test]
    fn orphans_and_cycles_degrade_to_partial_layout() {
        let fixture = Fixture::new();
        let layer = activity_layer(vec![
            Point::activity("root", 0.0, 100.0).with_children(["a"]),
            Point::activity("a", 0.0, 10.0).with_parent("root").with_children(["b"]),
            Point::activity("b", 0.0, 10.0).with_parent("a").with_children(["a"]),
            Point::activity("orphan", 0.0, 10.0).with_parent("missing"),
        ]);
        let layout = layout(&fixture, &layer);
        assert_eq!(layout.bars().len(), 3);
        assert!(layout.bar(3).is_none());
    }

    #[test]
    fn deep_chains_are_cut_at_the_depth_limit() {
        let mut fixture = Fixture::new();
        fixture.config.max_tree_depth = 3;
        let mut points = vec![Point::activity("n0", 0.0, 10.0).with_children(["n1"])];
        for depth in 1..10 {
            points.push(
                Point::activity(format!("n{depth}"), 0.0, 10.0)
                    .with_parent(format!("n{}", depth - 1))
                    .with_children([format!("n{}", depth + 1)]),
            );
        }
        let layout = layout(&fixture, &activity_layer(points));
        assert_eq!(layout.bars().len(), 4);
    }

    #[test]
    fn overrides_shift_the_whole_subtree() {
        let mut fixture = Fixture::new();
        fixture.overrides.insert("root".to_string(), 300.0);
        let layer = activity_layer(vec![
            Point::activity("root", 100.0, 50.0).with_children(["child"]),
            Point::activity("child", 110.0, 10.0).with_parent("root"),
        ]);
        let layout = layout(&fixture, &layer);
        assert_eq!(layout.bar(0).expect("root").rect.min.x, 300.0);
        assert_eq!(layout.bar(1).expect("child").rect.min.x, 310.0);
    }

    #[test]
    fn drawn_bars_and_labels_pick_their_point() {
        let fixture = Fixture::new();
        let layer = activity_layer(vec![
            Point::activity("a", 100.0, 100.0).with_label("alpha"),
            Point::activity("b", 150.0, 100.0).with_selected(true),
        ]);
        let ctx = fixture.ctx(60.0);
        let style = ActivityStyle::default();
        let layout = layout_activities(&layer, &style, &ctx);

        let mut surface: PickingSurface<RenderList> = PickingSurface::default();
        surface.begin_pass(1000, 60).expect("pass");
        let drawing = layout.draw(&layer, &style, &mut surface, &ctx);
        assert_eq!(drawing.entries.len(), 3);

        for bar in layout.bars() {
            assert_eq!(surface.pick(bar.rect.center()), Some(bar.index));
            if let Some(label) = &bar.label {
                assert_eq!(surface.pick(label.rect.center()), Some(bar.index));
            }
        }
        assert_eq!(surface.pick(ScreenPoint::new(900.0, 55.0)), None);
        assert_eq!(surface.visible().texts().collect::<Vec<_>>(), vec!["alpha"]);
    }
}
