//! Resource traces: a stroked curve plus pickable sample markers.

use crate::geom::{ScreenPoint, ScreenRect};
use crate::model::{CurveType, Layer, LineLayerStyle, PointKind, Row};
use crate::picking::PickingSurface;
use crate::render::{Canvas, LineStyle, clip_polyline};
use crate::scale::ValueScale;
use crate::spatial::IndexEntry;

use super::{LayerContext, LayerDrawing};

/// Line segments per cubic span of a natural curve.
const SPLINE_STEPS: usize = 12;

/// Draw a line layer against its row's value axis.
///
/// Layers whose axis is missing or has no domain yet are skipped.
pub fn draw_line_layer<V: Canvas>(
    layer: &Layer,
    style: &LineLayerStyle,
    row: &Row,
    surface: &mut PickingSurface<V>,
    ctx: &LayerContext<'_>,
) -> LayerDrawing {
    let axis = layer.y_axis_id.as_deref().and_then(|id| row.axis(id));
    let Some(scale) =
        axis.and_then(|axis| ValueScale::from_axis_domain(&axis.scale_domain, ctx.height))
    else {
        tracing::debug!(layer = %layer.id, "line layer has no usable value axis, skipping");
        return LayerDrawing::default();
    };

    let mut samples: Vec<(usize, ScreenPoint)> = layer
        .points
        .iter()
        .enumerate()
        .filter_map(|(index, point)| match &point.kind {
            PointKind::Line(line) => {
                let position = ScreenPoint::new(ctx.time.forward(point.x), scale.forward(line.y));
                (position.x.is_finite() && position.y.is_finite()).then_some((index, position))
            }
            _ => None,
        })
        .collect();
    if samples.is_empty() {
        return LayerDrawing::default();
    }
    samples.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));

    let color = style.color.unwrap_or(ctx.theme.line);
    let clip = ScreenRect::from_xywh(0.0, 0.0, ctx.time.width(), ctx.height);
    let vertices: Vec<ScreenPoint> = samples.iter().map(|(_, position)| *position).collect();
    let path = curve_path(&vertices, style.curve);
    let stroke = LineStyle {
        color,
        width: style.width,
    };
    for run in clip_polyline(&path, clip) {
        surface.visible_mut().stroke_path(&run, stroke);
    }

    let mut entries = Vec::new();
    for (index, position) in samples {
        if !clip.contains(position) {
            continue;
        }
        let point = &layer.points[index];
        let radius = match &point.kind {
            PointKind::Line(line) => line.radius.unwrap_or(ctx.config.marker_radius),
            _ => ctx.config.marker_radius,
        };
        let key = surface.register(index);
        if style.show_markers {
            surface.fill_circle(position, radius, point.color.unwrap_or(color), key);
        } else {
            surface.hidden_circle(position, radius, key);
        }
        entries.push(IndexEntry::point(index, position));
    }
    LayerDrawing { entries }
}

/// Interpolate samples (sorted by x) into a polyline for the given curve.
pub fn curve_path(points: &[ScreenPoint], curve: CurveType) -> Vec<ScreenPoint> {
    if points.len() < 2 {
        return points.to_vec();
    }
    match curve {
        CurveType::Linear => points.to_vec(),
        CurveType::StepBefore => step(points, |from, to| ScreenPoint::new(from.x, to.y)),
        CurveType::StepAfter => step(points, |from, to| ScreenPoint::new(to.x, from.y)),
        CurveType::Natural if points.len() < 3 => points.to_vec(),
        CurveType::Natural => natural(points),
    }
}

fn step(
    points: &[ScreenPoint],
    corner: impl Fn(ScreenPoint, ScreenPoint) -> ScreenPoint,
) -> Vec<ScreenPoint> {
    let mut path = Vec::with_capacity(points.len() * 2);
    path.push(points[0]);
    for pair in points.windows(2) {
        path.push(corner(pair[0], pair[1]));
        path.push(pair[1]);
    }
    path
}

/// Natural cubic spline through every sample, flattened to line segments.
fn natural(points: &[ScreenPoint]) -> Vec<ScreenPoint> {
    let xs: Vec<f64> = points.iter().map(|point| point.x).collect();
    let ys: Vec<f64> = points.iter().map(|point| point.y).collect();
    let (ax, bx) = control_points(&xs);
    let (ay, by) = control_points(&ys);

    let mut path = Vec::with_capacity((points.len() - 1) * SPLINE_STEPS + 1);
    path.push(points[0]);
    for segment in 0..points.len() - 1 {
        let p0 = points[segment];
        let p1 = ScreenPoint::new(ax[segment], ay[segment]);
        let p2 = ScreenPoint::new(bx[segment], by[segment]);
        let p3 = points[segment + 1];
        for step in 1..=SPLINE_STEPS {
            let t = step as f64 / SPLINE_STEPS as f64;
            path.push(cubic(p0, p1, p2, p3, t));
        }
    }
    path
}

/// Bezier control points of a natural spline along one coordinate.
///
/// Solves the tridiagonal system with the Thomas algorithm. `values` must
/// hold at least three entries.
fn control_points(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = values.len() - 1;
    let mut a = vec![0.0; n];
    let mut b = vec![0.0; n];
    let mut r = vec![0.0; n];

    a[0] = 0.0;
    b[0] = 2.0;
    r[0] = values[0] + 2.0 * values[1];
    for i in 1..n - 1 {
        a[i] = 1.0;
        b[i] = 4.0;
        r[i] = 4.0 * values[i] + 2.0 * values[i + 1];
    }
    a[n - 1] = 2.0;
    b[n - 1] = 7.0;
    r[n - 1] = 8.0 * values[n - 1] + values[n];

    for i in 1..n {
        let m = a[i] / b[i - 1];
        b[i] -= m;
        r[i] -= m * r[i - 1];
    }
    a[n - 1] = r[n - 1] / b[n - 1];
    for i in (0..n - 1).rev() {
        a[i] = (r[i] - a[i + 1]) / b[i];
    }
    b[n - 1] = (values[n] + a[n - 1]) / 2.0;
    for i in 0..n - 1 {
        b[i] = 2.0 * values[i + 1] - a[i + 1];
    }
    (a, b)
}

fn cubic(
    p0: ScreenPoint,
    p1: ScreenPoint,
    p2: ScreenPoint,
    p3: ScreenPoint,
    t: f64,
) -> ScreenPoint {
    let u = 1.0 - t;
    let w0 = u * u * u;
    let w1 = 3.0 * u * u * t;
    let w2 = 3.0 * u * t * t;
    let w3 = t * t * t;
    ScreenPoint::new(
        w0 * p0.x + w1 * p1.x + w2 * p2.x + w3 * p3.x,
        w0 * p0.y + w1 * p1.y + w2 * p2.y + w3 * p3.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::test_support::Fixture;
    use crate::model::{Axis, Point};
    use crate::render::{RenderCommand, RenderList};

    fn row_with(layer: Layer, axis: Axis) -> Row {
        Row::new("row", 100.0).with_axis(axis).with_layer(layer)
    }

    fn draw(row: &Row, fixture: &Fixture) -> (PickingSurface<RenderList>, LayerDrawing) {
        let mut surface: PickingSurface<RenderList> = PickingSurface::default();
        surface.begin_pass(1000, 100).expect("pass");
        let layer = &row.layers[0];
        let crate::model::LayerStyle::Line(style) = &layer.style else {
            panic!("line layer expected");
        };
        let drawing = draw_line_layer(layer, style, row, &mut surface, &fixture.ctx(100.0));
        (surface, drawing)
    }

    #[test]
    fn markers_are_pickable_and_indexed() {
        let fixture = Fixture::new();
        let layer = Layer::line(
            "power",
            "watts",
            vec![
                Point::line("p0", 100.0, 0.0),
                Point::line("p1", 500.0, 50.0),
                Point::line("p2", 900.0, 100.0),
            ],
        );
        let row = row_with(layer, Axis::new("watts", 0.0, 100.0));
        let (surface, drawing) = draw(&row, &fixture);

        assert_eq!(drawing.entries.len(), 3);
        assert_eq!(surface.pick(ScreenPoint::new(500.0, 50.0)), Some(1));
        assert_eq!(surface.pick(ScreenPoint::new(900.0, 0.5)), Some(2));
        assert_eq!(surface.pick(ScreenPoint::new(300.0, 10.0)), None);

        let paths = surface
            .visible()
            .commands()
            .iter()
            .filter(|command| matches!(command, RenderCommand::Path { .. }))
            .count();
        assert_eq!(paths, 1);
    }

    #[test]
    fn pending_axis_skips_the_layer() {
        let fixture = Fixture::new();
        let layer = Layer::line("power", "watts", vec![Point::line("p0", 100.0, 1.0)]);
        let row = row_with(layer, Axis::pending("watts"));
        let (surface, drawing) = draw(&row, &fixture);
        assert!(drawing.entries.is_empty());
        assert!(surface.visible().commands().is_empty());
    }

    #[test]
    fn hidden_markers_stay_pickable() {
        let fixture = Fixture::new();
        let mut layer = Layer::line(
            "power",
            "watts",
            vec![Point::line("p0", 100.0, 50.0), Point::line("p1", 200.0, 50.0)],
        );
        if let crate::model::LayerStyle::Line(style) = &mut layer.style {
            style.show_markers = false;
        }
        let row = row_with(layer, Axis::new("watts", 0.0, 100.0));
        let (surface, _) = draw(&row, &fixture);
        assert_eq!(surface.pick(ScreenPoint::new(100.0, 50.0)), Some(0));
        assert!(
            surface
                .visible()
                .commands()
                .iter()
                .all(|command| !matches!(command, RenderCommand::Circle { .. }))
        );
    }

    #[test]
    fn step_curves_place_the_corner_on_the_right_side() {
        let points = [ScreenPoint::new(0.0, 0.0), ScreenPoint::new(10.0, 5.0)];
        assert_eq!(
            curve_path(&points, CurveType::StepBefore)[1],
            ScreenPoint::new(0.0, 5.0)
        );
        assert_eq!(
            curve_path(&points, CurveType::StepAfter)[1],
            ScreenPoint::new(10.0, 0.0)
        );
    }

    #[test]
    fn natural_curve_passes_through_every_sample() {
        let points = [
            ScreenPoint::new(0.0, 10.0),
            ScreenPoint::new(10.0, 0.0),
            ScreenPoint::new(20.0, 8.0),
            ScreenPoint::new(30.0, 2.0),
        ];
        let path = curve_path(&points, CurveType::Natural);
        assert_eq!(path.len(), 3 * SPLINE_STEPS + 1);
        for (segment, point) in points.iter().enumerate() {
            let vertex = path[segment * SPLINE_STEPS];
            assert!((vertex.x - point.x).abs() < 1e-9);
            assert!((vertex.y - point.y).abs() < 1e-9);
        }
    }

    #[test]
    fn collinear_samples_stay_straight_when_natural() {
        let points = [
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(10.0, 10.0),
            ScreenPoint::new(20.0, 20.0),
        ];
        for vertex in curve_path(&points, CurveType::Natural) {
            assert!((vertex.x - vertex.y).abs() < 1e-9);
        }
    }
}
