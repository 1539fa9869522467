//! Categorical state bands.

use crate::geom::{ScreenPoint, ScreenRect};
use crate::model::{Layer, PointKind, XRangeStyle};
use crate::picking::PickingSurface;
use crate::render::{Canvas, TextAlign, TextMeasurer, TextStyle};
use crate::spatial::IndexEntry;
use crate::style::CategoricalScale;

use super::{LayerContext, LayerDrawing};

const ELLIPSIS: &str = "…";

/// A run of consecutive samples sharing one label.
#[derive(Debug, Clone, PartialEq)]
pub struct XRangeBand {
    /// Index of the first point of the run.
    pub index: usize,
    /// Start time.
    pub start: f64,
    /// Start of the next band; `None` for the last, open-ended band.
    pub end: Option<f64>,
    /// Shared label.
    pub label: String,
}

/// Merge consecutive samples with equal labels into bands.
///
/// Samples are ordered by time first; equal times keep input order.
pub fn coalesce_bands(layer: &Layer) -> Vec<XRangeBand> {
    let mut samples: Vec<(usize, f64, &str)> = layer
        .points
        .iter()
        .enumerate()
        .filter_map(|(index, point)| match &point.kind {
            PointKind::XRange(range) if point.x.is_finite() => {
                Some((index, point.x, range.label.as_str()))
            }
            _ => None,
        })
        .collect();
    samples.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut bands: Vec<XRangeBand> = Vec::new();
    for (index, x, label) in samples {
        if let Some(last) = bands.last_mut() {
            if last.label == label {
                continue;
            }
            last.end = Some(x);
        }
        bands.push(XRangeBand {
            index,
            start: x,
            end: None,
            label: label.to_string(),
        });
    }
    bands
}

/// Fit `text` into `width` pixels, trimming characters and appending an
/// ellipsis. Returns `None` when not even the ellipsis fits.
pub fn truncate_label(
    text: &str,
    width: f64,
    padding: f64,
    size: f64,
    measurer: &dyn TextMeasurer,
) -> Option<String> {
    let available = width - 2.0 * padding;
    let fits = |candidate: &str| measurer.measure(candidate, size).0 <= available;
    if fits(text) {
        return Some(text.to_string());
    }
    let mut kept: Vec<char> = text.chars().collect();
    while kept.pop().is_some() {
        let mut candidate: String = kept.iter().collect();
        candidate.push_str(ELLIPSIS);
        if fits(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Draw coalesced bands across the top of the row.
pub fn draw_xrange_layer<V: Canvas>(
    layer: &Layer,
    style: &XRangeStyle,
    surface: &mut PickingSurface<V>,
    ctx: &LayerContext<'_>,
) -> LayerDrawing {
    let bands = coalesce_bands(layer);
    let palette = style
        .palette
        .clone()
        .filter(|palette| !palette.is_empty())
        .unwrap_or_else(|| ctx.theme.palette.clone());
    let mut colors = CategoricalScale::new(palette);
    let band_colors: Vec<_> = bands.iter().map(|band| colors.color(&band.label)).collect();

    let view = ctx.time.view();
    let height = ctx.config.xrange_height.min(ctx.height);
    let text_style = TextStyle {
        color: style.label_color.unwrap_or(ctx.theme.xrange_label),
        size: ctx.config.label_font_size,
        align: TextAlign::Left,
    };

    let mut entries = Vec::new();
    for (band, color) in bands.iter().zip(band_colors) {
        let end = band.end.unwrap_or(f64::INFINITY);
        if end <= view.start || band.start >= view.end {
            continue;
        }
        let left = ctx.time.forward(band.start.max(view.start));
        let right = ctx.time.forward(end.min(view.end));
        let rect = ScreenRect::new(ScreenPoint::new(left, 0.0), ScreenPoint::new(right, height));
        if !(rect.width() > 0.0) {
            continue;
        }

        let fill = layer.points[band.index].color.unwrap_or(color);
        let key = surface.register(band.index);
        surface.fill_rect(rect, fill, key);
        entries.push(IndexEntry::rect(band.index, rect));

        if style.hide_labels || band.label.is_empty() {
            continue;
        }
        let padding = ctx.config.xrange_label_padding;
        if let Some(text) = truncate_label(
            &band.label,
            rect.width(),
            padding,
            text_style.size,
            ctx.measurer,
        ) {
            let anchor = ScreenPoint::new(left + padding, height / 2.0);
            surface.visible_mut().fill_text(anchor, &text, &text_style);
        }
    }
    LayerDrawing { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::test_support::Fixture;
    use crate::model::Point;
    use crate::render::{FixedWidthMeasurer, RenderList};

    fn states(points: Vec<Point>) -> Layer {
        Layer::xranges("states", points)
    }

    #[test]
    fn consecutive_equal_labels_merge() {
        let layer = states(vec![
            Point::xrange("s0", 0.0, "A"),
            Point::xrange("s1", 5.0, "A"),
            Point::xrange("s2", 10.0, "B"),
        ]);
        let bands = coalesce_bands(&layer);
        assert_eq!(bands.len(), 2);
        assert_eq!(
            (bands[0].start, bands[0].end, bands[0].label.as_str()),
            (0.0, Some(10.0), "A")
        );
        assert_eq!(
            (bands[1].start, bands[1].end, bands[1].label.as_str()),
            (10.0, None, "B")
        );
    }

    #[test]
    fn unsorted_samples_are_ordered_before_merging() {
        let layer = states(vec![
            Point::xrange("s2", 10.0, "A"),
            Point::xrange("s0", 0.0, "A"),
            Point::xrange("s1", 5.0, "B"),
        ]);
        let labels: Vec<(f64, String)> = coalesce_bands(&layer)
            .into_iter()
            .map(|band| (band.start, band.label))
            .collect();
        assert_eq!(
            labels,
            vec![(0.0, "A".to_string()), (5.0, "B".to_string()), (10.0, "A".to_string())]
        );
    }

    #[test]
    fn labels_are_trimmed_with_an_ellipsis() {
        let measurer = FixedWidthMeasurer { advance: 1.0 };
        assert_eq!(
            truncate_label("IDLE", 100.0, 4.0, 10.0, &measurer).as_deref(),
            Some("IDLE")
        );
        assert_eq!(
            truncate_label("TRANSMITTING", 48.0, 4.0, 10.0, &measurer).as_deref(),
            Some("TRA…")
        );
        assert_eq!(truncate_label("TRANSMITTING", 12.0, 4.0, 10.0, &measurer), None);
    }

    #[test]
    fn bands_fill_to_the_next_state_and_pick_their_first_point() {
        let fixture = Fixture::new();
        let layer = states(vec![
            Point::xrange("s0", 0.0, "A"),
            Point::xrange("s1", 5.0, "A"),
            Point::xrange("s2", 400.0, "B"),
        ]);
        let mut surface: PickingSurface<RenderList> = PickingSurface::default();
        surface.begin_pass(1000, 50).expect("pass");
        let drawing =
            draw_xrange_layer(&layer, &XRangeStyle::default(), &mut surface, &fixture.ctx(50.0));

        assert_eq!(drawing.entries.len(), 2);
        assert_eq!(drawing.entries[0].width, 400.0);
        assert_eq!(drawing.entries[1].width, 600.0);
        assert_eq!(surface.pick(ScreenPoint::new(200.0, 10.0)), Some(0));
        assert_eq!(surface.pick(ScreenPoint::new(999.0, 10.0)), Some(2));
        assert_eq!(surface.pick(ScreenPoint::new(200.0, 40.0)), None);
        assert_eq!(surface.visible().texts().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn same_label_gets_same_color_across_bands() {
        let fixture = Fixture::new();
        let layer = states(vec![
            Point::xrange("s0", 0.0, "A"),
            Point::xrange("s1", 100.0, "B"),
            Point::xrange("s2", 200.0, "A"),
        ]);
        let mut surface: PickingSurface<RenderList> = PickingSurface::default();
        surface.begin_pass(1000, 50).expect("pass");
        draw_xrange_layer(&layer, &XRangeStyle::default(), &mut surface, &fixture.ctx(50.0));
        let fills: Vec<_> = surface
            .visible()
            .commands()
            .iter()
            .filter_map(|command| match command {
                crate::render::RenderCommand::Rect { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 3);
        assert_eq!(fills[0], fills[2]);
        assert_ne!(fills[0], fills[1]);
    }
}
