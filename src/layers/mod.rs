//! Per-kind layer renderers.
//!
//! Each renderer draws one [`Layer`] onto its own [`PickingSurface`] and
//! returns the pixel geometry it drew, from which the row builds the layer's
//! [`SpatialIndex`](crate::spatial::SpatialIndex). Pick targets and index
//! targets are indices into the layer's point array.

mod activity;
mod line;
mod xrange;

use std::collections::HashMap;

pub use activity::{ActivityBar, ActivityLayout, layout_activities};
pub use line::{curve_path, draw_line_layer};
pub use xrange::{XRangeBand, coalesce_bands, draw_xrange_layer, truncate_label};

use crate::config::TimelineConfig;
use crate::model::{Layer, LayerStyle, Row};
use crate::picking::PickingSurface;
use crate::render::{Canvas, TextMeasurer};
use crate::scale::TimeScale;
use crate::spatial::IndexEntry;
use crate::style::Theme;

/// Shared inputs of one layer draw.
pub struct LayerContext<'a> {
    /// Shared time scale.
    pub time: &'a TimeScale,
    /// Layout tunables.
    pub config: &'a TimelineConfig,
    /// Colors.
    pub theme: &'a Theme,
    /// Text measurement for labels.
    pub measurer: &'a dyn TextMeasurer,
    /// Height of the row drawing area in pixels.
    pub height: f64,
    /// Optimistic start times keyed by point id.
    pub overrides: &'a HashMap<String, f64>,
}

impl LayerContext<'_> {
    /// Start time of a point, honoring optimistic overrides.
    pub fn start_of(&self, id: &str, x: f64) -> f64 {
        self.overrides.get(id).copied().unwrap_or(x)
    }
}

/// How a layer answers spatial hover queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitMode {
    /// Nearest marker within the hover tolerance.
    Nearest,
    /// Every rectangle covering the cursor.
    Containing,
}

impl HitMode {
    /// Hit mode for a layer style.
    pub fn for_style(style: &LayerStyle) -> Self {
        match style {
            LayerStyle::Line(_) => Self::Nearest,
            LayerStyle::Activity(_) | LayerStyle::XRange(_) => Self::Containing,
        }
    }
}

/// Drawn geometry of one layer.
#[derive(Debug, Clone, Default)]
pub struct LayerDrawing {
    /// Index entries for every drawn shape.
    pub entries: Vec<IndexEntry>,
}

/// Draw one layer.
///
/// `activity_layout` must be the layout computed for this layer when it is an
/// activity layer.
pub fn draw_layer<V: Canvas>(
    layer: &Layer,
    row: &Row,
    activity_layout: Option<&ActivityLayout>,
    surface: &mut PickingSurface<V>,
    ctx: &LayerContext<'_>,
) -> LayerDrawing {
    match &layer.style {
        LayerStyle::Activity(style) => match activity_layout {
            Some(layout) => layout.draw(layer, style, surface, ctx),
            None => LayerDrawing::default(),
        },
        LayerStyle::Line(style) => draw_line_layer(layer, style, row, surface, ctx),
        LayerStyle::XRange(style) => draw_xrange_layer(layer, style, surface, ctx),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::render::FixedWidthMeasurer;
    use crate::view::TimeRange;

    pub(crate) struct Fixture {
        pub time: TimeScale,
        pub config: TimelineConfig,
        pub theme: Theme,
        pub measurer: FixedWidthMeasurer,
        pub overrides: HashMap<String, f64>,
    }

    impl Fixture {
        /// 1 ms per pixel over a 1000 px wide view.
        pub fn new() -> Self {
            Self {
                time: TimeScale::new(TimeRange::new(0.0, 1000.0), 1000.0).expect("scale"),
                config: TimelineConfig::default(),
                theme: Theme::default(),
                measurer: FixedWidthMeasurer::default(),
                overrides: HashMap::new(),
            }
        }

        pub fn ctx(&self, height: f64) -> LayerContext<'_> {
            LayerContext {
                time: &self.time,
                config: &self.config,
                theme: &self.theme,
                measurer: &self.measurer,
                height,
                overrides: &self.overrides,
            }
        }
    }
}
