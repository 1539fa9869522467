//! plan-timeline renders zoomable, multi-row plan timelines and resolves
//! pointer positions back to the points drawn under them.
//! Rows stack activity bars, resource lines and state ranges on one shared
//! time axis. Every drawn shape is also keyed into a hidden picking canvas,
//! so hit-testing is exact for whatever was last drawn.

#![forbid(unsafe_code)]

pub mod axis;
pub mod compositor;
pub mod config;
pub mod error;
pub mod event;
pub mod geom;
pub mod guides;
pub mod interaction;
pub mod layers;
pub mod model;
pub mod packing;
pub mod picking;
pub mod render;
pub mod row;
pub mod scale;
pub mod spatial;
pub mod style;
pub mod surface;
pub mod timeline;
pub mod view;

#[cfg(feature = "gpui")]
pub mod gpui_backend;

pub use axis::{AxisFormatter, TimeTick, ValueTick};
pub use compositor::{DrawRequest, DrawScheduler, TimelineCompositor};
pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
pub use event::{DragPayload, TimelineEvent};
pub use geom::{ScreenPoint, ScreenRect};
pub use interaction::{HitTester, InteractionController, InteractionState, PointRef};
pub use model::{
    ActivityData, ActivityLabel, ActivityStyle, Axis, ConstraintViolation, CurveType,
    HorizontalGuide, Layer, LayerStyle, LineData, LineLayerStyle, Point, PointKind, PointKindTag,
    Row, VerticalGuide, XRangeData, XRangeStyle,
};
pub use packing::{PackItem, Packing, Placement, RowPacker};
pub use picking::{ColorKey, PickingSurface};
pub use render::{
    Canvas, Color, FixedWidthMeasurer, LineStyle, RenderCommand, RenderList, TextAlign,
    TextMeasurer, TextStyle,
};
pub use row::RowRenderer;
pub use scale::{TimeScale, ValueScale};
pub use spatial::SpatialIndex;
pub use style::{CategoricalScale, Theme};
pub use surface::PixelCanvas;
pub use timeline::{Timeline, TimelineBuilder};
pub use view::{Range, TimeRange};
