//! Timeline data model.
//!
//! Points, layers and rows are snapshots owned by the host. Renderers only
//! read them; every derived structure is rebuilt per draw pass.

use serde::{Deserialize, Serialize};

use crate::render::Color;
use crate::view::TimeRange;

/// Discriminant of a point or layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKindTag {
    /// Discrete activity interval.
    Activity,
    /// Continuous resource sample.
    Line,
    /// Categorical state range.
    XRange,
}

/// A drawable datum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Stable identifier.
    pub id: String,
    /// Start time in epoch milliseconds.
    pub x: f64,
    /// Optional per-point color override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Kind-specific data.
    #[serde(flatten)]
    pub kind: PointKind,
}

/// Kind-specific payload of a [`Point`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointKind {
    /// Discrete activity interval.
    Activity(ActivityData),
    /// Continuous resource sample.
    Line(LineData),
    /// Categorical state range.
    XRange(XRangeData),
}

/// Activity interval data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityData {
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: f64,
    /// Parent activity id; `None` for roots.
    #[serde(default)]
    pub parent: Option<String>,
    /// Child activity ids in decomposition order.
    #[serde(default)]
    pub children: Vec<String>,
    /// Whether the activity is selected.
    #[serde(default)]
    pub selected: bool,
    /// Label drawn next to the bar.
    #[serde(default)]
    pub label: ActivityLabel,
}

/// Activity label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityLabel {
    /// Label text.
    #[serde(default)]
    pub text: String,
    /// Suppress the label.
    #[serde(default)]
    pub hidden: bool,
}

/// Line sample data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    /// Sample value.
    pub y: f64,
    /// Marker radius; falls back to the configured default.
    #[serde(default)]
    pub radius: Option<f64>,
}

/// State range data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XRangeData {
    /// Categorical state label.
    pub label: String,
}

impl Point {
    /// Create a root activity with no label.
    pub fn activity(id: impl Into<String>, x: f64, duration: f64) -> Self {
        Self {
            id: id.into(),
            x,
            color: None,
            kind: PointKind::Activity(ActivityData {
                duration,
                ..ActivityData::default()
            }),
        }
    }

    /// Create a line sample.
    pub fn line(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            color: None,
            kind: PointKind::Line(LineData { y, radius: None }),
        }
    }

    /// Create a state range start.
    pub fn xrange(id: impl Into<String>, x: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            color: None,
            kind: PointKind::XRange(XRangeData {
                label: label.into(),
            }),
        }
    }

    /// Set the activity label.
    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        match &mut self.kind {
            PointKind::Activity(activity) => activity.label.text = text.into(),
            PointKind::XRange(range) => range.label = text.into(),
            PointKind::Line(_) => {}
        }
        self
    }

    /// Set the activity parent.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        if let PointKind::Activity(activity) = &mut self.kind {
            activity.parent = Some(parent.into());
        }
        self
    }

    /// Set the activity children.
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let PointKind::Activity(activity) = &mut self.kind {
            activity.children = children.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Mark the activity selected.
    pub fn with_selected(mut self, selected: bool) -> Self {
        if let PointKind::Activity(activity) = &mut self.kind {
            activity.selected = selected;
        }
        self
    }

    /// Set the per-point color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Discriminant of the point.
    pub fn kind_tag(&self) -> PointKindTag {
        match self.kind {
            PointKind::Activity(_) => PointKindTag::Activity,
            PointKind::Line(_) => PointKindTag::Line,
            PointKind::XRange(_) => PointKindTag::XRange,
        }
    }

    /// Activity data, if this is an activity.
    pub fn as_activity(&self) -> Option<&ActivityData> {
        match &self.kind {
            PointKind::Activity(activity) => Some(activity),
            _ => None,
        }
    }

    /// True for activities without a parent.
    pub fn is_root_activity(&self) -> bool {
        self.as_activity()
            .is_some_and(|activity| activity.parent.is_none())
    }

    /// End time for activities, start time otherwise.
    pub fn end(&self) -> f64 {
        match &self.kind {
            PointKind::Activity(activity) => self.x + activity.duration.max(0.0),
            _ => self.x,
        }
    }
}

/// Line curve interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    /// Straight segments.
    #[default]
    Linear,
    /// Natural cubic spline through every sample.
    Natural,
    /// Vertical step at the start of each interval.
    StepBefore,
    /// Vertical step at the end of each interval.
    StepAfter,
}

/// Activity layer styling; unset colors come from the theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityStyle {
    /// Bar fill.
    pub fill: Option<Color>,
    /// Bar fill for selected activities.
    pub selected_fill: Option<Color>,
    /// Label color.
    pub label_color: Option<Color>,
    /// Hide every label of the layer.
    pub hide_labels: bool,
}

/// Line layer styling; unset colors come from the theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineLayerStyle {
    /// Stroke and marker color.
    pub color: Option<Color>,
    /// Stroke width.
    pub width: f64,
    /// Curve interpolation of the stroked path.
    pub curve: CurveType,
    /// Draw per-sample markers.
    pub show_markers: bool,
}

impl Default for LineLayerStyle {
    fn default() -> Self {
        Self {
            color: None,
            width: 1.0,
            curve: CurveType::Linear,
            show_markers: true,
        }
    }
}

/// State range layer styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XRangeStyle {
    /// Categorical palette; the theme palette when unset.
    pub palette: Option<Vec<Color>>,
    /// Label color.
    pub label_color: Option<Color>,
    /// Hide band labels.
    pub hide_labels: bool,
}

/// Layer kind together with its styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerStyle {
    /// Activity bars.
    Activity(ActivityStyle),
    /// Resource line.
    Line(LineLayerStyle),
    /// State ranges.
    XRange(XRangeStyle),
}

impl LayerStyle {
    /// Discriminant of the layer.
    pub fn kind_tag(&self) -> PointKindTag {
        match self {
            Self::Activity(_) => PointKindTag::Activity,
            Self::Line(_) => PointKindTag::Line,
            Self::XRange(_) => PointKindTag::XRange,
        }
    }
}

/// A rendering unit bound to one point kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Stable identifier.
    pub id: String,
    /// Kind and styling.
    pub style: LayerStyle,
    /// Points drawn by the layer.
    #[serde(default)]
    pub points: Vec<Point>,
    /// Value axis used by resource layers.
    #[serde(default)]
    pub y_axis_id: Option<String>,
}

impl Layer {
    /// Create an empty layer.
    pub fn new(id: impl Into<String>, style: LayerStyle) -> Self {
        Self {
            id: id.into(),
            style,
            points: Vec::new(),
            y_axis_id: None,
        }
    }

    /// Create an activity layer with default styling.
    pub fn activities(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self::new(id, LayerStyle::Activity(ActivityStyle::default())).with_points(points)
    }

    /// Create a line layer bound to a value axis.
    pub fn line(id: impl Into<String>, y_axis_id: impl Into<String>, points: Vec<Point>) -> Self {
        let mut layer =
            Self::new(id, LayerStyle::Line(LineLayerStyle::default())).with_points(points);
        layer.y_axis_id = Some(y_axis_id.into());
        layer
    }

    /// Create a state range layer with default styling.
    pub fn xranges(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self::new(id, LayerStyle::XRange(XRangeStyle::default())).with_points(points)
    }

    /// Replace the points.
    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    /// Discriminant of the layer.
    pub fn kind_tag(&self) -> PointKindTag {
        self.style.kind_tag()
    }
}

/// A value axis of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Stable identifier referenced by layers and guides.
    pub id: String,
    /// `[min, max]`, or empty while not yet computable.
    #[serde(default)]
    pub scale_domain: Vec<f64>,
    /// Tick and label color.
    #[serde(default)]
    pub color: Option<Color>,
    /// Axis title.
    #[serde(default)]
    pub label: String,
    /// Approximate number of ticks.
    #[serde(default = "default_tick_count")]
    pub tick_count: usize,
}

fn default_tick_count() -> usize {
    5
}

impl Axis {
    /// Create an axis with a known domain.
    pub fn new(id: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            id: id.into(),
            scale_domain: vec![min, max],
            color: None,
            label: String::new(),
            tick_count: default_tick_count(),
        }
    }

    /// Create an axis whose domain is not yet known.
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            scale_domain: Vec::new(),
            ..Self::new(id, 0.0, 0.0)
        }
    }
}

/// Fixed value line across a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizontalGuide {
    /// Stable identifier.
    pub id: String,
    /// Axis the value is expressed on.
    pub y_axis_id: String,
    /// Guide value.
    pub value: f64,
    /// Editable label.
    #[serde(default)]
    pub label: String,
    /// Line color.
    #[serde(default)]
    pub color: Option<Color>,
}

/// Fixed time line across a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalGuide {
    /// Stable identifier.
    pub id: String,
    /// Guide time in epoch milliseconds.
    pub time: f64,
    /// Label.
    #[serde(default)]
    pub label: String,
    /// Line color.
    #[serde(default)]
    pub color: Option<Color>,
}

/// A named vertical slot sharing one time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Stable identifier.
    pub id: String,
    /// Drawing height in pixels; grows to fit packed activities.
    pub height: f64,
    /// Layers, drawn in order.
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Value axes referenced by resource layers.
    #[serde(default)]
    pub y_axes: Vec<Axis>,
    /// Horizontal value guides.
    #[serde(default)]
    pub horizontal_guides: Vec<HorizontalGuide>,
    /// Vertical time guides.
    #[serde(default)]
    pub vertical_guides: Vec<VerticalGuide>,
}

impl Row {
    /// Create an empty row.
    pub fn new(id: impl Into<String>, height: f64) -> Self {
        Self {
            id: id.into(),
            height,
            layers: Vec::new(),
            y_axes: Vec::new(),
            horizontal_guides: Vec::new(),
            vertical_guides: Vec::new(),
        }
    }

    /// Add a layer.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Add a value axis.
    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.y_axes.push(axis);
        self
    }

    /// Add a horizontal guide.
    pub fn with_horizontal_guide(mut self, guide: HorizontalGuide) -> Self {
        self.horizontal_guides.push(guide);
        self
    }

    /// Add a vertical guide.
    pub fn with_vertical_guide(mut self, guide: VerticalGuide) -> Self {
        self.vertical_guides.push(guide);
        self
    }

    /// Look up a value axis.
    pub fn axis(&self, id: &str) -> Option<&Axis> {
        self.y_axes.iter().find(|axis| axis.id == id)
    }

    /// Check whether any layer draws activities.
    pub fn hosts_activities(&self) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.kind_tag() == PointKindTag::Activity)
    }
}

/// A constraint violated over one or more windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Stable identifier.
    pub id: String,
    /// Constraint name.
    pub name: String,
    /// Human-readable explanation.
    #[serde(default)]
    pub message: String,
    /// Violating windows.
    pub windows: Vec<TimeRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_deserialize_with_kind_tag() {
        let json = r#"[
            { "id": "a", "x": 1000, "kind": "activity", "duration": 50,
              "children": ["b"], "label": { "text": "Slew" } },
            { "id": "b", "x": 1010, "kind": "activity", "parent": "a" },
            { "id": "r", "x": 0, "kind": "line", "y": 3.5 },
            { "id": "s", "x": 0, "kind": "x_range", "label": "IDLE" }
        ]"#;
        let points: Vec<Point> = serde_json::from_str(json).expect("points");
        assert_eq!(points[0].kind_tag(), PointKindTag::Activity);
        assert!(points[0].is_root_activity());
        assert_eq!(points[0].end(), 1050.0);
        assert_eq!(
            points[0].as_activity().map(|activity| activity.label.text.as_str()),
            Some("Slew")
        );
        assert!(!points[1].is_root_activity());
        assert_eq!(points[2].kind_tag(), PointKindTag::Line);
        assert_eq!(points[3].kind_tag(), PointKindTag::XRange);
    }

    #[test]
    fn row_reports_activity_layers() {
        let row = Row::new("r", 50.0).with_layer(Layer::xranges("s", Vec::new()));
        assert!(!row.hosts_activities());
        let row = row.with_layer(Layer::activities("a", Vec::new()));
        assert!(row.hosts_activities());
    }

    #[test]
    fn layer_style_deserializes_with_defaults() {
        let layer: Layer = serde_json::from_str(
            r#"{ "id": "power", "style": { "kind": "line", "curve": "step_after" },
                 "y_axis_id": "watts" }"#,
        )
        .expect("layer");
        match &layer.style {
            LayerStyle::Line(style) => {
                assert_eq!(style.curve, CurveType::StepAfter);
                assert!(style.show_markers);
            }
            other => panic!("unexpected style {other:?}"),
        }
        assert!(layer.points.is_empty());
    }
}
