//! Themes and categorical color scales.

use std::collections::HashMap;

use crate::render::Color;

/// Visual theme for timelines.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Row background.
    pub background: Color,
    /// Axis lines and tick marks.
    pub axis: Color,
    /// Tick label text.
    pub tick_label: Color,
    /// Time grid lines at each tick.
    pub grid: Color,
    /// Default horizontal guide color.
    pub horizontal_guide: Color,
    /// Default vertical guide color.
    pub vertical_guide: Color,
    /// Constraint violation overlay (translucent).
    pub violation: Color,
    /// Default activity fill.
    pub activity: Color,
    /// Fill of selected activities.
    pub activity_selected: Color,
    /// Activity label text.
    pub activity_label: Color,
    /// Default resource line color.
    pub line: Color,
    /// State range label text.
    pub xrange_label: Color,
    /// Categorical palette for state ranges.
    pub palette: Vec<Color>,
}

impl Theme {
    /// Create the default (light) theme.
    pub fn new() -> Self {
        Self::light()
    }

    /// Light theme.
    pub fn light() -> Self {
        Self {
            background: Color::WHITE,
            axis: Color::new(0.35, 0.35, 0.35, 1.0),
            tick_label: Color::new(0.2, 0.2, 0.2, 1.0),
            grid: Color::new(0.88, 0.88, 0.88, 1.0),
            horizontal_guide: Color::new(0.55, 0.55, 0.55, 1.0),
            vertical_guide: Color::new(0.15, 0.45, 0.85, 1.0),
            violation: Color::new(0.9, 0.1, 0.1, 0.2),
            activity: Color::from_rgb8(0x28, 0x8c, 0xd3),
            activity_selected: Color::from_rgb8(0xff, 0xcd, 0x69),
            activity_label: Color::BLACK,
            line: Color::from_rgb8(0x28, 0x3a, 0x93),
            xrange_label: Color::BLACK,
            palette: category10(),
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            background: Color::new(0.08, 0.09, 0.11, 1.0),
            axis: Color::new(0.7, 0.7, 0.72, 1.0),
            tick_label: Color::new(0.85, 0.85, 0.87, 1.0),
            grid: Color::new(0.2, 0.21, 0.24, 1.0),
            horizontal_guide: Color::new(0.6, 0.6, 0.62, 1.0),
            vertical_guide: Color::new(0.35, 0.65, 1.0, 1.0),
            violation: Color::new(1.0, 0.3, 0.3, 0.25),
            activity: Color::from_rgb8(0x3f, 0xa7, 0xf0),
            activity_selected: Color::from_rgb8(0xff, 0xcd, 0x69),
            activity_label: Color::WHITE,
            line: Color::from_rgb8(0x8f, 0xd1, 0x9e),
            xrange_label: Color::WHITE,
            palette: category10(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

fn category10() -> Vec<Color> {
    [
        "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
        "#bcbd22", "#17becf",
    ]
    .iter()
    .filter_map(|hex| Color::from_hex(hex))
    .collect()
}

/// Ordinal color scale keyed by label text.
///
/// Labels receive palette colors in first-seen order, cycling when the
/// palette runs out, so the same label keeps its color for the life of the
/// scale.
#[derive(Debug, Clone)]
pub struct CategoricalScale {
    palette: Vec<Color>,
    assigned: HashMap<String, Color>,
}

impl CategoricalScale {
    /// Create a scale over `palette`.
    pub fn new(palette: Vec<Color>) -> Self {
        Self {
            palette,
            assigned: HashMap::new(),
        }
    }

    /// Color of `label`, assigning the next palette entry on first use.
    pub fn color(&mut self, label: &str) -> Color {
        if let Some(color) = self.assigned.get(label) {
            return *color;
        }
        let color = if self.palette.is_empty() {
            Color::BLACK
        } else {
            self.palette[self.assigned.len() % self.palette.len()]
        };
        self.assigned.insert(label.to_string(), color);
        color
    }
}
