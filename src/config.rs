//! Timeline layout configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Layout and interaction tunables for a timeline.
///
/// Every field has a default, so a partial JSON document is enough to
/// override a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Height of an activity bar in pixels.
    pub activity_height: f64,
    /// Vertical gap between activity lanes in pixels.
    pub activity_row_padding: f64,
    /// Minimum drawn width of an activity bar, so zero-length activities stay clickable.
    pub min_activity_width: f64,
    /// Font size for activity and x-range labels.
    pub label_font_size: f64,
    /// Gap between an activity bar and its label.
    pub label_gap: f64,
    /// Default radius of line-layer markers.
    pub marker_radius: f64,
    /// Pixel radius used when hovering point-like layers.
    pub hover_tolerance_px: f64,
    /// Height of x-range bands.
    pub xrange_height: f64,
    /// Margin kept on each side of a truncated x-range label.
    pub xrange_label_padding: f64,
    /// Minimum pixel spacing between two time-axis ticks.
    pub tick_min_spacing_px: f64,
    /// Font size of axis tick labels.
    pub tick_font_size: f64,
    /// Recursion bound when walking the activity parent/child forest.
    pub max_tree_depth: usize,
    /// Height given to rows that do not specify one.
    pub default_row_height: f64,
    /// Factor applied to the view span per zoom-in step.
    pub zoom_step: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            activity_height: 20.0,
            activity_row_padding: 4.0,
            min_activity_width: 5.0,
            label_font_size: 10.0,
            label_gap: 4.0,
            marker_radius: 2.0,
            hover_tolerance_px: 6.0,
            xrange_height: 30.0,
            xrange_label_padding: 4.0,
            tick_min_spacing_px: 120.0,
            tick_font_size: 10.0,
            max_tree_depth: 32,
            default_row_height: 50.0,
            zoom_step: 0.8,
        }
    }
}

impl TimelineConfig {
    /// Parse a configuration document.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Vertical pitch of one activity lane (bar height plus padding).
    pub fn activity_row_height(&self) -> f64 {
        self.activity_height + self.activity_row_padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimelineError;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = TimelineConfig::from_json(r#"{ "activity_height": 12 }"#).expect("config");
        assert_eq!(config.activity_height, 12.0);
        assert_eq!(config.min_activity_width, 5.0);
        assert_eq!(config.activity_row_height(), 16.0);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = TimelineConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, TimelineError::Config(_)));
    }
}
