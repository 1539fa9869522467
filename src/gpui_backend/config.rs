/// Configuration for the GPUI timeline view.
#[derive(Debug, Clone)]
pub struct TimelineViewConfig {
    /// Vertical gap between stacked rows.
    pub row_gap: f64,
    /// Line height used to convert line-based scroll deltas to pixels.
    pub scroll_line_height: f32,
    /// Scroll deltas smaller than this are ignored.
    pub scroll_threshold_px: f32,
    /// Right-button drags narrower than this do not brush.
    pub brush_threshold_px: f64,
}

impl Default for TimelineViewConfig {
    fn default() -> Self {
        Self {
            row_gap: 1.0,
            scroll_line_height: 16.0,
            scroll_threshold_px: 0.5,
            brush_threshold_px: 4.0,
        }
    }
}
