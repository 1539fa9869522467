use std::sync::Arc;

use gpui::{TextRun, Window, WindowTextSystem, font, px};

use crate::render::TextMeasurer;

/// Label measurer backed by a window's text system.
pub struct GpuiTextMeasurer {
    text_system: Arc<WindowTextSystem>,
}

impl GpuiTextMeasurer {
    /// Measure with the text system of `window`.
    pub fn new(window: &Window) -> Self {
        Self {
            text_system: Arc::clone(window.text_system()),
        }
    }
}

impl TextMeasurer for GpuiTextMeasurer {
    fn measure(&self, text: &str, size: f64) -> (f64, f64) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let run = TextRun {
            len: text.len(),
            font: font(".SystemUIFont"),
            color: gpui::black(),
            background_color: None,
            underline: None,
            strikethrough: None,
        };
        let shaped =
            self.text_system
                .shape_line(text.to_string().into(), px(size as f32), &[run], None);
        let width = f64::from(f32::from(shaped.width));
        let height = f64::from(f32::from(shaped.ascent + shaped.descent));
        (width, height.max(size * 1.2))
    }
}
