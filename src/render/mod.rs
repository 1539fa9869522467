//! Rendering primitives and the canvas abstraction.
//!
//! Layers draw through the [`Canvas`] trait. [`RenderList`] records
//! backend-agnostic commands for a presenting backend (such as the GPUI
//! backend) to paint, and [`crate::surface::PixelCanvas`] rasterizes the same
//! calls into an RGBA buffer.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};
use crate::geom::{ScreenPoint, ScreenRect};

/// Largest canvas edge accepted by [`check_surface_size`].
pub const MAX_SURFACE_DIM: u32 = 32_767;

/// RGBA color.
///
/// All components are expected to be in the 0.0..=1.0 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Create a new color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create an opaque color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            1.0,
        )
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::from_rgb8(r, g, b))
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Quantize to 8-bit RGBA.
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        ]
    }
}

fn channel_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Line stroke styling.
///
/// The width is expressed in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
        }
    }
}

/// Horizontal anchoring of a text run relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    /// Position is the left edge.
    #[default]
    Left,
    /// Position is the horizontal center.
    Center,
    /// Position is the right edge.
    Right,
}

/// Text styling.
///
/// Text positions refer to the vertical middle of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Text color.
    pub color: Color,
    /// Font size in pixels.
    pub size: f64,
    /// Horizontal anchoring.
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 12.0,
            align: TextAlign::Left,
        }
    }
}

/// Measures text runs for layout.
pub trait TextMeasurer {
    /// Return `(width, height)` of `text` drawn at `size` pixels.
    fn measure(&self, text: &str, size: f64) -> (f64, f64);
}

/// Deterministic measurer assuming every glyph has the same advance.
///
/// Used for headless rendering and as the default when no backend measurer
/// is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthMeasurer {
    /// Glyph advance as a fraction of the font size.
    pub advance: f64,
}

impl Default for FixedWidthMeasurer {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasurer for FixedWidthMeasurer {
    fn measure(&self, text: &str, size: f64) -> (f64, f64) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let glyphs = text.chars().count() as f64;
        (glyphs * size * self.advance, size * 1.2)
    }
}

/// Drawing target shared by the visible and hidden surfaces.
pub trait Canvas {
    /// Resize the canvas and drop its content.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Current size in pixels.
    fn size(&self) -> (u32, u32);

    /// Drop all content.
    fn clear(&mut self);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: ScreenRect, color: Color);

    /// Fill a circle.
    fn fill_circle(&mut self, center: ScreenPoint, radius: f64, color: Color);

    /// Stroke an open polyline.
    fn stroke_path(&mut self, points: &[ScreenPoint], style: LineStyle);

    /// Draw a text run.
    fn fill_text(&mut self, position: ScreenPoint, text: &str, style: &TextStyle);

    /// Stroke a single segment.
    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, style: LineStyle) {
        self.stroke_path(&[from, to], style);
    }
}

/// Validate a requested canvas size.
pub fn check_surface_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
        return Err(TimelineError::SurfaceUnavailable { width, height });
    }
    Ok(())
}

/// Render command list.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Fill a rectangle.
    Rect {
        /// Rectangle bounds.
        rect: ScreenRect,
        /// Fill color.
        color: Color,
    },
    /// Fill a circle.
    Circle {
        /// Circle center.
        center: ScreenPoint,
        /// Circle radius.
        radius: f64,
        /// Fill color.
        color: Color,
    },
    /// Stroke a polyline.
    Path {
        /// Path vertices.
        points: Vec<ScreenPoint>,
        /// Stroke styling.
        style: LineStyle,
    },
    /// Draw text.
    Text {
        /// Text position.
        position: ScreenPoint,
        /// Text content.
        text: String,
        /// Text styling.
        style: TextStyle,
    },
}

/// Recorded drawing of one surface.
#[derive(Debug, Default, Clone)]
pub struct RenderList {
    width: u32,
    height: u32,
    commands: Vec<RenderCommand>,
}

impl RenderList {
    /// Create an empty render list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a render command.
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Access all render commands.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Iterate over the text runs drawn on this surface.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            RenderCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Canvas for RenderList {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        check_surface_size(width, height)?;
        self.width = width;
        self.height = height;
        self.commands.clear();
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        self.push(RenderCommand::Rect { rect, color });
    }

    fn fill_circle(&mut self, center: ScreenPoint, radius: f64, color: Color) {
        self.push(RenderCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn stroke_path(&mut self, points: &[ScreenPoint], style: LineStyle) {
        if points.len() < 2 {
            return;
        }
        self.push(RenderCommand::Path {
            points: points.to_vec(),
            style,
        });
    }

    fn fill_text(&mut self, position: ScreenPoint, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        self.push(RenderCommand::Text {
            position,
            text: text.to_string(),
            style: style.clone(),
        });
    }
}

/// Split a polyline into runs clipped to `clip`.
pub(crate) fn clip_polyline(points: &[ScreenPoint], clip: ScreenRect) -> Vec<Vec<ScreenPoint>> {
    let mut runs = Vec::new();
    let mut current: Vec<ScreenPoint> = Vec::new();
    for window in points.windows(2) {
        match clip_segment(window[0], window[1], clip) {
            Some((start, end)) => {
                if current.last() != Some(&start) {
                    if current.len() >= 2 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(start);
                }
                current.push(end);
            }
            None => {
                if current.len() >= 2 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

fn clip_segment(
    mut start: ScreenPoint,
    mut end: ScreenPoint,
    rect: ScreenRect,
) -> Option<(ScreenPoint, ScreenPoint)> {
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const TOP: u8 = 4;
    const BOTTOM: u8 = 8;

    let region = |point: ScreenPoint| -> u8 {
        let mut code = 0;
        if point.x < rect.min.x {
            code |= LEFT;
        } else if point.x > rect.max.x {
            code |= RIGHT;
        }
        if point.y < rect.min.y {
            code |= TOP;
        } else if point.y > rect.max.y {
            code |= BOTTOM;
        }
        code
    };

    let mut out_start = region(start);
    let mut out_end = region(end);

    loop {
        if (out_start | out_end) == 0 {
            return Some((start, end));
        }
        if (out_start & out_end) != 0 {
            return None;
        }

        let out_code = if out_start != 0 { out_start } else { out_end };
        let (x, y) = if (out_code & TOP) != 0 {
            (
                start.x + (end.x - start.x) * (rect.min.y - start.y) / (end.y - start.y),
                rect.min.y,
            )
        } else if (out_code & BOTTOM) != 0 {
            (
                start.x + (end.x - start.x) * (rect.max.y - start.y) / (end.y - start.y),
                rect.max.y,
            )
        } else if (out_code & RIGHT) != 0 {
            (
                rect.max.x,
                start.y + (end.y - start.y) * (rect.max.x - start.x) / (end.x - start.x),
            )
        } else {
            (
                rect.min.x,
                start.y + (end.y - start.y) * (rect.min.x - start.x) / (end.x - start.x),
            )
        };

        let new_point = ScreenPoint::new(x, y);
        if out_code == out_start {
            start = new_point;
            out_start = region(start);
        } else {
            end = new_point;
            out_end = region(end);
        }
    }
}
