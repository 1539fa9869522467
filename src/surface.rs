//! Software RGBA rasterizer.
//!
//! Shapes are rasterized without anti-aliasing: a pixel is covered when its
//! center lies inside the shape. That keeps colors exact, which the hidden
//! picking surface depends on, and makes a pixel read-back agree with a
//! geometric containment test at pixel centers.

use crate::error::Result;
use crate::geom::{ScreenPoint, ScreenRect};
use crate::render::{Canvas, Color, LineStyle, TextStyle, check_surface_size};

/// Headless RGBA canvas.
#[derive(Debug, Clone, Default)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl PixelCanvas {
    /// Allocate a cleared canvas.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut canvas = Self::default();
        canvas.resize(width, height)?;
        Ok(canvas)
    }

    /// Read the pixel containing `(x, y)`.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<[u8; 4]> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let (px, py) = (x.floor() as u32, y.floor() as u32);
        self.pixel(px, py)
    }

    /// Read a pixel by integer index.
    pub fn pixel(&self, px: u32, py: u32) -> Option<[u8; 4]> {
        if px >= self.width || py >= self.height {
            return None;
        }
        self.pixels.get(self.offset(px, py)).copied()
    }

    /// Raw pixel rows, top to bottom.
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    fn offset(&self, px: u32, py: u32) -> usize {
        py as usize * self.width as usize + px as usize
    }

    fn blend(&mut self, px: u32, py: u32, color: [u8; 4]) {
        let offset = self.offset(px, py);
        let Some(dst) = self.pixels.get_mut(offset) else {
            return;
        };
        match color[3] {
            255 => *dst = color,
            0 => {}
            alpha => {
                let a = u32::from(alpha);
                let inv = 255 - a;
                for channel in 0..3 {
                    let mixed =
                        (u32::from(color[channel]) * a + u32::from(dst[channel]) * inv) / 255;
                    dst[channel] = mixed as u8;
                }
                dst[3] = (a + u32::from(dst[3]) * inv / 255).min(255) as u8;
            }
        }
    }

    /// Pixel index span whose centers fall in `[min, max)`.
    fn covered(&self, min: f64, max: f64, limit: u32) -> Option<(u32, u32)> {
        let first = (min - 0.5).ceil().max(0.0);
        let last = ((max - 0.5).ceil() - 1.0).min(f64::from(limit) - 1.0);
        if !(first <= last) {
            return None;
        }
        Some((first as u32, last as u32))
    }

    fn fill_where(&mut self, bounds: ScreenRect, color: Color, inside: impl Fn(f64, f64) -> bool) {
        let rgba = color.to_rgba8();
        let Some((x0, x1)) = self.covered(bounds.min.x, bounds.max.x + 1.0, self.width) else {
            return;
        };
        let Some((y0, y1)) = self.covered(bounds.min.y, bounds.max.y + 1.0, self.height) else {
            return;
        };
        for py in y0..=y1 {
            for px in x0..=x1 {
                if inside(f64::from(px) + 0.5, f64::from(py) + 0.5) {
                    self.blend(px, py, rgba);
                }
            }
        }
    }
}

impl Canvas for PixelCanvas {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        check_surface_size(width, height)?;
        self.width = width;
        self.height = height;
        self.pixels = vec![[0; 4]; width as usize * height as usize];
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        let rect = rect.normalized();
        let rgba = color.to_rgba8();
        let Some((x0, x1)) = self.covered(rect.min.x, rect.max.x, self.width) else {
            return;
        };
        let Some((y0, y1)) = self.covered(rect.min.y, rect.max.y, self.height) else {
            return;
        };
        for py in y0..=y1 {
            for px in x0..=x1 {
                self.blend(px, py, rgba);
            }
        }
    }

    fn fill_circle(&mut self, center: ScreenPoint, radius: f64, color: Color) {
        if !(radius > 0.0) {
            return;
        }
        let bounds = ScreenRect::new(
            ScreenPoint::new(center.x - radius, center.y - radius),
            ScreenPoint::new(center.x + radius, center.y + radius),
        );
        let radius_sq = radius * radius;
        self.fill_where(bounds, color, |x, y| {
            ScreenPoint::new(x, y).distance_sq(center) <= radius_sq
        });
    }

    fn stroke_path(&mut self, points: &[ScreenPoint], style: LineStyle) {
        let half = (style.width * 0.5).max(0.5);
        for window in points.windows(2) {
            let (a, b) = (window[0], window[1]);
            let bounds = ScreenRect::new(a, b).normalized();
            let bounds = ScreenRect::new(
                ScreenPoint::new(bounds.min.x - half, bounds.min.y - half),
                ScreenPoint::new(bounds.max.x + half, bounds.max.y + half),
            );
            self.fill_where(bounds, style.color, |x, y| {
                segment_distance_sq(ScreenPoint::new(x, y), a, b) <= half * half
            });
        }
    }

    // Glyphs are rasterized by the presenting backend; the pixel canvas only
    // carries shapes.
    fn fill_text(&mut self, _position: ScreenPoint, _text: &str, _style: &TextStyle) {}
}

fn segment_distance_sq(point: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return point.distance_sq(a);
    }
    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    point.distance_sq(ScreenPoint::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimelineError;

    const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

    #[test]
    fn rect_covers_pixel_centers_only() {
        let mut canvas = PixelCanvas::new(10, 10).expect("canvas");
        canvas.fill_rect(ScreenRect::from_xywh(2.0, 2.0, 3.0, 1.0), RED);
        assert_eq!(canvas.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(4, 2), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(5, 2), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(2, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn rect_is_clipped_to_canvas() {
        let mut canvas = PixelCanvas::new(4, 4).expect("canvas");
        canvas.fill_rect(ScreenRect::from_xywh(-10.0, -10.0, 100.0, 100.0), RED);
        assert!(canvas.pixels().iter().all(|pixel| *pixel == [255, 0, 0, 255]));
    }

    #[test]
    fn circle_matches_distance_test() {
        let mut canvas = PixelCanvas::new(20, 20).expect("canvas");
        let center = ScreenPoint::new(10.0, 10.0);
        canvas.fill_circle(center, 3.0, RED);
        for py in 0..20u32 {
            for px in 0..20u32 {
                let sample = ScreenPoint::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
                let inside = sample.distance_sq(center) <= 9.0;
                let painted = canvas.pixel(px, py) == Some([255, 0, 0, 255]);
                assert_eq!(inside, painted, "pixel {px},{py}");
            }
        }
    }

    #[test]
    fn translucent_fill_blends() {
        let mut canvas = PixelCanvas::new(1, 1).expect("canvas");
        canvas.fill_rect(ScreenRect::from_xywh(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        canvas.fill_rect(ScreenRect::from_xywh(0.0, 0.0, 1.0, 1.0), RED.with_alpha(0.5));
        let pixel = canvas.pixel(0, 0).expect("pixel");
        assert_eq!(pixel[0], 255);
        assert!(pixel[1] > 100 && pixel[1] < 150);
    }

    #[test]
    fn stroke_covers_segment() {
        let mut canvas = PixelCanvas::new(10, 10).expect("canvas");
        canvas.line(
            ScreenPoint::new(0.0, 5.5),
            ScreenPoint::new(10.0, 5.5),
            LineStyle {
                color: RED,
                width: 1.0,
            },
        );
        assert!((0..10).all(|px| canvas.pixel(px, 5) == Some([255, 0, 0, 255])));
        assert_eq!(canvas.pixel(3, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_sized_canvas_is_unavailable() {
        assert!(matches!(
            PixelCanvas::new(0, 5),
            Err(TimelineError::SurfaceUnavailable { width: 0, height: 5 })
        ));
    }
}
