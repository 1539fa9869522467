//! Screen-space geometric primitives.
//!
//! All coordinates are logical pixels relative to the drawing surface they
//! belong to, with the origin at the top-left corner and Y growing downward.

use serde::{Deserialize, Serialize};

/// A point in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// X value in screen pixels.
    pub x: f64,
    /// Y value in screen pixels.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    pub fn distance_sq(&self, other: ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A rectangle in screen space (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    /// Top-left corner.
    pub min: ScreenPoint,
    /// Bottom-right corner.
    pub max: ScreenPoint,
}

impl ScreenRect {
    /// Create a new screen rectangle from corners.
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from its origin and size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(
            ScreenPoint::new(x, y),
            ScreenPoint::new(x + width, y + height),
        )
    }

    /// Rectangle width in pixels.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Rectangle height in pixels.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Check whether the rectangle has positive area.
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Center of the rectangle.
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Check whether two rectangles overlap with positive area.
    pub fn intersects(&self, other: &ScreenRect) -> bool {
        !(self.max.x <= other.min.x
            || self.min.x >= other.max.x
            || self.max.y <= other.min.y
            || self.min.y >= other.max.y)
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &ScreenRect) -> ScreenRect {
        ScreenRect::new(
            ScreenPoint::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            ScreenPoint::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Swap corners so that `min` is the top-left one.
    pub fn normalized(&self) -> ScreenRect {
        ScreenRect::new(
            ScreenPoint::new(self.min.x.min(self.max.x), self.min.y.min(self.max.y)),
            ScreenPoint::new(self.min.x.max(self.max.x), self.min.y.max(self.max.y)),
        )
    }
}
