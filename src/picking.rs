//! Color-keyed picking.
//!
//! Every pickable shape is drawn twice: once in its real color on the visible
//! canvas and once in a unique synthetic color on a hidden [`PixelCanvas`].
//! Reading the hidden pixel under the cursor yields the key of the topmost
//! shape there, which resolves to the drawn target in O(1).

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TimelineError};
use crate::geom::{ScreenPoint, ScreenRect};
use crate::render::{Canvas, Color, RenderList};
use crate::surface::PixelCanvas;

/// Highest key the 24-bit RGB sequence can express.
const MAX_KEY: u32 = 0x00ff_ffff;
/// Smallest hidden circle radius that still covers a pixel center.
const MIN_PICK_RADIUS: f64 = 1.0;

/// Synthetic color identifying one pickable shape within a draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorKey(u32);

impl ColorKey {
    /// Decode a hidden-canvas pixel. Transparent pixels are background.
    pub fn from_pixel(pixel: [u8; 4]) -> Option<Self> {
        if pixel[3] == 0 {
            return None;
        }
        let value = u32::from(pixel[0]) | u32::from(pixel[1]) << 8 | u32::from(pixel[2]) << 16;
        (value != 0).then_some(Self(value))
    }

    /// Opaque color this key is drawn with.
    pub fn color(self) -> Color {
        let [r, g, b, _] = self.0.to_le_bytes();
        Color::from_rgb8(r, g, b)
    }

    /// Sequence number of the key within its pass.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, _] = self.0.to_le_bytes();
        write!(f, "rgb({r},{g},{b})")
    }
}

/// Deterministic, collision-free key sequence.
///
/// Keys count up from 1 with the low byte in the red channel; 0 is reserved
/// for the cleared background.
#[derive(Debug, Clone, Default)]
pub struct ColorKeyGenerator {
    issued: u32,
}

impl ColorKeyGenerator {
    /// Start a fresh sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the sequence for a new draw pass.
    pub fn reset(&mut self) {
        self.issued = 0;
    }

    /// Hand out the next unused key.
    pub fn next_key(&mut self) -> Result<ColorKey> {
        if self.issued >= MAX_KEY {
            return Err(TimelineError::ColorKeysExhausted {
                issued: self.issued,
            });
        }
        self.issued += 1;
        Ok(ColorKey(self.issued))
    }

    /// Number of keys handed out in the current pass.
    pub fn issued(&self) -> u32 {
        self.issued
    }
}

/// A visible canvas paired with its hidden picking canvas.
///
/// Targets are opaque indices chosen by the caller; a surface maps keys to
/// them for exactly one draw pass.
#[derive(Debug, Clone)]
pub struct PickingSurface<V = RenderList> {
    visible: V,
    hidden: PixelCanvas,
    keys: ColorKeyGenerator,
    targets: HashMap<ColorKey, usize>,
    exhausted: bool,
}

impl<V: Canvas + Default> Default for PickingSurface<V> {
    fn default() -> Self {
        Self::with_visible(V::default())
    }
}

impl<V: Canvas> PickingSurface<V> {
    /// Wrap a visible canvas. Both canvases are sized on the first pass.
    pub fn with_visible(visible: V) -> Self {
        Self {
            visible,
            hidden: PixelCanvas::default(),
            keys: ColorKeyGenerator::new(),
            targets: HashMap::new(),
            exhausted: false,
        }
    }

    /// Start a draw pass: size and clear both canvases and forget all keys.
    pub fn begin_pass(&mut self, width: u32, height: u32) -> Result<()> {
        if self.visible.size() == (width, height) && self.hidden.size() == (width, height) {
            self.visible.clear();
            self.hidden.clear();
        } else {
            self.visible.resize(width, height)?;
            self.hidden.resize(width, height)?;
        }
        self.keys.reset();
        self.targets.clear();
        self.exhausted = false;
        Ok(())
    }

    /// Register a target and get the key its shapes are drawn with.
    ///
    /// Returns `None` once the key space is exhausted; such targets still
    /// draw visibly but cannot be picked.
    pub fn register(&mut self, target: usize) -> Option<ColorKey> {
        match self.keys.next_key() {
            Ok(key) => {
                self.targets.insert(key, target);
                Some(key)
            }
            Err(err) => {
                if !self.exhausted {
                    tracing::warn!(error = %err, "hidden canvas cannot key more shapes");
                    self.exhausted = true;
                }
                None
            }
        }
    }

    /// Fill a rectangle on both canvases.
    pub fn fill_rect(&mut self, rect: ScreenRect, color: Color, key: Option<ColorKey>) {
        self.visible.fill_rect(rect, color);
        self.hidden_rect(rect, key);
    }

    /// Fill a circle on both canvases.
    pub fn fill_circle(
        &mut self,
        center: ScreenPoint,
        radius: f64,
        color: Color,
        key: Option<ColorKey>,
    ) {
        self.visible.fill_circle(center, radius, color);
        self.hidden_circle(center, radius, key);
    }

    /// Fill a rectangle on the hidden canvas only.
    pub fn hidden_rect(&mut self, rect: ScreenRect, key: Option<ColorKey>) {
        if let Some(key) = key {
            self.hidden.fill_rect(rect, key.color());
        }
    }

    /// Fill a circle on the hidden canvas only.
    ///
    /// The radius is floored so even tiny markers stay pickable at their center.
    pub fn hidden_circle(&mut self, center: ScreenPoint, radius: f64, key: Option<ColorKey>) {
        if let Some(key) = key {
            let radius = radius.max(MIN_PICK_RADIUS);
            self.hidden.fill_circle(center, radius, key.color());
        }
    }

    /// Resolve the target under a pixel, if any.
    pub fn pick(&self, point: ScreenPoint) -> Option<usize> {
        let pixel = self.hidden.pixel_at(point.x, point.y)?;
        let key = ColorKey::from_pixel(pixel)?;
        let target = self.targets.get(&key).copied();
        tracing::trace!(key = %key, ?target, "hidden canvas pick");
        target
    }

    /// Visible canvas, for drawing that is never picked.
    pub fn visible_mut(&mut self) -> &mut V {
        &mut self.visible
    }

    /// Visible canvas.
    pub fn visible(&self) -> &V {
        &self.visible
    }

    /// Hidden picking canvas.
    pub fn hidden(&self) -> &PixelCanvas {
        &self.hidden
    }

    /// Number of keys issued in the current pass.
    pub fn key_count(&self) -> u32 {
        self.keys.issued()
    }
}
