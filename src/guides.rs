//! Guide lines: fixed value markers and fixed time markers.
//!
//! Guides are retained between draw passes and reconciled against the row's
//! latest guide list by id, so each pass knows which guides appeared,
//! disappeared or changed instead of rebuilding them blindly.

use crate::geom::ScreenPoint;
use crate::model::{HorizontalGuide, Row, VerticalGuide};
use crate::render::{Canvas, Color, LineStyle, TextAlign, TextStyle};
use crate::scale::{TimeScale, ValueScale};
use crate::style::Theme;

/// Anything identified by a stable guide id.
pub trait Guide: Clone + PartialEq {
    /// Stable id.
    fn id(&self) -> &str;
}

impl Guide for HorizontalGuide {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Guide for VerticalGuide {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Ids touched by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideChanges {
    /// Guides that were not drawn before.
    pub added: Vec<String>,
    /// Guides that are no longer present.
    pub removed: Vec<String>,
    /// Guides whose value, label or color changed.
    pub changed: Vec<String>,
}

impl GuideChanges {
    /// Check whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn extend(&mut self, other: GuideChanges) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.changed.extend(other.changed);
    }
}

/// Retained guides of one kind, in host order.
#[derive(Debug, Clone)]
pub struct GuideSet<T> {
    retained: Vec<T>,
}

impl<T> Default for GuideSet<T> {
    fn default() -> Self {
        Self {
            retained: Vec::new(),
        }
    }
}

impl<T: Guide> GuideSet<T> {
    /// Reconcile against the latest guides.
    pub fn sync(&mut self, next: &[T]) -> GuideChanges {
        let mut changes = GuideChanges::default();
        for old in &self.retained {
            if !next.iter().any(|guide| guide.id() == old.id()) {
                changes.removed.push(old.id().to_string());
            }
        }
        for guide in next {
            match self.retained.iter().find(|old| old.id() == guide.id()) {
                None => changes.added.push(guide.id().to_string()),
                Some(old) if old != guide => changes.changed.push(guide.id().to_string()),
                Some(_) => {}
            }
        }
        self.retained = next.to_vec();
        changes
    }

    /// Guides retained by the last reconciliation.
    pub fn retained(&self) -> &[T] {
        &self.retained
    }
}

/// Both guide kinds of one row.
#[derive(Debug, Clone, Default)]
pub struct GuideTracker {
    horizontal: GuideSet<HorizontalGuide>,
    vertical: GuideSet<VerticalGuide>,
}

impl GuideTracker {
    /// Reconcile against a row's guides.
    pub fn sync(&mut self, row: &Row) -> GuideChanges {
        let mut changes = self.horizontal.sync(&row.horizontal_guides);
        changes.extend(self.vertical.sync(&row.vertical_guides));
        changes
    }

    /// Draw the retained guides.
    ///
    /// Horizontal guides whose axis has no domain yet and vertical guides
    /// outside the view are skipped.
    pub fn draw(
        &self,
        canvas: &mut impl Canvas,
        row: &Row,
        time: &TimeScale,
        height: f64,
        theme: &Theme,
        font_size: f64,
    ) {
        let width = time.width();
        for guide in self.horizontal.retained() {
            let Some(scale) = row
                .axis(&guide.y_axis_id)
                .and_then(|axis| ValueScale::from_axis_domain(&axis.scale_domain, height))
            else {
                continue;
            };
            let y = scale.forward(guide.value);
            if !(0.0..=height).contains(&y) {
                continue;
            }
            let color = guide.color.unwrap_or(theme.horizontal_guide);
            canvas.line(ScreenPoint::new(0.0, y), ScreenPoint::new(width, y), stroke(color));
            let anchor = ScreenPoint::new(width - 4.0, y - font_size * 0.75);
            label(canvas, anchor, &guide.label, color, TextAlign::Right, font_size);
        }

        let view = time.view();
        for guide in self.vertical.retained() {
            if !view.contains(guide.time) {
                continue;
            }
            let x = time.forward(guide.time);
            let color = guide.color.unwrap_or(theme.vertical_guide);
            canvas.line(ScreenPoint::new(x, 0.0), ScreenPoint::new(x, height), stroke(color));
            let anchor = ScreenPoint::new(x + 4.0, font_size * 0.75);
            label(canvas, anchor, &guide.label, color, TextAlign::Left, font_size);
        }
    }
}

fn stroke(color: Color) -> LineStyle {
    LineStyle { color, width: 1.0 }
}

fn label(
    canvas: &mut impl Canvas,
    at: ScreenPoint,
    text: &str,
    color: Color,
    align: TextAlign,
    size: f64,
) {
    if text.is_empty() {
        return;
    }
    canvas.fill_text(at, text, &TextStyle { color, size, align });
}
