use crate::geom::ScreenPoint;

/// Placement of one row inside the view, in view-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RowSlot {
    pub(crate) id: String,
    pub(crate) top: f64,
    pub(crate) height: f64,
}

impl RowSlot {
    pub(crate) fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.height
    }

    pub(crate) fn local(&self, point: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(point.x, point.y - self.top)
    }
}

/// Layout computed during prepaint and consumed by paint.
#[derive(Debug, Clone, Default)]
pub(crate) struct TimelineFrame {
    pub(crate) origin: ScreenPoint,
    pub(crate) axis_height: f64,
    pub(crate) rows: Vec<RowSlot>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TimelineUiState {
    pub(crate) frame: TimelineFrame,
    /// Row that received the last left press; moves and release go to it.
    pub(crate) captured: Option<String>,
    pub(crate) hovered: Option<String>,
    pub(crate) brush_start: Option<f64>,
    pub(crate) last_cursor: Option<ScreenPoint>,
    pub(crate) measurer_installed: bool,
}

impl TimelineUiState {
    /// Convert a window position to view-local pixels.
    pub(crate) fn to_local(&self, position: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(
            position.x - self.frame.origin.x,
            position.y - self.frame.origin.y,
        )
    }

    pub(crate) fn row_at(&self, local: ScreenPoint) -> Option<&RowSlot> {
        self.frame.rows.iter().find(|slot| slot.contains_y(local.y))
    }

    pub(crate) fn row(&self, id: &str) -> Option<&RowSlot> {
        self.frame.rows.iter().find(|slot| slot.id == id)
    }
}
