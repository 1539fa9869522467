//! Semantic events emitted to the host.

use serde::{Deserialize, Serialize};

use crate::model::{Point, PointKindTag};
use crate::view::TimeRange;

/// External payload dropped onto a row, e.g. a new-activity template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    /// Type name of the item to create.
    pub type_name: String,
    /// Free-form arguments forwarded untouched.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl DragPayload {
    /// Payload carrying only a type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            arguments: serde_json::Value::Null,
        }
    }
}

/// Event emitted by a timeline for the host to act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimelineEvent {
    /// The set of points under the cursor changed (possibly to empty).
    HoverChanged {
        /// Row the cursor is over.
        row_id: String,
        /// Hovered points, topmost layer last.
        points: Vec<Point>,
    },
    /// A point was clicked.
    Selected {
        /// Row of the point.
        row_id: String,
        /// Point id.
        id: String,
        /// Point kind.
        kind: PointKindTag,
    },
    /// A payload was dropped onto a row that accepts it.
    Created {
        /// Target row.
        row_id: String,
        /// Kind of point to create.
        kind: PointKindTag,
        /// Time under the cursor, in epoch milliseconds.
        at_time: f64,
        /// Dropped payload.
        payload: DragPayload,
    },
    /// Provisional value during a drag.
    Updated {
        /// Row of the point.
        row_id: String,
        /// Point id.
        id: String,
        /// Point kind.
        kind: PointKindTag,
        /// The point at its provisional position.
        value: Point,
    },
    /// Final value of a drag that moved the point.
    Committed {
        /// Row of the point.
        row_id: String,
        /// Point id.
        id: String,
        /// Point kind.
        kind: PointKindTag,
        /// The point at its final position.
        value: Point,
    },
    /// A row grew to fit its packed content, or shrank back to its own height.
    RowResized {
        /// Resized row.
        row_id: String,
        /// New drawing height in pixels.
        new_height: f64,
    },
    /// A draw pass added, removed or changed guide lines on a row.
    GuidesChanged {
        /// Row of the guides.
        row_id: String,
        /// Guides drawn for the first time.
        added: Vec<String>,
        /// Guides no longer drawn.
        removed: Vec<String>,
        /// Guides redrawn with a new value, label or color.
        changed: Vec<String>,
    },
    /// A zoom, pan or brush gesture asks the host for a new view window.
    ViewTimeRangeRequested(TimeRange),
    /// A row could not be drawn at all.
    RowFailed {
        /// Failed row.
        row_id: String,
        /// Human-readable failure.
        reason: String,
    },
}

impl TimelineEvent {
    /// Row the event belongs to, if any.
    pub fn row_id(&self) -> Option<&str> {
        match self {
            Self::HoverChanged { row_id, .. }
            | Self::Selected { row_id, .. }
            | Self::Created { row_id, .. }
            | Self::Updated { row_id, .. }
            | Self::Committed { row_id, .. }
            | Self::RowResized { row_id, .. }
            | Self::GuidesChanged { row_id, .. }
            | Self::RowFailed { row_id, .. } => Some(row_id),
            Self::ViewTimeRangeRequested(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_a_tag() {
        let event = TimelineEvent::RowResized {
            row_id: "r".to_string(),
            new_height: 72.0,
        };
        let json = serde_json::to_value(&event).expect("json");
        assert_eq!(json["event"], "row_resized");
        assert_eq!(json["new_height"], 72.0);
        assert_eq!(event.row_id(), Some("r"));
    }

    #[test]
    fn payload_arguments_default_to_null() {
        let payload: DragPayload =
            serde_json::from_str(r#"{ "type_name": "PeelBanana" }"#).expect("payload");
        assert_eq!(payload, DragPayload::new("PeelBanana"));
    }
}
