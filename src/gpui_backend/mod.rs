//! GPUI integration for plan-timeline.
//!
//! This module provides a GPUI view that paints a [`Timeline`](crate::timeline::Timeline)
//! and forwards pointer, scroll and brush gestures to it.

#![allow(clippy::collapsible_if)]

mod config;
mod paint;
mod state;
mod text;
mod view;

pub use config::TimelineViewConfig;
pub use text::GpuiTextMeasurer;
pub use view::{GpuiTimelineView, TimelineHandle};
