//! Error types for timeline rendering.
//!
//! Degenerate input (empty point sets, missing axis domains) and picking
//! misses are not errors; they simply draw or resolve to nothing. The variants
//! here are the failures a host has to react to.

use thiserror::Error;

/// Errors surfaced to the host.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// A drawing surface could not be allocated, so the row cannot render at all.
    #[error("drawing surface unavailable for a {width}x{height} canvas")]
    SurfaceUnavailable {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The per-pass picking color sequence ran out of unique keys.
    #[error("picking color keys exhausted after {issued} shapes")]
    ColorKeysExhausted {
        /// Number of keys handed out in the pass.
        issued: u32,
    },

    /// A configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// A row id did not match any row of the timeline.
    #[error("unknown row: {0}")]
    UnknownRow(String),
}

/// Result type alias using [`TimelineError`].
pub type Result<T> = std::result::Result<T, TimelineError>;
