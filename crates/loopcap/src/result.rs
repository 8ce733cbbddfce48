//! Result and error types for loopcap.

use thiserror::Error;

/// Result type for loopcap operations
pub type LoopcapResult<T> = Result<T, LoopcapError>;

/// Errors that can occur while capturing or exporting
#[derive(Debug, Error)]
pub enum LoopcapError {
    /// The frame source could not be acquired or reports no geometry.
    ///
    /// Surfaced once at the point of failure; retry policy belongs to the
    /// caller.
    #[error("Capture unavailable: {message}")]
    CaptureUnavailable {
        /// Error message
        message: String,
    },

    /// Export was invoked with zero captured frames
    #[error("Nothing captured: the frame buffer is empty")]
    EmptySequence,

    /// The frame source failed to produce a snapshot mid-recording
    #[error("Snapshot failed: {message}")]
    Snapshot {
        /// Error message
        message: String,
    },

    /// The underlying GIF/PNG encoder could not produce output
    #[error("Encoding failed: {message}")]
    EncodingFailure {
        /// Error message
        message: String,
    },

    /// An operation was called in the wrong state (e.g. `start` twice on
    /// a single-use encoder)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// The export run observed a cancelled token at a yield point
    #[error("Export cancelled")]
    Cancelled,
}

impl LoopcapError {
    /// True if this error aborted an export run that may simply be retried
    /// with a fresh encoder.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::EncodingFailure { .. } | Self::Cancelled)
    }
}
