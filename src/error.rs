//! Error types for playlist and scheduler operations

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Index outside the valid range of the playlist or queue
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Operation requested in a state that cannot satisfy it
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// External resolver failed to produce an audio resource
    #[error("failed to resolve '{title}': {reason}")]
    Resolution { title: String, reason: String },

    /// Audio transport failed to start or control playback
    #[error("transport error: {0}")]
    Transport(String),

    /// Notification channel failed (best-effort, never fatal)
    #[error("notifier error: {0}")]
    Notify(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
