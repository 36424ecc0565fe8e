//! Codec error types.

use thiserror::Error;

/// Errors that can occur while encoding outbound frames.
///
/// Inbound frames never produce errors: anything that doesn't decode is
/// dropped.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Failed to serialize an intent
    #[error("Failed to encode intent: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
