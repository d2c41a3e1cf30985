//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Message too large: {len} bytes (max {max})")]
    Oversized { len: usize, max: usize },

    #[error("Input angle is not a finite number")]
    NonFiniteAngle,
}
