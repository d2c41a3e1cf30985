//! Client -> Server message parsing.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// Parsed client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Set the display name. A missing or empty name means "use the default".
    Join {
        #[serde(default)]
        name: Option<String>,
    },
    /// Steering update: heading in radians and the boost flag.
    Input {
        angle: f64,
        #[serde(default)]
        boosting: bool,
    },
}

impl ClientMessage {
    /// Parse a client message from raw bytes.
    ///
    /// Messages longer than `max_len` bytes are rejected before decoding.
    pub fn parse(data: &[u8], max_len: usize) -> Result<Self, ProtocolError> {
        if data.len() > max_len {
            return Err(ProtocolError::Oversized {
                len: data.len(),
                max: max_len,
            });
        }

        let message: ClientMessage = serde_json::from_slice(data)?;
        match message {
            ClientMessage::Input { angle, .. } if !angle.is_finite() => {
                Err(ProtocolError::NonFiniteAngle)
            }
            message => Ok(message),
        }
    }
}
