//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while framing or interpreting datagrams.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Outer packet frame could not be parsed.
    #[error("malformed packet: {reason}")]
    MalformedPacket { reason: String },

    /// Inner message frame could not be parsed or does not match its command's shape.
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// Command name is not in the registry for the receiving role.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Encoded packet does not fit in a single datagram.
    #[error("datagram too large: {size} bytes (max: {max})")]
    DatagramTooLarge { size: usize, max: usize },
}

impl ProtocolError {
    /// Creates a malformed packet error.
    pub fn malformed_packet(reason: impl Into<String>) -> Self {
        Self::MalformedPacket {
            reason: reason.into(),
        }
    }

    /// Creates a malformed message error.
    pub fn malformed_message(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }
}
