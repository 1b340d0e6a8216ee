//! Client error types.

use std::fmt;

use udpchat_core::UsernameError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
    /// Server address could not be resolved or reached.
    Connection(String),
    /// Protocol/framing error.
    Protocol(String),
    /// Username cannot be carried on the wire.
    InvalidUsername(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Connection(msg) => write!(f, "connection error: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::InvalidUsername(msg) => write!(f, "invalid username: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<UsernameError> for ClientError {
    fn from(err: UsernameError) -> Self {
        Self::InvalidUsername(err.to_string())
    }
}
