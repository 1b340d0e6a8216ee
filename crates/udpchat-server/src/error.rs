//! Server error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (socket bind, send, receive).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (framing, oversize datagram).
    #[error("Protocol error: {0}")]
    Protocol(#[from] udpchat_protocol::ProtocolError),

    /// Bind address did not resolve to any socket address.
    #[error("Could not resolve bind address: {address}")]
    UnresolvedAddress { address: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an unresolved address error.
    pub fn unresolved_address(address: impl Into<String>) -> Self {
        Self::UnresolvedAddress {
            address: address.into(),
        }
    }
}

/// Reasons a join request is refused. The registry is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// The registry already holds the configured maximum of clients.
    #[error("server full ({capacity} clients)")]
    CapacityExceeded { capacity: usize },

    /// Another client already registered this username.
    #[error("username {username:?} is already taken")]
    UsernameTaken { username: String },

    /// The requesting address is already registered under another username.
    #[error("{addr} is already registered as {username:?}")]
    AddressInUse { addr: SocketAddr, username: String },
}
