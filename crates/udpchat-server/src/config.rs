//! Server configuration.

use udpchat_protocol::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WINDOW_SIZE};

use crate::error::{ServerError, ServerResult};

/// Default maximum number of registered clients.
pub const DEFAULT_MAX_CLIENTS: usize = 10;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host or IP address to bind.
    pub bind_address: String,

    /// UDP port to bind.
    pub port: u16,

    /// Maximum number of simultaneously registered clients.
    pub max_clients: usize,

    /// Window size. Stored and reported, no flow control is applied.
    pub window_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_CLIENTS,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration bound to `address:port`.
    pub fn new(bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            ..Default::default()
        }
    }

    /// Builder: set max clients.
    pub fn with_max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }

    /// Builder: set window size.
    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    /// Returns the `host:port` string handed to the socket layer.
    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Checks the configuration for values the server cannot run with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.bind_address.trim().is_empty() {
            return Err(ServerError::config("bind address must not be empty"));
        }
        if self.max_clients == 0 {
            return Err(ServerError::config("max_clients must be at least 1"));
        }
        Ok(())
    }
}
