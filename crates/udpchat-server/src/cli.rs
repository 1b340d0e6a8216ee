//! Command-line interface definition.

use clap::Parser;

use udpchat_protocol::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WINDOW_SIZE};

use crate::config::{DEFAULT_MAX_CLIENTS, ServerConfig};

/// udpchat-server - UDP chat relay
#[derive(Debug, Parser)]
#[command(name = "udpchat-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, short, env = "UDPCHAT_ADDRESS", default_value = DEFAULT_HOST)]
    pub address: String,

    /// UDP port to bind
    #[arg(long, short, env = "UDPCHAT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Window size (accepted for compatibility, not enforced)
    #[arg(long, short, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window: u32,

    /// Maximum number of connected clients
    #[arg(long, default_value_t = DEFAULT_MAX_CLIENTS)]
    pub max_clients: usize,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

impl Cli {
    /// Builds the server configuration from the parsed flags.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(&self.address, self.port)
            .with_max_clients(self.max_clients)
            .with_window_size(self.window)
    }
}
