//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// udpchat - chat over UDP
#[derive(Debug, Parser)]
#[command(name = "udpchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Username to join with
    #[arg(long, short)]
    pub user: Option<String>,

    /// Server address
    #[arg(long, short)]
    pub address: Option<String>,

    /// Server port
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Window size (accepted for compatibility, not enforced)
    #[arg(long, short)]
    pub window: Option<u32>,

    /// Path to configuration file
    #[arg(long, short, env = "UDPCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

/// Effective settings after merging flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub username: String,
    pub address: String,
    pub port: u16,
    pub window_size: u32,
}

impl Cli {
    /// Loads the config file named by `--config`, or the default one.
    pub fn load_config(&self) -> ClientResult<ClientConfig> {
        match self.config {
            Some(ref path) => ClientConfig::load_from(path),
            None => ClientConfig::load(),
        }
    }

    /// Overlays the flags on `config`. A username must come from one of them.
    pub fn settings(&self, config: ClientConfig) -> ClientResult<SessionSettings> {
        let username = self.user.clone().or(config.username).ok_or_else(|| {
            ClientError::Config(format!(
                "no username given; pass --user or set `username` in {}",
                ClientConfig::default_path().display()
            ))
        })?;

        Ok(SessionSettings {
            username,
            address: self.address.clone().unwrap_or(config.server.address),
            port: self.port.unwrap_or(config.server.port),
            window_size: self.window.unwrap_or(config.server.window_size),
        })
    }
}
