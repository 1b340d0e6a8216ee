//! Client configuration.
//!
//! Settings live in an optional `config.toml` at
//! `~/.config/udpchat/config.toml` by default:
//!
//! ```toml
//! username = "alice"
//!
//! [server]
//! address = "chat.example.com"
//! port = 15000
//! window_size = 3
//! ```
//!
//! Command-line flags override anything set here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use udpchat_protocol::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WINDOW_SIZE};

use crate::error::{ClientError, ClientResult};

/// Configuration for the chat client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Username to join with.
    pub username: Option<String>,

    /// Server/connection settings.
    #[serde(default)]
    pub server: ServerSettings,
}

/// Server/connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server host name or address.
    pub address: String,

    /// Server UDP port.
    pub port: u16,

    /// Window size. Stored and logged only.
    pub window_size: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it is absent.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("udpchat")
            .join("config.toml")
    }
}
