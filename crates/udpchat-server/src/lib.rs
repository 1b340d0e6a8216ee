//! Chat server: client registry, dispatch loop, signal handling.
//!
//! This crate provides the udpchat server that:
//! - keeps the authoritative username → address registry
//! - enforces capacity and username uniqueness on join
//! - fans chat messages out to deduplicated recipient lists
//! - answers undecodable requests with `err_unknown_message`
//!
//! # Example
//!
//! ```rust,no_run
//! use udpchat_server::{RequestHandler, ServerConfig, UdpServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let server = UdpServer::bind(config.clone()).await?;
//!     let mut handler = RequestHandler::new(&config);
//!     server.run(&mut handler).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
mod config;
mod error;
mod handler;
mod registry;
mod signals;
mod socket;

pub use cli::Cli;
pub use config::{DEFAULT_MAX_CLIENTS, ServerConfig};
pub use error::{JoinError, ServerError, ServerResult};
pub use handler::{Reply, RequestHandler};
pub use registry::ClientRegistry;
pub use signals::{ShutdownSignal, SignalHandler};
pub use socket::UdpServer;
