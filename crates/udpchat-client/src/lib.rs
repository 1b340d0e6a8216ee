//! Interactive chat client: session state, input commands, rendering.
//!
//! This crate provides the `udpchat` command-line client. A
//! [`ClientSession`] holds the username and session state, a [`ChatSocket`]
//! carries commands to one server, and [`run_session`] drives the input and
//! receive loops until the session ends.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod socket;

pub use cli::{Cli, SessionSettings};
pub use config::ClientConfig;
pub use dispatch::run_session;
pub use error::{ClientError, ClientResult};
pub use session::{ClientSession, SessionState};
pub use socket::ChatSocket;
