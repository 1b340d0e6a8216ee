//! Packet/message framing and the chat command registry.
//!
//! Every UDP datagram carries exactly one textual packet, which wraps one
//! application message:
//!
//! ```text
//! packet  := "<kind> <sequence> <message>"
//! message := "<command> <arg_count> <body>"
//! ```
//!
//! The packet layer is transport bookkeeping and never looks inside the
//! message. The message layer is interpreted through the typed
//! [`ClientCommand`] and [`ServerCommand`] registries, which check the
//! declared argument count against each command's shape.
//!
//! # Example
//!
//! ```rust
//! use udpchat_protocol::{ClientCommand, Packet, PacketKind};
//!
//! let join = ClientCommand::Join { username: "alice".into() };
//! let packet = Packet::data(0, join.to_message());
//! let wire = packet.encode();
//! assert_eq!(wire, "data 0 join 1 alice");
//!
//! let decoded = Packet::decode(&wire).unwrap();
//! assert_eq!(decoded.kind, PacketKind::Data);
//! let message = decoded.message().unwrap();
//! assert_eq!(ClientCommand::from_message(&message).unwrap(), join);
//! ```

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{
    Message, Packet, PacketKind, decode_datagram, decode_message, decode_packet, encode_message,
    encode_packet,
};
pub use types::{ClientCommand, ServerCommand};

/// Largest datagram either side sends or reads.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Default server port.
pub const DEFAULT_PORT: u16 = 15000;

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default window size. Accepted and stored, never enforced.
pub const DEFAULT_WINDOW_SIZE: u32 = 3;
