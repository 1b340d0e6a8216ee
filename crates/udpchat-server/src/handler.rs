//! Request dispatch and registry handlers.
//!
//! The handler owns the [`ClientRegistry`] and turns each inbound datagram
//! into zero or more [`Reply`] values. It performs no IO itself, which keeps
//! every registry rule testable without sockets.

use std::net::SocketAddr;

use tracing::{debug, error, info, warn};

use udpchat_core::dedup_preserving_order;
use udpchat_protocol::{ClientCommand, PacketKind, ProtocolError, ServerCommand, decode_datagram};

use crate::config::ServerConfig;
use crate::error::JoinError;
use crate::registry::ClientRegistry;

/// A server command addressed to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Destination address.
    pub addr: SocketAddr,
    /// Command to send.
    pub command: ServerCommand,
}

impl Reply {
    /// Creates a reply.
    pub fn new(addr: SocketAddr, command: ServerCommand) -> Self {
        Self { addr, command }
    }
}

/// Routes decoded client commands to the registry handlers.
#[derive(Debug)]
pub struct RequestHandler {
    registry: ClientRegistry,
}

impl RequestHandler {
    /// Creates a handler with an empty registry sized from `config`.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_registry(ClientRegistry::new(config.max_clients))
    }

    /// Creates a handler around an existing registry.
    pub fn with_registry(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Read access to the registry.
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Decodes one datagram and dispatches it.
    ///
    /// Packet-layer errors are logged and dropped. Message-layer errors are
    /// answered with `err_unknown_message`.
    #[tracing::instrument(skip_all, fields(from = %from))]
    pub fn handle_datagram(&mut self, from: SocketAddr, data: &[u8]) -> Vec<Reply> {
        let packet = match decode_datagram(data) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Dropping malformed packet");
                return Vec::new();
            }
        };

        if packet.kind != PacketKind::Data {
            debug!(kind = %packet.kind, sequence = packet.sequence, "Ignoring non-data packet");
            return Vec::new();
        }

        let command = packet
            .message()
            .and_then(|message| ClientCommand::from_message(&message));
        match command {
            Ok(command) => self.handle(from, command),
            Err(e) => self.handle_unknown(from, &e),
        }
    }

    /// Dispatches a typed command.
    pub fn handle(&mut self, from: SocketAddr, command: ClientCommand) -> Vec<Reply> {
        debug!(command = command.name(), "Handling command");
        match command {
            ClientCommand::Join { username } => self.handle_join(from, &username),
            ClientCommand::RequestUsersList => self.handle_request_users_list(from),
            ClientCommand::SendMessage { recipients, text } => {
                self.handle_send_message(from, &recipients, &text)
            }
            ClientCommand::Disconnect => self.handle_disconnect(from),
        }
    }

    /// Registers `username` for `from`, or replies with the refusal.
    pub fn handle_join(&mut self, from: SocketAddr, username: &str) -> Vec<Reply> {
        match self.registry.join(username, from) {
            Ok(()) => {
                info!(username, "join");
                Vec::new()
            }
            Err(JoinError::CapacityExceeded { capacity }) => {
                info!(username, capacity, "Join refused: server full");
                vec![Reply::new(from, ServerCommand::ErrServerFull)]
            }
            Err(e @ (JoinError::UsernameTaken { .. } | JoinError::AddressInUse { .. })) => {
                info!(username, reason = %e, "Join refused: username not available");
                vec![Reply::new(from, ServerCommand::ErrUsernameUnavailable)]
            }
        }
    }

    /// Replies with every registered username, sorted.
    ///
    /// Unregistered requesters are answered too.
    pub fn handle_request_users_list(&self, from: SocketAddr) -> Vec<Reply> {
        let requester = self.registry.username_for(from).unwrap_or("<unregistered>");
        info!(requester, "request_users_list");

        vec![Reply::new(
            from,
            ServerCommand::ResponseUsersList {
                usernames: self.registry.usernames(),
            },
        )]
    }

    /// Forwards `text` once to each distinct registered recipient.
    ///
    /// Unknown recipients are logged and skipped without telling the sender.
    pub fn handle_send_message(
        &self,
        from: SocketAddr,
        recipients: &[String],
        text: &str,
    ) -> Vec<Reply> {
        let Some(sender) = self.registry.username_for(from) else {
            warn!("Dropping message from unregistered address");
            return Vec::new();
        };
        info!(sender, "msg");

        let mut replies = Vec::new();
        for recipient in dedup_preserving_order(recipients) {
            match self.registry.addr_of(&recipient) {
                Some(addr) => replies.push(Reply::new(
                    addr,
                    ServerCommand::ForwardedMessage {
                        sender: sender.to_string(),
                        text: text.to_string(),
                    },
                )),
                None => warn!(sender, recipient = %recipient, "msg to non-existent user"),
            }
        }
        replies
    }

    /// Removes the client registered at `from`.
    pub fn handle_disconnect(&mut self, from: SocketAddr) -> Vec<Reply> {
        match self.registry.remove_by_addr(from) {
            Some(username) => info!(username = %username, "disconnected"),
            None => error!("Disconnect from unregistered address: no address found"),
        }
        Vec::new()
    }

    fn handle_unknown(&self, from: SocketAddr, e: &ProtocolError) -> Vec<Reply> {
        match self.registry.username_for(from) {
            Some(username) => warn!(username, error = %e, "Client sent unknown command"),
            None => warn!(error = %e, "Unknown command from unregistered address"),
        }
        vec![Reply::new(from, ServerCommand::ErrUnknownMessage)]
    }
}
