//! UDP listener and dispatch loop.
//!
//! The server is purely reactive: one loop receives a datagram, hands it to
//! the [`RequestHandler`], and sends whatever replies come back.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

use udpchat_protocol::{MAX_DATAGRAM_SIZE, Packet, ProtocolError};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{Reply, RequestHandler};

/// UDP socket server for the chat protocol.
pub struct UdpServer {
    /// Server configuration.
    config: ServerConfig,
    /// Bound UDP socket.
    socket: UdpSocket,
    /// Sequence number stamped on the next outbound packet.
    sequence: AtomicU32,
}

impl UdpServer {
    /// Binds a server socket using the given configuration.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;

        let target = config.bind_target();
        let addr = tokio::net::lookup_host(&target)
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ServerError::unresolved_address(target.clone()))?;
        let socket = UdpSocket::bind(addr).await?;

        info!(
            addr = %socket.local_addr()?,
            max_clients = config.max_clients,
            window_size = config.window_size,
            "Chat server listening"
        );

        Ok(Self {
            config,
            socket,
            sequence: AtomicU32::new(0),
        })
    }

    /// Returns the configuration the server was bound with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the bound local address.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Encodes and sends a single reply.
    pub async fn send(&self, reply: &Reply) -> ServerResult<()> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let wire = Packet::data(sequence, reply.command.to_message()).encode();

        if wire.len() > MAX_DATAGRAM_SIZE {
            return Err(ProtocolError::DatagramTooLarge {
                size: wire.len(),
                max: MAX_DATAGRAM_SIZE,
            }
            .into());
        }

        self.socket.send_to(wire.as_bytes(), reply.addr).await?;
        debug!(to = %reply.addr, command = reply.command.name(), sequence, "Sent reply");
        Ok(())
    }

    /// Runs the receive/dispatch loop.
    ///
    /// Runs until the task is cancelled. Receive errors and per-reply send
    /// errors are logged and the loop continues.
    pub async fn run(&self, handler: &mut RequestHandler) -> ServerResult<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    error!(error = %e, "Failed to receive datagram");
                    continue;
                }
            };

            for reply in handler.handle_datagram(from, &buf[..len]) {
                if let Err(e) = self.send(&reply).await {
                    warn!(
                        to = %reply.addr,
                        command = reply.command.name(),
                        error = %e,
                        "Failed to send reply"
                    );
                }
            }
        }
    }

    /// Runs the dispatch loop until the shutdown future completes.
    pub async fn run_until_shutdown<S>(
        &self,
        handler: &mut RequestHandler,
        shutdown: S,
    ) -> ServerResult<()>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!(clients = handler.registry().len(), "Shutdown signal received");
                Ok(())
            }
        }
    }
}
