//! UDP socket bound to one chat server.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::net::UdpSocket;
use tracing::debug;

use udpchat_protocol::{ClientCommand, MAX_DATAGRAM_SIZE, Packet};

use crate::error::{ClientError, ClientResult};

/// Client side of the chat transport.
///
/// Every outbound command is framed as a `data` packet and stamped with the
/// next sequence number. Only datagrams from the server address are handed
/// back by [`ChatSocket::recv`].
pub struct ChatSocket {
    socket: UdpSocket,
    server_addr: SocketAddr,
    sequence: AtomicU32,
}

impl ChatSocket {
    /// Resolves `host:port` and binds an ephemeral local port of the same
    /// address family.
    pub async fn connect(host: &str, port: u16) -> ClientResult<Self> {
        let server_addr = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| {
                ClientError::Connection(format!("failed to resolve {}:{}: {}", host, port, e))
            })?
            .next()
            .ok_or_else(|| {
                ClientError::Connection(format!("no address found for {}:{}", host, port))
            })?;

        let local = match server_addr.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };

        Self::bind_to(local, server_addr).await
    }

    /// Binds `local` and targets `server_addr` without name resolution.
    pub async fn bind_to(local: SocketAddr, server_addr: SocketAddr) -> ClientResult<Self> {
        let socket = UdpSocket::bind(local).await?;
        debug!(
            local = %socket.local_addr()?,
            server = %server_addr,
            "Client socket bound"
        );

        Ok(Self {
            socket,
            server_addr,
            sequence: AtomicU32::new(0),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Returns the bound local address.
    pub fn local_addr(&self) -> ClientResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Sends one command to the server.
    pub async fn send(&self, command: &ClientCommand) -> ClientResult<()> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let wire = Packet::data(sequence, command.to_message()).encode();

        if wire.len() > MAX_DATAGRAM_SIZE {
            return Err(ClientError::Protocol(format!(
                "packet too large: {} bytes (max: {})",
                wire.len(),
                MAX_DATAGRAM_SIZE
            )));
        }

        self.socket.send_to(wire.as_bytes(), self.server_addr).await?;
        debug!(command = command.name(), sequence, "Sent command");
        Ok(())
    }

    /// Receives the next datagram from the server into `buf`.
    ///
    /// Datagrams from any other peer are discarded.
    pub async fn recv(&self, buf: &mut [u8]) -> ClientResult<usize> {
        loop {
            let (len, from) = self.socket.recv_from(buf).await?;
            if from == self.server_addr {
                return Ok(len);
            }
            debug!(from = %from, "Discarding datagram from unknown peer");
        }
    }
}
