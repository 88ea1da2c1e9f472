//! Simulated datagram transport.

use std::{io, net::SocketAddr, time::Duration};

use thermonet_core::DatagramTransport;
use turmoil::{ToSocketAddrs, net::UdpSocket};

/// Turmoil UDP socket.
#[derive(Debug)]
pub struct SimTransport {
    socket: UdpSocket,
}

impl SimTransport {
    /// Bind to an address on the current simulated host.
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        Ok(Self { socket: UdpSocket::bind(addr).await? })
    }
}

impl DatagramTransport for SimTransport {
    async fn try_recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        // A zero timeout polls the receive once; anything not already
        // delivered by the simulation counts as empty.
        match tokio::time::timeout(Duration::ZERO, self.socket.recv_from(buf)).await {
            Ok(received) => received.map(Some),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, target).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
