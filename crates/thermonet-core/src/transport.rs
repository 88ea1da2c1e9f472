//! Datagram transport abstraction.
//!
//! The listener and the client are written against this trait so the same
//! code runs over a real UDP socket and over turmoil's simulated network.

use std::{io, net::SocketAddr};

/// An unreliable, unordered datagram socket.
pub trait DatagramTransport: Send + Sync {
    /// Attempt to receive one datagram without waiting for one to arrive.
    ///
    /// Returns `Ok(None)` when nothing is queued. Datagrams longer than `buf`
    /// are truncated.
    fn try_recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl std::future::Future<Output = io::Result<Option<(usize, SocketAddr)>>> + Send;

    /// Send one datagram to `target`.
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl std::future::Future<Output = io::Result<usize>> + Send;

    /// Address this transport is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}
