//! Transport listener.
//!
//! Drives one [`Endpoint`] from one datagram socket. Each iteration of the
//! loop:
//!
//! 1. attempts a single non-blocking receive and, if a datagram arrived,
//!    answers it
//! 2. refreshes the cached temperature from the telemetry source
//! 3. sleeps for the poll period
//!
//! Command latency is therefore at least one poll period. The endpoint is
//! owned by the loop, so the token set and the cached reading need no lock.

use std::{io, net::SocketAddr, time::Duration};

use thermonet_core::{DatagramTransport, Endpoint, Environment};
use tokio::sync::watch;

/// Largest datagram the listener reads. Longer datagrams are truncated and
/// then fail authentication.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Read-only view of a listener's latest kelvin reading.
pub type ReadingHandle = watch::Receiver<f64>;

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollOutcome {
    /// A datagram was received.
    pub received: bool,
    /// Replies successfully sent back.
    pub sent: usize,
}

/// Poll loop for a single sensor endpoint.
pub struct Listener<E: Environment, T: DatagramTransport> {
    name: String,
    endpoint: Endpoint<E>,
    transport: T,
    env: E,
    period: Duration,
    reading: watch::Sender<f64>,
    buf: Vec<u8>,
}

impl<E: Environment, T: DatagramTransport> Listener<E, T> {
    /// Create a listener. The transport must already be bound.
    pub fn new(name: impl Into<String>, endpoint: Endpoint<E>, transport: T, period: Duration) -> Self {
        let env = endpoint.env().clone();
        let (reading, _) = watch::channel(endpoint.kelvin());

        Self {
            name: name.into(),
            endpoint,
            transport,
            env,
            period,
            reading,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
        }
    }

    /// Endpoint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address the transport is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Subscribe to the cached kelvin reading, updated every iteration.
    pub fn reading(&self) -> ReadingHandle {
        self.reading.subscribe()
    }

    /// Current poll period.
    pub fn update_period(&self) -> Duration {
        self.period
    }

    /// Change the poll period. Takes effect from the next sleep.
    pub fn set_update_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// The driven endpoint.
    pub fn endpoint(&self) -> &Endpoint<E> {
        &self.endpoint
    }

    /// Mutable access to the driven endpoint (password, source, unit).
    pub fn endpoint_mut(&mut self) -> &mut Endpoint<E> {
        &mut self.endpoint
    }

    /// Run one loop iteration without the trailing sleep.
    ///
    /// Never fails: receive and send errors are logged and the iteration
    /// carries on.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        match self.transport.try_recv_from(&mut self.buf).await {
            Ok(Some((len, peer))) => {
                outcome.received = true;
                outcome.sent = self.answer(len, peer).await;
            },
            Ok(None) => {},
            Err(e) => {
                tracing::debug!(endpoint = %self.name, "receive error: {}", e);
            },
        }

        let kelvin = self.endpoint.refresh_temperature();
        self.reading.send_replace(kelvin);

        outcome
    }

    async fn answer(&mut self, len: usize, peer: SocketAddr) -> usize {
        let replies = match self.endpoint.handle_datagram(&self.buf[..len]) {
            Ok(replies) => replies,
            Err(e) => {
                tracing::debug!(endpoint = %self.name, %peer, "dropped datagram: {}", e);
                return 0;
            },
        };

        let mut sent = 0;
        for reply in replies {
            match self.transport.send_to(&reply, peer).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    tracing::warn!(endpoint = %self.name, %peer, "failed to send reply: {}", e);
                },
            }
        }

        sent
    }

    /// Run the poll loop until `shutdown` becomes `true` or its sender is
    /// dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(endpoint = %self.name, period = ?self.period, "listener started");

        while !*shutdown.borrow() {
            self.poll_once().await;

            tokio::select! {
                () = self.env.sleep(self.period) => {},
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
            }
        }

        tracing::info!(endpoint = %self.name, "listener stopped");
    }
}

impl<E: Environment, T: DatagramTransport> std::fmt::Debug for Listener<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}
