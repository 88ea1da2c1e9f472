//! Thermonet production server.
//!
//! This crate provides the production server implementation using:
//! - Tokio UDP sockets for transport
//! - Tokio tasks, one per sensor endpoint
//! - System time and cryptographic RNG
//!
//! ## Architecture
//!
//! ```text
//! thermonet-server
//!   ├─ Server             (supervisor: one task per endpoint, shutdown)
//!   ├─ Listener           (poll loop: receive, answer, refresh, sleep)
//!   ├─ UdpTransport       (tokio UdpSocket)
//!   ├─ SystemEnv          (production Environment impl)
//!   └─ Endpoint           (thermonet-core: tokens, dispatch, replies)
//! ```
//!
//! Endpoints share nothing. A collaborator that needs a sensor's reading
//! (a heater, a display) subscribes to that listener's [`ReadingHandle`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod listener;
mod system_env;
mod transport;

use std::net::SocketAddr;

pub use config::{
    ConfigError, DEFAULT_KELVIN, DEFAULT_POLL_PERIOD, EndpointSpec, ServerRuntimeConfig,
};
pub use error::ServerError;
pub use listener::{Listener, MAX_DATAGRAM_SIZE, PollOutcome, ReadingHandle};
pub use system_env::{SystemEnv, generate_key};
use thermonet_core::{DatagramTransport, Endpoint, Environment, FixedSource};
use tokio::{sync::watch, task::JoinSet};
pub use transport::UdpTransport;

/// A running endpoint, as seen from the supervisor.
#[derive(Debug, Clone)]
pub struct RunningEndpoint {
    /// Endpoint name.
    pub name: String,
    /// Bound socket address.
    pub local_addr: SocketAddr,
    /// Latest kelvin reading.
    pub reading: ReadingHandle,
}

/// Supervisor for a set of independent listeners.
pub struct Server {
    tasks: JoinSet<String>,
    shutdown: watch::Sender<bool>,
    endpoints: Vec<RunningEndpoint>,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Create a supervisor with no listeners.
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { tasks: JoinSet::new(), shutdown, endpoints: Vec::new() }
    }

    /// Bind every configured endpoint and start its listener.
    ///
    /// Each endpoint reports the fixed reading from its configuration. Use
    /// [`Server::spawn`] to run listeners with other telemetry sources.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The key in the configuration is invalid
    /// - Binding any endpoint address fails
    pub async fn bind(config: &ServerRuntimeConfig) -> Result<Self, ServerError> {
        let endpoint_config = config.endpoint_config()?;
        let mut server = Self::new();

        for spec in &config.endpoints {
            let transport = UdpTransport::bind(spec.bind)
                .await
                .map_err(|source| ServerError::Bind { addr: spec.bind, source })?;

            let endpoint =
                Endpoint::new(SystemEnv::new(), endpoint_config.clone(), FixedSource::new(spec.kelvin));

            server.spawn(Listener::new(&spec.name, endpoint, transport, config.poll_period()))?;
        }

        Ok(server)
    }

    /// Start a listener as its own task.
    pub fn spawn<E, T>(&mut self, listener: Listener<E, T>) -> Result<&RunningEndpoint, ServerError>
    where
        E: Environment,
        T: DatagramTransport + 'static,
    {
        let name = listener.name().to_string();
        let local_addr = listener.local_addr()?;
        let reading = listener.reading();
        let shutdown = self.shutdown.subscribe();

        tracing::info!(endpoint = %name, %local_addr, "endpoint listening");

        let task_name = name.clone();
        self.tasks.spawn(async move {
            listener.run(shutdown).await;
            task_name
        });

        self.endpoints.push(RunningEndpoint { name, local_addr, reading });
        Ok(&self.endpoints[self.endpoints.len() - 1])
    }

    /// Running endpoints, in spawn order.
    pub fn endpoints(&self) -> &[RunningEndpoint] {
        &self.endpoints
    }

    /// Look up a running endpoint by name.
    pub fn endpoint(&self, name: &str) -> Option<&RunningEndpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Signal every listener to stop and wait for all of them.
    ///
    /// # Errors
    ///
    /// Returns the first listener task that panicked or was aborted. The
    /// remaining listeners are still awaited.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        self.shutdown.send_replace(true);

        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(name) => tracing::debug!(endpoint = %name, "listener joined"),
                Err(e) => {
                    tracing::error!("listener task failed: {}", e);
                    first_error.get_or_insert(ServerError::ListenerTask(e.to_string()));
                },
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server").field("endpoints", &self.endpoints).finish_non_exhaustive()
    }
}
