//! Simulated sensor host.

use std::{sync::Arc, time::Duration};

use thermonet_core::{Endpoint, EndpointConfig};
use thermonet_crypto::SecretKey;
use thermonet_server::{DEFAULT_KELVIN, DEFAULT_POLL_PERIOD, Listener};
use tokio::sync::watch;

use crate::{SimEnv, SimTransport};

/// Port simulated endpoints bind to unless told otherwise.
pub const SIM_PORT: u16 = 23456;

type SourceFactory = Arc<dyn Fn() -> Box<dyn FnMut() -> f64 + Send> + Send + Sync>;

/// Endpoint definition for a turmoil host.
///
/// Turmoil may start a host more than once (after a crash or bounce), so this
/// is a recipe rather than a running endpoint. Every [`SimEndpoint::run`]
/// starts from an empty token set.
#[derive(Clone)]
pub struct SimEndpoint {
    name: String,
    password: String,
    key: SecretKey,
    port: u16,
    seed: u64,
    period: Duration,
    source: SourceFactory,
}

impl SimEndpoint {
    /// Endpoint reporting [`DEFAULT_KELVIN`] on [`SIM_PORT`].
    pub fn new(name: impl Into<String>, password: impl Into<String>, key: SecretKey) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            key,
            port: SIM_PORT,
            seed: 0,
            period: DEFAULT_POLL_PERIOD,
            source: Arc::new(|| Box::new(|| DEFAULT_KELVIN)),
        }
    }

    /// Report a constant reading.
    #[must_use]
    pub fn kelvin(self, kelvin: f64) -> Self {
        self.source(move || move || kelvin)
    }

    /// Build a fresh telemetry source on every start.
    #[must_use]
    pub fn source<F, S>(mut self, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: FnMut() -> f64 + Send + 'static,
    {
        self.source = Arc::new(move || Box::new(factory()));
        self
    }

    /// Bind a different port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Seed for the endpoint's token and nonce stream.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Poll period of the listener loop.
    #[must_use]
    pub fn poll_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Bind and serve until the simulation ends.
    pub async fn run(self) -> turmoil::Result {
        let transport = SimTransport::bind(("0.0.0.0", self.port)).await?;
        let endpoint = Endpoint::new(
            SimEnv::with_seed(self.seed),
            EndpointConfig::new(&self.password, self.key),
            (self.source)(),
        );

        let (_stop, shutdown) = watch::channel(false);
        Listener::new(self.name, endpoint, transport, self.period).run(shutdown).await;

        Ok(())
    }
}

impl std::fmt::Debug for SimEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEndpoint")
            .field("name", &self.name)
            .field("port", &self.port)
            .field("seed", &self.seed)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}
