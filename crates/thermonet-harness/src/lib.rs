//! Deterministic simulation harness for Thermonet.
//!
//! Turmoil-based implementations of the `Environment` and `DatagramTransport`
//! traits. Endpoints and clients run unchanged on a simulated network with a
//! virtual clock, so packet loss, latency and partitions are reproducible from
//! a seed.
//!
//! # Example
//!
//! ```rust,ignore
//! use thermonet_harness::{SimEndpoint, SimEnv, SimTransport};
//!
//! let mut sim = turmoil::Builder::new().build();
//!
//! sim.host("sensor", || SimEndpoint::new("sensor", "secret", key).run());
//!
//! sim.client("operator", async {
//!     let transport = SimTransport::bind("0.0.0.0:40000").await?;
//!     // Client logic...
//!     Ok(())
//! });
//!
//! sim.run().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod sim_endpoint;
mod sim_env;
mod sim_transport;

pub use sim_endpoint::{SIM_PORT, SimEndpoint};
pub use sim_env::SimEnv;
pub use sim_transport::SimTransport;
