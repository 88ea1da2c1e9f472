//! Thermonet protocol core.
//!
//! Sans-IO implementation of the sensor command protocol: token lifecycle,
//! command grammar, dispatch and reply formatting. Nothing in this crate
//! touches a socket or a clock. The server crate drives an [`Endpoint`] from
//! a UDP poll loop; the harness drives the same code over a simulated network.
//!
//! ## Architecture
//!
//! ```text
//! envelope ─► thermonet_crypto::decrypt ─► command::parse_frame
//!                                             │
//!                      TokenManager ◄─────────┤ (token gating)
//!                      TelemetrySource ◄──────┤ (UPDATE_TEMP)
//!                                             ▼
//!                                     Vec<Reply> ─► Reply::seal ─► envelopes
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod endpoint;
pub mod env;
pub mod reply;
pub mod telemetry;
pub mod token;
pub mod transport;
pub mod unit;

#[cfg(test)]
mod testing;

pub use command::{Command, Frame, FrameError, OpenCommand, parse_frame};
pub use endpoint::{Endpoint, EndpointConfig, EndpointError};
pub use env::Environment;
pub use reply::Reply;
pub use telemetry::{FixedSource, TelemetrySource};
pub use token::{MAX_ACTIVE_TOKENS, SessionToken, TokenError, TokenManager};
pub use transport::DatagramTransport;
pub use unit::DegreeUnit;
