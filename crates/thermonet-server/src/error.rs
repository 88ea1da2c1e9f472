//! Server error types.

use std::{io, net::SocketAddr};

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur in the server.
///
/// None of these come from a single bad datagram: per-message failures are
/// logged and dropped inside the listener loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Binding an endpoint socket failed
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address from the endpoint configuration.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// A listener task panicked or was aborted
    #[error("listener task failed: {0}")]
    ListenerTask(String),
}
