//! Protocol client.
//!
//! The client speaks to exactly one endpoint. It keeps no session state of its
//! own: tokens are returned to the caller, who passes them back in. Replies
//! are matched to requests purely by arrival order, so a reply that arrives
//! after its request timed out is read by the next request. Callers that
//! retry should expect that.

use std::{net::SocketAddr, time::Duration};

use thermonet_core::{
    DatagramTransport, DegreeUnit, Environment,
    command::{AUTH, GET_TEMP, LOGOUT, SET_DEGC, SET_DEGF, SET_DEGK, UPDATE_TEMP},
    reply::{AUTHENTICATE_FIRST, BAD_COMMAND, BAD_TOKEN, INVALID_COMMAND, TOO_MANY_TOKENS},
};
use thermonet_crypto::{PasswordDigest, SecretKey};

use crate::error::{ClientError, Rejection};

/// Receive buffer size, matching the endpoint's datagram limit.
const RECV_BUFFER_SIZE: usize = 1024;

/// Reply waiting behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long to wait for a reply before giving up.
    pub reply_timeout: Duration,
    /// How often to check for a reply while waiting.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { reply_timeout: Duration::from_secs(1), poll_interval: Duration::from_millis(10) }
    }
}

/// Client for one sensor endpoint.
///
/// # Type Parameters
///
/// - `T`: Datagram transport (UDP in production, turmoil in simulation)
/// - `E`: Environment implementation for sleeping and nonces
pub struct Client<T: DatagramTransport, E: Environment> {
    transport: T,
    env: E,
    server: SocketAddr,
    key: SecretKey,
    config: ClientConfig,
}

impl<T: DatagramTransport, E: Environment> Client<T, E> {
    /// Create a client that talks to `server` over a bound `transport`.
    pub fn new(transport: T, env: E, server: SocketAddr, key: SecretKey) -> Self {
        Self { transport, env, server, key, config: ClientConfig::default() }
    }

    /// Replace the reply waiting behavior.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Endpoint address.
    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Authenticate with a plaintext password and return the issued token.
    ///
    /// A wrong password produces [`ClientError::NoReply`].
    pub async fn authenticate(&self, password: &str) -> Result<String, ClientError> {
        self.authenticate_digest(&PasswordDigest::of_password(password)).await
    }

    /// Authenticate with a precomputed digest.
    pub async fn authenticate_digest(&self, digest: &PasswordDigest) -> Result<String, ClientError> {
        let reply = self.request(&format!("{AUTH} {}", digest.as_str())).await?;
        let token = expect_success(&reply)?.trim();

        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(ClientError::UnexpectedReply { reply });
        }

        Ok(token.to_string())
    }

    /// Read the temperature in whatever unit was last selected.
    pub async fn get_temperature(&self, token: &str) -> Result<f64, ClientError> {
        let reply = self.request(&format!("{token};{GET_TEMP}")).await?;
        let value = expect_success(&reply)?.trim();

        value.parse().map_err(|_| ClientError::UnexpectedReply { reply: reply.clone() })
    }

    /// Select the unit for later readings. The endpoint does not acknowledge.
    pub async fn set_unit(&self, token: &str, unit: DegreeUnit) -> Result<(), ClientError> {
        let command = match unit {
            DegreeUnit::Kelvin => SET_DEGK,
            DegreeUnit::Celsius => SET_DEGC,
            DegreeUnit::Fahrenheit => SET_DEGF,
        };
        self.send_batch(token, &[command]).await
    }

    /// Ask the endpoint to refresh its cached reading now.
    pub async fn update_temperature(&self, token: &str) -> Result<(), ClientError> {
        self.send_batch(token, &[UPDATE_TEMP]).await
    }

    /// Revoke `token`. The endpoint does not acknowledge.
    pub async fn logout(&self, token: &str) -> Result<(), ClientError> {
        self.send(&format!("{LOGOUT} {token}")).await
    }

    /// Send a token-prefixed batch without waiting for replies.
    ///
    /// Use [`Client::recv_reply`] for each reply the batch produces.
    pub async fn send_batch(&self, token: &str, commands: &[&str]) -> Result<(), ClientError> {
        self.send(&format!("{token};{}", commands.join(";"))).await
    }

    /// Send a plaintext and wait for one reply.
    pub async fn request(&self, plaintext: &str) -> Result<String, ClientError> {
        self.send(plaintext).await?;
        self.recv_reply().await
    }

    /// Encrypt and send a raw plaintext.
    pub async fn send(&self, plaintext: &str) -> Result<(), ClientError> {
        let envelope =
            thermonet_crypto::encrypt(&self.key, &self.env.random_nonce(), plaintext.as_bytes())?;
        self.transport.send_to(&envelope, self.server).await?;
        Ok(())
    }

    /// Wait for the next reply from the endpoint.
    ///
    /// Datagrams from other peers and datagrams that fail to decrypt are
    /// skipped.
    pub async fn recv_reply(&self) -> Result<String, ClientError> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let interval = self.config.poll_interval.max(Duration::from_millis(1));
        let attempts = (self.config.reply_timeout.as_nanos() / interval.as_nanos()).max(1);

        for _ in 0..attempts {
            if let Some((len, from)) = self.transport.try_recv_from(&mut buf).await? {
                if from != self.server {
                    tracing::debug!(%from, "ignoring datagram from unexpected peer");
                    continue;
                }

                match thermonet_crypto::decrypt(&self.key, &buf[..len]) {
                    Ok(plaintext) => {
                        return String::from_utf8(plaintext).map_err(|e| {
                            ClientError::UnexpectedReply {
                                reply: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                            }
                        });
                    },
                    Err(e) => {
                        tracing::debug!("ignoring undecryptable reply: {}", e);
                        continue;
                    },
                }
            }

            self.env.sleep(interval).await;
        }

        Err(ClientError::NoReply)
    }
}

/// Map canonical error replies to errors, pass anything else through.
fn expect_success(reply: &str) -> Result<&str, ClientError> {
    match reply {
        INVALID_COMMAND => Err(ClientError::Rejected(Rejection::InvalidCommand)),
        BAD_TOKEN => Err(ClientError::Rejected(Rejection::BadToken)),
        BAD_COMMAND => Err(ClientError::Rejected(Rejection::BadCommand)),
        AUTHENTICATE_FIRST => Err(ClientError::Rejected(Rejection::AuthenticateFirst)),
        TOO_MANY_TOKENS => Err(ClientError::TokenLimit),
        other => Ok(other),
    }
}
