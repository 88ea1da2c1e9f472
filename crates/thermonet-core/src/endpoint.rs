//! Command endpoint.
//!
//! One `Endpoint` holds the complete protocol state of one sensor: the
//! password digest, the key, the active tokens, the degree unit and the
//! cached kelvin reading. It is a pure state machine. The caller hands it
//! received envelopes and transmits the envelopes it returns.
//!
//! ## Fail-closed handling
//!
//! | Input | Outcome |
//! |---|---|
//! | envelope fails authentication, or plaintext is not UTF-8 | `Err`, caller drops it, no reply |
//! | wrong word count, or one word without `;` | `Bad Command` |
//! | two words, verb not `AUTH`/`LOGOUT` | `Authenticate First` |
//! | batch token not active | `Bad Token` |
//! | `AUTH` with wrong digest | nothing |
//! | `AUTH` with 10 tokens active | limit message |
//! | unrecognized unit in a batch | `Invalid Command` for that unit only |

use thermonet_crypto::{CodecError, PasswordDigest, SecretKey};
use thiserror::Error;

use crate::{
    command::{Command, Frame, FrameError, OpenCommand, parse_frame},
    env::Environment,
    reply::Reply,
    telemetry::TelemetrySource,
    token::{TokenError, TokenManager},
    unit::DegreeUnit,
};

/// Errors that cause a datagram to be dropped without a reply.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Envelope failed to decrypt.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] CodecError),

    /// Decrypted plaintext is not valid UTF-8.
    #[error("plaintext is not UTF-8")]
    NotUtf8,

    /// A reply could not be encrypted.
    #[error("failed to seal reply: {0}")]
    Seal(#[source] CodecError),
}

/// Secrets an endpoint is provisioned with.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Digest `AUTH` must present.
    pub password: PasswordDigest,
    /// Envelope key shared with clients.
    pub key: SecretKey,
}

impl EndpointConfig {
    /// Build a config from a plaintext password.
    pub fn new(password: &str, key: SecretKey) -> Self {
        Self { password: PasswordDigest::of_password(password), key }
    }
}

/// Protocol state of one sensor endpoint.
pub struct Endpoint<E: Environment> {
    env: E,
    config: EndpointConfig,
    tokens: TokenManager,
    unit: DegreeUnit,
    /// Last reading pulled from `source`, in kelvin.
    kelvin: f64,
    source: Box<dyn TelemetrySource>,
}

impl<E: Environment> Endpoint<E> {
    /// Create an endpoint and take an initial reading from `source`.
    pub fn new(env: E, config: EndpointConfig, source: impl TelemetrySource + 'static) -> Self {
        let mut source: Box<dyn TelemetrySource> = Box::new(source);
        let kelvin = source.temperature();

        Self {
            env,
            config,
            tokens: TokenManager::new(),
            unit: DegreeUnit::default(),
            kelvin,
            source,
        }
    }

    /// Process one received envelope and return the envelopes to send back to
    /// its sender, in order.
    ///
    /// An `Err` means the datagram must be dropped silently.
    pub fn handle_datagram(&mut self, envelope: &[u8]) -> Result<Vec<Vec<u8>>, EndpointError> {
        let plaintext =
            thermonet_crypto::decrypt(&self.config.key, envelope).map_err(EndpointError::Malformed)?;
        let plaintext = std::str::from_utf8(&plaintext).map_err(|_| EndpointError::NotUtf8)?;

        self.dispatch(plaintext)
            .iter()
            .map(|reply| {
                reply.seal(&self.config.key, &self.env.random_nonce()).map_err(EndpointError::Seal)
            })
            .collect()
    }

    /// Run a decrypted plaintext against the endpoint state.
    pub fn dispatch(&mut self, plaintext: &str) -> Vec<Reply> {
        let mut replies = Vec::new();

        match parse_frame(plaintext) {
            Err(FrameError::BadCommand) => replies.push(Reply::BadCommand),
            Err(FrameError::AuthenticateFirst) => replies.push(Reply::AuthenticateFirst),
            Ok(Frame::Open(command)) => self.run_open(command, &mut replies),
            Ok(Frame::Protected { token, commands }) => {
                if !self.tokens.validate(token) {
                    tracing::debug!("batch rejected: unknown token");
                    replies.push(Reply::BadToken);
                    return replies;
                }

                for command in commands {
                    self.run(command, &mut replies);
                }
            },
        }

        replies
    }

    fn run(&mut self, command: Command<'_>, replies: &mut Vec<Reply>) {
        match command {
            Command::Open(open) => self.run_open(open, replies),
            Command::SetUnit(unit) => self.set_degree_unit(unit),
            Command::GetTemp => replies.push(Reply::Temperature(self.temperature())),
            Command::UpdateTemp => {
                self.refresh_temperature();
            },
            Command::Invalid(unit) => {
                tracing::debug!(len = unit.len(), "invalid command in batch");
                replies.push(Reply::InvalidCommand);
            },
        }
    }

    fn run_open(&mut self, command: OpenCommand<'_>, replies: &mut Vec<Reply>) {
        match command {
            OpenCommand::Auth { digest } => {
                // Wrong digests get no reply at all, indistinguishable from loss
                if !self.config.password.matches(digest) {
                    tracing::debug!("AUTH rejected");
                    return;
                }

                match self.tokens.issue(&self.env) {
                    Ok(token) => replies.push(Reply::Token(token)),
                    Err(TokenError::LimitExceeded) => {
                        tracing::warn!("AUTH refused: token limit reached");
                        replies.push(Reply::TooManyTokens);
                    },
                    Err(err @ TokenError::EntropyExhausted) => {
                        tracing::error!("AUTH failed: {}", err);
                    },
                }
            },
            OpenCommand::Logout { token } => {
                self.tokens.revoke(token);
            },
        }
    }

    /// Pull a fresh reading from the telemetry source into the cache.
    pub fn refresh_temperature(&mut self) -> f64 {
        self.kelvin = self.source.temperature();
        self.kelvin
    }

    /// Cached reading converted to the current unit.
    pub fn temperature(&self) -> f64 {
        self.unit.convert(self.kelvin)
    }

    /// Cached reading in kelvin.
    pub fn kelvin(&self) -> f64 {
        self.kelvin
    }

    /// Unit applied to `GET_TEMP`.
    pub fn degree_unit(&self) -> DegreeUnit {
        self.unit
    }

    /// Change the unit applied to `GET_TEMP`.
    pub fn set_degree_unit(&mut self, unit: DegreeUnit) {
        self.unit = unit;
    }

    /// Change the unit by symbol. Unknown symbols select kelvin.
    pub fn set_degree_unit_symbol(&mut self, symbol: &str) {
        self.unit = DegreeUnit::from_symbol(symbol);
    }

    /// Replace the password. Active tokens stay valid.
    pub fn set_password(&mut self, password: &str) {
        self.config.password = PasswordDigest::of_password(password);
    }

    /// Replace the telemetry source. The cache keeps the old reading until
    /// the next refresh.
    pub fn set_source(&mut self, source: impl TelemetrySource + 'static) {
        self.source = Box::new(source);
    }

    /// Active session tokens.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Envelope key.
    pub fn key(&self) -> &SecretKey {
        &self.config.key
    }

    /// Environment used for tokens and nonces.
    pub fn env(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> std::fmt::Debug for Endpoint<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("unit", &self.unit)
            .field("kelvin", &self.kelvin)
            .field("active_tokens", &self.tokens.len())
            .finish_non_exhaustive()
    }
}
