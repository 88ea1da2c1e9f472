//! Outbound replies.
//!
//! Every reply is a short ASCII string. Replies carry no unit label: a client
//! has to remember which `SET_DEG*` it last sent.

use thermonet_crypto::{CodecError, NONCE_SIZE, SecretKey};

use crate::token::SessionToken;

/// Reply to an unrecognized unit in a batch.
pub const INVALID_COMMAND: &str = "Invalid Command\n";
/// Reply to a batch whose token is not active.
pub const BAD_TOKEN: &str = "Bad Token\n";
/// Reply to a malformed frame.
pub const BAD_COMMAND: &str = "Bad Command\n";
/// Reply to a two-word frame that is not an open command.
pub const AUTHENTICATE_FIRST: &str = "Authenticate First\n";
/// Reply to a correct `AUTH` while the token set is full.
pub const TOO_MANY_TOKENS: &str = "Too many active tokens. Please Logout a session.";

/// A reply before encryption.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Freshly issued token (successful `AUTH`).
    Token(SessionToken),
    /// `AUTH` succeeded but the token set is full.
    TooManyTokens,
    /// `GET_TEMP` reading, already converted to the current unit.
    Temperature(f64),
    /// Unrecognized batch unit.
    InvalidCommand,
    /// Batch token not active.
    BadToken,
    /// Malformed frame.
    BadCommand,
    /// Open-shaped frame with a protected verb.
    AuthenticateFirst,
}

impl Reply {
    /// Plaintext bytes for this reply.
    ///
    /// Readings use six fixed decimals followed by a newline. Non-finite
    /// readings print as `nan`, `inf` or `-inf`.
    pub fn to_plaintext(&self) -> Vec<u8> {
        match self {
            Self::Token(token) => token.as_str().as_bytes().to_vec(),
            Self::TooManyTokens => TOO_MANY_TOKENS.as_bytes().to_vec(),
            Self::Temperature(value) if value.is_nan() => b"nan\n".to_vec(),
            Self::Temperature(value) => format!("{value:.6}\n").into_bytes(),
            Self::InvalidCommand => INVALID_COMMAND.as_bytes().to_vec(),
            Self::BadToken => BAD_TOKEN.as_bytes().to_vec(),
            Self::BadCommand => BAD_COMMAND.as_bytes().to_vec(),
            Self::AuthenticateFirst => AUTHENTICATE_FIRST.as_bytes().to_vec(),
        }
    }

    /// Encrypt this reply into a wire envelope.
    pub fn seal(&self, key: &SecretKey, nonce: &[u8; NONCE_SIZE]) -> Result<Vec<u8>, CodecError> {
        thermonet_crypto::encrypt(key, nonce, &self.to_plaintext())
    }
}
