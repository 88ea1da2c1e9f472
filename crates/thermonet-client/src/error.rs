//! Client error types.

use std::io;

use thermonet_crypto::CodecError;
use thiserror::Error;

/// Canonical error replies an endpoint can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `Invalid Command`: a unit in the batch was not recognized.
    InvalidCommand,
    /// `Bad Token`: the token is not active (logged out, or never issued).
    BadToken,
    /// `Bad Command`: the frame was malformed.
    BadCommand,
    /// `Authenticate First`: a protected verb was sent without a token.
    AuthenticateFirst,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InvalidCommand => "invalid command",
            Self::BadToken => "bad token",
            Self::BadCommand => "bad command",
            Self::AuthenticateFirst => "authenticate first",
        })
    }
}

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No reply arrived before the timeout.
    ///
    /// Endpoints answer a wrong password with silence, so this is also what a
    /// failed `AUTH` looks like.
    #[error("no reply within timeout")]
    NoReply,

    /// The endpoint already has the maximum number of active tokens.
    #[error("endpoint token limit reached")]
    TokenLimit,

    /// The endpoint answered with an error reply.
    #[error("endpoint rejected request: {0}")]
    Rejected(Rejection),

    /// The reply did not have the expected shape.
    #[error("unexpected reply: {reply:?}")]
    UnexpectedReply {
        /// Decrypted reply text.
        reply: String,
    },

    /// Request could not be encrypted.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Socket error.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl ClientError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Transient errors can be retried: datagrams get lost, tokens get
    /// revoked and must be renewed, slots free up when others log out.
    pub fn is_fatal(&self) -> bool {
        match self {
            // Fatal: local setup or a protocol mismatch
            Self::Codec(_) | Self::Transport(_) | Self::UnexpectedReply { .. } => true,

            // Caller sent a malformed request
            Self::Rejected(Rejection::BadCommand | Rejection::InvalidCommand) => true,

            // Transient: retry, or authenticate again
            Self::NoReply
            | Self::TokenLimit
            | Self::Rejected(Rejection::BadToken | Rejection::AuthenticateFirst) => false,
        }
    }
}
