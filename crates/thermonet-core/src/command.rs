//! Plaintext command grammar.
//!
//! ```text
//! frame        := open_command | token ';' command_seq
//! open_command := "AUTH" ' ' digest | "LOGOUT" ' ' token
//! command_seq  := command (';' command)*
//! command      := open_command | "SET_DEGF" | "SET_DEGC" | "SET_DEGK"
//!               | "GET_TEMP" | "UPDATE_TEMP"
//! ```
//!
//! The outer shape is decided by the number of single-space separated words
//! in the whole (trimmed) plaintext: two words is an open command line, one
//! word is a token-prefixed batch, anything else is rejected. An open command
//! line takes its argument whole, so `LOGOUT x;GET_TEMP` names the token
//! `x;GET_TEMP` and never runs an ungated `GET_TEMP`.

use thiserror::Error;

use crate::unit::DegreeUnit;

/// Authenticate with a password digest.
pub const AUTH: &str = "AUTH";
/// Revoke a token.
pub const LOGOUT: &str = "LOGOUT";
/// Report readings in Fahrenheit.
pub const SET_DEGF: &str = "SET_DEGF";
/// Report readings in Celsius.
pub const SET_DEGC: &str = "SET_DEGC";
/// Report readings in kelvin.
pub const SET_DEGK: &str = "SET_DEGK";
/// Read the cached temperature.
pub const GET_TEMP: &str = "GET_TEMP";
/// Refresh the cached temperature from the telemetry source.
pub const UPDATE_TEMP: &str = "UPDATE_TEMP";

/// Commands usable without a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenCommand<'a> {
    /// `AUTH <digest>`
    Auth {
        /// Hex password digest supplied by the client.
        digest: &'a str,
    },
    /// `LOGOUT <token>`
    Logout {
        /// Token to revoke.
        token: &'a str,
    },
}

/// One unit of a token-prefixed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// An open command embedded in a batch.
    Open(OpenCommand<'a>),
    /// `SET_DEGF`, `SET_DEGC` or `SET_DEGK`.
    SetUnit(DegreeUnit),
    /// `GET_TEMP`
    GetTemp,
    /// `UPDATE_TEMP`
    UpdateTemp,
    /// Anything else, including the empty unit.
    Invalid(&'a str),
}

impl<'a> Command<'a> {
    /// Classify one `;`-delimited unit.
    pub fn parse(unit: &'a str) -> Self {
        let mut words = unit.split(' ');
        let first = words.next().unwrap_or_default();
        let second = words.next();

        if words.next().is_some() {
            return Self::Invalid(unit);
        }

        match (first, second) {
            (AUTH, Some(digest)) => Self::Open(OpenCommand::Auth { digest }),
            (LOGOUT, Some(token)) => Self::Open(OpenCommand::Logout { token }),
            (SET_DEGF, None) => Self::SetUnit(DegreeUnit::Fahrenheit),
            (SET_DEGC, None) => Self::SetUnit(DegreeUnit::Celsius),
            (SET_DEGK, None) => Self::SetUnit(DegreeUnit::Kelvin),
            (GET_TEMP, None) => Self::GetTemp,
            (UPDATE_TEMP, None) => Self::UpdateTemp,
            _ => Self::Invalid(unit),
        }
    }
}

/// A parsed plaintext datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Two-word open command line.
    Open(OpenCommand<'a>),
    /// Token-prefixed batch. The token is not yet validated.
    Protected {
        /// Candidate token (text before the first `;`).
        token: &'a str,
        /// Commands after the first `;`, in order.
        commands: Vec<Command<'a>>,
    },
}

/// Outer-frame rejections. Each maps to one canonical reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Wrong word count, or a one-word frame without `;`.
    #[error("bad command shape")]
    BadCommand,

    /// Two-word frame whose verb is not an open command.
    #[error("authentication required")]
    AuthenticateFirst,
}

/// Parse a decrypted plaintext.
///
/// Surrounding whitespace is ignored. Token validation is left to the caller.
pub fn parse_frame(plaintext: &str) -> Result<Frame<'_>, FrameError> {
    let line = plaintext.trim();

    match line.split(' ').count() {
        1 => {
            let (token, rest) = line.split_once(';').ok_or(FrameError::BadCommand)?;
            let commands = rest.split(';').map(Command::parse).collect();
            Ok(Frame::Protected { token, commands })
        },
        2 => {
            let (verb, argument) = line.split_once(' ').ok_or(FrameError::BadCommand)?;
            match verb {
                AUTH => Ok(Frame::Open(OpenCommand::Auth { digest: argument })),
                LOGOUT => Ok(Frame::Open(OpenCommand::Logout { token: argument })),
                _ => Err(FrameError::AuthenticateFirst),
            }
        },
        _ => Err(FrameError::BadCommand),
    }
}
