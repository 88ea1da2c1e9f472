//! Datagram envelope codec.
//!
//! Every message on the wire, in both directions, is an envelope:
//!
//! ```text
//! ┌──────────────┬─────────────────────────┬──────────────┐
//! │ nonce (24 B) │ ciphertext (len of msg) │ tag (16 B)   │
//! └──────────────┴─────────────────────────┴──────────────┘
//! ```
//!
//! The nonce is chosen by the caller. A 192-bit random nonce never needs
//! coordination between endpoints, which suits a lossy datagram transport
//! with no handshake.

use chacha20poly1305::{
    Key, KeyInit, XChaCha20Poly1305, XNonce,
    aead::{Aead, Error as AeadError},
};
use thiserror::Error;

/// Key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Nonce size in bytes (XChaCha20).
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Bytes added to every plaintext by [`encrypt`].
pub const ENVELOPE_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// Errors from the envelope codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Envelope is too short to hold a nonce and a tag.
    #[error("envelope truncated: {len} bytes, need at least {ENVELOPE_OVERHEAD}")]
    Truncated {
        /// Length of the rejected envelope.
        len: usize,
    },

    /// Authentication failed (tampered envelope or wrong key).
    #[error("decryption failed")]
    Decryption,

    /// The AEAD refused to encrypt (plaintext exceeds cipher limits).
    #[error("encryption failed")]
    Encryption,

    /// Key material could not be decoded.
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected.
        reason: String,
    },
}

/// Symmetric key shared by an endpoint and its clients.
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl never prints key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key from 64 hex characters.
    pub fn from_hex(encoded: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| CodecError::InvalidKey { reason: e.to_string() })?;

        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            CodecError::InvalidKey { reason: format!("expected {KEY_SIZE} bytes, got {}", b.len()) }
        })?;

        Ok(Self(bytes))
    }

    /// Hex encoding of the key, for writing configuration files.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Seal `plaintext` into an envelope using the caller-supplied nonce.
///
/// The caller MUST NOT reuse a nonce under the same key. Production callers
/// draw it from the OS entropy pool.
pub fn encrypt(
    key: &SecretKey,
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, CodecError> {
    let sealed = key
        .cipher()
        .encrypt(XNonce::from_slice(nonce), plaintext)
        .map_err(|_: AeadError| CodecError::Encryption)?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + sealed.len());
    envelope.extend_from_slice(nonce);
    envelope.extend_from_slice(&sealed);
    Ok(envelope)
}

/// Open an envelope produced by [`encrypt`].
pub fn decrypt(key: &SecretKey, envelope: &[u8]) -> Result<Vec<u8>, CodecError> {
    if envelope.len() < ENVELOPE_OVERHEAD {
        return Err(CodecError::Truncated { len: envelope.len() });
    }

    let (nonce, sealed) = envelope.split_at(NONCE_SIZE);
    key.cipher().decrypt(XNonce::from_slice(nonce), sealed).map_err(|_| CodecError::Decryption)
}
