//! Password digests.
//!
//! Clients never send the password itself. `AUTH` carries the lowercase hex
//! SHA-256 of the UTF-8 password, and the endpoint stores only that digest.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-256 digest of a password.
///
/// # Security
///
/// - **Debug Redaction**: The digest is password-equivalent on the wire, so
///   the `Debug` impl does not print it.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Digest a plaintext password.
    pub fn of_password(password: &str) -> Self {
        Self(hex::encode(Sha256::digest(password.as_bytes())))
    }

    /// Exact byte equality with a digest supplied by a client, evaluated in
    /// constant time.
    pub fn matches(&self, supplied: &str) -> bool {
        let expected = self.0.as_bytes();
        let supplied = supplied.as_bytes();

        // Lengths are public (always 64 for a well-formed digest)
        expected.len() == supplied.len() && bool::from(expected.ct_eq(supplied))
    }

    /// The hex digest, as sent in `AUTH <digest>`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}
