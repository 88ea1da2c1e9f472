//! Thermonet Cryptographic Primitives
//!
//! This crate provides the cryptographic building blocks for the Thermonet
//! protocol: the datagram envelope codec and the password digest used by
//! `AUTH`.
//!
//! # Design
//!
//! All functions in this crate are pure - they have no side effects and
//! produce deterministic outputs given the same inputs. Random bytes required
//! for encryption must be provided by the caller, enabling:
//!
//! - Deterministic testing with seeded RNG
//! - Sans-IO architecture compatibility
//! - No coupling to application-level abstractions
//!
//! # Security Properties
//!
//! - Confidentiality and integrity: every envelope is sealed with
//!   XChaCha20-Poly1305, so tampering or a wrong key fails decryption
//! - Random nonces: 192-bit nonces make random generation collision-safe
//! - Constant-time comparison: password digests are compared with `subtle`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod digest;

pub use codec::{
    CodecError, ENVELOPE_OVERHEAD, KEY_SIZE, NONCE_SIZE, SecretKey, TAG_SIZE, decrypt, encrypt,
};
pub use digest::PasswordDigest;
