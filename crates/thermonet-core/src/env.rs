//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples protocol logic from system resources
//! (time and randomness). This enables:
//!
//! - Deterministic Simulation: Turmoil provides a virtual clock and the harness
//!   supplies a seeded RNG, so token and nonce sequences are reproducible.
//!
//! - Production Runtime: Tokio and `getrandom` implementations use real system
//!   resources without any code changes to the protocol logic.
//!
//! # Invariants
//!
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::time::Duration;

use thermonet_crypto::NONCE_SIZE;

/// Abstract environment providing sleeping and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. RNG quality: `random_bytes()` uses cryptographically secure entropy in
///    production. Session tokens and envelope nonces come from here.
/// 2. Minimal panics: Methods are infallible except in exceptional
///    circumstances (e.g., OS entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Sleeps for the specified duration.
    ///
    /// Only driver code (the listener poll loop, the client's reply wait)
    /// sleeps. Protocol logic never does.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Security
    ///
    /// Production implementations MUST use `getrandom` (OS entropy pool), NOT
    /// a userspace PRNG seeded once.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a fresh envelope nonce.
    fn random_nonce(&self) -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        self.random_bytes(&mut nonce);
        nonce
    }
}
