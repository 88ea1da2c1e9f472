//! Runtime environment for real sockets.
//!
//! Listeners sleep on the tokio timer and draw token and nonce entropy from
//! the operating system.

use std::time::Duration;

use thermonet_core::Environment;
use thermonet_crypto::{KEY_SIZE, SecretKey};

/// Environment backed by tokio timers and `getrandom`.
///
/// Session tokens and envelope nonces both come from [`Environment::random_bytes`],
/// so this is the only entropy source a production endpoint has.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(e) = getrandom::fill(buffer) {
            // Zeroed entropy makes every token collide, so AUTH stops issuing
            // tokens while the listener keeps running.
            tracing::error!("OS entropy unavailable: {}", e);
            buffer.fill(0);
        }
    }
}

/// Draw a fresh envelope key from OS entropy.
///
/// Unlike [`SystemEnv::random_bytes`], a failure is reported rather than
/// papered over: a zeroed key would be shared by every installation.
pub fn generate_key() -> Result<SecretKey, getrandom::Error> {
    let mut bytes = [0u8; KEY_SIZE];
    getrandom::fill(&mut bytes)?;
    Ok(SecretKey::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use thermonet_core::TokenManager;

    use super::*;

    #[test]
    fn tokens_from_os_entropy_are_distinct() {
        let env = SystemEnv::new();
        let mut tokens = TokenManager::new();

        let issued: HashSet<String> =
            (0..5).map(|_| tokens.issue(&env).unwrap().as_str().to_string()).collect();

        assert_eq!(issued.len(), 5);
    }

    #[test]
    fn envelope_nonces_are_not_reused() {
        let env = SystemEnv::new();
        assert_ne!(env.random_nonce(), env.random_nonce());
    }

    #[test]
    fn generated_keys_are_fresh_and_round_trip_as_hex() {
        let first = generate_key().unwrap();
        let second = generate_key().unwrap();

        assert_ne!(first, second);
        assert_eq!(SecretKey::from_hex(&first.to_hex()).unwrap(), first);
        assert_eq!(first.to_hex().len(), KEY_SIZE * 2);
    }

    #[tokio::test]
    async fn poll_period_sleep_waits() {
        let env = SystemEnv::new();

        let start = std::time::Instant::now();
        env.sleep(Duration::from_millis(50)).await;

        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
