//! Session tokens.
//!
//! A token proves that some client completed an `AUTH` exchange. Tokens are
//! anonymous: the endpoint only knows whether a string is in its active set.
//!
//! # Lifetime
//!
//! Tokens have no expiry. A token lives until a `LOGOUT` names it or the
//! process exits, so an endpoint whose clients never log out stays pinned at
//! [`MAX_ACTIVE_TOKENS`] and answers every further `AUTH` with the limit
//! message. This is the protocol's documented behavior and is kept as is.

use std::{borrow::Borrow, collections::HashSet};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

use crate::env::Environment;

/// Maximum number of concurrently active tokens per endpoint.
pub const MAX_ACTIVE_TOKENS: usize = 10;

/// Random bytes per token, before encoding.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Fresh-token draws before giving up on finding an unused value.
const MAX_ISSUE_ATTEMPTS: usize = 8;

/// Errors from [`TokenManager::issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The active set already holds [`MAX_ACTIVE_TOKENS`] tokens.
    #[error("token limit reached ({MAX_ACTIVE_TOKENS} active)")]
    LimitExceeded,

    /// The entropy source kept producing tokens that are already active.
    #[error("could not draw an unused token after {MAX_ISSUE_ATTEMPTS} attempts")]
    EntropyExhausted,
}

/// Opaque, URL-safe session credential.
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl prints only the length so tokens
///   never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate<E: Environment>(env: &E) -> Self {
        let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
        env.random_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// The token as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken(<redacted {} chars>)", self.0.len())
    }
}

/// Active token set for one endpoint.
#[derive(Debug, Default)]
pub struct TokenManager {
    active: HashSet<SessionToken>,
}

impl TokenManager {
    /// Create an empty token set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token and add it to the active set.
    ///
    /// The returned token is never equal to a token that is already active.
    pub fn issue<E: Environment>(&mut self, env: &E) -> Result<SessionToken, TokenError> {
        if self.active.len() >= MAX_ACTIVE_TOKENS {
            return Err(TokenError::LimitExceeded);
        }

        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let token = SessionToken::generate(env);
            if self.active.insert(token.clone()) {
                tracing::debug!(active = self.active.len(), "issued session token");
                return Ok(token);
            }
        }

        Err(TokenError::EntropyExhausted)
    }

    /// Exact membership test.
    pub fn validate(&self, token: &str) -> bool {
        self.active.contains(token)
    }

    /// Remove `token` if it is active.
    ///
    /// Unknown or already revoked tokens are ignored. Returns whether a token
    /// was removed.
    pub fn revoke(&mut self, token: &str) -> bool {
        let removed = self.active.remove(token);
        if removed {
            tracing::debug!(active = self.active.len(), "revoked session token");
        }
        removed
    }

    /// Number of active tokens.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no token is active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Iterate over the active tokens in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &SessionToken> {
        self.active.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU8, Ordering},
        },
        time::Duration,
    };

    use proptest::prelude::*;

    use super::*;
    use crate::testing::SeededEnv;

    /// Produces the same bytes every time, to force collisions.
    #[derive(Clone, Default)]
    struct StuckEnv(Arc<AtomicU8>);

    impl Environment for StuckEnv {
        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.0.load(Ordering::Relaxed));
        }
    }

    #[test]
    fn issued_token_is_url_safe_and_sized() {
        let mut manager = TokenManager::new();
        let token = manager.issue(&SeededEnv::new(1)).unwrap();

        // 16 bytes -> 22 base64 chars without padding
        assert_eq!(token.as_str().len(), 22);
        assert!(
            token.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn validate_is_exact_membership() {
        let mut manager = TokenManager::new();
        let token = manager.issue(&SeededEnv::new(2)).unwrap();

        assert!(manager.validate(token.as_str()));
        assert!(!manager.validate(&token.as_str()[1..]));
        assert!(!manager.validate(""));
    }

    #[test]
    fn revoke_removes_only_the_named_token() {
        let env = SeededEnv::new(3);
        let mut manager = TokenManager::new();
        let a = manager.issue(&env).unwrap();
        let b = manager.issue(&env).unwrap();

        assert!(manager.revoke(a.as_str()));
        assert!(!manager.validate(a.as_str()));
        assert!(manager.validate(b.as_str()));
        assert!(!manager.revoke(a.as_str()), "second revoke is a no-op");
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn eleventh_issue_hits_the_limit() {
        let env = SeededEnv::new(4);
        let mut manager = TokenManager::new();

        for _ in 0..MAX_ACTIVE_TOKENS {
            manager.issue(&env).unwrap();
        }

        assert_eq!(manager.issue(&env), Err(TokenError::LimitExceeded));
        assert_eq!(manager.len(), MAX_ACTIVE_TOKENS);
    }

    #[test]
    fn revoking_frees_a_slot() {
        let env = SeededEnv::new(5);
        let mut manager = TokenManager::new();
        let tokens: Vec<_> = (0..MAX_ACTIVE_TOKENS).map(|_| manager.issue(&env).unwrap()).collect();

        manager.revoke(tokens[3].as_str());
        assert!(manager.issue(&env).is_ok());
    }

    #[test]
    fn colliding_entropy_is_reported() {
        let env = StuckEnv::default();
        let mut manager = TokenManager::new();

        manager.issue(&env).unwrap();
        assert_eq!(manager.issue(&env), Err(TokenError::EntropyExhausted));
        assert_eq!(manager.len(), 1);

        env.0.store(1, Ordering::Relaxed);
        assert!(manager.issue(&env).is_ok());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let mut manager = TokenManager::new();
        let token = manager.issue(&SeededEnv::new(6)).unwrap();

        let debug = format!("{token:?} {manager:?}");
        assert!(!debug.contains(token.as_str()));
    }

    proptest! {
        #[test]
        fn issued_tokens_are_unique(seed in any::<u64>(), n in 0usize..=MAX_ACTIVE_TOKENS) {
            let env = SeededEnv::new(seed);
            let mut manager = TokenManager::new();

            for _ in 0..n {
                let before: Vec<SessionToken> = manager.iter().cloned().collect();
                let token = manager.issue(&env).unwrap();
                prop_assert!(!before.contains(&token));
            }

            prop_assert_eq!(manager.len(), n);
        }

        #[test]
        fn revoking_unknown_token_is_a_no_op(
            seed in any::<u64>(),
            n in 0usize..=MAX_ACTIVE_TOKENS,
            unknown in "[A-Za-z0-9_-]{0,30}",
        ) {
            let env = SeededEnv::new(seed);
            let mut manager = TokenManager::new();
            for _ in 0..n {
                manager.issue(&env).unwrap();
            }
            prop_assume!(!manager.validate(&unknown));

            let mut before: Vec<String> = manager.iter().map(|t| t.as_str().to_owned()).collect();
            prop_assert!(!manager.revoke(&unknown));
            let mut after: Vec<String> = manager.iter().map(|t| t.as_str().to_owned()).collect();

            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }
    }
}
