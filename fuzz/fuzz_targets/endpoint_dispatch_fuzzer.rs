//! Fuzz target for [`Endpoint`] request handling
//!
//! Prevent token-gating bypass and unbounded token growth.
//!
//! # Strategy
//!
//! - Event sequences: correct and wrong `AUTH`, `LOGOUT` of live and unknown
//!   tokens, batches under live and unknown tokens, raw plaintext and raw
//!   envelopes
//! - Batches carry arbitrary command text, including `;`-joined open verbs
//!
//! # Invariants
//!
//! - Active tokens NEVER exceed the limit
//! - A wrong `AUTH` NEVER produces a reply or a token
//! - A batch under an unknown token produces exactly one `Bad Token` and
//!   changes nothing
//! - NEVER panic on arbitrary envelopes

#![no_main]

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use thermonet_core::{
    Endpoint, EndpointConfig, Environment, FixedSource, Reply, MAX_ACTIVE_TOKENS,
};
use thermonet_crypto::{PasswordDigest, SecretKey, KEY_SIZE};

const PASSWORD: &str = "fuzz";

/// Counter-based entropy. Deterministic so crashes reproduce.
#[derive(Clone, Default)]
struct FuzzEnv(Arc<AtomicU64>);

impl Environment for FuzzEnv {
    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for chunk in buffer.chunks_mut(8) {
            let n = self.0.fetch_add(1, Ordering::Relaxed).to_le_bytes();
            chunk.copy_from_slice(&n[..chunk.len()]);
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzEvent {
    Auth { correct: bool },
    Logout { slot: u8 },
    Batch { slot: Option<u8>, commands: Vec<String> },
    Plaintext(String),
    Envelope(Vec<u8>),
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let config = EndpointConfig::new(PASSWORD, SecretKey::from_bytes([7; KEY_SIZE]));
    let mut endpoint = Endpoint::new(FuzzEnv::default(), config, FixedSource::new(300.0));
    let mut issued: Vec<String> = Vec::new();

    for event in events {
        match event {
            FuzzEvent::Auth { correct } => {
                let password = if correct { PASSWORD } else { "wrong" };
                let digest = PasswordDigest::of_password(password);
                let before = endpoint.tokens().len();
                let replies = endpoint.dispatch(&format!("AUTH {}", digest.as_str()));

                if correct {
                    assert_eq!(replies.len(), 1);
                    match &replies[0] {
                        Reply::Token(token) => issued.push(token.as_str().to_string()),
                        Reply::TooManyTokens => assert_eq!(before, MAX_ACTIVE_TOKENS),
                        other => panic!("unexpected AUTH reply {other:?}"),
                    }
                } else {
                    assert!(replies.is_empty());
                    assert_eq!(endpoint.tokens().len(), before);
                }
            },
            FuzzEvent::Logout { slot } => {
                let token = issued.get(usize::from(slot)).cloned().unwrap_or_default();
                let replies = endpoint.dispatch(&format!("LOGOUT {token}"));
                assert!(replies.iter().all(|r| matches!(r, Reply::BadCommand)));
            },
            FuzzEvent::Batch { slot, commands } => {
                let token = slot
                    .and_then(|slot| issued.get(usize::from(slot)).cloned())
                    .unwrap_or_else(|| "unknown".to_string());
                let live = endpoint.tokens().validate(&token);
                let before = endpoint.tokens().len();
                let unit = endpoint.degree_unit();

                let frame = format!("{token};{}", commands.join(";"));
                let replies = endpoint.dispatch(&frame);

                if !live && !frame.contains(' ') {
                    assert_eq!(replies, vec![Reply::BadToken]);
                    assert_eq!(endpoint.tokens().len(), before);
                    assert_eq!(endpoint.degree_unit(), unit);
                }
            },
            FuzzEvent::Plaintext(text) => {
                let _ = endpoint.dispatch(&text);
            },
            FuzzEvent::Envelope(bytes) => {
                let _ = endpoint.handle_datagram(&bytes);
            },
        }

        assert!(endpoint.tokens().len() <= MAX_ACTIVE_TOKENS);
    }
});
