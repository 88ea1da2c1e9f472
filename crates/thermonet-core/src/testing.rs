//! Shared test environment.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::env::Environment;

/// Seeded, non-sleeping environment for unit tests.
#[derive(Clone)]
pub(crate) struct SeededEnv(Arc<Mutex<StdRng>>);

impl SeededEnv {
    pub(crate) fn new(seed: u64) -> Self {
        Self(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }
}

impl Environment for SeededEnv {
    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).fill_bytes(buffer);
    }
}
