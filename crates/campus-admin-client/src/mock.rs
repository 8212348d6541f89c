//! Scripted token verifier for testing

use crate::{
    error::{ClientError, ClientResult},
    guard::TokenVerifier,
    session::Session,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Verifier that answers from a script, accepting once the script runs out
#[derive(Debug, Default)]
pub struct MockVerifier {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl MockVerifier {
    /// Verifier that accepts every token
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an accepted verification
    #[must_use]
    pub fn then_accept(self) -> Self {
        self.script.lock().push_back(true);
        self
    }

    /// Queue a rejected verification
    #[must_use]
    pub fn then_reject(self) -> Self {
        self.script.lock().push_back(false);
        self
    }

    /// Number of verifications performed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for MockVerifier {
    async fn verify(&self, _session: &Session) -> ClientResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let accepted = self.script.lock().pop_front().unwrap_or(true);
        if accepted {
            Ok(())
        } else {
            Err(ClientError::Unauthorized)
        }
    }
}
