//! Periodic session verification
//!
//! A guard checks the stored token once immediately and then on a fixed
//! interval. Any non-success verification clears the credential store; a
//! single failure is never retried.

use crate::{
    client::ApiClient,
    error::{ClientError, ClientResult},
    session::{CredentialStore, Session},
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default time between verifications
pub const DEFAULT_VERIFY_INTERVAL: Duration = Duration::from_secs(300);

/// Something that can confirm a token is still valid
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify the session's token
    ///
    /// `Transport` errors mean the backend could not be asked; every other
    /// error means the token is no longer valid.
    async fn verify(&self, session: &Session) -> ClientResult<()>;
}

#[async_trait]
impl TokenVerifier for ApiClient {
    async fn verify(&self, session: &Session) -> ClientResult<()> {
        self.verify_token(session).await
    }
}

/// Result of one guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// No token stored; the user must sign in
    NoToken,
    /// Token accepted
    Valid,
    /// Token rejected; credentials were cleared
    Expired,
    /// Backend unreachable; the session is kept
    Unreachable,
    /// The guard was stopped by logout or shutdown
    Cancelled,
}

impl GuardOutcome {
    /// Whether the browser must be sent to the login page
    pub const fn requires_login(self) -> bool {
        matches!(self, Self::NoToken | Self::Expired)
    }
}

/// Token verification loop for one browser session
#[derive(Clone)]
pub struct SessionGuard {
    verifier: Arc<dyn TokenVerifier>,
    interval: Duration,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    /// Create a guard with the default five-minute interval
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            interval: DEFAULT_VERIFY_INTERVAL,
        }
    }

    /// Override the verification interval
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Verification interval
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one verification against the store
    pub async fn check(&self, store: &CredentialStore) -> GuardOutcome {
        let Some(session) = store.session() else {
            debug!("no stored token");
            return GuardOutcome::NoToken;
        };

        match self.verifier.verify(&session).await {
            Ok(()) => GuardOutcome::Valid,
            Err(ClientError::Transport { source, .. }) => {
                warn!(error = %source, "token verification could not reach backend");
                GuardOutcome::Unreachable
            }
            Err(err) => {
                info!(error = %err, "token rejected, clearing credentials");
                store.clear();
                GuardOutcome::Expired
            }
        }
    }

    /// Check immediately, then on every interval tick, until the session
    /// ends or `cancel` fires
    pub async fn run(&self, store: Arc<CredentialStore>, cancel: CancellationToken) -> GuardOutcome {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("session guard cancelled");
                    return GuardOutcome::Cancelled;
                }
                _ = ticker.tick() => {
                    let outcome = self.check(&store).await;
                    if outcome.requires_login() {
                        return outcome;
                    }
                }
            }
        }
    }

    /// Run the guard on a background task
    pub fn spawn(
        &self,
        store: Arc<CredentialStore>,
        cancel: CancellationToken,
    ) -> JoinHandle<GuardOutcome> {
        let guard = self.clone();
        tokio::spawn(async move { guard.run(store, cancel).await })
    }
}
