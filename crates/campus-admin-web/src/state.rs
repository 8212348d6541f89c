//! Application state management

use crate::sessions::SessionRegistry;
use campus_admin_client::{ApiClient, ClientResult, SessionGuard, TokenVerifier};
use campus_admin_core::Config;
use std::{sync::Arc, time::Duration};

/// Application state holding configuration, the backend client and the
/// browser session registry
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Client for the REST backend
    pub api: ApiClient,
    /// Guard template cloned for every signed-in browser
    pub guard: SessionGuard,
    /// Signed-in browsers
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Create state that verifies tokens against the configured backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config) -> ClientResult<Self> {
        let api = ApiClient::from_config(&config.backend)?;
        let verifier: Arc<dyn TokenVerifier> = Arc::new(api.clone());
        Ok(Self::with_verifier(config, api, verifier))
    }

    /// Create state with a custom token verifier
    pub fn with_verifier(config: Config, api: ApiClient, verifier: Arc<dyn TokenVerifier>) -> Self {
        let guard = SessionGuard::new(verifier)
            .with_interval(Duration::from_secs(config.session.verify_interval_secs));

        Self {
            config,
            api,
            guard,
            sessions: SessionRegistry::new(),
        }
    }

    /// Name of the browser session cookie
    pub fn cookie_name(&self) -> &str {
        &self.config.session.cookie_name
    }
}
