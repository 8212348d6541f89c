//! Common test utilities for backend client tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use campus_admin_client::{ApiClient, CredentialStore, Session};
use serde_json::{Value, json};
use std::sync::{Arc, Once};
use wiremock::MockServer;

static INIT_LOGGER: Once = Once::new();

/// Initialize test logging (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Token every test session uses
pub const TEST_TOKEN: &str = "test-token-123";

/// Value of the `Authorization` header for [`TEST_TOKEN`]
pub const TEST_AUTH_HEADER: &str = "Token test-token-123";

/// Start a mock backend and a client pointed at it
pub async fn mock_backend() -> (MockServer, ApiClient) {
    init_test_logging();
    let server = MockServer::start().await;
    let client = ApiClient::new(server.uri()).expect("Failed to create API client");
    (server, client)
}

/// Session carrying [`TEST_TOKEN`]
pub fn test_session() -> Session {
    Session::new(TEST_TOKEN)
}

/// Store already holding both keys
pub fn signed_in_store() -> Arc<CredentialStore> {
    let store = Arc::new(CredentialStore::new());
    store.store(TEST_TOKEN, Some(json!({"username": "admin"})));
    store
}

/// The admission lead used across scenario tests
pub fn john_doe_lead() -> Value {
    json!({
        "id": 1,
        "first_name": "John",
        "last_name": "Doe",
        "email": "john@example.com",
        "mobile_number": "9876543210",
        "interested_course": "MBA",
        "created_at": "2025-10-10T09:30:00Z"
    })
}
