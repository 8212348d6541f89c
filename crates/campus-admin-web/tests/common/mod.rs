//! Common test utilities for dashboard flow tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use campus_admin_client::{ApiClient, mock::MockVerifier};
use campus_admin_core::Config;
use campus_admin_web::{AppState, build_app, sessions::SessionRegistry};
use serde_json::{Value, json};
use std::sync::{Arc, Once};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

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

/// Token the mocked backend hands out
pub const TEST_TOKEN: &str = "test-token-123";

/// Boundary used by [`multipart_body`]
pub const BOUNDARY: &str = "campus-admin-test-boundary";

/// Dashboard wired to a mock backend
pub struct TestApp {
    /// Mock REST backend
    pub backend: MockServer,
    /// Dashboard router
    pub router: Router,
    /// Shared view of the browser sessions
    pub sessions: SessionRegistry,
}

fn test_config(backend: &MockServer) -> Config {
    let mut config = Config::default();
    config.backend.base_url = backend.uri();
    config
}

/// Dashboard whose session guard always accepts the token
pub async fn test_app() -> TestApp {
    init_test_logging();
    let backend = MockServer::start().await;
    let config = test_config(&backend);
    let api = ApiClient::from_config(&config.backend).unwrap();
    let state = AppState::with_verifier(config, api, Arc::new(MockVerifier::new()));
    let sessions = state.sessions.clone();

    TestApp {
        router: build_app(state),
        backend,
        sessions,
    }
}

/// Dashboard whose session guard verifies against the mock backend
pub async fn test_app_verifying_backend() -> TestApp {
    init_test_logging();
    let backend = MockServer::start().await;
    let state = AppState::new(test_config(&backend)).unwrap();
    let sessions = state.sessions.clone();

    TestApp {
        router: build_app(state),
        backend,
        sessions,
    }
}

impl TestApp {
    /// Send one request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sign in through `/login` against a mocked `/api/login/` and return
    /// the session cookie
    pub async fn sign_in(&self) -> String {
        Mock::given(method("POST"))
            .and(path("/api/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": TEST_TOKEN,
                "user": {"username": "admin", "first_name": "Asha"}
            })))
            .mount(&self.backend)
            .await;

        let response = self
            .send(form_request("/login", "", "username=admin&password=secret"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        session_cookie(&response).expect("login should set the session cookie")
    }
}

/// `name=value` of the session cookie set by a response
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("campus_admin_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Cookie value without the name
pub fn cookie_value(cookie: &str) -> &str {
    cookie.split_once('=').map_or(cookie, |(_, v)| v)
}

/// GET with the session cookie
pub fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// URL-encoded POST with the session cookie
pub fn form_request(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart POST with the session cookie
pub fn multipart_request(
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, files)))
        .unwrap()
}

/// Encode text fields and files as `multipart/form-data`
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Response body as text
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `Location` header of a redirect
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Number of table rows rendered for records
pub fn row_count(html: &str) -> usize {
    html.matches("<tr data-id=").count()
}

/// Admission leads served by the mock backend
pub fn leads() -> Value {
    json!([
        {
            "id": 1,
            "first_name": "John",
            "last_name": "Doe",
            "email": "john@example.com",
            "mobile_number": "9876543210",
            "interested_course": "MBA",
            "created_at": "2025-10-10T09:30:00Z"
        },
        {
            "id": 2,
            "first_name": "Asha",
            "last_name": "Rao",
            "email": "asha@example.com",
            "mobile_number": "9123456780",
            "interested_course": "BBA",
            "created_at": "2025-10-11T10:00:00Z"
        },
        {
            "id": 3,
            "first_name": "Vikram",
            "last_name": "Shah",
            "email": "vikram@example.com",
            "mobile_number": "9988776655",
            "interested_course": "MCA",
            "created_at": "2025-10-12T11:15:00Z"
        }
    ])
}
