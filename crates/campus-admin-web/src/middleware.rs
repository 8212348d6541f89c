//! Session gate for dashboard routes

use crate::{sessions::BrowserSession, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use campus_admin_client::Session;
use std::sync::Arc;
use tracing::debug;

/// Signed-in browser attached to every gated request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The browser's server-side state
    pub browser: Arc<BrowserSession>,
    /// Explicit session for backend calls
    pub session: Session,
}

/// Redirect to `/login` unless the request carries a signed-in session cookie
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let current = jar
        .get(state.cookie_name())
        .and_then(|cookie| state.sessions.get(cookie.value()))
        .and_then(|browser| {
            browser
                .session()
                .map(|session| CurrentUser { browser, session })
        });

    let Some(current) = current else {
        debug!(path = %request.uri().path(), "no signed-in session, redirecting to login");
        return Redirect::to("/login").into_response();
    };

    current.browser.touch();
    request.extensions_mut().insert(current);
    next.run(request).await
}
