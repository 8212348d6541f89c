//! Sign-in and sign-out

use super::{clear_cookie, shell};
use crate::{
    middleware::CurrentUser,
    state::AppState,
    views::{LoginTemplate, LogoutTemplate, render, render_with_status},
};
use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use campus_admin_client::ClientError;
use campus_admin_core::ConfirmDialog;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use validator::Validate;

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const LOGIN_UNAVAILABLE: &str = "Something went wrong. Please try again later.";

/// Submitted credentials
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    /// Username
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login page; signed-in browsers go straight to the dashboard
pub async fn login_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let signed_in = jar
        .get(state.cookie_name())
        .and_then(|c| state.sessions.get(c.value()))
        .is_some_and(|browser| browser.session().is_some());

    if signed_in {
        return Redirect::to("/").into_response();
    }

    render(&LoginTemplate {
        error: None,
        username: String::new(),
    })
}

/// Exchange credentials for a token and open a browser session
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim().to_string();

    if let Err(errors) = form.validate() {
        let message = match campus_admin_core::Error::from(errors) {
            campus_admin_core::Error::Validation { message, .. } => message,
            other => other.to_string(),
        };
        return login_failed(StatusCode::UNPROCESSABLE_ENTITY, message, username);
    }

    let response = match state.api.login(&username, &form.password).await {
        Ok(response) => response,
        Err(ClientError::Rejected { status, body }) => {
            debug!(%status, "credentials rejected");
            return login_failed(StatusCode::UNAUTHORIZED, rejection_detail(&body), username);
        }
        Err(e) => {
            error!("Login request failed: {e}");
            return login_failed(
                StatusCode::BAD_GATEWAY,
                LOGIN_UNAVAILABLE.to_string(),
                username,
            );
        }
    };

    if let Some(previous) = jar
        .get(state.cookie_name())
        .and_then(|c| state.sessions.get(c.value()))
    {
        state.sessions.remove(previous.id());
    }

    let browser = state.sessions.create();
    browser.credentials().store(response.token, response.user);

    let cancel = CancellationToken::new();
    browser.set_guard(cancel.clone());
    let guard = state.guard.spawn(Arc::clone(browser.credentials()), cancel);

    let sessions = state.sessions.clone();
    let id = browser.id();
    tokio::spawn(async move {
        match guard.await {
            Ok(outcome) if outcome.requires_login() => {
                info!(session = %id, ?outcome, "session ended by token verification");
                sessions.remove(id);
            }
            Ok(_) => {}
            Err(e) => warn!(session = %id, "session guard task failed: {e}"),
        }
    });

    info!(session = %id, user = %username, "admin signed in");

    let cookie = Cookie::build((state.cookie_name().to_string(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    (jar.add(cookie), Redirect::to("/")).into_response()
}

fn login_failed(status: StatusCode, message: String, username: String) -> Response {
    render_with_status(
        status,
        &LoginTemplate {
            error: Some(message),
            username,
        },
    )
}

/// The backend's `detail` message, or a generic one
fn rejection_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| LOGIN_FAILED.to_string())
}

/// Logout confirmation
pub async fn logout_page(Extension(current): Extension<CurrentUser>) -> Response {
    render(&LogoutTemplate {
        shell: shell(&current, None),
        confirm: ConfirmDialog::logout("/"),
    })
}

/// Invalidate the token and end the browser session
///
/// A failed backend call is logged; the local session ends regardless.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Response {
    if let Err(e) = state.api.logout(&current.session).await {
        warn!("Backend logout failed: {e}");
    }

    state.sessions.remove(current.browser.id());
    info!(session = %current.browser.id(), "admin signed out");

    (clear_cookie(&state, jar), Redirect::to("/login")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejection_detail() {
        assert_eq!(
            rejection_detail(r#"{"detail": "Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(rejection_detail(r#"{"error": "Account locked"}"#), "Account locked");
        assert_eq!(rejection_detail("<html>500</html>"), LOGIN_FAILED);
        assert_eq!(rejection_detail(r#"{"detail": ""}"#), LOGIN_FAILED);
    }
}
