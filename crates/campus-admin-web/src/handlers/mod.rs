//! Request handlers

pub mod actions;
pub mod auth;
pub mod dashboard;
pub mod entities;
pub mod health;

use crate::{
    middleware::CurrentUser,
    state::AppState,
    views::{ErrorTemplate, Shell, render_with_status},
};
use axum::{
    extract::Multipart,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use campus_admin_core::{EntitySchema, Upload, schema};
use tracing::{debug, warn};

/// Chrome for a signed-in page
pub(crate) fn shell(current: &CurrentUser, active: Option<&str>) -> Shell {
    Shell::new(active, current.browser.credentials().display_name())
}

/// Jar with the session cookie removed
pub(crate) fn clear_cookie(state: &AppState, jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(state.cookie_name().to_string()).path("/"))
}

/// End the browser's session after the backend rejected its token
pub(crate) fn force_logout(state: &AppState, current: &CurrentUser, jar: CookieJar) -> Response {
    warn!(session = %current.browser.id(), "backend rejected the session token, signing out");
    state.sessions.remove(current.browser.id());
    (clear_cookie(state, jar), Redirect::to("/login")).into_response()
}

/// Resolve an entity slug, or render a 404 page
pub(crate) fn entity(current: &CurrentUser, slug: &str) -> Result<&'static EntitySchema, Response> {
    schema::lookup(slug).map_err(|e| {
        debug!("{e}");
        not_found(current, "Page not found", "There is no such section.", "/")
    })
}

/// 404 page
pub(crate) fn not_found(current: &CurrentUser, title: &str, message: &str, back: &str) -> Response {
    render_with_status(
        StatusCode::NOT_FOUND,
        &ErrorTemplate {
            shell: shell(current, None),
            title: title.to_string(),
            message: message.to_string(),
            back_href: back.to_string(),
            retry_href: None,
        },
    )
}

/// Text fields and attached files of a multipart form
pub(crate) async fn read_submission(
    mut multipart: Multipart,
) -> Result<(Vec<(String, String)>, Vec<Upload>), MultipartError> {
    let mut fields = Vec::new();
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                uploads.push(Upload {
                    field: name,
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => fields.push((name, field.text().await?)),
        }
    }

    Ok((fields, uploads))
}
