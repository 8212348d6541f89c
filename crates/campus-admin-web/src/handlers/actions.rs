//! Inline toggles on list rows

use super::{
    entities::{RowWrite, cached_id, ensure_loaded, list_page},
    entity, force_logout, not_found,
};
use crate::{middleware::CurrentUser, state::AppState};
use axum::{
    Extension, Form,
    extract::{Path, State},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use campus_admin_core::{EntitySchema, ListQuery, PhaseEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Dispatch a row action such as `toggle-top-choice`
pub async fn record_action(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path((slug, raw_id, action)): Path<(String, String, String)>,
    Form(query): Form<ListQuery>,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    match (schema.slug, action.as_str()) {
        ("courses", "toggle-top-choice") => {
            toggle_top_choice(&state, &current, jar, schema, &raw_id, &query).await
        }
        ("events", "toggle-active") => {
            toggle_active(&state, &current, jar, schema, &raw_id, &query).await
        }
        _ => not_found(&current, "Page not found", "There is no such action.", &schema.list_path()),
    }
}

/// Flip a course's top-choice flag and swap in the returned course
async fn toggle_top_choice(
    state: &AppState,
    current: &CurrentUser,
    jar: CookieJar,
    schema: &'static EntitySchema,
    raw_id: &str,
    query: &ListQuery,
) -> Response {
    if let Err(e) = ensure_loaded(state, current, schema, query.selected_category()).await
        && e.is_auth_failure()
    {
        return force_logout(state, current, jar);
    }

    let id = cached_id(current, schema, raw_id);
    let write = RowWrite::begin(current, schema, &id, &PhaseEvent::BeginSubmit);
    let alert = match state.api.toggle_top_choice(&current.session, &id).await {
        Ok(course) => {
            info!(%id, top_choice = course.flag("top_choice"), "course top choice toggled");
            if !current.browser.with_collection(schema, |c| c.replace_record(course)) {
                warn!(%id, "toggled course is not in the cached list");
            }
            None
        }
        Err(e) if e.is_auth_failure() => return force_logout(state, current, jar),
        Err(e) => {
            warn!(%id, "top choice toggle failed: {e}");
            Some(format!("Failed to update course: {}", e.user_message()))
        }
    };
    drop(write);

    list_page(current, schema, query, alert, None)
}

/// Flip an event's `is_active` flag with a partial update
async fn toggle_active(
    state: &AppState,
    current: &CurrentUser,
    jar: CookieJar,
    schema: &'static EntitySchema,
    raw_id: &str,
    query: &ListQuery,
) -> Response {
    if let Err(e) = ensure_loaded(state, current, schema, query.selected_category()).await
        && e.is_auth_failure()
    {
        return force_logout(state, current, jar);
    }

    let found = current.browser.with_collection(schema, |c| {
        c.find(raw_id)
            .and_then(|r| r.id().map(|id| (id, r.flag("is_active"))))
    });
    let Some((id, active)) = found else {
        let message = format!("{} not found", schema.singular);
        return list_page(current, schema, query, Some(message), None);
    };

    let write = RowWrite::begin(current, schema, &id, &PhaseEvent::BeginSubmit);
    let alert = match state
        .api
        .set_event_active(&current.session, schema, &id, !active)
        .await
    {
        Ok(_) => {
            info!(%id, active = !active, "event status changed");
            current.browser.with_collection(schema, |c| {
                if let Some(event) = c.get_mut(&id) {
                    event.set("is_active", Value::Bool(!active));
                }
            });
            None
        }
        Err(e) if e.is_auth_failure() => return force_logout(state, current, jar),
        Err(e) => {
            warn!(%id, "event status change failed: {e}");
            Some(format!("Failed to update event: {}", e.user_message()))
        }
    };
    drop(write);

    list_page(current, schema, query, alert, None)
}
