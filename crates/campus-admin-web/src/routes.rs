//! Route definitions for the dashboard

use crate::{
    handlers::{actions, auth, dashboard, entities, health},
    middleware::require_session,
    state::AppState,
};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;

/// Build the complete dashboard router
///
/// Everything except `/login` and `/health` requires a signed-in session.
pub fn build_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/logout", get(auth::logout_page).post(auth::logout))
        // Entity views
        .route("/:entity", get(entities::list))
        .route("/:entity/add", get(entities::new_form).post(entities::create))
        .route("/:entity/:id", get(entities::detail))
        .route(
            "/:entity/:id/edit",
            get(entities::edit_form).post(entities::update),
        )
        .route(
            "/:entity/:id/delete",
            get(entities::confirm_delete).post(entities::delete),
        )
        // Row toggles
        .route("/:entity/:id/:action", post(actions::record_action))
        .route_layer(from_fn_with_state(state, require_session));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/login", get(auth::login_page).post(auth::login))
        .merge(protected)
}
