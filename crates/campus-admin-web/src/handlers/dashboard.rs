//! Home dashboard

use super::{force_logout, shell};
use crate::{
    middleware::CurrentUser,
    state::AppState,
    views::{DashboardTemplate, render, render_with_status},
};
use axum::{Extension, extract::State, http::StatusCode, response::Response};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::error;

/// Totals and recent activity; all three backend calls must succeed
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Response {
    match state.api.dashboard_summary(&current.session).await {
        Ok(summary) => render(&DashboardTemplate::new(
            shell(&current, None),
            summary.counts.total_applications,
            summary.counts.total_contacts,
            &summary.recent_leads,
            &summary.recent_contacts,
        )),
        Err(e) if e.is_auth_failure() => force_logout(&state, &current, jar),
        Err(e) => {
            error!("Failed to load dashboard data: {e}");
            render_with_status(
                StatusCode::BAD_GATEWAY,
                &DashboardTemplate::failed(shell(&current, None)),
            )
        }
    }
}
