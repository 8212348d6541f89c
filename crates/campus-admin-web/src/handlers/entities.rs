//! Generic list, detail, add/edit and delete views
//!
//! Lists are fetched in full on every visit and cached per browser. Deletes
//! and toggles patch that cache instead of refetching.

use super::{entity, force_logout, not_found, read_submission, shell};
use crate::{
    middleware::CurrentUser,
    sessions::BrowserSession,
    state::AppState,
    views::{
        DetailTemplate, FormTarget, FormTemplate, ListTemplate, query_suffix, render,
        render_with_status,
    },
};
use axum::{
    Extension, Form,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use campus_admin_client::{ClientError, ClientResult};
use campus_admin_core::{
    ConfirmDialog, EntitySchema, FormAction, FormState, ListQuery, LocalCollection, PhaseEvent,
    Record, RecordId, SubmitMode, ViewPhase, WriteTicket, schema::DetailSource,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Full refetch of one entity's list into the browser's cache
///
/// An error status from the backend leaves an empty list. Only an
/// unreachable backend or a rejected token is returned as an error.
pub(crate) async fn load(
    state: &AppState,
    current: &CurrentUser,
    schema: &'static EntitySchema,
    category: Option<&str>,
) -> ClientResult<()> {
    current
        .browser
        .with_collection(schema, LocalCollection::begin_load);

    match state.api.list(&current.session, schema, category).await {
        Ok(records) => {
            debug!(entity = schema.slug, count = records.len(), "list loaded");
            current
                .browser
                .with_collection(schema, |c| c.replace_all(records));
            Ok(())
        }
        Err(e) if e.is_auth_failure() => Err(e),
        Err(e) if e.is_transport() => {
            warn!(entity = schema.slug, "list request failed: {e}");
            let message = format!("Failed to load {}", schema.plural.to_lowercase());
            current.browser.with_collection(schema, |c| c.fail(message));
            Err(e)
        }
        Err(e) => {
            warn!(entity = schema.slug, "list request returned an error, showing no rows: {e}");
            current
                .browser
                .with_collection(schema, |c| c.replace_all(Vec::new()));
            Ok(())
        }
    }
}

/// Load the list unless a previous fetch is cached
pub(crate) async fn ensure_loaded(
    state: &AppState,
    current: &CurrentUser,
    schema: &'static EntitySchema,
    category: Option<&str>,
) -> ClientResult<()> {
    if current.browser.with_collection(schema, |c| c.is_loaded()) {
        return Ok(());
    }
    load(state, current, schema, category).await
}

/// Render the cached list, filtered by `query`
pub(crate) fn list_page(
    current: &CurrentUser,
    schema: &'static EntitySchema,
    query: &ListQuery,
    alert: Option<String>,
    confirm: Option<ConfirmDialog>,
) -> Response {
    let (records, phase, busy) = current.browser.with_collection(schema, |c| {
        let busy: Vec<String> = c
            .records()
            .iter()
            .filter_map(Record::id)
            .filter(|id| c.row_phase(id).is_busy())
            .map(|id| id.to_string())
            .collect();
        (c.records().to_vec(), c.phase().clone(), busy)
    });

    let mut page = ListTemplate::new(shell(current, Some(schema.slug)), schema, &records, query)
        .with_alert(alert)
        .with_busy_rows(&busy);
    if let Some(confirm) = confirm {
        page = page.with_confirm(confirm);
    }

    match phase {
        ViewPhase::ErrorShown(message) => {
            render_with_status(StatusCode::BAD_GATEWAY, &page.with_error(message))
        }
        _ => render(&page),
    }
}

/// In-flight write on one row
///
/// Finishes the row's write when dropped, so a handler cancelled mid-request
/// leaves no stale in-flight mark behind. Writes never wait on each other.
#[derive(Debug)]
pub(crate) struct RowWrite {
    browser: Arc<BrowserSession>,
    schema: &'static EntitySchema,
    ticket: Option<WriteTicket>,
}

impl RowWrite {
    /// Mark a delete or toggle on `id` as in flight
    pub(crate) fn begin(
        current: &CurrentUser,
        schema: &'static EntitySchema,
        id: &RecordId,
        event: &PhaseEvent,
    ) -> Self {
        let ticket = current
            .browser
            .with_collection(schema, |c| c.begin_write(id.clone(), event))
            .map_err(|e| debug!("{e}"))
            .ok();
        Self {
            browser: Arc::clone(&current.browser),
            schema,
            ticket,
        }
    }
}

impl Drop for RowWrite {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.browser
                .with_collection(self.schema, |c| c.finish_write(ticket));
        }
    }
}

/// Id of a cached record, or the id parsed from the path
pub(crate) fn cached_id(current: &CurrentUser, schema: &EntitySchema, raw_id: &str) -> RecordId {
    current
        .browser
        .with_collection(schema, |c| c.find(raw_id).and_then(Record::id))
        .unwrap_or_else(|| RecordId::from_path(raw_id))
}

/// Entity list with search and category filter
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    if let Err(e) = load(&state, &current, schema, query.selected_category()).await
        && e.is_auth_failure()
    {
        return force_logout(&state, &current, jar);
    }

    list_page(&current, schema, &query, None, None)
}

/// Find a record in the cached list, fetching once if it is stale or missing
async fn cached_record(
    state: &AppState,
    current: &CurrentUser,
    schema: &'static EntitySchema,
    raw_id: &str,
) -> ClientResult<Option<Record>> {
    ensure_loaded(state, current, schema, None).await?;
    if let Some(record) = current
        .browser
        .with_collection(schema, |c| c.find(raw_id).cloned())
    {
        return Ok(Some(record));
    }

    load(state, current, schema, None).await?;
    Ok(current
        .browser
        .with_collection(schema, |c| c.find(raw_id).cloned()))
}

/// One record from its detail source
async fn fetch_record(
    state: &AppState,
    current: &CurrentUser,
    schema: &'static EntitySchema,
    raw_id: &str,
) -> ClientResult<Option<Record>> {
    match schema.endpoints.detail {
        DetailSource::Remote(_) => {
            match state
                .api
                .get(&current.session, schema, &RecordId::from_path(raw_id))
                .await
            {
                Ok(record) => Ok(Some(record)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        }
        DetailSource::CachedList | DetailSource::Unavailable => {
            cached_record(state, current, schema, raw_id).await
        }
    }
}

/// Response for a record that could not be loaded
fn load_failed(
    state: &AppState,
    current: &CurrentUser,
    jar: CookieJar,
    schema: &EntitySchema,
    error: &ClientError,
) -> Response {
    if error.is_auth_failure() {
        return force_logout(state, current, jar);
    }
    warn!(entity = schema.slug, "failed to load record: {error}");
    not_found(
        current,
        &format!("{} not found", schema.singular),
        &format!(
            "The requested {} could not be loaded.",
            schema.singular.to_lowercase()
        ),
        &schema.list_path(),
    )
}

/// Detail view of one record
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path((slug, raw_id)): Path<(String, String)>,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    if !schema.has_detail() {
        return Redirect::to(&schema.list_path()).into_response();
    }

    match fetch_record(&state, &current, schema, &raw_id).await {
        Ok(Some(record)) => render(&DetailTemplate::new(
            shell(&current, Some(schema.slug)),
            schema,
            &record,
            state.api.base_url(),
        )),
        Ok(None) => {
            debug!(entity = schema.slug, id = %raw_id, "record not found, back to list");
            Redirect::to(&schema.list_path()).into_response()
        }
        Err(e) => load_failed(&state, &current, jar, schema, &e),
    }
}

/// Blank add form
pub async fn new_form(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    if !schema.can_create() {
        return Redirect::to(&schema.list_path()).into_response();
    }

    render(&FormTemplate::new(
        shell(&current, Some(schema.slug)),
        schema,
        &FormState::empty(schema),
        &FormTarget::Create,
        state.api.base_url(),
    ))
}

/// Submitted form, split into the pressed button and the field state
struct Submission {
    action: FormAction,
    form: FormState,
    draft: Option<Uuid>,
}

/// Read a submitted form
///
/// Files kept from an earlier render of the same form are attached again
/// unless the browser sent a new file for that field.
async fn read_form(
    current: &CurrentUser,
    schema: &EntitySchema,
    multipart: Multipart,
) -> Result<Submission, Response> {
    let (fields, uploads) = read_submission(multipart).await.map_err(|e| {
        warn!(entity = schema.slug, "unreadable form submission: {e}");
        (StatusCode::BAD_REQUEST, e.body_text()).into_response()
    })?;

    let field = |wanted: &str| {
        fields
            .iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, value)| value.as_str())
    };
    let action = FormAction::parse(field("form_action"));
    let draft = field("form_draft").and_then(|raw| Uuid::parse_str(raw).ok());

    let mut form = FormState::from_submission(schema, &fields, uploads);
    if let Some(draft) = draft {
        for kept in current.browser.take_uploads(draft) {
            if !form.uploads().iter().any(|u| u.field == kept.field) {
                form.attach(kept);
            }
        }
    }

    Ok(Submission {
        action,
        form,
        draft,
    })
}

/// Render the form, keeping its chosen files server-side for the next submit
fn form_page(
    state: &AppState,
    current: &CurrentUser,
    schema: &'static EntitySchema,
    form: &FormState,
    target: &FormTarget,
    draft: Option<Uuid>,
    error: Option<String>,
) -> Response {
    let draft = (!form.uploads().is_empty()).then(|| {
        let draft = draft.unwrap_or_else(Uuid::new_v4);
        current.browser.stash_uploads(draft, form.uploads().to_vec());
        draft.to_string()
    });

    let page = FormTemplate::new(
        shell(current, Some(schema.slug)),
        schema,
        form,
        target,
        state.api.base_url(),
    )
    .with_draft(draft);
    let status = if error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    render_with_status(status, &page.with_error(error))
}

fn validation_message(error: campus_admin_core::Error) -> String {
    match error {
        campus_admin_core::Error::Validation { message, .. } => message,
        other => other.to_string(),
    }
}

/// Create a record, or apply a module edit and show the form again
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    if !schema.can_create() {
        return Redirect::to(&schema.list_path()).into_response();
    }

    let Submission {
        action,
        mut form,
        draft,
    } = match read_form(&current, schema, multipart).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };
    let target = FormTarget::Create;

    if action != FormAction::Submit {
        form.apply(action);
        return form_page(&state, &current, schema, &form, &target, draft, None);
    }

    let payload = match form.to_payload(schema, SubmitMode::Create) {
        Ok(payload) => payload,
        Err(e) => {
            let message = validation_message(e);
            return form_page(&state, &current, schema, &form, &target, draft, Some(message));
        }
    };

    match state.api.create(&current.session, schema, payload).await {
        Ok(created) => {
            let id = created.as_ref().and_then(Record::id);
            info!(entity = schema.slug, id = ?id, "record created");
            Redirect::to(&schema.after_submit_path(id.as_ref())).into_response()
        }
        Err(e) if e.is_auth_failure() => force_logout(&state, &current, jar),
        Err(e) => {
            warn!(entity = schema.slug, "create failed: {e}");
            let message = format!("Failed to create {}: {}", schema.singular, e.user_message());
            form_page(&state, &current, schema, &form, &target, draft, Some(message))
        }
    }
}

/// Edit form filled from the stored record
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path((slug, raw_id)): Path<(String, String)>,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    if !schema.can_edit() {
        return Redirect::to(&schema.list_path()).into_response();
    }

    match fetch_record(&state, &current, schema, &raw_id).await {
        Ok(Some(record)) => {
            let form = FormState::from_record(schema, &record);
            let target = FormTarget::Update {
                id: raw_id,
                existing: Some(record),
            };
            form_page(&state, &current, schema, &form, &target, None, None)
        }
        Ok(None) => Redirect::to(&schema.list_path()).into_response(),
        Err(e) => load_failed(&state, &current, jar, schema, &e),
    }
}

/// Update a record, or apply a module edit and show the form again
///
/// A new file switches the request to multipart; without one the stored
/// file is kept.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path((slug, raw_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    if !schema.can_edit() {
        return Redirect::to(&schema.list_path()).into_response();
    }

    let Submission {
        action,
        mut form,
        draft,
    } = match read_form(&current, schema, multipart).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };
    let id = RecordId::from_path(&raw_id);
    let target = FormTarget::Update {
        id: raw_id,
        existing: None,
    };

    if action != FormAction::Submit {
        form.apply(action);
        return form_page(&state, &current, schema, &form, &target, draft, None);
    }

    let payload = match form.to_payload(schema, SubmitMode::Update) {
        Ok(payload) => payload,
        Err(e) => {
            let message = validation_message(e);
            return form_page(&state, &current, schema, &form, &target, draft, Some(message));
        }
    };
    let multipart = payload.is_multipart();

    match state.api.update(&current.session, schema, &id, payload).await {
        Ok(_) => {
            info!(entity = schema.slug, %id, multipart, "record updated");
            Redirect::to(&schema.after_submit_path(Some(&id))).into_response()
        }
        Err(e) if e.is_auth_failure() => force_logout(&state, &current, jar),
        Err(e) => {
            warn!(entity = schema.slug, %id, "update failed: {e}");
            let message = format!("Failed to update {}: {}", schema.singular, e.user_message());
            form_page(&state, &current, schema, &form, &target, draft, Some(message))
        }
    }
}

/// List with the delete confirmation open over the cached rows
pub async fn confirm_delete(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path((slug, raw_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    let return_to = format!("{}{}", schema.list_path(), query_suffix(&query));
    if !schema.can_delete() {
        return Redirect::to(&return_to).into_response();
    }

    if let Err(e) = ensure_loaded(&state, &current, schema, query.selected_category()).await
        && e.is_auth_failure()
    {
        return force_logout(&state, &current, jar);
    }

    let Some(record) = current
        .browser
        .with_collection(schema, |c| c.find(&raw_id).cloned())
    else {
        return Redirect::to(&return_to).into_response();
    };

    let dialog = ConfirmDialog::delete(schema, &record, &raw_id, &return_to);
    list_page(&current, schema, &query, None, Some(dialog))
}

/// Delete one record and drop it from the cached list without refetching
///
/// A failed delete leaves the rows untouched and shows the backend's
/// message.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Path((slug, raw_id)): Path<(String, String)>,
    Form(query): Form<ListQuery>,
) -> Response {
    let schema = match entity(&current, &slug) {
        Ok(schema) => schema,
        Err(response) => return response,
    };

    if !schema.can_delete() {
        return Redirect::to(&schema.list_path()).into_response();
    }

    let id = cached_id(&current, schema, &raw_id);
    let write = RowWrite::begin(&current, schema, &id, &PhaseEvent::BeginDelete);
    let result = state.api.delete(&current.session, schema, &id).await;

    let alert = match result {
        Ok(()) => {
            current.browser.with_collection(schema, |c| c.remove_by_id(&id));
            info!(entity = schema.slug, %id, "record deleted");
            None
        }
        Err(e) if e.is_auth_failure() => return force_logout(&state, &current, jar),
        Err(e) => {
            warn!(entity = schema.slug, %id, "delete failed: {e}");
            Some(format!("Failed to delete {}: {}", schema.singular, e.user_message()))
        }
    };
    drop(write);

    list_page(&current, schema, &query, alert, None)
}
