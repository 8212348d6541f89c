//! Page templates and the view models they render

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use campus_admin_core::{
    ConfirmDialog, FormState, ListQuery, Record,
    confirm::display_name,
    filter::category_choices,
    form::{ModuleGroup, parse_modules},
    schema::{self, EntitySchema, FieldKind, FieldSpec},
    utils::{PREVIEW_CHARS, format_long_date, format_short_date, truncate_text},
};
use serde_json::Value;
use tracing::error;

/// Render a template with `200 OK`
pub fn render<T: Template>(template: &T) -> Response {
    render_with_status(StatusCode::OK, template)
}

/// Render a template with the given status
pub fn render_with_status<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("Failed to render template: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

/// One sidebar link
#[derive(Debug, Clone)]
pub struct NavItem {
    /// Target path
    pub href: String,
    /// Visible label
    pub label: &'static str,
    /// Whether this is the current section
    pub active: bool,
}

/// Dashboard chrome shared by every signed-in page
#[derive(Debug, Clone)]
pub struct Shell {
    /// Sidebar links, one per entity
    pub nav: Vec<NavItem>,
    /// Name shown in the header
    pub user: String,
    /// Whether the home dashboard is the current page
    pub home_active: bool,
}

impl Shell {
    /// Chrome with `active` highlighted; `None` highlights the home page
    pub fn new(active: Option<&str>, user: Option<String>) -> Self {
        let nav = schema::all()
            .iter()
            .map(|s| NavItem {
                href: s.list_path(),
                label: s.plural,
                active: active == Some(s.slug),
            })
            .collect();

        Self {
            nav,
            user: user.unwrap_or_else(|| "Admin".to_string()),
            home_active: active.is_none(),
        }
    }
}

/// `<option>` of a select
#[derive(Debug, Clone)]
pub struct OptionView {
    /// Submitted value
    pub value: String,
    /// Visible label
    pub label: String,
    /// Pre-selected
    pub selected: bool,
}

/// Sign-in page
#[derive(Debug, Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    /// Message from the last attempt
    pub error: Option<String>,
    /// Username to refill
    pub username: String,
}

/// Row of the recent-leads panel
#[derive(Debug, Clone)]
pub struct LeadSummary {
    /// Full name
    pub name: String,
    /// Course of interest
    pub course: String,
    /// Short submission date
    pub date: String,
}

/// Row of the recent-contacts panel
#[derive(Debug, Clone)]
pub struct ContactSummary {
    /// Sender name
    pub name: String,
    /// Truncated message
    pub message: String,
    /// Short submission date
    pub date: String,
}

/// Home dashboard
#[derive(Debug, Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    /// Chrome
    pub shell: Shell,
    /// Set when loading failed
    pub error: Option<String>,
    /// Admission leads received
    pub total_applications: u64,
    /// Contact messages received
    pub total_contacts: u64,
    /// Latest leads
    pub leads: Vec<LeadSummary>,
    /// Latest contact messages
    pub contacts: Vec<ContactSummary>,
}

impl DashboardTemplate {
    /// Panel rows from the backend's recent lists
    pub fn new(
        shell: Shell,
        total_applications: u64,
        total_contacts: u64,
        leads: &[Record],
        contacts: &[Record],
    ) -> Self {
        let leads = leads
            .iter()
            .map(|lead| LeadSummary {
                name: format!("{} {}", lead.text("first_name"), lead.text("last_name"))
                    .trim()
                    .to_string(),
                course: lead.text("interested_course"),
                date: format_short_date(&lead.text("created_at")),
            })
            .collect();

        let contacts = contacts
            .iter()
            .map(|contact| ContactSummary {
                name: contact.text("name"),
                message: truncate_text(&contact.text("message"), PREVIEW_CHARS),
                date: format_short_date(&contact.text("created_at")),
            })
            .collect();

        Self {
            shell,
            error: None,
            total_applications,
            total_contacts,
            leads,
            contacts,
        }
    }

    /// Failure panel with a retry link
    pub fn failed(shell: Shell) -> Self {
        Self {
            shell,
            error: Some("Failed to load dashboard data".to_string()),
            total_applications: 0,
            total_contacts: 0,
            leads: Vec::new(),
            contacts: Vec::new(),
        }
    }
}

/// Inline toggle button on a list row
#[derive(Debug, Clone)]
pub struct ToggleView {
    /// Form target
    pub action: String,
    /// Button label
    pub label: String,
}

/// One table row
#[derive(Debug, Clone)]
pub struct RowView {
    /// Raw id, for `data-id`
    pub id: String,
    /// Column texts
    pub cells: Vec<String>,
    /// Detail link
    pub view_href: Option<String>,
    /// Edit link
    pub edit_href: Option<String>,
    /// Delete confirmation link
    pub delete_href: Option<String>,
    /// Inline toggle
    pub toggle: Option<ToggleView>,
    /// A delete or toggle on this row is still in flight
    pub busy: bool,
}

/// Generic entity list
#[derive(Debug, Template)]
#[template(path = "list.html")]
pub struct ListTemplate {
    /// Chrome
    pub shell: Shell,
    /// Entity slug
    pub slug: &'static str,
    /// Plural label
    pub title: &'static str,
    /// Singular label
    pub singular: &'static str,
    /// Column headers
    pub headers: Vec<&'static str>,
    /// Filtered rows
    pub rows: Vec<RowView>,
    /// Size of the unfiltered collection
    pub total: usize,
    /// Current search text
    pub search: String,
    /// Current category selection
    pub category: String,
    /// Label of the category select, if the entity has one
    pub category_label: Option<&'static str>,
    /// Category options
    pub categories: Vec<OptionView>,
    /// Empty-state title
    pub empty_title: String,
    /// Empty-state hint
    pub empty_hint: &'static str,
    /// Add link
    pub add_href: Option<String>,
    /// Result of the last write, shown as an alert
    pub alert: Option<String>,
    /// Load failure, shown with a retry link
    pub error: Option<String>,
    /// Link that reloads this view
    pub retry_href: String,
    /// Open delete confirmation
    pub confirm: Option<ConfirmDialog>,
}

impl ListTemplate {
    /// Build the table for `records` filtered by `query`
    pub fn new(
        shell: Shell,
        schema: &'static EntitySchema,
        records: &[Record],
        query: &ListQuery,
    ) -> Self {
        let filtered = campus_admin_core::filter_records(schema, records, query);
        let suffix = query_suffix(query);
        let selected = query.selected_category().unwrap_or_default().to_string();

        let rows = filtered
            .into_iter()
            .filter_map(|record| row_view(schema, record, &suffix))
            .collect();

        let categories = category_choices(schema, records)
            .into_iter()
            .map(|(value, label)| OptionView {
                selected: value == selected,
                value,
                label,
            })
            .collect();

        let headers = schema
            .columns
            .iter()
            .filter_map(|c| schema.field(c).map(|f| f.label))
            .collect();

        Self {
            shell,
            slug: schema.slug,
            title: schema.plural,
            singular: schema.singular,
            headers,
            rows,
            total: records.len(),
            search: query.search.clone(),
            category: selected,
            category_label: schema.category.map(|c| c.label),
            categories,
            empty_title: schema.empty_title(),
            empty_hint: schema.empty_hint(query.is_active()),
            add_href: schema
                .can_create()
                .then(|| format!("/{}/add", schema.slug)),
            alert: None,
            error: None,
            retry_href: format!("{}{suffix}", schema.list_path()),
            confirm: None,
        }
    }

    /// Attach an alert message
    #[must_use]
    pub fn with_alert(mut self, alert: Option<String>) -> Self {
        self.alert = alert;
        self
    }

    /// Flag the rows whose ids have a write in flight
    #[must_use]
    pub fn with_busy_rows(mut self, busy: &[String]) -> Self {
        for row in &mut self.rows {
            row.busy = busy.contains(&row.id);
        }
        self
    }

    /// Attach a confirmation dialog
    #[must_use]
    pub fn with_confirm(mut self, confirm: ConfirmDialog) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Show a load failure instead of the table
    #[must_use]
    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// `?q=..&category=..` for links that keep the current filter
pub fn query_suffix(query: &ListQuery) -> String {
    let mut params = Vec::new();
    if !query.search.is_empty() {
        params.push(format!("q={}", urlencoding::encode(&query.search)));
    }
    if let Some(category) = query.selected_category() {
        params.push(format!("category={}", urlencoding::encode(category)));
    }
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

fn row_view(schema: &EntitySchema, record: &Record, suffix: &str) -> Option<RowView> {
    let id = record.id()?;
    let encoded = schema::encode_id(&id);
    let base = format!("/{}/{encoded}", schema.slug);

    let cells = schema
        .columns
        .iter()
        .filter_map(|c| schema.field(c))
        .map(|field| cell_text(field, record))
        .collect();

    let toggle = match schema.slug {
        "courses" => Some(ToggleView {
            action: format!("{base}/toggle-top-choice"),
            label: if record.flag("top_choice") {
                "Remove top choice".to_string()
            } else {
                "Mark top choice".to_string()
            },
        }),
        "events" => Some(ToggleView {
            action: format!("{base}/toggle-active"),
            label: if record.flag("is_active") {
                "Deactivate".to_string()
            } else {
                "Activate".to_string()
            },
        }),
        _ => None,
    };

    Some(RowView {
        id: id.to_string(),
        cells,
        view_href: schema.has_detail().then(|| base.clone()),
        edit_href: schema.can_edit().then(|| format!("{base}/edit")),
        delete_href: schema
            .can_delete()
            .then(|| format!("{base}/delete{suffix}")),
        toggle,
        busy: false,
    })
}

fn cell_text(field: &FieldSpec, record: &Record) -> String {
    let text = record.text(field.name);
    match field.kind {
        FieldKind::Date => format_short_date(&text),
        FieldKind::LongText => truncate_text(&text, PREVIEW_CHARS),
        _ => text,
    }
}

/// Resolve a stored media path against the backend
pub fn media_url(base_url: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_string())
    } else if raw.starts_with('/') {
        Some(format!("{base_url}{raw}"))
    } else {
        Some(format!("{base_url}/{raw}"))
    }
}

/// One field on a detail page
#[derive(Debug, Clone)]
pub struct DetailField {
    /// Label
    pub label: &'static str,
    /// Display text
    pub text: String,
    /// Image source, for upload fields
    pub image: Option<String>,
    /// Render as a paragraph
    pub long: bool,
    /// Module groups, for course modules
    pub modules: Vec<ModuleGroup>,
}

/// Generic detail page
#[derive(Debug, Template)]
#[template(path = "detail.html")]
pub struct DetailTemplate {
    /// Chrome
    pub shell: Shell,
    /// Singular label
    pub singular: &'static str,
    /// Record name
    pub heading: String,
    /// Field rows
    pub fields: Vec<DetailField>,
    /// Edit link
    pub edit_href: Option<String>,
    /// Delete confirmation link
    pub delete_href: Option<String>,
    /// List link
    pub back_href: String,
}

impl DetailTemplate {
    /// Detail rows for a record
    pub fn new(shell: Shell, schema: &'static EntitySchema, record: &Record, base_url: &str) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| detail_field(field, record, base_url))
            .collect();

        let base = record
            .id()
            .map(|id| format!("/{}/{}", schema.slug, schema::encode_id(&id)));

        Self {
            shell,
            singular: schema.singular,
            heading: display_name(schema, record),
            fields,
            edit_href: base
                .as_ref()
                .filter(|_| schema.can_edit())
                .map(|b| format!("{b}/edit")),
            delete_href: base
                .as_ref()
                .filter(|_| schema.can_delete())
                .map(|b| format!("{b}/delete")),
            back_href: schema.list_path(),
        }
    }
}

fn detail_field(field: &FieldSpec, record: &Record, base_url: &str) -> DetailField {
    let text = record.text(field.name);
    let mut view = DetailField {
        label: field.label,
        text: String::new(),
        image: None,
        long: matches!(field.kind, FieldKind::LongText),
        modules: Vec::new(),
    };

    match field.kind {
        FieldKind::Image { .. } => view.image = media_url(base_url, &text),
        FieldKind::Date => view.text = format_long_date(&text),
        FieldKind::ModuleGroups => {
            let state = modules_only(record.get(field.name));
            view.modules = state;
        }
        _ => view.text = text,
    }
    view
}

fn modules_only(value: Option<&Value>) -> Vec<ModuleGroup> {
    parse_modules(value)
        .into_iter()
        .map(|mut module| {
            module.content.retain(|line| !line.trim().is_empty());
            module
        })
        .collect()
}

/// A content line of a module being edited
#[derive(Debug, Clone)]
pub struct LineView {
    /// Line index
    pub index: usize,
    /// Text
    pub text: String,
}

/// A module being edited
#[derive(Debug, Clone)]
pub struct ModuleView {
    /// Module index
    pub index: usize,
    /// Title
    pub title: String,
    /// Content lines
    pub lines: Vec<LineView>,
}

/// One form control
#[derive(Debug, Clone)]
pub struct FieldView {
    /// Input name
    pub name: &'static str,
    /// Label
    pub label: &'static str,
    /// Control kind: text, textarea, date, number, checkbox, select, file or modules
    pub kind: &'static str,
    /// Current value
    pub value: String,
    /// Checkbox state
    pub checked: bool,
    /// Rendered with `required`
    pub required: bool,
    /// Select options
    pub options: Vec<OptionView>,
    /// Modules, for the modules control
    pub modules: Vec<ModuleView>,
    /// Stored image, for file controls on edit
    pub current_image: Option<String>,
    /// File chosen on an earlier render of this form, kept until submit
    pub attached: Option<String>,
    /// Hint under the control
    pub help: Option<&'static str>,
}

/// Generic add/edit form
#[derive(Debug, Template)]
#[template(path = "form.html")]
pub struct FormTemplate {
    /// Chrome
    pub shell: Shell,
    /// Page heading
    pub title: String,
    /// Form target
    pub action: String,
    /// Cancel link
    pub cancel_href: String,
    /// Submit button label
    pub submit_label: String,
    /// Controls
    pub fields: Vec<FieldView>,
    /// Error from the last submit, verbatim
    pub error: Option<String>,
    /// Key of the files kept server-side between renders
    pub draft: Option<String>,
}

/// Whether a form adds or edits
#[derive(Debug, Clone)]
pub enum FormTarget {
    /// Add form
    Create,
    /// Edit form for the record with this raw id, and its stored values
    Update {
        /// Raw id from the URL
        id: String,
        /// Stored record, for current images
        existing: Option<Record>,
    },
}

impl FormTemplate {
    /// Form controls for `state`
    pub fn new(
        shell: Shell,
        schema: &'static EntitySchema,
        state: &FormState,
        target: &FormTarget,
        base_url: &str,
    ) -> Self {
        let (title, action, cancel_href, submit_label, creating, existing) = match target {
            FormTarget::Create => (
                format!("Add {}", schema.singular),
                format!("/{}/add", schema.slug),
                schema.list_path(),
                format!("Create {}", schema.singular),
                true,
                None,
            ),
            FormTarget::Update { id, existing } => {
                let encoded = urlencoding::encode(id).into_owned();
                let cancel = if schema.has_detail() {
                    format!("/{}/{encoded}", schema.slug)
                } else {
                    schema.list_path()
                };
                (
                    format!("Edit {}", schema.singular),
                    format!("/{}/{encoded}/edit", schema.slug),
                    cancel,
                    "Save Changes".to_string(),
                    false,
                    existing.as_ref(),
                )
            }
        };

        let fields = schema
            .form_fields()
            .map(|field| field_view(field, state, creating, existing, base_url))
            .collect();

        Self {
            shell,
            title,
            action,
            cancel_href,
            submit_label,
            fields,
            error: None,
            draft: None,
        }
    }

    /// Attach an error message
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// Carry files chosen earlier under `draft`
    #[must_use]
    pub fn with_draft(mut self, draft: Option<String>) -> Self {
        self.draft = draft;
        self
    }
}

fn field_view(
    field: &FieldSpec,
    state: &FormState,
    creating: bool,
    existing: Option<&Record>,
    base_url: &str,
) -> FieldView {
    let value = state.value(field.name).to_string();
    let mut view = FieldView {
        name: field.name,
        label: field.label,
        kind: "text",
        value: value.clone(),
        checked: state.flag(field.name),
        required: field.required,
        options: Vec::new(),
        modules: Vec::new(),
        current_image: None,
        attached: None,
        help: None,
    };

    match field.kind {
        FieldKind::Text => {}
        FieldKind::LongText => view.kind = "textarea",
        FieldKind::Date => view.kind = "date",
        FieldKind::Number => view.kind = "number",
        FieldKind::Boolean => view.kind = "checkbox",
        FieldKind::Select(options) => {
            view.kind = "select";
            view.options = options
                .iter()
                .map(|o| OptionView {
                    value: o.value.to_string(),
                    label: o.label.to_string(),
                    selected: o.value == value,
                })
                .collect();
        }
        FieldKind::CommaList => view.help = Some("Separate items with commas"),
        FieldKind::ModuleGroups => {
            view.kind = "modules";
            view.modules = state
                .modules()
                .iter()
                .enumerate()
                .map(|(index, module)| ModuleView {
                    index,
                    title: module.title.clone(),
                    lines: module
                        .content
                        .iter()
                        .enumerate()
                        .map(|(index, text)| LineView {
                            index,
                            text: text.clone(),
                        })
                        .collect(),
                })
                .collect();
        }
        FieldKind::Image { required_on_create } => {
            view.kind = "file";
            view.required = required_on_create && creating;
            view.current_image = existing
                .and_then(|r| media_url(base_url, &r.text(field.name)));
            view.attached = state
                .uploads()
                .iter()
                .find(|u| u.field == field.name)
                .map(|u| u.file_name.clone());
            if view.attached.is_some() {
                view.required = false;
                view.help = Some("Choose another file to replace it");
            } else if !creating {
                view.help = Some("Leave empty to keep the current file");
            }
        }
    }
    view
}

/// Logout confirmation
#[derive(Debug, Template)]
#[template(path = "logout.html")]
pub struct LogoutTemplate {
    /// Chrome
    pub shell: Shell,
    /// Dialog content
    pub confirm: ConfirmDialog,
}

/// Error or not-found panel
#[derive(Debug, Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    /// Chrome
    pub shell: Shell,
    /// Heading
    pub title: String,
    /// Explanation
    pub message: String,
    /// Link back
    pub back_href: String,
    /// Retry link
    pub retry_href: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn lead() -> Record {
        Record::from_value(json!({
            "id": 1,
            "first_name": "John",
            "last_name": "Doe",
            "email": "john@example.com",
            "mobile_number": "9876543210",
            "interested_course": "MBA",
            "created_at": "2025-10-10T09:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_list_rows_and_empty_state() {
        let schema = schema::lookup("admission-leads").unwrap();
        let records = vec![lead()];
        let shell = Shell::new(Some("admission-leads"), None);

        let kept = ListTemplate::new(shell.clone(), schema, &records, &ListQuery::search("mba"));
        assert_eq!(kept.rows.len(), 1);
        assert_eq!(kept.rows[0].cells[5], "Oct 10");
        assert_eq!(kept.rows[0].delete_href.as_deref(), Some("/admission-leads/1/delete?q=mba"));
        assert!(kept.rows[0].edit_href.is_none());

        let none = ListTemplate::new(shell, schema, &records, &ListQuery::search("phd"));
        assert!(none.rows.is_empty());
        let html = none.render().unwrap();
        assert!(html.contains("No admission leads found"));
        assert!(html.contains("Try adjusting your search or filter"));
    }

    #[test]
    fn test_query_suffix() {
        assert_eq!(query_suffix(&ListQuery::default()), "");
        assert_eq!(
            query_suffix(&ListQuery::search("john doe").with_category("MBA")),
            "?q=john%20doe&category=MBA"
        );
    }

    #[test]
    fn test_media_url() {
        assert_eq!(
            media_url("http://api.local", "/media/a.png").as_deref(),
            Some("http://api.local/media/a.png")
        );
        assert_eq!(
            media_url("http://api.local", "https://cdn.x/a.png").as_deref(),
            Some("https://cdn.x/a.png")
        );
        assert_eq!(media_url("http://api.local", " "), None);
    }

    #[test]
    fn test_shell_marks_active_section() {
        let shell = Shell::new(Some("blogs"), Some("asha".to_string()));
        assert!(!shell.home_active);
        assert_eq!(shell.nav.iter().filter(|n| n.active).count(), 1);
        assert_eq!(shell.user, "asha");
    }

    #[test]
    fn test_course_form_renders_module_controls() {
        let schema = schema::lookup("courses").unwrap();
        let record = Record::from_value(json!({
            "id": "MBA-01",
            "title": "MBA",
            "modules": [{"title": "Finance", "content": ["Accounting"]}],
            "image": "/media/mba.png"
        }))
        .unwrap();
        let state = FormState::from_record(schema, &record);
        let target = FormTarget::Update {
            id: "MBA-01".to_string(),
            existing: Some(record),
        };

        let html = FormTemplate::new(Shell::new(Some("courses"), None), schema, &state, &target, "http://api.local")
            .render()
            .unwrap();
        assert!(html.contains("modules[0].title"));
        assert!(html.contains("modules[0].content[0]"));
        assert!(html.contains("remove_content:0:0"));
        assert!(html.contains("mba.png"));
        assert!(html.contains("Save Changes"));
    }

    #[test]
    fn test_detail_keeps_modules_without_content_array() {
        let schema = schema::lookup("courses").unwrap();
        let record = Record::from_value(json!({
            "id": 4,
            "title": "BBA",
            "modules": [
                {"title": "Marketing", "content": "not a list"},
                {"title": "Finance", "content": ["Budgeting", ""]}
            ]
        }))
        .unwrap();

        let page = DetailTemplate::new(Shell::new(Some("courses"), None), schema, &record, "http://api.local");
        let modules = page
            .fields
            .iter()
            .find(|f| !f.modules.is_empty())
            .map(|f| f.modules.clone())
            .unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].title, "Marketing");
        assert!(modules[0].content.is_empty());
        assert_eq!(modules[1].content, vec!["Budgeting".to_string()]);
    }

    #[test]
    fn test_busy_rows_are_flagged() {
        let schema = schema::lookup("admission-leads").unwrap();
        let records = vec![lead()];
        let page = ListTemplate::new(Shell::new(None, None), schema, &records, &ListQuery::default())
            .with_busy_rows(&["1".to_string()]);

        assert!(page.rows[0].busy);
        assert!(page.render().unwrap().contains("Saving..."));
    }
}
