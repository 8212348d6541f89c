//! Generic add/edit form engine
//!
//! A [`FormState`] mirrors the editable fields of one entity. List-valued
//! fields stay comma-separated text until [`FormState::to_payload`] splits
//! them, and module groups keep at least one editable content line each.

use crate::{
    Error, Result,
    record::Record,
    schema::{EntitySchema, FieldKind},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// One repeatable course module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGroup {
    /// Module title
    #[serde(default)]
    pub title: String,
    /// Ordered content lines
    #[serde(default)]
    pub content: Vec<String>,
}

impl ModuleGroup {
    fn blank() -> Self {
        Self {
            title: String::new(),
            content: vec![String::new()],
        }
    }

    fn from_value(value: &Value) -> Self {
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let content = match value.get("content") {
            Some(Value::Array(lines)) if !lines.is_empty() => lines
                .iter()
                .map(|l| l.as_str().map_or_else(|| l.to_string(), str::to_string))
                .collect(),
            _ => vec![String::new()],
        };

        Self { title, content }
    }

    /// Copy without blank content lines, `None` if the title is blank
    fn cleaned(&self) -> Option<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            content: self
                .content
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// A file attached to a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Form field the file belongs to
    pub field: String,
    /// Original file name
    pub file_name: String,
    /// MIME type reported by the browser
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text field
    Text {
        /// Field name
        name: String,
        /// Field value
        value: String,
    },
    /// File field
    File(Upload),
}

/// Request body produced by a form submission
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `application/json` body
    Json(Value),
    /// `multipart/form-data` body, used whenever a file is attached
    Multipart(Vec<Part>),
}

impl Payload {
    /// Whether this payload is multipart
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Whether a submission creates or updates a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// POST to the create endpoint
    Create,
    /// PUT to the update endpoint
    Update,
}

/// Button pressed on a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    /// Submit to the backend
    Submit,
    /// Append a blank module
    AddModule,
    /// Remove a module
    RemoveModule(usize),
    /// Append a content line to a module
    AddContent(usize),
    /// Remove a content line from a module
    RemoveContent(usize, usize),
}

impl FormAction {
    /// Parse the `form_action` button value
    ///
    /// Missing or unrecognised values submit the form.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Submit;
        };
        let mut parts = raw.split(':');
        let verb = parts.next().unwrap_or_default();
        let first = parts.next().and_then(|p| p.parse().ok());
        let second = parts.next().and_then(|p| p.parse().ok());

        match (verb, first, second) {
            ("add_module", _, _) => Self::AddModule,
            ("remove_module", Some(i), _) => Self::RemoveModule(i),
            ("add_content", Some(i), _) => Self::AddContent(i),
            ("remove_content", Some(i), Some(j)) => Self::RemoveContent(i, j),
            _ => Self::Submit,
        }
    }
}

/// Editable state of one add/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<String, String>,
    flags: BTreeMap<String, bool>,
    modules: Vec<ModuleGroup>,
    uploads: Vec<Upload>,
}

impl FormState {
    /// Blank form for an add page
    pub fn empty(schema: &EntitySchema) -> Self {
        let mut state = Self::default();
        for field in schema.form_fields() {
            match field.kind {
                FieldKind::Boolean => {
                    state.flags.insert(field.name.to_string(), false);
                }
                FieldKind::ModuleGroups | FieldKind::Image { .. } => {}
                FieldKind::Select(options) => {
                    let first = options.first().map(|o| o.value).unwrap_or_default();
                    let initial = if field.required { "" } else { first };
                    state.values.insert(field.name.to_string(), initial.to_string());
                }
                _ => {
                    state.values.insert(field.name.to_string(), String::new());
                }
            }
        }
        state
    }

    /// Form pre-filled from an existing record
    ///
    /// Arrays become comma-separated text. A module whose `content` is not a
    /// non-empty array gets a single blank line.
    pub fn from_record(schema: &EntitySchema, record: &Record) -> Self {
        let mut state = Self::empty(schema);
        for field in schema.form_fields() {
            let value = record.get(field.name);
            match field.kind {
                FieldKind::Boolean => {
                    state
                        .flags
                        .insert(field.name.to_string(), record.flag(field.name));
                }
                FieldKind::ModuleGroups => {
                    state.modules = parse_modules(value);
                }
                FieldKind::Image { .. } => {}
                FieldKind::Date => {
                    let text = record.text(field.name);
                    let date = text.get(..10).unwrap_or(&text);
                    state.values.insert(field.name.to_string(), date.to_string());
                }
                _ => {
                    state
                        .values
                        .insert(field.name.to_string(), record.text(field.name));
                }
            }
        }
        state
    }

    /// Form rebuilt from a browser submission
    ///
    /// Module inputs are named `modules[i].title` and `modules[i].content[j]`.
    /// Checkboxes are present only when ticked.
    pub fn from_submission(
        schema: &EntitySchema,
        fields: &[(String, String)],
        uploads: Vec<Upload>,
    ) -> Self {
        let mut state = Self::empty(schema);
        let mut modules: BTreeMap<usize, (String, BTreeMap<usize, String>)> = BTreeMap::new();

        for (name, value) in fields {
            if let Some((index, slot)) = parse_module_key(name) {
                let entry = modules.entry(index).or_default();
                match slot {
                    ModuleSlot::Title => entry.0.clone_from(value),
                    ModuleSlot::Content(line) => {
                        entry.1.insert(line, value.clone());
                    }
                }
                continue;
            }

            let Some(field) = schema.field(name).filter(|f| f.editable()) else {
                continue;
            };
            match field.kind {
                FieldKind::Boolean => {
                    state.flags.insert(field.name.to_string(), is_checked(value));
                }
                FieldKind::ModuleGroups | FieldKind::Image { .. } => {}
                _ => {
                    state.values.insert(field.name.to_string(), value.clone());
                }
            }
        }

        state.modules = modules
            .into_values()
            .map(|(title, lines)| {
                let mut content: Vec<String> = lines.into_values().collect();
                if content.is_empty() {
                    content.push(String::new());
                }
                ModuleGroup { title, content }
            })
            .collect();

        state.uploads = uploads
            .into_iter()
            .filter(|u| {
                !u.bytes.is_empty()
                    && schema
                        .field(&u.field)
                        .is_some_and(|f| f.editable() && f.kind.is_upload())
            })
            .collect();

        state
    }

    /// Current text of a field
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    /// Current state of a checkbox
    pub fn flag(&self, field: &str) -> bool {
        self.flags.get(field).copied().unwrap_or(false)
    }

    /// Set the text of a field
    pub fn set_value(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    /// Set a checkbox
    pub fn set_flag(&mut self, field: impl Into<String>, value: bool) {
        self.flags.insert(field.into(), value);
    }

    /// Module groups being edited
    pub fn modules(&self) -> &[ModuleGroup] {
        &self.modules
    }

    /// Attached files
    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    /// Attach a file
    pub fn attach(&mut self, upload: Upload) {
        self.uploads.retain(|u| u.field != upload.field);
        self.uploads.push(upload);
    }

    /// Apply a module editing action; `Submit` is a no-op
    pub fn apply(&mut self, action: FormAction) {
        match action {
            FormAction::Submit => {}
            FormAction::AddModule => self.add_module(),
            FormAction::RemoveModule(i) => self.remove_module(i),
            FormAction::AddContent(i) => self.add_content(i),
            FormAction::RemoveContent(i, j) => self.remove_content(i, j),
        }
    }

    /// Append a blank module
    pub fn add_module(&mut self) {
        self.modules.push(ModuleGroup::blank());
    }

    /// Remove a module; out-of-range indexes are ignored
    pub fn remove_module(&mut self, index: usize) {
        if index < self.modules.len() {
            self.modules.remove(index);
        }
    }

    /// Append a blank content line unless the last line is still blank
    pub fn add_content(&mut self, module: usize) {
        if let Some(group) = self.modules.get_mut(module) {
            let last_filled = group.content.last().is_none_or(|l| !l.trim().is_empty());
            if last_filled {
                group.content.push(String::new());
            }
        }
    }

    /// Remove a content line, keeping at least one blank line
    pub fn remove_content(&mut self, module: usize, line: usize) {
        if let Some(group) = self.modules.get_mut(module) {
            if line < group.content.len() {
                group.content.remove(line);
            }
            if group.content.is_empty() {
                group.content.push(String::new());
            }
        }
    }

    /// Check required inputs the way the browser would
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for the first blank required field, or a
    /// missing file that is mandatory on create.
    pub fn check_required(&self, schema: &EntitySchema, mode: SubmitMode) -> Result<()> {
        for field in schema.form_fields() {
            let missing = match field.kind {
                FieldKind::Image { required_on_create } => {
                    required_on_create
                        && mode == SubmitMode::Create
                        && !self.uploads.iter().any(|u| u.field == field.name)
                }
                FieldKind::Boolean | FieldKind::ModuleGroups => false,
                _ => field.required && self.value(field.name).trim().is_empty(),
            };
            if missing {
                return Err(Error::Validation {
                    field: field.name.to_string(),
                    message: format!("{} is required", field.label),
                });
            }
        }
        Ok(())
    }

    /// Build the request body for a submission
    ///
    /// Multipart is used iff a file is attached. Without one, image fields
    /// are omitted entirely so the backend keeps the stored file.
    ///
    /// # Errors
    ///
    /// Returns a validation error from [`Self::check_required`], or a
    /// serialization error while encoding list fields.
    pub fn to_payload(&self, schema: &EntitySchema, mode: SubmitMode) -> Result<Payload> {
        self.check_required(schema, mode)?;

        if self.uploads.is_empty() {
            self.json_payload(schema).map(Payload::Json)
        } else {
            self.multipart_payload(schema).map(Payload::Multipart)
        }
    }

    fn cleaned_modules(&self) -> Vec<ModuleGroup> {
        self.modules.iter().filter_map(ModuleGroup::cleaned).collect()
    }

    fn json_payload(&self, schema: &EntitySchema) -> Result<Value> {
        let mut body = Map::new();
        for field in schema.form_fields() {
            let name = field.name.to_string();
            match field.kind {
                FieldKind::Image { .. } => {}
                FieldKind::Boolean => {
                    body.insert(name, Value::Bool(self.flag(field.name)));
                }
                FieldKind::Number => {
                    if let Some(number) = number_value(self.value(field.name)) {
                        body.insert(name, number);
                    }
                }
                FieldKind::CommaList => {
                    let items = split_comma_list(self.value(field.name));
                    if !items.is_empty() {
                        body.insert(name, json!(items));
                    }
                }
                FieldKind::ModuleGroups => {
                    body.insert(name, serde_json::to_value(self.cleaned_modules())?);
                }
                _ => {
                    body.insert(name, Value::String(self.value(field.name).to_string()));
                }
            }
        }
        Ok(Value::Object(body))
    }

    fn multipart_payload(&self, schema: &EntitySchema) -> Result<Vec<Part>> {
        let mut parts = Vec::new();
        for field in schema.form_fields() {
            let text = match field.kind {
                FieldKind::Image { .. } => {
                    parts.extend(
                        self.uploads
                            .iter()
                            .filter(|u| u.field == field.name)
                            .cloned()
                            .map(Part::File),
                    );
                    continue;
                }
                FieldKind::Boolean => self.flag(field.name).to_string(),
                FieldKind::CommaList => {
                    let items = split_comma_list(self.value(field.name));
                    if items.is_empty() {
                        continue;
                    }
                    serde_json::to_string(&items)?
                }
                FieldKind::ModuleGroups => serde_json::to_string(&self.cleaned_modules())?,
                _ => self.value(field.name).to_string(),
            };
            parts.push(Part::Text {
                name: field.name.to_string(),
                value: text,
            });
        }
        Ok(parts)
    }
}

/// Split comma-separated text into trimmed, non-empty items
pub fn split_comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn number_value(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(json!(int));
    }
    if let Some(float) = text
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return Some(Value::Number(float));
    }
    Some(Value::String(text.to_string()))
}

fn is_checked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1" | "yes")
}

/// Module groups stored on a record
///
/// Accepts a JSON array or its JSON-encoded string. A module whose `content`
/// is missing or not an array gets one empty line.
pub fn parse_modules(value: Option<&Value>) -> Vec<ModuleGroup> {
    match value {
        Some(Value::Array(items)) => items.iter().map(ModuleGroup::from_value).collect(),
        // Multipart-created records may hold the JSON-encoded string
        Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)
            .ok()
            .map(|v| parse_modules(Some(&v)))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

enum ModuleSlot {
    Title,
    Content(usize),
}

fn parse_module_key(name: &str) -> Option<(usize, ModuleSlot)> {
    let rest = name.strip_prefix("modules[")?;
    let (index, rest) = rest.split_once("].")?;
    let index = index.parse().ok()?;

    if rest == "title" {
        return Some((index, ModuleSlot::Title));
    }
    let line = rest.strip_prefix("content[")?.strip_suffix(']')?.parse().ok()?;
    Some((index, ModuleSlot::Content(line)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::schema::lookup;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn course_record() -> Record {
        Record::from_value(json!({
            "id": "MBA-01",
            "title": "MBA",
            "short_description": "Two year programme",
            "tools": ["Excel", "Tableau"],
            "modules": [
                {"title": "Finance", "content": ["Accounting", "Markets"]},
                {"title": "Marketing", "content": "not a list"},
                {"title": "Ops"}
            ],
            "image": "/media/mba.png",
            "top_choice": true
        }))
        .unwrap()
    }

    fn upload(field: &str) -> Upload {
        Upload {
            field: field.to_string(),
            file_name: "photo.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    #[test]
    fn test_from_record_normalizes_modules() {
        let schema = lookup("courses").unwrap();
        let form = FormState::from_record(schema, &course_record());

        assert_eq!(form.value("title"), "MBA");
        assert_eq!(form.value("tools"), "Excel, Tableau");
        assert_eq!(form.modules().len(), 3);
        assert_eq!(form.modules()[0].content, vec!["Accounting", "Markets"]);
        assert_eq!(form.modules()[1].content, vec![""]);
        assert_eq!(form.modules()[2].content, vec![""]);
    }

    #[test]
    fn test_from_record_accepts_encoded_modules() {
        let schema = lookup("courses").unwrap();
        let record = Record::from_value(json!({
            "id": "C1",
            "title": "Design",
            "modules": r#"[{"title":"Basics","content":["Colour"]}]"#
        }))
        .unwrap();

        let form = FormState::from_record(schema, &record);
        assert_eq!(form.modules().len(), 1);
        assert_eq!(form.modules()[0].title, "Basics");
    }

    #[test]
    fn test_from_record_trims_datetimes_for_date_inputs() {
        let schema = lookup("events").unwrap();
        let record = Record::from_value(json!({
            "title": "Open Day",
            "date": "2025-11-02T10:00:00Z",
            "is_active": true
        }))
        .unwrap();

        let form = FormState::from_record(schema, &record);
        assert_eq!(form.value("date"), "2025-11-02");
        assert!(form.flag("is_active"));
    }

    #[test]
    fn test_remove_last_content_keeps_blank_line() {
        let schema = lookup("courses").unwrap();
        let mut form = FormState::from_record(schema, &course_record());

        form.remove_content(0, 0);
        form.remove_content(0, 0);
        assert_eq!(form.modules()[0].content, vec![""]);

        form.remove_content(0, 0);
        assert_eq!(form.modules()[0].content, vec![""]);
    }

    #[test]
    fn test_add_content_requires_filled_last_line() {
        let schema = lookup("courses").unwrap();
        let mut form = FormState::from_record(schema, &course_record());

        form.add_content(0);
        assert_eq!(form.modules()[0].content.len(), 3);

        // Last line is now blank, so nothing is appended
        form.add_content(0);
        assert_eq!(form.modules()[0].content.len(), 3);

        form.add_content(99);
    }

    #[test]
    fn test_add_and_remove_modules() {
        let schema = lookup("courses").unwrap();
        let mut form = FormState::empty(schema);

        form.apply(FormAction::AddModule);
        form.apply(FormAction::AddModule);
        assert_eq!(form.modules().len(), 2);
        assert_eq!(form.modules()[0], ModuleGroup::blank());

        form.apply(FormAction::RemoveModule(0));
        form.apply(FormAction::RemoveModule(5));
        assert_eq!(form.modules().len(), 1);
    }

    #[rstest]
    #[case(None, FormAction::Submit)]
    #[case(Some("submit"), FormAction::Submit)]
    #[case(Some("add_module"), FormAction::AddModule)]
    #[case(Some("remove_module:2"), FormAction::RemoveModule(2))]
    #[case(Some("add_content:1"), FormAction::AddContent(1))]
    #[case(Some("remove_content:1:3"), FormAction::RemoveContent(1, 3))]
    #[case(Some("remove_content:1"), FormAction::Submit)]
    #[case(Some("remove_module:x"), FormAction::Submit)]
    fn test_form_action_parse(#[case] raw: Option<&str>, #[case] expected: FormAction) {
        assert_eq!(FormAction::parse(raw), expected);
    }

    #[test]
    fn test_json_payload_without_upload() {
        let schema = lookup("courses").unwrap();
        let mut form = FormState::from_record(schema, &course_record());
        form.set_value("highlights", "  Industry visits , , Placement  ");
        form.set_value("career_opportunities", " ");
        form.add_module();

        let payload = form.to_payload(schema, SubmitMode::Update).unwrap();
        let Payload::Json(body) = payload else {
            panic!("expected JSON payload");
        };

        assert_eq!(body["highlights"], json!(["Industry visits", "Placement"]));
        assert!(body.get("career_opportunities").is_none());
        assert!(body.get("image").is_none());
        assert!(body.get("top_choice").is_none());
        assert!(body.get("created_at").is_none());
        assert_eq!(
            body["modules"],
            json!([
                {"title": "Finance", "content": ["Accounting", "Markets"]},
                {"title": "Marketing", "content": []},
                {"title": "Ops", "content": []}
            ])
        );
    }

    #[test]
    fn test_multipart_payload_with_upload() {
        let schema = lookup("courses").unwrap();
        let mut form = FormState::from_record(schema, &course_record());
        form.attach(upload("image"));

        let Payload::Multipart(parts) = form.to_payload(schema, SubmitMode::Update).unwrap() else {
            panic!("expected multipart payload");
        };

        let text = |name: &str| {
            parts.iter().find_map(|p| match p {
                Part::Text { name: n, value } if n == name => Some(value.clone()),
                _ => None,
            })
        };

        assert_eq!(text("tools").unwrap(), r#"["Excel","Tableau"]"#);
        assert!(text("highlights").is_none());
        assert!(text("modules").unwrap().starts_with(r#"[{"title":"Finance""#));
        assert!(
            parts
                .iter()
                .any(|p| matches!(p, Part::File(u) if u.field == "image"))
        );
    }

    #[test]
    fn test_numbers_and_flags_in_json() {
        let schema = lookup("ug-programs").unwrap();
        let mut form = FormState::empty(schema);
        form.set_value("name", "BCA");
        form.set_value("code", "BCA-1");
        form.set_value("rating", "4.5");
        form.set_value("students", "120");
        form.set_value("modules", "about six");

        let Payload::Json(body) = form.to_payload(schema, SubmitMode::Create).unwrap() else {
            panic!("expected JSON payload");
        };
        assert_eq!(body["rating"], json!(4.5));
        assert_eq!(body["students"], json!(120));
        assert_eq!(body["modules"], json!("about six"));

        let events = lookup("events").unwrap();
        let mut event = FormState::empty(events);
        for (field, value) in [
            ("title", "Open Day"),
            ("date", "2025-11-02"),
            ("location", "Main Hall"),
            ("phone_number", "0471 2345678"),
            ("registration_message", "See you there"),
        ] {
            event.set_value(field, value);
        }
        let Payload::Json(body) = event.to_payload(events, SubmitMode::Create).unwrap() else {
            panic!("expected JSON payload");
        };
        assert_eq!(body["is_active"], json!(false));
    }

    #[test]
    fn test_required_fields() {
        let events = lookup("events").unwrap();
        let mut form = FormState::empty(events);
        form.set_value("title", "Open Day");

        match form.to_payload(events, SubmitMode::Create).unwrap_err() {
            Error::Validation { field, .. } => assert_eq!(field, "date"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_image_required_only_on_create() {
        let posters = lookup("placement-posters").unwrap();
        let mut form = FormState::empty(posters);
        form.set_value("alt", "Batch of 2025");

        assert!(form.check_required(posters, SubmitMode::Create).is_err());
        assert!(form.check_required(posters, SubmitMode::Update).is_ok());

        form.attach(upload("image"));
        assert!(form.check_required(posters, SubmitMode::Create).is_ok());
    }

    #[test]
    fn test_from_submission() {
        let schema = lookup("courses").unwrap();
        let fields: Vec<(String, String)> = [
            ("id", "MBA-01"),
            ("title", "MBA"),
            ("modules[1].title", "Second"),
            ("modules[0].title", "First"),
            ("modules[0].content[1]", "B"),
            ("modules[0].content[0]", "A"),
            ("top_choice", "on"),
            ("unknown", "ignored"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

        let empty_file = Upload {
            bytes: Vec::new(),
            ..upload("image")
        };
        let form = FormState::from_submission(schema, &fields, vec![empty_file, upload("logo")]);

        assert_eq!(form.value("title"), "MBA");
        assert_eq!(form.modules()[0].title, "First");
        assert_eq!(form.modules()[0].content, vec!["A", "B"]);
        assert_eq!(form.modules()[1].content, vec![""]);
        assert!(!form.flag("top_choice"));
        assert!(form.uploads().is_empty());
    }

    #[test]
    fn test_split_comma_list() {
        assert_eq!(split_comma_list("a, b ,,c"), vec!["a", "b", "c"]);
        assert!(split_comma_list(" , ").is_empty());
    }
}
