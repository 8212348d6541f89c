//! Confirmation dialog model

use crate::{record::Record, schema::EntitySchema};

/// Stateless confirmation overlay
///
/// Whether it is open is decided by the caller's route; confirming runs the
/// caller's action and cancelling does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    /// Heading
    pub title: String,
    /// Body text
    pub message: String,
    /// Label of the destructive button
    pub confirm_label: String,
    /// Form target that performs the action
    pub confirm_action: String,
    /// Where cancelling goes
    pub cancel_href: String,
}

impl ConfirmDialog {
    /// Dialog for deleting one record
    pub fn delete(schema: &EntitySchema, record: &Record, raw_id: &str, return_to: &str) -> Self {
        let name = display_name(schema, record);
        Self {
            title: format!("Delete {}", schema.singular),
            message: format!(
                "Are you sure you want to delete \"{name}\"? This action cannot be undone."
            ),
            confirm_label: "Delete".to_string(),
            confirm_action: format!("/{}/{}/delete", schema.slug, urlencoding::encode(raw_id)),
            cancel_href: return_to.to_string(),
        }
    }

    /// Dialog for signing out
    pub fn logout(return_to: &str) -> Self {
        Self {
            title: "Confirm Logout".to_string(),
            message: "Are you sure you want to log out?".to_string(),
            confirm_label: "Logout".to_string(),
            confirm_action: "/logout".to_string(),
            cancel_href: return_to.to_string(),
        }
    }
}

/// Best human name for a record: first search field with text, else its id
pub fn display_name(schema: &EntitySchema, record: &Record) -> String {
    schema
        .search_fields
        .iter()
        .map(|f| record.text(f))
        .find(|t| !t.trim().is_empty())
        .or_else(|| record.id().map(|id| id.to_string()))
        .unwrap_or_else(|| schema.singular.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::lookup;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_delete_dialog() {
        let schema = lookup("testimonials").unwrap();
        let record = Record::from_value(json!({"id": 4, "name": "Priya", "text": "Great"})).unwrap();

        let dialog = ConfirmDialog::delete(schema, &record, "4", "/testimonials?q=pri");
        assert_eq!(dialog.title, "Delete Testimonial");
        assert!(dialog.message.contains("\"Priya\""));
        assert_eq!(dialog.confirm_action, "/testimonials/4/delete");
        assert_eq!(dialog.cancel_href, "/testimonials?q=pri");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let schema = lookup("placement-posters").unwrap();
        let record = Record::from_value(json!({"id": 11, "alt": ""})).unwrap();
        assert_eq!(display_name(schema, &record), "11");
    }

    #[test]
    fn test_logout_dialog() {
        let dialog = ConfirmDialog::logout("/");
        assert_eq!(dialog.confirm_action, "/logout");
        assert_eq!(dialog.confirm_label, "Logout");
    }
}
