//! Client-side list filtering
//!
//! Filtering is a pure function of the collection and the query. The source
//! collection is only borrowed.

use crate::{
    record::Record,
    schema::{CategoryOptions, EntitySchema},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Search box text plus an optional category selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Free-text search, matched case-insensitively
    #[serde(default, rename = "q")]
    pub search: String,
    /// Selected category value; empty means "all"
    #[serde(default)]
    pub category: Option<String>,
}

impl ListQuery {
    /// Query with only a search string
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            category: None,
        }
    }

    /// Add a category selection
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Selected category, ignoring the empty "all" choice
    pub fn selected_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Whether any filter is in effect
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.selected_category().is_some()
    }
}

/// Value of a field as compared by the category filter
///
/// Booleans compare as `true`/`false` so they line up with static options.
pub fn category_value(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Records matching the query, in source order
///
/// A record matches when any search field contains the trimmed search text
/// (case-insensitive) and, if a category is selected, its category field
/// equals the selection.
pub fn filter_records<'a>(
    schema: &EntitySchema,
    records: &'a [Record],
    query: &ListQuery,
) -> Vec<&'a Record> {
    let needle = query.search.trim().to_lowercase();
    let category = schema.category.zip(query.selected_category());

    records
        .iter()
        .filter(|record| {
            needle.is_empty()
                || schema
                    .search_fields
                    .iter()
                    .any(|field| record.text(field).to_lowercase().contains(&needle))
        })
        .filter(|record| {
            category.is_none_or(|(spec, selected)| category_value(record, spec.field) == selected)
        })
        .collect()
}

/// Category choices as `(value, label)` pairs
///
/// Derived categories are the distinct non-empty values present in the
/// collection, sorted.
pub fn category_choices(schema: &EntitySchema, records: &[Record]) -> Vec<(String, String)> {
    let Some(spec) = schema.category else {
        return Vec::new();
    };

    match spec.options {
        CategoryOptions::Static(options) => options
            .iter()
            .map(|o| (o.value.to_string(), o.label.to_string()))
            .collect(),
        CategoryOptions::Derived => records
            .iter()
            .map(|r| category_value(r, spec.field))
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|v| (v.clone(), v))
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::lookup;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn leads() -> Vec<Record> {
        vec![
            Record::from_value(json!({
                "id": 1,
                "first_name": "John",
                "last_name": "Doe",
                "email": "john@example.com",
                "mobile_number": "9876543210",
                "interested_course": "MBA",
                "created_at": "2025-10-10T09:30:00Z"
            }))
            .unwrap(),
            Record::from_value(json!({
                "id": 2,
                "first_name": "Asha",
                "last_name": "Menon",
                "email": "asha@example.com",
                "mobile_number": "9123456780",
                "interested_course": "BBA",
                "created_at": "2025-10-11T10:00:00Z"
            }))
            .unwrap(),
        ]
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let schema = lookup("admission-leads").unwrap();
        let records = leads();

        let filtered = filter_records(schema, &records, &ListQuery::default());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let schema = lookup("admission-leads").unwrap();
        let records = leads();

        let upper = filter_records(schema, &records, &ListQuery::search("MBA"));
        let lower = filter_records(schema, &records, &ListQuery::search("mba"));
        assert_eq!(upper.len(), 1);
        assert_eq!(upper, lower);

        let padded = filter_records(schema, &records, &ListQuery::search("  asha  "));
        assert_eq!(padded.len(), 1);
    }

    #[test]
    fn test_search_scenario_from_leads_page() {
        let schema = lookup("admission-leads").unwrap();
        let records = vec![leads().remove(0)];

        let kept = filter_records(schema, &records, &ListQuery::search("mba"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text("first_name"), "John");

        let none = filter_records(schema, &records, &ListQuery::search("phd"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_search_matches_single_record() {
        let schema = lookup("admission-leads").unwrap();
        let records = leads();

        let filtered = filter_records(schema, &records, &ListQuery::search("9123"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text("first_name"), "Asha");
    }

    #[test]
    fn test_category_and_search_combine() {
        let schema = lookup("admission-leads").unwrap();
        let records = leads();

        let query = ListQuery::search("example.com").with_category("BBA");
        let filtered = filter_records(schema, &records, &query);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text("interested_course"), "BBA");

        let blank = ListQuery::default().with_category("  ");
        assert!(!blank.is_active());
        assert_eq!(filter_records(schema, &records, &blank).len(), 2);
    }

    #[test]
    fn test_boolean_category() {
        let schema = lookup("events").unwrap();
        let records = vec![
            Record::from_value(json!({"id": 1, "title": "Open Day", "is_active": true})).unwrap(),
            Record::from_value(json!({"id": 2, "title": "Alumni Meet", "is_active": false}))
                .unwrap(),
        ];

        let active = filter_records(schema, &records, &ListQuery::default().with_category("true"));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].text("title"), "Open Day");
    }

    #[test]
    fn test_derived_choices_are_distinct_and_sorted() {
        let schema = lookup("admission-leads").unwrap();
        let mut records = leads();
        records.push(records[0].clone());

        let choices = category_choices(schema, &records);
        assert_eq!(
            choices,
            vec![
                ("BBA".to_string(), "BBA".to_string()),
                ("MBA".to_string(), "MBA".to_string())
            ]
        );
    }

    #[test]
    fn test_static_choices() {
        let schema = lookup("gallery").unwrap();
        let choices = category_choices(schema, &[]);
        assert_eq!(choices.len(), 4);
        assert_eq!(choices[0], ("programs".to_string(), "Programs".to_string()));

        assert!(category_choices(lookup("faculty").unwrap(), &[]).is_empty());
    }

    fn arb_lead() -> impl Strategy<Value = Record> {
        ("[a-zA-Z]{0,8}", "[a-z]{0,6}@x\\.io", "[A-Z]{2,4}").prop_map(|(name, email, course)| {
            Record::from_value(json!({
                "first_name": name,
                "email": email,
                "interested_course": course
            }))
            .unwrap()
        })
    }

    proptest! {
        #[test]
        fn test_filter_is_idempotent(
            records in prop::collection::vec(arb_lead(), 0..20),
            search in "[a-zA-Z@.]{0,4}",
            category in prop::option::of("[A-Z]{2,4}"),
        ) {
            let schema = lookup("admission-leads").unwrap();
            let query = ListQuery { search, category };

            let first: Vec<Record> = filter_records(schema, &records, &query)
                .into_iter()
                .cloned()
                .collect();
            let second: Vec<Record> = filter_records(schema, &records, &query)
                .into_iter()
                .cloned()
                .collect();
            prop_assert_eq!(&first, &second);

            // Filtering the filtered set again changes nothing
            let again: Vec<Record> = filter_records(schema, &first, &query)
                .into_iter()
                .cloned()
                .collect();
            prop_assert_eq!(first, again);
        }

        #[test]
        fn test_filter_never_grows_or_mutates(
            records in prop::collection::vec(arb_lead(), 0..20),
            search in "[a-z]{0,3}",
        ) {
            let schema = lookup("admission-leads").unwrap();
            let before = records.clone();

            let filtered = filter_records(schema, &records, &ListQuery::search(search));
            prop_assert!(filtered.len() <= records.len());
            prop_assert_eq!(before, records);
        }
    }
}
