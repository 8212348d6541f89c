//! Display helpers

use chrono::{DateTime, NaiveDate};

/// Default truncation length for dashboard previews
pub const PREVIEW_CHARS: usize = 50;

/// Short month-day rendering, e.g. `Oct 10`
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates. Anything else
/// is returned unchanged.
pub fn format_short_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%b %-d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%b %-d").to_string();
    }
    raw.to_string()
}

/// Long date rendering for detail pages, e.g. `Oct 10, 2025 09:30`
pub fn format_long_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%b %-d, %Y %H:%M").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%b %-d, %Y").to_string();
    }
    raw.to_string()
}

/// Cut text to `max` characters, appending `...` when shortened
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("2025-10-10T09:30:00Z", "Oct 10")]
    #[case("2025-01-05T23:59:59+05:30", "Jan 5")]
    #[case("2025-10-10", "Oct 10")]
    #[case("soon", "soon")]
    #[case("", "")]
    fn test_format_short_date(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(format_short_date(raw), expected);
    }

    #[test]
    fn test_format_long_date() {
        assert_eq!(format_long_date("2025-10-10T09:30:00Z"), "Oct 10, 2025 09:30");
        assert_eq!(format_long_date("2025-10-10"), "Oct 10, 2025");
    }

    #[test]
    fn test_truncate_text() {
        let long = "a".repeat(60);
        let cut = truncate_text(&long, PREVIEW_CHARS);
        assert_eq!(cut.len(), 53);
        assert!(cut.ends_with("..."));

        assert_eq!(truncate_text("short", PREVIEW_CHARS), "short");
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
    }
}
