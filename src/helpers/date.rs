//! Date helper functions

use chrono::{NaiveDate, NaiveDateTime};

/// Formats tried, in order, when a front-matter date is displayed
const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d",
];

/// Display a raw front-matter date using a Moment.js-style format.
///
/// Values that do not look like a date are returned unchanged, so a page
/// never fails to render because of an unusual date string.
///
/// # Examples
/// ```ignore
/// format_date_str("2024-01-05", "MMMM D, YYYY") // -> "January 5, 2024"
/// ```
pub fn format_date_str(value: &str, format: &str) -> String {
    let value = value.trim();
    let Some(date) = parse_date(value) else {
        return value.to_string();
    };
    date.format(&moment_to_chrono_format(format)).to_string()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each category
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("D", "%-d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_str() {
        assert_eq!(format_date_str("2024-01-05", "MMMM D, YYYY"), "January 5, 2024");
        assert_eq!(format_date_str("2024-01-15", "YYYY/MM/DD"), "2024/01/15");
        assert_eq!(format_date_str("2024-01-15 10:30:00", "MMM D"), "Jan 15");
    }

    #[test]
    fn test_unparseable_date_is_kept() {
        assert_eq!(format_date_str("someday", "MMMM D, YYYY"), "someday");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("MMMM D, YYYY"), "%B %-d, %Y");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
    }
}
