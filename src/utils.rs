use chrono::{Months, NaiveDate};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything outside the RFC 3986 unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encode one URL path segment or userinfo part.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Join a list field into the comma-separated form stored in the database.
/// Absent, empty and all-blank lists become `None`.
pub fn join_list(items: Option<&[String]>) -> Option<String> {
    let joined = items?
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() { None } else { Some(joined) }
}

/// `"2023-11-14"` + `"06:58:12"` -> `"2023-11-14 06:58:12"`.
pub fn date_time(date: &str, time: &str) -> String {
    format!("{} {}", date, time)
}

/// End of the default fetch window: one calendar month after `start`,
/// clamped to the last day of that month.
pub fn default_end_date(start: NaiveDate) -> NaiveDate {
    start.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(percent_encode("Toronto,CA"), "Toronto%2CCA");
        assert_eq!(percent_encode("New York"), "New%20York");
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(percent_encode("p@ss:word/é"), "p%40ss%3Aword%2F%C3%A9");
    }

    #[test]
    fn joins_lists_and_drops_empty_ones() {
        let list = vec!["rain".to_string(), " snow ".to_string()];
        assert_eq!(join_list(Some(&list)), Some("rain,snow".to_string()));
        assert_eq!(join_list(Some(&[])), None);
        assert_eq!(join_list(Some(&["  ".to_string()])), None);
        assert_eq!(join_list(None), None);
    }

    #[test]
    fn default_window_is_one_month() {
        let d = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(default_end_date(d("2023-12-01")), d("2024-01-01"));
        assert_eq!(default_end_date(d("2024-01-31")), d("2024-02-29"));
    }
}
