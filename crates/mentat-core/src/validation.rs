//! Validation and normalization rules applied to entry fields.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::{DATETIME_LAYOUT, DATETIME_PARSE_LAYOUT, PRIORITY_PATTERN};
use crate::error::{DomainError, Error, Result};

/// Compiled priority pattern. A built-in pattern that fails to compile is a
/// programming error and aborts the process.
static PRIORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PRIORITY_PATTERN).expect("built-in priority pattern must compile"));

/// Accept a priority such as `#A`; anything else is a soft rejection.
pub fn validate_priority(raw: &str) -> std::result::Result<String, DomainError> {
    if PRIORITY_RE.is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(DomainError::MalformedPriority)
    }
}

/// Lowercase tags, drop empty ones and collapse duplicates.
///
/// First-occurrence order is kept.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Todo states are stored uppercase.
pub fn normalize_todo_status(raw: &str) -> String {
    raw.to_uppercase()
}

/// Parse a `scheduled`/`deadline` argument.
///
/// Unlike the other field checks this is a hard error.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATETIME_PARSE_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::InvalidTimestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Render a timestamp in the argument layout.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(DATETIME_LAYOUT).to_string()
}

/// Current time at the precision the stores keep (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Next modification stamp: now, bumped past `previous` when the clock has
/// not advanced.
pub fn next_modified(previous: DateTime<Utc>) -> DateTime<Utc> {
    let current = now();
    if current > previous {
        current
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

/// Treat an empty string as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_priority_accepts_hash_uppercase() {
        assert_eq!(validate_priority("#A").unwrap(), "#A");
        assert_eq!(validate_priority("#Z").unwrap(), "#Z");
    }

    #[test]
    fn test_priority_rejects_malformed() {
        for raw in ["#a", "#AB", "A#", "A", "#", "#1", ""] {
            assert_eq!(
                validate_priority(raw),
                Err(DomainError::MalformedPriority),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_priority_pattern_is_end_anchored_only() {
        // Only the end of the value is anchored.
        assert!(validate_priority("prio #B").is_ok());
    }

    #[test]
    fn test_normalize_tags_lowercases() {
        assert_eq!(normalize_tags(["Go", "RUST"]), vec!["go", "rust"]);
    }

    #[test]
    fn test_normalize_tags_dedupes_and_drops_empty() {
        assert_eq!(
            normalize_tags(["Work", "", "work", "Home"]),
            vec!["work", "home"]
        );
        assert!(normalize_tags(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_normalize_todo_status() {
        assert_eq!(normalize_todo_status("todo"), "TODO");
        assert_eq!(normalize_todo_status("Done"), "DONE");
    }

    #[test]
    fn test_parse_timestamp_with_millis() {
        let ts = parse_timestamp("2024-03-01T09:30:15.250Z").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 3);
        assert_eq!(ts.day(), 1);
        assert_eq!(ts.hour(), 9);
        assert_eq!(ts.minute(), 30);
        assert_eq!(ts.second(), 15);
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_timestamp_without_fraction() {
        let ts = parse_timestamp("2024-03-01T09:30:15Z").unwrap();
        assert_eq!(ts.second(), 15);
        assert_eq!(ts.timestamp_subsec_millis(), 0);
    }

    #[test]
    fn test_parse_timestamp_rejects_other_layouts() {
        for raw in ["tomorrow", "2024-03-01", "01/03/2024 09:30", "2024-03-01T09:30:00+02:00"] {
            let err = parse_timestamp(raw).unwrap_err();
            assert!(
                matches!(err, Error::InvalidTimestamp { .. }),
                "{:?} should fail",
                raw
            );
        }
    }

    #[test]
    fn test_format_timestamp_matches_layout() {
        let ts = parse_timestamp("2024-03-01T09:30:00.000Z").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T09:30:00.000Z");
    }

    #[test]
    fn test_next_modified_strictly_increases() {
        let future = now() + chrono::Duration::seconds(5);
        let next = next_modified(future);
        assert!(next > future);

        let past = now() - chrono::Duration::seconds(5);
        assert!(next_modified(past) > past);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
    }
}
