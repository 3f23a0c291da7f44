//! Centralized default constants for the mentat entry service.
//!
//! All crates reference these constants instead of defining their own magic
//! values. Organized by domain area.

// =============================================================================
// ENTRY TYPES
// =============================================================================

/// Entry types used when a Search or Cleanup call names none.
///
/// Unrecognized type names supplied by a caller are matched literally and
/// therefore never widen this set.
pub const ENTRY_TYPES: &[&str] = &["pim", "bookmark", "org"];

// =============================================================================
// VALIDATION
// =============================================================================

/// Accepted priority shape: a hash followed by one uppercase letter at the
/// end of the value (`#A`, `#B`, ...).
pub const PRIORITY_PATTERN: &str = r"#[A-Z]$";

/// Textual layout for `scheduled` and `deadline` values (chrono syntax).
///
/// Example: `2024-03-01T09:30:00.000Z`.
pub const DATETIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Layout used when parsing arguments; same as [`DATETIME_LAYOUT`] with the
/// fractional seconds optional and of any precision.
pub const DATETIME_PARSE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

// =============================================================================
// DELETION
// =============================================================================

/// Above this many identifiers, Delete switches from per-item removal to a
/// single set-based removal.
pub const BATCH_DELETE_THRESHOLD: usize = 10;

// =============================================================================
// RESPONSES
// =============================================================================

/// Count reported when a count was not computed or failed.
pub const COUNT_UNKNOWN: i64 = -1;

/// Separator between identifiers in a partial Delete failure message.
pub const FAILED_ID_SEPARATOR: &str = ", ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry_types() {
        assert_eq!(ENTRY_TYPES, &["pim", "bookmark", "org"]);
    }

    #[test]
    fn test_batch_delete_threshold() {
        assert_eq!(BATCH_DELETE_THRESHOLD, 10);
    }

    #[test]
    fn test_count_unknown_is_negative() {
        assert!(COUNT_UNKNOWN < 0);
    }
}
