//! Error types for the mentat entry service.
//!
//! Two tiers are kept apart:
//!
//! - [`Error`] is a hard failure. It aborts the operation and surfaces to the
//!   transport as a protocol-level error (or aborts the process at startup).
//! - [`DomainError`] is a soft failure. Gateway operations render it into the
//!   `message`/`error` field of an otherwise successful response.
//!
//! [`EntryError`] tags an outcome as one or the other inside the gateway.

use thiserror::Error;

/// Result type alias using the service's hard [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Hard error type for mentat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No document matched a lookup
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected by a uniqueness constraint
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Timestamp argument does not follow the fixed layout
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error carries "no document matched" semantics.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Database(sqlx::Error::RowNotFound)
        )
    }

    /// Whether this error is a uniqueness violation.
    pub fn is_duplicate(&self) -> bool {
        match self {
            Error::Duplicate(_) => true,
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

/// Soft, domain-level failure reported inside a response.
///
/// The display strings are part of the wire contract: callers branch on them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("User ID is missing")]
    UserIdMissing,

    #[error("Entry type is missing")]
    TypeMissing,

    #[error("Unknown entry type")]
    UnknownType,

    #[error("Empty content not allowed")]
    EmptyContent,

    #[error("Malformed priority value")]
    MalformedPriority,

    #[error("Already exists, skipping")]
    AlreadyExists,

    #[error("No UUID found, cannot proceed with updating")]
    UuidMissing,

    #[error("No entry with provided UUID")]
    UnknownUuid,

    #[error("No UUIDs provided")]
    NoUuids,

    /// A store failure reported as text, prefixed with where it happened.
    #[error("{context}: {message}")]
    Store {
        context: &'static str,
        message: String,
    },
}

impl DomainError {
    /// Wrap a store error with a context prefix.
    pub fn store(context: &'static str, err: &Error) -> Self {
        DomainError::Store {
            context,
            message: err.to_string(),
        }
    }
}

/// Tagged outcome of a gateway step: soft domain rejection or hard failure.
#[derive(Error, Debug)]
pub enum EntryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Fatal(#[from] Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("entry".to_string());
        assert_eq!(err.to_string(), "Not found: entry");
    }

    #[test]
    fn test_error_display_invalid_timestamp() {
        let err = Error::InvalidTimestamp {
            value: "tomorrow".to_string(),
            reason: "input contains invalid characters".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid timestamp 'tomorrow': input contains invalid characters"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".to_string()).is_not_found());
        assert!(Error::Database(sqlx::Error::RowNotFound).is_not_found());
        assert!(!Error::Internal("x".to_string()).is_not_found());
    }

    #[test]
    fn test_is_duplicate() {
        assert!(Error::Duplicate("content".to_string()).is_duplicate());
        assert!(!Error::NotFound("x".to_string()).is_duplicate());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_duplicate());
    }

    #[test]
    fn test_domain_error_messages() {
        assert_eq!(DomainError::UserIdMissing.to_string(), "User ID is missing");
        assert_eq!(DomainError::TypeMissing.to_string(), "Entry type is missing");
        assert_eq!(DomainError::UnknownType.to_string(), "Unknown entry type");
        assert_eq!(
            DomainError::EmptyContent.to_string(),
            "Empty content not allowed"
        );
        assert_eq!(
            DomainError::MalformedPriority.to_string(),
            "Malformed priority value"
        );
        assert_eq!(
            DomainError::AlreadyExists.to_string(),
            "Already exists, skipping"
        );
        assert_eq!(DomainError::NoUuids.to_string(), "No UUIDs provided");
    }

    #[test]
    fn test_domain_error_store_prefix() {
        let err = DomainError::store("update failed", &Error::Internal("boom".to_string()));
        assert_eq!(err.to_string(), "update failed: Internal error: boom");
    }

    #[test]
    fn test_entry_error_from_both_tiers() {
        let soft: EntryError = DomainError::EmptyContent.into();
        assert!(matches!(soft, EntryError::Domain(DomainError::EmptyContent)));

        let hard: EntryError = Error::Internal("x".to_string()).into();
        assert!(matches!(hard, EntryError::Fatal(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
        assert_send::<EntryError>();
    }
}
