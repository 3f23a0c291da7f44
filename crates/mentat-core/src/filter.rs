//! Storage-agnostic query filter for entries.
//!
//! Gateway operations describe which entries they touch with an
//! [`EntryFilter`]. Backends either compile it (PostgreSQL, see
//! `mentat_db::filter_sql`) or evaluate it directly with
//! [`EntryFilter::matches`] (the in-memory store).
//!
//! Absent search criteria are omitted from the filter, never turned into
//! wildcards.

use regex::{Regex, RegexBuilder};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Entry;

/// Boolean filter over entry fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryFilter {
    /// Every entry in the collection.
    All,
    /// All sub-filters hold. An empty conjunction matches everything.
    And(Vec<EntryFilter>),
    /// At least one sub-filter holds. An empty disjunction matches nothing.
    Or(Vec<EntryFilter>),
    /// Entry type is one of the given names. Unknown names match nothing.
    TypeIn(Vec<String>),
    /// Exact content match (the Add uniqueness key).
    ContentEquals(String),
    /// Case-insensitive regular expression over `content`.
    ContentMatches(String),
    /// Case-insensitive regular expression over `metadata.description`.
    DescriptionMatches(String),
    /// Exact uuid match.
    UuidEquals(Uuid),
    /// Uuid is one of the given identifiers.
    UuidIn(Vec<Uuid>),
    /// Entry tags intersect the given tags.
    TagsAny(Vec<String>),
    /// Exact priority match.
    PriorityEquals(String),
}

impl EntryFilter {
    pub fn by_content(content: impl Into<String>) -> Self {
        EntryFilter::ContentEquals(content.into())
    }

    pub fn by_uuid(uuid: Uuid) -> Self {
        EntryFilter::UuidEquals(uuid)
    }

    /// Type membership, falling back to `defaults` when `types` is empty.
    pub fn type_in_or_default(types: &[String], defaults: &[&str]) -> Self {
        if types.is_empty() {
            EntryFilter::TypeIn(defaults.iter().map(|t| t.to_string()).collect())
        } else {
            EntryFilter::TypeIn(types.to_vec())
        }
    }

    /// Build the Search filter from the supplied criteria.
    ///
    /// The type clause is always present; content, tags and priority clauses
    /// only when supplied. Requested tags are lowercased to match the stored
    /// normalization.
    pub fn search(
        types: &[String],
        content: &str,
        tags: &[String],
        priority: &str,
        default_types: &[&str],
    ) -> Self {
        let mut clauses = vec![Self::type_in_or_default(types, default_types)];

        if !content.is_empty() {
            clauses.push(EntryFilter::Or(vec![
                EntryFilter::ContentMatches(content.to_string()),
                EntryFilter::DescriptionMatches(content.to_string()),
            ]));
        }

        if !tags.is_empty() {
            clauses.push(EntryFilter::TagsAny(
                tags.iter().map(|t| t.to_lowercase()).collect(),
            ));
        }

        if !priority.is_empty() {
            clauses.push(EntryFilter::PriorityEquals(priority.to_string()));
        }

        EntryFilter::And(clauses)
    }

    /// Evaluate the filter against one entry.
    ///
    /// Fails with [`Error::InvalidInput`] when a pattern is not a valid
    /// regular expression.
    pub fn matches(&self, entry: &Entry) -> Result<bool> {
        Ok(match self {
            EntryFilter::All => true,
            EntryFilter::And(clauses) => {
                for clause in clauses {
                    if !clause.matches(entry)? {
                        return Ok(false);
                    }
                }
                true
            }
            EntryFilter::Or(clauses) => {
                for clause in clauses {
                    if clause.matches(entry)? {
                        return Ok(true);
                    }
                }
                false
            }
            EntryFilter::TypeIn(types) => types.iter().any(|t| t == entry.kind.as_str()),
            EntryFilter::ContentEquals(content) => entry.content == *content,
            EntryFilter::ContentMatches(pattern) => {
                case_insensitive(pattern)?.is_match(&entry.content)
            }
            EntryFilter::DescriptionMatches(pattern) => match &entry.metadata {
                Some(meta) => case_insensitive(pattern)?.is_match(&meta.description),
                None => false,
            },
            EntryFilter::UuidEquals(uuid) => entry.uuid == *uuid,
            EntryFilter::UuidIn(uuids) => uuids.contains(&entry.uuid),
            EntryFilter::TagsAny(tags) => entry.tags.iter().any(|t| tags.contains(t)),
            EntryFilter::PriorityEquals(priority) => {
                entry.priority.as_deref() == Some(priority.as_str())
            }
        })
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidInput(format!("invalid search pattern: {}", e)))
}
