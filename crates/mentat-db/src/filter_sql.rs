//! SQL compilation of [`EntryFilter`].
//!
//! Produces a parenthesized WHERE fragment with positional parameters. The
//! caller owns `$1..=$offset` (the user id is always `$1`) and binds the
//! returned [`QueryParam`]s after its own, in order.

use mentat_core::EntryFilter;
use uuid::Uuid;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Uuid(Uuid),
    /// Array of UUIDs (for ANY operations).
    UuidArray(Vec<Uuid>),
    String(String),
    /// Array of strings (type sets, tag overlap).
    StringArray(Vec<String>),
}

/// Generates SQL WHERE clause fragments for an [`EntryFilter`].
///
/// # Example
///
/// ```rust
/// use mentat_core::EntryFilter;
/// use mentat_db::filter_sql::{EntryFilterQueryBuilder, QueryParam};
///
/// let filter = EntryFilter::PriorityEquals("#A".to_string());
/// let (sql, params) = EntryFilterQueryBuilder::new(&filter, 1).build();
/// assert_eq!(sql, "priority = $2");
/// assert_eq!(params, vec![QueryParam::String("#A".to_string())]);
/// ```
pub struct EntryFilterQueryBuilder<'a> {
    filter: &'a EntryFilter,
    param_offset: usize,
}

impl<'a> EntryFilterQueryBuilder<'a> {
    /// `param_offset` is the number of parameters already in the query.
    pub fn new(filter: &'a EntryFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    /// Build the fragment and its parameters in placeholder order.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut params = Vec::new();
        let sql = compile(self.filter, self.param_offset, &mut params);
        (sql, params)
    }
}

fn compile(filter: &EntryFilter, offset: usize, params: &mut Vec<QueryParam>) -> String {
    match filter {
        EntryFilter::All => "TRUE".to_string(),
        EntryFilter::And(clauses) => join(clauses, " AND ", "TRUE", offset, params),
        EntryFilter::Or(clauses) => join(clauses, " OR ", "FALSE", offset, params),
        EntryFilter::TypeIn(types) => format!(
            "type = ANY({}::text[])",
            bind(params, offset, QueryParam::StringArray(types.clone()))
        ),
        // The md5 term lets the planner use the (user_id, md5(content)) index.
        EntryFilter::ContentEquals(content) => {
            let placeholder = bind(params, offset, QueryParam::String(content.clone()));
            format!(
                "(md5(content) = md5({0}::text) AND content = {0})",
                placeholder
            )
        }
        EntryFilter::ContentMatches(pattern) => format!(
            "content ~* {}",
            bind(params, offset, QueryParam::String(pattern.clone()))
        ),
        EntryFilter::DescriptionMatches(pattern) => format!(
            "metadata->>'description' ~* {}",
            bind(params, offset, QueryParam::String(pattern.clone()))
        ),
        EntryFilter::UuidEquals(uuid) => {
            format!("uuid = {}", bind(params, offset, QueryParam::Uuid(*uuid)))
        }
        EntryFilter::UuidIn(uuids) => format!(
            "uuid = ANY({}::uuid[])",
            bind(params, offset, QueryParam::UuidArray(uuids.clone()))
        ),
        EntryFilter::TagsAny(tags) => format!(
            "tags && {}::text[]",
            bind(params, offset, QueryParam::StringArray(tags.clone()))
        ),
        EntryFilter::PriorityEquals(priority) => format!(
            "priority = {}",
            bind(params, offset, QueryParam::String(priority.clone()))
        ),
    }
}

/// Append `param` and return its placeholder.
fn bind(params: &mut Vec<QueryParam>, offset: usize, param: QueryParam) -> String {
    params.push(param);
    format!("${}", offset + params.len())
}

fn join(
    clauses: &[EntryFilter],
    separator: &str,
    empty: &str,
    offset: usize,
    params: &mut Vec<QueryParam>,
) -> String {
    if clauses.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = clauses
        .iter()
        .map(|clause| compile(clause, offset, params))
        .collect();
    format!("({})", parts.join(separator))
}
