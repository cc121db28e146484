//! Task query composition.
//!
//! `show` accepts several independent flags that all end up in a single Graph
//! request. Each flag is optional; filter predicates from different flags are
//! always joined with `and`, never overwrite each other, and the result does
//! not depend on the order the flags were given in.

use serde::Serialize;

use crate::error::{Error, Result};

/// Raw flag values as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct QueryFlags {
    pub limit: Option<String>,
    pub skip: Option<String>,
    pub filter: Option<String>,
    pub search: Option<String>,
    pub orderby: Option<String>,
    pub important: bool,
}

/// Combined paging, filter and sort parameters of one task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub top: Option<u32>,
    pub skip: Option<u32>,
    pub filter: Option<String>,
    pub orderby: Option<String>,
}

#[derive(Serialize)]
struct ODataParams<'a> {
    #[serde(rename = "$top", skip_serializing_if = "Option::is_none")]
    top: Option<u32>,
    #[serde(rename = "$skip", skip_serializing_if = "Option::is_none")]
    skip: Option<u32>,
    #[serde(rename = "$filter", skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(rename = "$orderby", skip_serializing_if = "Option::is_none")]
    orderby: Option<&'a str>,
}

impl TaskQuery {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the result is a prefix of the unfiltered server-ordered
    /// listing, so result positions equal listing positions.
    ///
    /// Only `$top` keeps that property; `$filter`, `$skip` and `$orderby`
    /// all shift or reorder the tasks.
    pub fn keeps_positions(&self) -> bool {
        self.filter.is_none() && self.skip.is_none() && self.orderby.is_none()
    }

    /// OData query parameters, ready for `RequestBuilder::query`.
    pub fn params(&self) -> impl Serialize + '_ {
        ODataParams {
            top: self.top,
            skip: self.skip,
            filter: self.filter.as_deref(),
            orderby: self.orderby.as_deref(),
        }
    }
}

/// Builds one [`TaskQuery`] out of the independent `show` flags.
///
/// Every flag is optional and a blank value counts as absent. Filter
/// predicates are combined in a fixed order, so the flag order on the command
/// line never changes the result:
///
/// 1. the raw `--filter`, parenthesized when anything else joins it,
/// 2. the `--search` disjunction over title and body,
/// 3. `importance eq 'high'` for `--important`.
///
/// # Arguments
///
/// * `flags` - Raw flag values as typed by the user
///
/// # Returns
///
/// The combined query. `--limit 0` yields no `$top`.
///
/// # Errors
///
/// Returns [`Error::Validation`] when `--limit` or `--skip` is present but not
/// a non-negative integer. Nothing is sent to the server in that case.
///
/// # Example
///
/// ```
/// let flags = QueryFlags {
///     search: Some("milk".into()),
///     important: true,
///     ..Default::default()
/// };
/// let query = compose(&flags)?;
/// assert_eq!(
///     query.filter.as_deref(),
///     Some("(contains(title,'milk') or contains(body/content,'milk')) and importance eq 'high'")
/// );
/// ```
pub fn compose(flags: &QueryFlags) -> Result<TaskQuery> {
    // a zero limit means "no limit"
    let top = parse_count("--limit", flags.limit.as_deref())?.filter(|n| *n > 0);
    let skip = parse_count("--skip", flags.skip.as_deref())?;

    let raw_filter = non_empty(flags.filter.as_deref());
    let search = non_empty(flags.search.as_deref());

    let mut clauses: Vec<String> = Vec::new();

    // a raw filter is trusted as-is, but grouped so a top-level `or` in it
    // cannot escape the conjunction
    if let Some(filter) = raw_filter {
        if search.is_some() || flags.important {
            clauses.push(format!("({filter})"));
        } else {
            clauses.push(filter.to_string());
        }
    }
    if let Some(search) = search {
        clauses.push(search_clause(search));
    }
    if flags.important {
        clauses.push("importance eq 'high'".to_string());
    }

    Ok(TaskQuery {
        top,
        skip,
        filter: (!clauses.is_empty()).then(|| clauses.join(" and ")),
        orderby: non_empty(flags.orderby.as_deref()).map(str::to_string),
    })
}

/// Parenthesized disjunction testing `term` against title and description.
pub fn search_clause(term: &str) -> String {
    let literal = escape_literal(term);
    format!("(contains(title,'{literal}') or contains(body/content,'{literal}'))")
}

/// Escapes a value for use inside an OData string literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn parse_count(flag: &str, value: Option<&str>) -> Result<Option<u32>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| Error::Validation(format!("{flag} requires a non-negative numeric value, got '{raw}'")))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
