//! Identifier resolution.
//!
//! The Graph API only accepts opaque IDs while users type list and task names
//! or the positions printed by `lists` / `show`. An identifier is resolved
//! against an ordered collection, first match wins:
//!
//! 1. a non-negative integer within bounds selects that position,
//! 2. a case-insensitive exact display-name match,
//! 3. a case-insensitive suffix match, so `Groceries` finds `🛒 Groceries`.
//!
//! A display name consisting of digits is therefore unreachable by name
//! whenever it is also a valid position.

use crate::types::{TodoList, TodoTask};

/// Anything with a user-facing display name.
pub trait NamedEntity {
    fn display_name(&self) -> &str;
}

impl NamedEntity for TodoList {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl NamedEntity for TodoTask {
    fn display_name(&self) -> &str {
        &self.title
    }
}

/// Resolves `identifier` against `entities` in their given order.
///
/// # Arguments
///
/// * `identifier` - Position or (suffix of a) display name, surrounding
///   whitespace is ignored
/// * `entities` - Collection in server order; positions refer to this order
///
/// # Returns
///
/// The first match of the first rule that matches anything, or `None`. An
/// empty identifier always yields `None` since every name ends with the empty
/// string.
///
/// # Example
///
/// ```
/// // lists: ["Tasks", "🛒 Groceries"]
/// assert_eq!(resolve("1", &lists).map(|l| l.id.as_str()), Some("groceries-id"));
/// assert_eq!(resolve("groceries", &lists).map(|l| l.id.as_str()), Some("groceries-id"));
/// assert!(resolve("chores", &lists).is_none());
/// ```
pub fn resolve<'a, T: NamedEntity>(identifier: &str, entities: &'a [T]) -> Option<&'a T> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }

    if let Ok(index) = identifier.parse::<usize>() {
        if let Some(entity) = entities.get(index) {
            return Some(entity);
        }
    }

    let needle = identifier.to_lowercase();

    entities
        .iter()
        .find(|e| e.display_name().to_lowercase() == needle)
        .or_else(|| {
            entities
                .iter()
                .find(|e| e.display_name().to_lowercase().ends_with(&needle))
        })
}
