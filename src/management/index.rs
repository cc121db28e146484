use crate::resolve::{self, NamedEntity};

/// Process-local snapshot of remote entities, in server order.
///
/// Positions used for numeric identifiers are the positions of this
/// snapshot, so entries are never re-sorted and entries sharing a display
/// name are all kept.
#[derive(Debug, Clone)]
pub struct EntityIndex<T> {
    entries: Vec<T>,
    populated: bool,
}

impl<T> Default for EntityIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            populated: false,
        }
    }
}

impl<T: NamedEntity> EntityIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole snapshot with `entries`.
    pub fn replace(&mut self, entries: Vec<T>) {
        self.entries.clear();
        self.entries.extend(entries);
        self.populated = true;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.populated = false;
    }

    /// Whether the snapshot was filled since creation or the last `clear`.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn resolve(&self, identifier: &str) -> Option<&T> {
        resolve::resolve(identifier, &self.entries)
    }
}

impl<T: NamedEntity> From<Vec<T>> for EntityIndex<T> {
    fn from(entries: Vec<T>) -> Self {
        Self {
            entries,
            populated: true,
        }
    }
}
