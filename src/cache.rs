//! Child-name cache backing path completion.

use std::collections::HashMap;

/// Cached child lists keyed by parent path.
///
/// Entries are filled lazily by completion and dropped by any command
/// that adds or removes a node under the parent.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    entries: HashMap<String, Vec<String>>,
}

impl SuggestionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached children of `parent`, if any.
    pub fn get(&self, parent: &str) -> Option<&[String]> {
        self.entries.get(parent).map(Vec::as_slice)
    }

    /// Remember the children of `parent`.
    pub fn put(&mut self, parent: impl Into<String>, names: Vec<String>) {
        self.entries.insert(parent.into(), names);
    }

    /// Forget the children of `parent`.
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(&mut self, parent: &str) -> bool {
        self.entries.remove(parent).is_some()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached parents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
