//! Specialized collection types

use std::collections::HashMap;

pub use slotmap::{new_key_type, SlotMap};

/// Insertion-ordered registry addressable by name or by dense index
///
/// The index of an entry is the order in which its name was first inserted,
/// and never changes afterwards. Re-inserting an existing name replaces the
/// stored value in place and hands the old value back to the caller.
#[derive(Debug, Clone)]
pub struct NamedRegistry<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> NamedRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a value under `name`
    ///
    /// Returns the dense index of the entry and, if the name was already
    /// present, the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> (usize, Option<T>) {
        let name = name.into();
        if let Some(&idx) = self.index.get(&name) {
            let old = std::mem::replace(&mut self.entries[idx].1, value);
            return (idx, Some(old));
        }

        let idx = self.entries.len();
        self.index.insert(name.clone(), idx);
        self.entries.push((name, value));
        (idx, None)
    }

    /// Dense index for a name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Value by dense index
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.entries.get(idx).map(|(_, v)| v)
    }

    /// Name by dense index
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|(n, _)| n.as_str())
    }

    /// Value by name
    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.index_of(name).and_then(|idx| self.get(idx))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(index, name, value)` in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, (name, value))| (idx, name.as_str(), value))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl<T> Default for NamedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_follows_insertion_not_name_order() {
        let mut reg = NamedRegistry::new();
        assert_eq!(reg.insert("zebra", 1).0, 0);
        assert_eq!(reg.insert("apple", 2).0, 1);
        assert_eq!(reg.insert("mango", 3).0, 2);

        assert_eq!(reg.index_of("apple"), Some(1));
        let names: Vec<&str> = reg.iter().map(|(_, n, _)| n).collect();
        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_duplicate_name_replaces_in_place() {
        let mut reg = NamedRegistry::new();
        reg.insert("a", 10);
        reg.insert("b", 20);
        let (idx, old) = reg.insert("a", 11);

        assert_eq!(idx, 0);
        assert_eq!(old, Some(10));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get_by_name("a"), Some(&11));
    }

    #[test]
    fn test_clear() {
        let mut reg = NamedRegistry::new();
        reg.insert("a", ());
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.index_of("a"), None);
    }
}
