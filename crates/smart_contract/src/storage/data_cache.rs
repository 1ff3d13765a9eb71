//! The storage collaborator used by the application engine.

use super::{StorageItem, StorageKey};
use std::collections::BTreeMap;
use std::ops::Bound;

/// Iteration order of [`DataCache::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekDirection {
    #[default]
    Forward,
    Backward,
}

/// Key-value storage seen by contracts.
///
/// Implementations must return `find` results sorted by key in the requested
/// direction.
pub trait DataCache {
    /// Reads the item stored under `key`.
    fn get(&self, key: &StorageKey) -> Option<StorageItem>;

    /// Returns a mutable handle to the item under `key`, inserting the
    /// value produced by `factory` when the key is missing.
    fn get_and_change(
        &mut self,
        key: &StorageKey,
        factory: Option<&dyn Fn() -> StorageItem>,
    ) -> Option<&mut StorageItem>;

    /// Stores `item` under `key`, replacing any previous value.
    fn put(&mut self, key: StorageKey, item: StorageItem);

    /// Removes `key`. Missing keys are ignored.
    fn delete(&mut self, key: &StorageKey);

    /// Returns every entry of contract `prefix.id` whose key starts with
    /// `prefix.key`.
    fn find(&self, prefix: &StorageKey, direction: SeekDirection) -> Vec<(StorageKey, StorageItem)>;

    fn contains(&self, key: &StorageKey) -> bool {
        self.get(key).is_some()
    }
}

/// An in-memory [`DataCache`] backed by an ordered map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<StorageKey, StorageItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates every entry in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StorageKey, &StorageItem)> {
        self.entries.iter()
    }
}

impl DataCache for MemoryStore {
    fn get(&self, key: &StorageKey) -> Option<StorageItem> {
        self.entries.get(key).cloned()
    }

    fn get_and_change(
        &mut self,
        key: &StorageKey,
        factory: Option<&dyn Fn() -> StorageItem>,
    ) -> Option<&mut StorageItem> {
        if !self.entries.contains_key(key) {
            let item = factory?();
            self.entries.insert(key.clone(), item);
        }
        self.entries.get_mut(key)
    }

    fn put(&mut self, key: StorageKey, item: StorageItem) {
        self.entries.insert(key, item);
    }

    fn delete(&mut self, key: &StorageKey) {
        self.entries.remove(key);
    }

    fn find(&self, prefix: &StorageKey, direction: SeekDirection) -> Vec<(StorageKey, StorageItem)> {
        let matches = self
            .entries
            .range((Bound::Included(prefix.clone()), Bound::Unbounded))
            .take_while(|(key, _)| key.id == prefix.id && key.has_prefix(&prefix.key))
            .map(|(key, item)| (key.clone(), item.clone()));
        match direction {
            SeekDirection::Forward => matches.collect(),
            SeekDirection::Backward => {
                let mut entries: Vec<_> = matches.collect();
                entries.reverse();
                entries
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.put(StorageKey::new(1, vec![0x01, 0x02]), StorageItem::new(vec![2]));
        store.put(StorageKey::new(1, vec![0x01]), StorageItem::new(vec![1]));
        store.put(StorageKey::new(1, vec![0x02]), StorageItem::new(vec![3]));
        store.put(StorageKey::new(2, vec![0x01]), StorageItem::new(vec![4]));
        store
    }

    #[test]
    fn find_returns_prefix_matches_in_key_order() {
        let store = store();
        let found = store.find(&StorageKey::new(1, vec![0x01]), SeekDirection::Forward);
        let values: Vec<u8> = found.iter().map(|(_, item)| item.value[0]).collect();
        assert_eq!(values, vec![1, 2]);

        let found = store.find(&StorageKey::new(1, vec![]), SeekDirection::Backward);
        let values: Vec<u8> = found.iter().map(|(_, item)| item.value[0]).collect();
        assert_eq!(values, vec![3, 2, 1]);
    }

    #[test]
    fn get_and_change_uses_the_factory_only_for_missing_keys() {
        let mut store = store();
        let key = StorageKey::new(3, vec![9]);
        assert!(store.get_and_change(&key, None).is_none());

        let item = store
            .get_and_change(&key, Some(&|| StorageItem::new(vec![7])))
            .unwrap();
        item.value.push(8);
        assert_eq!(store.get(&key).unwrap().value, vec![7, 8]);

        store.delete(&key);
        assert!(!store.contains(&key));
        assert_eq!(store.len(), 4);
    }
}
