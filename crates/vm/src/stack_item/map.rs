//! Ordered map compound item.

use super::StackItem;
use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Maximum size in bytes of a map key.
pub const MAX_KEY_SIZE: usize = 64;

/// An insertion-ordered map with primitive keys, shared by reference.
#[derive(Clone, Default)]
pub struct Map {
    entries: Rc<RefCell<IndexMap<StackItem, StackItem>>>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (StackItem, StackItem)>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(entries.into_iter().collect())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn get(&self, key: &StackItem) -> Option<StackItem> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &StackItem) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Inserts or replaces a value, returning the previous one. Replacing
    /// keeps the key's original position.
    pub fn insert(&self, key: StackItem, value: StackItem) -> Option<StackItem> {
        self.entries.borrow_mut().insert(key, value)
    }

    /// Removes a key while preserving the order of the remaining entries.
    pub fn remove(&self, key: &StackItem) -> Option<StackItem> {
        self.entries.borrow_mut().shift_remove(key)
    }

    pub fn keys(&self) -> Vec<StackItem> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<StackItem> {
        self.entries.borrow().values().cloned().collect()
    }

    pub fn borrow(&self) -> Ref<'_, IndexMap<StackItem, StackItem>> {
        self.entries.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, IndexMap<StackItem, StackItem>> {
        self.entries.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Map) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }

    /// Identity key used by the reference counter.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.entries) as *const () as usize
    }
}
