//! Slot storage for local variables, arguments and static fields.

use crate::error::{VmError, VmResult};
use crate::reference_counter::ReferenceCounter;
use crate::stack_item::StackItem;

/// Fixed-size storage that keeps the reference counter in sync with its
/// content.
#[derive(Debug, Clone)]
pub struct Slot {
    items: Vec<StackItem>,
    reference_counter: ReferenceCounter,
}

impl Slot {
    /// Creates a slot populated with the provided items.
    pub fn new(items: Vec<StackItem>, reference_counter: ReferenceCounter) -> Self {
        for item in &items {
            reference_counter.add_stack_reference(item, 1);
        }
        Self {
            items,
            reference_counter,
        }
    }

    /// Creates a slot of `count` Null items.
    pub fn with_count(count: usize, reference_counter: ReferenceCounter) -> Self {
        reference_counter.add_stack_reference(&StackItem::Null, count);
        Self {
            items: vec![StackItem::Null; count],
            reference_counter,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[StackItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> VmResult<&StackItem> {
        self.items.get(index).ok_or_else(|| {
            VmError::out_of_range(format!("slot index {index} of {}", self.items.len()))
        })
    }

    pub fn set(&mut self, index: usize, item: StackItem) -> VmResult<()> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| VmError::out_of_range(format!("slot index {index} of {len}")))?;
        self.reference_counter.add_stack_reference(&item, 1);
        let old = std::mem::replace(slot, item);
        self.reference_counter.remove_stack_reference(&old);
        Ok(())
    }

    /// Drops every stack reference held by the slot.
    pub fn clear_references(&mut self) {
        for item in &self.items {
            self.reference_counter.remove_stack_reference(item);
        }
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_and_recounts() {
        let counter = ReferenceCounter::new();
        let mut slot = Slot::with_count(2, counter.clone());
        assert_eq!(counter.count(), 2);

        slot.set(1, StackItem::from_array(vec![StackItem::from_int(1)])).unwrap();
        // two slot references plus the array element
        assert_eq!(counter.count(), 3);
        assert!(slot.set(2, StackItem::Null).is_err());

        slot.clear_references();
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.check_zero_referred(), 0);
    }
}
