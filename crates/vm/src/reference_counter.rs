//! Reference counting for stack items.
//!
//! The counter tracks how many references to stack items exist across all
//! evaluation stacks, slots and compound items, so the engine can enforce
//! `max_stack_size`. Compound items are tracked by identity. A compound whose
//! last stack reference goes away is not released immediately; it is checked
//! for reachability from the remaining stack roots the next time the count
//! reaches the limit.

use crate::stack_item::StackItem;
use hashbrown::{HashMap, HashSet};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
struct Tracked {
    item: StackItem,
    stack_references: usize,
}

#[derive(Debug, Default)]
struct Inner {
    references_count: usize,
    tracked: HashMap<usize, Tracked>,
    zero_referred: HashSet<usize>,
}

impl Inner {
    /// Starts tracking `item` and, recursively, every untracked compound it
    /// holds, counting one reference per child.
    fn attach(&mut self, id: usize, item: &StackItem, stack_references: usize) {
        self.tracked.insert(
            id,
            Tracked {
                item: item.clone(),
                stack_references,
            },
        );
        for child in item.sub_items() {
            self.references_count += 1;
            if let Some(child_id) = child.compound_id() {
                if !self.tracked.contains_key(&child_id) {
                    self.attach(child_id, &child, 0);
                }
            }
        }
    }
}

/// Shared handle to the reference counter of one engine.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCounter {
    inner: Rc<RefCell<Inner>>,
}

impl ReferenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of references currently counted.
    pub fn count(&self) -> usize {
        self.inner.borrow().references_count
    }

    /// Returns `true` when both handles refer to the same counter.
    pub fn ptr_eq(&self, other: &ReferenceCounter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of compound items currently tracked.
    pub fn tracked_count(&self) -> usize {
        self.inner.borrow().tracked.len()
    }

    /// Records `count` references from a stack or slot to `item`.
    pub fn add_stack_reference(&self, item: &StackItem, count: usize) {
        let mut inner = self.inner.borrow_mut();
        inner.references_count += count;
        let Some(id) = item.compound_id() else {
            return;
        };
        match inner.tracked.get_mut(&id) {
            Some(entry) => entry.stack_references += count,
            None => inner.attach(id, item, count),
        }
        inner.zero_referred.remove(&id);
    }

    /// Removes one stack or slot reference to `item`.
    pub fn remove_stack_reference(&self, item: &StackItem) {
        let mut inner = self.inner.borrow_mut();
        inner.references_count = inner.references_count.saturating_sub(1);
        let Some(id) = item.compound_id() else {
            return;
        };
        let orphaned = match inner.tracked.get_mut(&id) {
            Some(entry) => {
                entry.stack_references = entry.stack_references.saturating_sub(1);
                entry.stack_references == 0
            }
            None => false,
        };
        if orphaned {
            inner.zero_referred.insert(id);
        }
    }

    /// Records that `parent` now holds `child`. No-op for untracked parents;
    /// their children are counted when they are first pushed.
    pub fn add_reference(&self, child: &StackItem, parent: &StackItem) {
        let mut inner = self.inner.borrow_mut();
        let Some(parent_id) = parent.compound_id() else {
            return;
        };
        if !inner.tracked.contains_key(&parent_id) {
            return;
        }
        inner.references_count += 1;
        if let Some(child_id) = child.compound_id() {
            if !inner.tracked.contains_key(&child_id) {
                inner.attach(child_id, child, 0);
            }
        }
    }

    /// Records that `parent` no longer holds `child`.
    pub fn remove_reference(&self, child: &StackItem, parent: &StackItem) {
        let mut inner = self.inner.borrow_mut();
        let Some(parent_id) = parent.compound_id() else {
            return;
        };
        if !inner.tracked.contains_key(&parent_id) {
            return;
        }
        inner.references_count = inner.references_count.saturating_sub(1);
        if let Some(child_id) = child.compound_id() {
            let orphaned = inner
                .tracked
                .get(&child_id)
                .map(|entry| entry.stack_references == 0)
                .unwrap_or(false);
            if orphaned {
                inner.zero_referred.insert(child_id);
            }
        }
    }

    /// Releases tracked compounds that are no longer reachable from any
    /// stack root and returns the resulting count.
    pub fn check_zero_referred(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        if inner.zero_referred.is_empty() {
            return inner.references_count;
        }
        inner.zero_referred.clear();

        let mut reachable: HashSet<usize> = HashSet::with_capacity(inner.tracked.len());
        let mut pending: Vec<StackItem> = inner
            .tracked
            .iter()
            .filter(|(_, entry)| entry.stack_references > 0)
            .map(|(_, entry)| entry.item.clone())
            .collect();

        while let Some(item) = pending.pop() {
            let Some(id) = item.compound_id() else {
                continue;
            };
            if !reachable.insert(id) {
                continue;
            }
            pending.extend(item.sub_items().into_iter().filter(|child| {
                child
                    .compound_id()
                    .map(|child_id| !reachable.contains(&child_id))
                    .unwrap_or(false)
            }));
        }

        let unreachable: Vec<usize> = inner
            .tracked
            .keys()
            .filter(|id| !reachable.contains(*id))
            .copied()
            .collect();
        for id in unreachable {
            if let Some(entry) = inner.tracked.remove(&id) {
                let released = entry.item.sub_items_count();
                inner.references_count = inner.references_count.saturating_sub(released);
            }
        }
        inner.references_count
    }
}
