//! Array and Struct compound items.

use super::StackItem;
use crate::error::{VmError, VmResult};
use std::cell::{Ref, RefCell, RefMut};
use std::ops::Deref;
use std::rc::Rc;

/// A mutable list of stack items shared by reference.
///
/// Cloning an `Array` clones the handle; both handles observe the same items.
#[derive(Clone, Default)]
pub struct Array {
    items: Rc<RefCell<Vec<StackItem>>>,
}

impl Array {
    pub fn new(items: Vec<StackItem>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Returns a clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<StackItem> {
        self.items.borrow().get(index).cloned()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<StackItem>> {
        self.items.borrow()
    }

    /// Mutable access. Callers on a tracked item must notify the reference
    /// counter for every child added or removed.
    pub fn borrow_mut(&self) -> RefMut<'_, Vec<StackItem>> {
        self.items.borrow_mut()
    }

    /// Snapshot of the current items.
    pub fn to_vec(&self) -> Vec<StackItem> {
        self.items.borrow().clone()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }

    /// Identity key used by the reference counter.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.items) as *const () as usize
    }
}

impl From<Vec<StackItem>> for Array {
    fn from(items: Vec<StackItem>) -> Self {
        Array::new(items)
    }
}

/// A value-semantics list: copied when stored into another container and
/// compared element by element.
#[derive(Clone, Default)]
pub struct Struct(Array);

impl Struct {
    pub fn new(items: Vec<StackItem>) -> Self {
        Struct(Array::new(items))
    }

    /// The underlying list handle.
    pub fn as_array(&self) -> &Array {
        &self.0
    }

    /// Copies this struct and every nested struct. Arrays, maps and other
    /// reference items are shared. At most `limit` items may be copied.
    pub fn deep_clone(&self, limit: usize) -> VmResult<Struct> {
        let mut budget = limit as isize - 1;
        self.clone_counted(&mut budget, limit)
    }

    fn clone_counted(&self, budget: &mut isize, limit: usize) -> VmResult<Struct> {
        let source = self.borrow();
        let mut items = Vec::with_capacity(source.len());
        for item in source.iter() {
            *budget -= 1;
            if *budget < 0 {
                return Err(VmError::invalid_operation(format!(
                    "beyond the struct clone limit {limit}"
                )));
            }
            match item {
                StackItem::Struct(inner) => {
                    items.push(StackItem::Struct(inner.clone_counted(budget, limit)?))
                }
                other => items.push(other.clone()),
            }
        }
        Ok(Struct::new(items))
    }
}

impl Deref for Struct {
    type Target = Array;

    fn deref(&self) -> &Array {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_handles_alias() {
        let a = Array::new(vec![StackItem::from_int(1)]);
        let b = a.clone();
        b.borrow_mut().push(StackItem::from_int(2));
        assert_eq!(a.len(), 2);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn deep_clone_copies_nested_structs_only() {
        let shared = Array::new(vec![]);
        let inner = Struct::new(vec![StackItem::from_int(7)]);
        let outer = Struct::new(vec![
            StackItem::Struct(inner.clone()),
            StackItem::Array(shared.clone()),
        ]);

        let copy = outer.deep_clone(2048).unwrap();
        assert!(!copy.ptr_eq(&outer));
        match (copy.get(0), copy.get(1)) {
            (Some(StackItem::Struct(s)), Some(StackItem::Array(a))) => {
                assert!(!s.ptr_eq(&inner));
                assert!(a.ptr_eq(&shared));
            }
            other => panic!("unexpected clone layout: {other:?}"),
        }
    }

    #[test]
    fn deep_clone_respects_limit() {
        let items = (0..10).map(StackItem::from_int).collect();
        let big = Struct::new(items);
        assert!(big.deep_clone(5).is_err());
        assert!(big.deep_clone(11).is_ok());
    }
}
