//! Evaluation stack module for the Neo Virtual Machine.
//!
//! Indexes passed to `peek`, `insert`, `remove` and `swap` count from the
//! top of the stack: index 0 is the most recently pushed item.

use crate::error::{VmError, VmResult};
use crate::reference_counter::ReferenceCounter;
use crate::stack_item::StackItem;

/// The evaluation stack of one or more execution contexts.
#[derive(Debug, Clone)]
pub struct EvaluationStack {
    items: Vec<StackItem>,
    reference_counter: ReferenceCounter,
}

impl EvaluationStack {
    pub fn new(reference_counter: ReferenceCounter) -> Self {
        Self {
            items: Vec::new(),
            reference_counter,
        }
    }

    pub fn reference_counter(&self) -> &ReferenceCounter {
        &self.reference_counter
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from bottom to top.
    pub fn as_slice(&self) -> &[StackItem] {
        &self.items
    }

    pub fn push(&mut self, item: StackItem) {
        self.reference_counter.add_stack_reference(&item, 1);
        self.items.push(item);
    }

    pub fn pop(&mut self) -> VmResult<StackItem> {
        self.remove(0)
    }

    /// Returns the item `index` positions below the top. A negative index
    /// counts from the bottom.
    pub fn peek(&self, index: isize) -> VmResult<&StackItem> {
        let position = self.position_from_top(index)?;
        Ok(&self.items[position])
    }

    /// Inserts an item so that it ends up `index` positions below the top.
    pub fn insert(&mut self, index: usize, item: StackItem) -> VmResult<()> {
        if index > self.items.len() {
            return Err(VmError::out_of_range(format!(
                "insert index {index} on a stack of {}",
                self.items.len()
            )));
        }
        self.reference_counter.add_stack_reference(&item, 1);
        let position = self.items.len() - index;
        self.items.insert(position, item);
        Ok(())
    }

    /// Removes the item `index` positions below the top.
    pub fn remove(&mut self, index: usize) -> VmResult<StackItem> {
        if index >= self.items.len() {
            return Err(VmError::StackUnderflow {
                requested: index,
                available: self.items.len(),
            });
        }
        let position = self.items.len() - index - 1;
        let item = self.items.remove(position);
        self.reference_counter.remove_stack_reference(&item);
        Ok(item)
    }

    /// Swaps two items addressed from the top.
    pub fn swap(&mut self, a: usize, b: usize) -> VmResult<()> {
        let len = self.items.len();
        let top = a.max(b);
        if top >= len {
            return Err(VmError::StackUnderflow {
                requested: top,
                available: len,
            });
        }
        self.items.swap(len - a - 1, len - b - 1);
        Ok(())
    }

    /// Reverses the order of the top `n` items.
    pub fn reverse(&mut self, n: isize) -> VmResult<()> {
        if n < 0 || n as usize > self.items.len() {
            return Err(VmError::out_of_range(format!(
                "cannot reverse {n} item(s) on a stack of {}",
                self.items.len()
            )));
        }
        let len = self.items.len();
        self.items[len - n as usize..].reverse();
        Ok(())
    }

    pub fn clear(&mut self) {
        for item in self.items.drain(..) {
            self.reference_counter.remove_stack_reference(&item);
        }
    }

    /// Copies the top `count` items (all items when `count` is `None`) onto
    /// `target`, preserving their order.
    pub fn copy_to(&self, target: &mut EvaluationStack, count: Option<usize>) -> VmResult<()> {
        let start = self.range_start(count)?;
        for item in &self.items[start..] {
            target.push(item.clone());
        }
        Ok(())
    }

    /// Moves the top `count` items (all items when `count` is `None`) onto
    /// `target`, preserving their order.
    pub fn move_to(&mut self, target: &mut EvaluationStack, count: Option<usize>) -> VmResult<()> {
        let start = self.range_start(count)?;
        let moved: Vec<StackItem> = self.items.drain(start..).collect();
        for item in moved {
            self.reference_counter.remove_stack_reference(&item);
            target.push(item);
        }
        Ok(())
    }

    fn range_start(&self, count: Option<usize>) -> VmResult<usize> {
        let count = count.unwrap_or(self.items.len());
        if count > self.items.len() {
            return Err(VmError::StackUnderflow {
                requested: count,
                available: self.items.len(),
            });
        }
        Ok(self.items.len() - count)
    }

    fn position_from_top(&self, index: isize) -> VmResult<usize> {
        let len = self.items.len() as isize;
        let index = if index < 0 { index + len } else { index };
        if index < 0 || index >= len {
            return Err(VmError::StackUnderflow {
                requested: index.unsigned_abs(),
                available: self.items.len(),
            });
        }
        Ok((len - index - 1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(values: &[i64]) -> EvaluationStack {
        let mut stack = EvaluationStack::new(ReferenceCounter::new());
        for v in values {
            stack.push(StackItem::from_int(*v));
        }
        stack
    }

    fn ints(stack: &EvaluationStack) -> Vec<i64> {
        stack
            .as_slice()
            .iter()
            .map(|item| item.get_i64().unwrap())
            .collect()
    }

    #[test]
    fn peek_counts_from_top() {
        let stack = stack_of(&[1, 2, 3]);
        assert_eq!(stack.peek(0).unwrap(), &StackItem::from_int(3));
        assert_eq!(stack.peek(2).unwrap(), &StackItem::from_int(1));
        assert_eq!(stack.peek(-1).unwrap(), &StackItem::from_int(1));
        assert!(stack.peek(3).is_err());
    }

    #[test]
    fn insert_and_remove_address_from_top() {
        let mut stack = stack_of(&[1, 2, 3]);
        stack.insert(1, StackItem::from_int(9)).unwrap();
        assert_eq!(ints(&stack), vec![1, 2, 9, 3]);
        assert_eq!(stack.remove(3).unwrap(), StackItem::from_int(1));
        assert!(stack.insert(5, StackItem::Null).is_err());
        assert!(stack.remove(3).is_err());
    }

    #[test]
    fn reverse_bounds() {
        let mut stack = stack_of(&[1, 2, 3, 4]);
        stack.reverse(3).unwrap();
        assert_eq!(ints(&stack), vec![1, 4, 3, 2]);
        assert!(stack.reverse(5).is_err());
        assert!(stack.reverse(-1).is_err());
    }

    #[test]
    fn move_to_preserves_order_and_counts() {
        let counter = ReferenceCounter::new();
        let mut source = EvaluationStack::new(counter.clone());
        let mut target = EvaluationStack::new(counter.clone());
        for v in 1..=3 {
            source.push(StackItem::from_int(v));
        }
        source.move_to(&mut target, Some(2)).unwrap();
        assert_eq!(ints(&source), vec![1]);
        assert_eq!(ints(&target), vec![2, 3]);
        assert_eq!(counter.count(), 3);

        source.clear();
        assert_eq!(counter.count(), 2);
    }
}
