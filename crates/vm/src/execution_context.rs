//! Execution context module for the Neo Virtual Machine.
//!
//! A context is one call frame. Frames created by `CALL`/`CALLA` alias the
//! caller's [`SharedStates`] (script, evaluation stack, static fields and
//! typed states) and own their instruction pointer, slots and try stack.

use crate::error::{VmError, VmResult};
use crate::evaluation_stack::EvaluationStack;
use crate::exception_handling::ExceptionHandlingContext;
use crate::instruction::Instruction;
use crate::reference_counter::ReferenceCounter;
use crate::script::Script;
use crate::slot::Slot;
use crate::stack_item::StackItem;
use std::any::{Any, TypeId};
use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// State shared between a context and the frames cloned from it.
pub struct SharedStates {
    script: Script,
    evaluation_stack: RefCell<EvaluationStack>,
    static_fields: RefCell<Option<Slot>>,
    states: RefCell<HashMap<TypeId, Box<dyn Any>>>,
}

impl SharedStates {
    fn new(script: Script, reference_counter: ReferenceCounter) -> Self {
        Self {
            script,
            evaluation_stack: RefCell::new(EvaluationStack::new(reference_counter)),
            static_fields: RefCell::new(None),
            states: RefCell::new(HashMap::new()),
        }
    }
}

/// One call frame.
pub struct ExecutionContext {
    shared: Rc<SharedStates>,
    instruction_pointer: usize,
    rv_count: i32,
    local_variables: Option<Slot>,
    arguments: Option<Slot>,
    try_stack: Vec<ExceptionHandlingContext>,
}

impl ExecutionContext {
    /// Creates a frame with a fresh evaluation stack. `rv_count` of `-1`
    /// accepts any number of return values.
    pub fn new(script: Script, rv_count: i32, reference_counter: ReferenceCounter) -> Self {
        Self {
            shared: Rc::new(SharedStates::new(script, reference_counter)),
            instruction_pointer: 0,
            rv_count,
            local_variables: None,
            arguments: None,
            try_stack: Vec::new(),
        }
    }

    /// A new frame at `position` sharing this frame's script, stack, static
    /// fields and states.
    pub fn clone_with_position(&self, position: usize) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            instruction_pointer: position,
            rv_count: 0,
            local_variables: None,
            arguments: None,
            try_stack: Vec::new(),
        }
    }

    /// A slot-less handle on this frame keeping its position and return
    /// count, for hosts observing unloaded frames.
    pub(crate) fn detached(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            instruction_pointer: self.instruction_pointer,
            rv_count: self.rv_count,
            local_variables: None,
            arguments: None,
            try_stack: Vec::new(),
        }
    }

    pub fn script(&self) -> &Script {
        &self.shared.script
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    /// Moves the instruction pointer. Valid positions are `0..=script.len()`.
    pub fn set_instruction_pointer(&mut self, position: usize) -> VmResult<()> {
        if position > self.script().len() {
            return Err(VmError::out_of_range(format!(
                "instruction pointer {position} beyond script length {}",
                self.script().len()
            )));
        }
        self.instruction_pointer = position;
        Ok(())
    }

    pub fn rv_count(&self) -> i32 {
        self.rv_count
    }

    /// The instruction at the instruction pointer, `RET` at the end.
    pub fn current_instruction(&self) -> VmResult<Instruction> {
        self.script().get_instruction(self.instruction_pointer)
    }

    /// The instruction after the current one.
    pub fn next_instruction(&self) -> VmResult<Instruction> {
        let current = self.current_instruction()?;
        self.script()
            .get_instruction(self.instruction_pointer + current.size())
    }

    /// Advances past the current instruction, clamping at the script end.
    pub fn move_next(&mut self) -> VmResult<()> {
        let size = self.current_instruction()?.size();
        self.instruction_pointer = (self.instruction_pointer + size).min(self.script().len());
        Ok(())
    }

    /// Returns `true` when both frames use the same evaluation stack.
    pub fn shares_stack_with(&self, other: &ExecutionContext) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn evaluation_stack(&self) -> RefMut<'_, EvaluationStack> {
        self.shared.evaluation_stack.borrow_mut()
    }

    pub fn push(&self, item: StackItem) {
        self.evaluation_stack().push(item);
    }

    pub fn pop(&self) -> VmResult<StackItem> {
        self.evaluation_stack().pop()
    }

    pub fn peek(&self, index: isize) -> VmResult<StackItem> {
        self.evaluation_stack().peek(index).cloned()
    }

    pub fn static_fields(&self) -> RefMut<'_, Option<Slot>> {
        self.shared.static_fields.borrow_mut()
    }

    pub fn local_variables(&self) -> Option<&Slot> {
        self.local_variables.as_ref()
    }

    pub fn local_variables_mut(&mut self) -> &mut Option<Slot> {
        &mut self.local_variables
    }

    pub fn arguments(&self) -> Option<&Slot> {
        self.arguments.as_ref()
    }

    pub fn arguments_mut(&mut self) -> &mut Option<Slot> {
        &mut self.arguments
    }

    pub fn try_stack(&self) -> &[ExceptionHandlingContext] {
        &self.try_stack
    }

    pub fn try_stack_mut(&mut self) -> &mut Vec<ExceptionHandlingContext> {
        &mut self.try_stack
    }

    /// Returns a copy of the typed state `T`, if set.
    pub fn get_state<T: Any + Clone>(&self) -> Option<T> {
        self.shared
            .states
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|state| state.downcast_ref::<T>())
            .cloned()
    }

    /// Stores the typed state `T`, replacing any previous value.
    pub fn set_state<T: Any>(&self, value: T) {
        self.shared
            .states
            .borrow_mut()
            .insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Mutates the typed state `T` in place.
    pub fn update_state<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.shared
            .states
            .borrow_mut()
            .get_mut(&TypeId::of::<T>())
            .and_then(|state| state.downcast_mut::<T>())
            .map(f)
    }

    /// Releases the stack references held by the frame's locals and
    /// arguments, and by the static fields when `release_static` is set.
    pub(crate) fn release_slots(&mut self, release_static: bool) {
        if release_static {
            if let Some(slot) = self.static_fields().as_mut() {
                slot.clear_references();
            }
        }
        if let Some(slot) = self.local_variables.as_mut() {
            slot.clear_references();
        }
        if let Some(slot) = self.arguments.as_mut() {
            slot.clear_references();
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("script", self.script())
            .field("instruction_pointer", &self.instruction_pointer)
            .field("rv_count", &self.rv_count)
            .field("try_depth", &self.try_stack.len())
            .finish()
    }
}
