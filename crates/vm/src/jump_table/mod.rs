//! Jump table module for the Neo Virtual Machine.
//!
//! Maps each opcode byte to its handler. `SYSCALL` and `CALLT` are absent:
//! the engine forwards them to its interop host.

pub mod bitwise;
pub mod compound;
pub mod control;
pub mod numeric;
pub mod push;
pub mod slot;
pub mod splice;
pub mod stack;
pub mod types;

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::op_code::OpCode;
use num_bigint::BigInt;
use once_cell::sync::Lazy;

/// A handler for a VM instruction.
pub type InstructionHandler = fn(&mut ExecutionEngine, &Instruction) -> VmResult<()>;

/// Represents a jump table for the VM.
#[derive(Clone)]
pub struct JumpTable {
    handlers: [Option<InstructionHandler>; 256],
}

static DEFAULT: Lazy<JumpTable> = Lazy::new(JumpTable::new);

impl Default for JumpTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JumpTable {
    /// Creates a table with every standard handler registered.
    pub fn new() -> Self {
        let mut table = Self::empty();
        push::register_handlers(&mut table);
        control::register_handlers(&mut table);
        stack::register_handlers(&mut table);
        slot::register_handlers(&mut table);
        splice::register_handlers(&mut table);
        bitwise::register_handlers(&mut table);
        numeric::register_handlers(&mut table);
        compound::register_handlers(&mut table);
        types::register_handlers(&mut table);
        table
    }

    /// A table without handlers.
    pub fn empty() -> Self {
        Self {
            handlers: [None; 256],
        }
    }

    /// The shared standard table.
    pub fn default_table() -> &'static JumpTable {
        &DEFAULT
    }

    /// Registers (or replaces) the handler of an opcode.
    pub fn register(&mut self, opcode: OpCode, handler: InstructionHandler) {
        self.handlers[opcode as usize] = Some(handler);
    }

    pub fn get(&self, opcode: OpCode) -> Option<InstructionHandler> {
        self.handlers[opcode as usize]
    }
}

/// Pops a non-negative integer that must fit `usize`.
pub(crate) fn pop_index(engine: &mut ExecutionEngine) -> VmResult<usize> {
    let value = engine.pop_i64()?;
    usize::try_from(value)
        .map_err(|_| VmError::out_of_range(format!("the negative value {value} is invalid")))
}

/// Converts a BigInt index for compound access.
pub(crate) fn to_index(value: &BigInt) -> Option<usize> {
    usize::try_from(value).ok()
}
