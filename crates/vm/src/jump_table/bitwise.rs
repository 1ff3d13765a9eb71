//! Bitwise logic and equality handlers.

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the bitwise handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::INVERT, invert);
    jump_table.register(OpCode::AND, and);
    jump_table.register(OpCode::OR, or);
    jump_table.register(OpCode::XOR, xor);
    jump_table.register(OpCode::EQUAL, equal);
    jump_table.register(OpCode::NOTEQUAL, notequal);
}

fn invert(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    engine.push_integer(!x)
}

fn and(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_integer()?;
    let x1 = engine.pop_integer()?;
    engine.push_integer(x1 & x2)
}

fn or(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_integer()?;
    let x1 = engine.pop_integer()?;
    engine.push_integer(x1 | x2)
}

fn xor(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_integer()?;
    let x1 = engine.pop_integer()?;
    engine.push_integer(x1 ^ x2)
}

fn items_equal(engine: &mut ExecutionEngine) -> VmResult<bool> {
    let x2 = engine.pop()?;
    let x1 = engine.pop()?;
    let limits = engine.limits();
    x1.equals_with_limits(&x2, limits.max_comparable_size, limits.max_stack_size)
}

fn equal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let result = items_equal(engine)?;
    engine.push(StackItem::Boolean(result))
}

fn notequal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let result = items_equal(engine)?;
    engine.push(StackItem::Boolean(!result))
}
