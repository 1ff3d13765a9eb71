//! Stack manipulation handlers.

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::{pop_index, JumpTable};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the stack handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::DEPTH, depth);
    jump_table.register(OpCode::DROP, drop);
    jump_table.register(OpCode::NIP, nip);
    jump_table.register(OpCode::XDROP, xdrop);
    jump_table.register(OpCode::CLEAR, clear);
    jump_table.register(OpCode::DUP, dup);
    jump_table.register(OpCode::OVER, over);
    jump_table.register(OpCode::PICK, pick);
    jump_table.register(OpCode::TUCK, tuck);
    jump_table.register(OpCode::SWAP, swap);
    jump_table.register(OpCode::ROT, rot);
    jump_table.register(OpCode::ROLL, roll);
    jump_table.register(OpCode::REVERSE3, reverse3);
    jump_table.register(OpCode::REVERSE4, reverse4);
    jump_table.register(OpCode::REVERSEN, reversen);
}

fn depth(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let depth = engine.current_context_or_err()?.evaluation_stack().len();
    engine.push(StackItem::from_int(depth as i64))
}

fn drop(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.pop().map(|_| ())
}

fn nip(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.current_context_or_err()?.evaluation_stack().remove(1).map(|_| ())
}

fn xdrop(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_index(engine)?;
    engine.current_context_or_err()?.evaluation_stack().remove(n).map(|_| ())
}

fn clear(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.current_context_or_err()?.evaluation_stack().clear();
    Ok(())
}

fn dup(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.peek(0)?;
    engine.push(item)
}

fn over(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.peek(1)?;
    engine.push(item)
}

fn pick(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_index(engine)?;
    let item = engine.peek(n as isize)?;
    engine.push(item)
}

fn tuck(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.peek(0)?;
    engine
        .current_context_or_err()?
        .evaluation_stack()
        .insert(2, item)
}

fn swap(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.current_context_or_err()?.evaluation_stack().remove(1)?;
    engine.push(item)
}

fn rot(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let item = engine.current_context_or_err()?.evaluation_stack().remove(2)?;
    engine.push(item)
}

fn roll(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = pop_index(engine)?;
    if n == 0 {
        return Ok(());
    }
    let item = engine.current_context_or_err()?.evaluation_stack().remove(n)?;
    engine.push(item)
}

fn reverse3(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.current_context_or_err()?.evaluation_stack().reverse(3)
}

fn reverse4(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.current_context_or_err()?.evaluation_stack().reverse(4)
}

fn reversen(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let n = engine.pop_i64()?;
    let n = isize::try_from(n).unwrap_or(isize::MAX);
    engine.current_context_or_err()?.evaluation_stack().reverse(n)
}
