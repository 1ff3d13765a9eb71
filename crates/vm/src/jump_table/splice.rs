//! Byte string and buffer handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::{pop_index, JumpTable};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

/// Registers the splice handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::NEWBUFFER, newbuffer);
    jump_table.register(OpCode::MEMCPY, memcpy);
    jump_table.register(OpCode::CAT, cat);
    jump_table.register(OpCode::SUBSTR, substr);
    jump_table.register(OpCode::LEFT, left);
    jump_table.register(OpCode::RIGHT, right);
}

fn newbuffer(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let length = pop_index(engine)?;
    engine.limits().assert_max_item_size(length)?;
    engine.push(StackItem::from_buffer(vec![0u8; length]))
}

fn memcpy(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_index(engine)?;
    let source_index = pop_index(engine)?;
    let source = engine.pop_bytes()?;
    let source_end = source_index
        .checked_add(count)
        .filter(|end| *end <= source.len())
        .ok_or_else(|| VmError::out_of_range("MEMCPY source range"))?;
    let destination_index = pop_index(engine)?;
    let destination = match engine.pop()? {
        StackItem::Buffer(buffer) => buffer,
        other => {
            return Err(VmError::InvalidType {
                expected: "Buffer",
                actual: other.stack_item_type(),
            })
        }
    };
    let mut destination = destination.borrow_mut();
    let destination_end = destination_index
        .checked_add(count)
        .filter(|end| *end <= destination.len())
        .ok_or_else(|| VmError::out_of_range("MEMCPY destination range"))?;
    destination[destination_index..destination_end]
        .copy_from_slice(&source[source_index..source_end]);
    Ok(())
}

fn cat(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_bytes()?;
    let mut x1 = engine.pop_bytes()?;
    engine.limits().assert_max_item_size(x1.len() + x2.len())?;
    x1.extend_from_slice(&x2);
    engine.push(StackItem::from_buffer(x1))
}

fn substr(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_index(engine)?;
    let index = pop_index(engine)?;
    let x = engine.pop_bytes()?;
    let end = index
        .checked_add(count)
        .filter(|end| *end <= x.len())
        .ok_or_else(|| VmError::out_of_range("SUBSTR range"))?;
    engine.push(StackItem::from_buffer(x[index..end].to_vec()))
}

fn left(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_index(engine)?;
    let x = engine.pop_bytes()?;
    if count > x.len() {
        return Err(VmError::out_of_range("LEFT count"));
    }
    engine.push(StackItem::from_buffer(x[..count].to_vec()))
}

fn right(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let count = pop_index(engine)?;
    let x = engine.pop_bytes()?;
    if count > x.len() {
        return Err(VmError::out_of_range("RIGHT count"));
    }
    engine.push(StackItem::from_buffer(x[x.len() - count..].to_vec()))
}
