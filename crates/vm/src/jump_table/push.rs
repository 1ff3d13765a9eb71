//! Constant push handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_bigint::BigInt;

/// Registers the push handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    for opcode in [
        OpCode::PUSHINT8,
        OpCode::PUSHINT16,
        OpCode::PUSHINT32,
        OpCode::PUSHINT64,
        OpCode::PUSHINT128,
        OpCode::PUSHINT256,
    ] {
        jump_table.register(opcode, push_int);
    }
    jump_table.register(OpCode::PUSHT, push_true);
    jump_table.register(OpCode::PUSHF, push_false);
    jump_table.register(OpCode::PUSHA, push_a);
    jump_table.register(OpCode::PUSHNULL, push_null);
    jump_table.register(OpCode::PUSHDATA1, push_data);
    jump_table.register(OpCode::PUSHDATA2, push_data);
    jump_table.register(OpCode::PUSHDATA4, push_data);
    for code in OpCode::PUSHM1 as u8..=OpCode::PUSH16 as u8 {
        if let Some(opcode) = OpCode::from_u8(code) {
            jump_table.register(opcode, push_small);
        }
    }
}

fn push_int(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::Integer(BigInt::from_signed_bytes_le(
        instruction.operand(),
    )))
}

fn push_true(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::Boolean(true))
}

fn push_false(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::Boolean(false))
}

fn push_a(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let context = engine.current_context_or_err()?;
    let position = context.instruction_pointer() as i64 + instruction.token_i32() as i64;
    let script = context.script().clone();
    if position < 0 || position > script.len() as i64 {
        return Err(VmError::out_of_range(format!(
            "pointer {position} outside script of {} bytes",
            script.len()
        )));
    }
    engine.push(StackItem::Pointer {
        script,
        position: position as usize,
    })
}

fn push_null(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    engine.push(StackItem::Null)
}

fn push_data(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    engine
        .limits()
        .assert_max_item_size(instruction.operand().len())?;
    engine.push(StackItem::ByteString(instruction.operand().to_vec()))
}

fn push_small(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let value = instruction.opcode() as i32 - OpCode::PUSH0 as i32;
    engine.push(StackItem::from_int(value))
}
