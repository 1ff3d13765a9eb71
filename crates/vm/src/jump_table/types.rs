//! Type inspection and conversion handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::{StackItem, StackItemType};

/// Registers the type handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::ISNULL, isnull);
    jump_table.register(OpCode::ISTYPE, istype);
    jump_table.register(OpCode::CONVERT, convert);
}

fn operand_type(instruction: &Instruction) -> VmResult<StackItemType> {
    let code = instruction.token_u8();
    match StackItemType::from_u8(code) {
        Some(StackItemType::Any) | None => Err(VmError::invalid_operation(format!(
            "invalid type for {}: 0x{code:02x}",
            instruction.opcode()
        ))),
        Some(item_type) => Ok(item_type),
    }
}

fn isnull(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop()?;
    engine.push(StackItem::Boolean(x.is_null()))
}

fn istype(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let item_type = operand_type(instruction)?;
    let x = engine.pop()?;
    engine.push(StackItem::Boolean(x.stack_item_type() == item_type))
}

fn convert(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let item_type = operand_type(instruction)?;
    let x = engine.pop()?;
    let converted = x.convert_to(item_type)?;
    engine.push(converted)
}
