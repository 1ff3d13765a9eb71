//! Static field, local variable and argument handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::slot::Slot;

#[derive(Clone, Copy)]
enum SlotKind {
    Static,
    Local,
    Argument,
}

/// Registers the slot handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::INITSSLOT, initsslot);
    jump_table.register(OpCode::INITSLOT, initslot);

    let groups: [(OpCode, OpCode, fn(&mut ExecutionEngine, &Instruction) -> VmResult<()>); 6] = [
        (OpCode::LDSFLD0, OpCode::LDSFLD, ldsfld),
        (OpCode::STSFLD0, OpCode::STSFLD, stsfld),
        (OpCode::LDLOC0, OpCode::LDLOC, ldloc),
        (OpCode::STLOC0, OpCode::STLOC, stloc),
        (OpCode::LDARG0, OpCode::LDARG, ldarg),
        (OpCode::STARG0, OpCode::STARG, starg),
    ];
    for (first, last, handler) in groups {
        for code in first as u8..=last as u8 {
            if let Some(opcode) = OpCode::from_u8(code) {
                jump_table.register(opcode, handler);
            }
        }
    }
}

fn initsslot(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let count = instruction.token_u8() as usize;
    let reference_counter = engine.reference_counter().clone();
    let context = engine.current_context_or_err()?;
    let mut static_fields = context.static_fields();
    if static_fields.is_some() {
        return Err(VmError::invalid_operation("INITSSLOT cannot be executed twice"));
    }
    if count == 0 {
        return Err(VmError::InvalidOperand {
            position: context.instruction_pointer(),
            message: "INITSSLOT needs at least one static field".into(),
        });
    }
    *static_fields = Some(Slot::with_count(count, reference_counter));
    Ok(())
}

fn initslot(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let locals = instruction.token_u8() as usize;
    let arguments = instruction.token_u8_1() as usize;
    let reference_counter = engine.reference_counter().clone();
    let context = engine.current_context_or_err()?;
    if context.local_variables().is_some() || context.arguments().is_some() {
        return Err(VmError::invalid_operation("INITSLOT cannot be executed twice"));
    }
    if locals == 0 && arguments == 0 {
        return Err(VmError::InvalidOperand {
            position: context.instruction_pointer(),
            message: "INITSLOT needs locals or arguments".into(),
        });
    }

    let mut items = Vec::with_capacity(arguments);
    for _ in 0..arguments {
        items.push(engine.pop()?);
    }
    let context = engine.current_context_mut_or_err()?;
    if locals > 0 {
        *context.local_variables_mut() = Some(Slot::with_count(locals, reference_counter.clone()));
    }
    if arguments > 0 {
        *context.arguments_mut() = Some(Slot::new(items, reference_counter));
    }
    Ok(())
}

/// The slot index of a short form (`LDLOC3`) or the operand of a long form.
fn slot_index(instruction: &Instruction, first: OpCode) -> usize {
    if instruction.operand().is_empty() {
        (instruction.opcode() as u8 - first as u8) as usize
    } else {
        instruction.token_u8() as usize
    }
}

fn load(engine: &mut ExecutionEngine, kind: SlotKind, index: usize) -> VmResult<()> {
    let context = engine.current_context_or_err()?;
    let item = match kind {
        SlotKind::Static => context
            .static_fields()
            .as_ref()
            .ok_or_else(|| VmError::invalid_operation("static fields are not initialized"))?
            .get(index)?
            .clone(),
        SlotKind::Local => context
            .local_variables()
            .ok_or_else(|| VmError::invalid_operation("local variables are not initialized"))?
            .get(index)?
            .clone(),
        SlotKind::Argument => context
            .arguments()
            .ok_or_else(|| VmError::invalid_operation("arguments are not initialized"))?
            .get(index)?
            .clone(),
    };
    engine.push(item)
}

fn store(engine: &mut ExecutionEngine, kind: SlotKind, index: usize) -> VmResult<()> {
    let item = engine.pop()?;
    let context = engine.current_context_mut_or_err()?;
    match kind {
        SlotKind::Static => context
            .static_fields()
            .as_mut()
            .ok_or_else(|| VmError::invalid_operation("static fields are not initialized"))?
            .set(index, item),
        SlotKind::Local => context
            .local_variables_mut()
            .as_mut()
            .ok_or_else(|| VmError::invalid_operation("local variables are not initialized"))?
            .set(index, item),
        SlotKind::Argument => context
            .arguments_mut()
            .as_mut()
            .ok_or_else(|| VmError::invalid_operation("arguments are not initialized"))?
            .set(index, item),
    }
}

fn ldsfld(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    load(engine, SlotKind::Static, slot_index(instruction, OpCode::LDSFLD0))
}

fn stsfld(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    store(engine, SlotKind::Static, slot_index(instruction, OpCode::STSFLD0))
}

fn ldloc(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    load(engine, SlotKind::Local, slot_index(instruction, OpCode::LDLOC0))
}

fn stloc(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    store(engine, SlotKind::Local, slot_index(instruction, OpCode::STLOC0))
}

fn ldarg(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    load(engine, SlotKind::Argument, slot_index(instruction, OpCode::LDARG0))
}

fn starg(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    store(engine, SlotKind::Argument, slot_index(instruction, OpCode::STARG0))
}
