//! Flow control handlers: jumps, calls, exceptions and returns.

use crate::error::{VmError, VmResult};
use crate::exception_handling::{ExceptionHandlingContext, ExceptionHandlingState};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use crate::vm_state::VMState;
use num_bigint::BigInt;
use std::cmp::Ordering;

/// Registers the flow control handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::NOP, nop);
    jump_table.register(OpCode::JMP, jmp);
    jump_table.register(OpCode::JMP_L, jmp);
    jump_table.register(OpCode::JMPIF, jmpif);
    jump_table.register(OpCode::JMPIF_L, jmpif);
    jump_table.register(OpCode::JMPIFNOT, jmpifnot);
    jump_table.register(OpCode::JMPIFNOT_L, jmpifnot);
    for opcode in [
        OpCode::JMPEQ,
        OpCode::JMPEQ_L,
        OpCode::JMPNE,
        OpCode::JMPNE_L,
        OpCode::JMPGT,
        OpCode::JMPGT_L,
        OpCode::JMPGE,
        OpCode::JMPGE_L,
        OpCode::JMPLT,
        OpCode::JMPLT_L,
        OpCode::JMPLE,
        OpCode::JMPLE_L,
    ] {
        jump_table.register(opcode, jmp_compare);
    }
    jump_table.register(OpCode::CALL, call);
    jump_table.register(OpCode::CALL_L, call);
    jump_table.register(OpCode::CALLA, calla);
    jump_table.register(OpCode::ABORT, abort);
    jump_table.register(OpCode::ASSERT, assert);
    jump_table.register(OpCode::THROW, throw);
    jump_table.register(OpCode::TRY, try_);
    jump_table.register(OpCode::TRY_L, try_);
    jump_table.register(OpCode::ENDTRY, endtry);
    jump_table.register(OpCode::ENDTRY_L, endtry);
    jump_table.register(OpCode::ENDFINALLY, endfinally);
    jump_table.register(OpCode::RET, ret);
    jump_table.register(OpCode::ABORTMSG, abortmsg);
    jump_table.register(OpCode::ASSERTMSG, assertmsg);
}

fn nop(_engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    Ok(())
}

fn jmp(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    engine.execute_jump_offset(instruction.jump_offset())
}

fn jmpif(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    if engine.pop_boolean()? {
        engine.execute_jump_offset(instruction.jump_offset())?;
    }
    Ok(())
}

fn jmpifnot(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    if !engine.pop_boolean()? {
        engine.execute_jump_offset(instruction.jump_offset())?;
    }
    Ok(())
}

fn jmp_compare(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let x2: BigInt = engine.pop_integer()?;
    let x1: BigInt = engine.pop_integer()?;
    let ordering = x1.cmp(&x2);
    let taken = match instruction.opcode() {
        OpCode::JMPEQ | OpCode::JMPEQ_L => ordering == Ordering::Equal,
        OpCode::JMPNE | OpCode::JMPNE_L => ordering != Ordering::Equal,
        OpCode::JMPGT | OpCode::JMPGT_L => ordering == Ordering::Greater,
        OpCode::JMPGE | OpCode::JMPGE_L => ordering != Ordering::Less,
        OpCode::JMPLT | OpCode::JMPLT_L => ordering == Ordering::Less,
        _ => ordering != Ordering::Greater,
    };
    if taken {
        engine.execute_jump_offset(instruction.jump_offset())?;
    }
    Ok(())
}

fn call(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let ip = engine.current_context_or_err()?.instruction_pointer() as i64;
    engine.execute_call(ip + instruction.jump_offset() as i64)
}

fn calla(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    match engine.pop()? {
        StackItem::Pointer { script, position } => {
            if !script.ptr_eq(engine.current_context_or_err()?.script()) {
                return Err(VmError::invalid_operation(
                    "pointers can't be shared between scripts",
                ));
            }
            engine.execute_call(position as i64)
        }
        other => Err(VmError::InvalidType {
            expected: "Pointer",
            actual: other.stack_item_type(),
        }),
    }
}

fn abort(_engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    Err(VmError::Abort("ABORT is executed.".into()))
}

fn assert(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    if !engine.pop_boolean()? {
        return Err(VmError::AssertFailed(
            "ASSERT is executed with false result.".into(),
        ));
    }
    Ok(())
}

fn throw(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let exception = engine.pop()?;
    Err(VmError::Throw(exception))
}

fn try_(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let (catch_offset, finally_offset) = instruction.try_offsets();
    if catch_offset == 0 && finally_offset == 0 {
        return Err(VmError::invalid_operation(
            "catch and finally offsets can't both be 0 in a TRY block",
        ));
    }
    let max_depth = engine.limits().max_try_nesting_depth;
    let context = engine.current_context_mut_or_err()?;
    if context.try_stack().len() >= max_depth {
        return Err(VmError::TryNestingDepthExceeded(max_depth));
    }
    let ip = context.instruction_pointer() as i32;
    let absolute = |offset: i32| -> VmResult<i32> {
        if offset == 0 {
            return Ok(-1);
        }
        ip.checked_add(offset)
            .ok_or_else(|| VmError::out_of_range("try pointer overflow"))
    };
    let handler = ExceptionHandlingContext::new(absolute(catch_offset)?, absolute(finally_offset)?);
    context.try_stack_mut().push(handler);
    Ok(())
}

fn endtry(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let context = engine.current_context_mut_or_err()?;
    let end_pointer = context.instruction_pointer() as i64 + instruction.jump_offset() as i64;
    let handler = context
        .try_stack_mut()
        .last_mut()
        .ok_or_else(|| VmError::invalid_operation("the corresponding TRY block cannot be found"))?;
    if handler.state == ExceptionHandlingState::Finally {
        return Err(VmError::invalid_operation(
            "ENDTRY can't be executed in a FINALLY block",
        ));
    }
    let end_pointer = i32::try_from(end_pointer)
        .map_err(|_| VmError::out_of_range("end pointer overflow"))?;
    let target = if handler.has_finally() {
        handler.state = ExceptionHandlingState::Finally;
        handler.end_pointer = end_pointer;
        handler.finally_pointer
    } else {
        context.try_stack_mut().pop();
        end_pointer
    };
    let target = usize::try_from(target)
        .map_err(|_| VmError::out_of_range(format!("invalid ENDTRY target {target}")))?;
    context.set_instruction_pointer(target)?;
    engine.is_jumping = true;
    Ok(())
}

fn endfinally(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let handler = engine
        .current_context_mut_or_err()?
        .try_stack_mut()
        .pop()
        .ok_or_else(|| VmError::invalid_operation("the corresponding TRY block cannot be found"))?;
    match engine.uncaught_exception().cloned() {
        None => {
            let target = usize::try_from(handler.end_pointer).map_err(|_| {
                VmError::out_of_range(format!("invalid end pointer {}", handler.end_pointer))
            })?;
            engine.current_context_mut_or_err()?.set_instruction_pointer(target)?;
            engine.is_jumping = true;
            Ok(())
        }
        Some(exception) => engine.execute_throw(exception),
    }
}

fn ret(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let context = engine.unload_context()?;
    let shares_stack = engine
        .current_context()
        .map(|caller| caller.shares_stack_with(&context))
        .unwrap_or(false);
    if !shares_stack {
        let mut stack = context.evaluation_stack();
        if context.rv_count() >= 0 && stack.len() != context.rv_count() as usize {
            return Err(VmError::invalid_operation(
                "RVCount doesn't match with EvaluationStack",
            ));
        }
        match engine.current_context() {
            Some(caller) => stack.move_to(&mut caller.evaluation_stack(), None)?,
            None => stack.move_to(engine.result_stack_mut(), None)?,
        }
    }
    if engine.invocation_stack().is_empty() {
        engine.set_state(VMState::HALT);
    }
    engine.is_jumping = true;
    Ok(())
}

fn abortmsg(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let message = engine.pop()?.get_string()?;
    Err(VmError::Abort(format!(
        "ABORTMSG is executed. Reason: {message}"
    )))
}

fn assertmsg(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let message = engine.pop()?.get_string()?;
    if !engine.pop_boolean()? {
        return Err(VmError::AssertFailed(format!(
            "ASSERTMSG is executed with false result. Reason: {message}"
        )));
    }
    Ok(())
}
