//! Integration tests for the execution engine.

use neo_vm::op_code::OpCode;
use neo_vm::{
    ExecResult, ExecutionEngine, ExecutionEngineLimits, InteropHost, NullHost, Script,
    ScriptBuilder, StackItem, VMState, VmError, VmResult,
};

fn run(script: Vec<u8>) -> ExecutionEngine {
    let mut engine = ExecutionEngine::new();
    engine.load_script(Script::new(script), -1, 0).unwrap();
    engine.execute();
    engine
}

fn ops(codes: &[OpCode]) -> Vec<u8> {
    codes.iter().map(|code| *code as u8).collect()
}

fn ints(engine: &ExecutionEngine) -> Vec<i64> {
    engine
        .result_stack()
        .as_slice()
        .iter()
        .map(|item| item.get_i64().unwrap())
        .collect()
}

#[test]
fn arithmetic_halts_with_result() {
    let engine = run(ops(&[OpCode::PUSH3, OpCode::PUSH5, OpCode::ADD]));
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(ints(&engine), vec![8]);
}

#[test]
fn division_by_zero_faults() {
    let engine = run(ops(&[OpCode::PUSH5, OpCode::PUSH0, OpCode::DIV]));
    assert_eq!(engine.state(), VMState::FAULT);
}

#[test]
fn try_catch_resumes_after_endtry() {
    let script = vec![
        OpCode::TRY as u8,
        5,
        0,
        OpCode::PUSH1 as u8,
        OpCode::THROW as u8,
        OpCode::DROP as u8,
        OpCode::ENDTRY as u8,
        2,
        OpCode::PUSH9 as u8,
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(ints(&engine), vec![9]);
    assert!(engine.uncaught_exception().is_none());
}

#[test]
fn finally_runs_then_rethrows() {
    // TRY without catch: the finally block pushes 7, then the exception
    // continues and faults the engine.
    let script = vec![
        OpCode::TRY as u8,
        0,
        5,
        OpCode::PUSH1 as u8,
        OpCode::THROW as u8,
        OpCode::PUSH7 as u8,
        OpCode::ENDFINALLY as u8,
    ];
    let mut engine = ExecutionEngine::new();
    engine.load_script(Script::new(script), -1, 0).unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
    assert_eq!(engine.uncaught_exception(), Some(&StackItem::from_int(1)));
    assert!(engine.fault_message().unwrap().contains('1'));
}

#[test]
fn finally_runs_on_normal_exit() {
    let script = vec![
        OpCode::TRY as u8,
        0,
        6,
        OpCode::PUSH1 as u8,
        OpCode::ENDTRY as u8,
        4,
        OpCode::PUSH2 as u8,
        OpCode::ENDFINALLY as u8,
        OpCode::PUSH3 as u8,
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(ints(&engine), vec![1, 2, 3]);
}

#[test]
fn abort_is_not_catchable() {
    let script = vec![
        OpCode::TRY as u8,
        4,
        0,
        OpCode::ABORT as u8,
        OpCode::PUSH1 as u8,
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(engine.fault_message().unwrap().contains("ABORT"));
}

#[test]
fn out_of_range_pickitem_is_catchable() {
    let script = vec![
        OpCode::TRY as u8,
        7,
        0,
        OpCode::NEWARRAY0 as u8,
        OpCode::PUSH3 as u8,
        OpCode::PICKITEM as u8,
        OpCode::RET as u8,
        OpCode::DROP as u8,
        OpCode::PUSH4 as u8,
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(ints(&engine), vec![4]);
}

#[test]
fn exception_unwinds_called_frames() {
    // 0: TRY catch=7
    // 3: CALL -> 10
    // 5: JMP -> 9
    // 7: DROP PUSH9 RET (catch block)
    // 10: PUSH1 THROW (callee)
    let script = vec![
        OpCode::TRY as u8,
        7,
        0,
        OpCode::CALL as u8,
        7,
        OpCode::JMP as u8,
        4,
        OpCode::DROP as u8,
        OpCode::PUSH9 as u8,
        OpCode::RET as u8,
        OpCode::PUSH1 as u8,
        OpCode::THROW as u8,
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(ints(&engine), vec![9]);
    assert!(engine.invocation_stack().is_empty());
}

#[test]
fn slots_load_and_store() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit(OpCode::INITSLOT, &[1, 2])
        .emit_opcode(OpCode::LDARG0)
        .emit_opcode(OpCode::LDARG1)
        .emit_opcode(OpCode::SUB)
        .emit_opcode(OpCode::STLOC0)
        .emit_opcode(OpCode::LDLOC0)
        .emit_opcode(OpCode::RET);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.to_script(), -1, 0).unwrap();
    // Arguments are popped in order, so the top of the stack is argument 0.
    engine.push(StackItem::from_int(3)).unwrap();
    engine.push(StackItem::from_int(10)).unwrap();
    assert_eq!(engine.execute(), VMState::HALT);
    assert_eq!(ints(&engine), vec![7]);
}

#[test]
fn static_fields_are_initialised_once() {
    let script = vec![
        OpCode::INITSSLOT as u8,
        1,
        OpCode::PUSH4 as u8,
        OpCode::STSFLD0 as u8,
        OpCode::LDSFLD0 as u8,
        OpCode::INITSSLOT as u8,
        1,
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(engine.fault_message().unwrap().contains("INITSSLOT"));
}

#[test]
fn rv_count_mismatch_faults() {
    let mut engine = ExecutionEngine::new();
    engine
        .load_script(Script::new(ops(&[OpCode::PUSH1, OpCode::PUSH2])), 1, 0)
        .unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
}

#[test]
fn integer_overflow_faults() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(1)
        .emit_push_int(254)
        .emit_opcode(OpCode::SHL)
        .emit_push_int(1)
        .emit_opcode(OpCode::SHL);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.to_script(), -1, 0).unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
}

#[test]
fn gas_is_charged_per_instruction() {
    let mut engine = ExecutionEngine::new();
    engine.set_gas_limit(Some(1_000));
    engine
        .load_script(Script::new(ops(&[OpCode::PUSH3, OpCode::PUSH5, OpCode::ADD])), -1, 0)
        .unwrap();
    let mut last = 0;
    while !engine.state().is_terminal() {
        engine.execute_next(&mut NullHost);
        assert!(engine.fee_consumed() >= last);
        last = engine.fee_consumed();
    }
    assert_eq!(engine.state(), VMState::HALT);
    let expected = OpCode::PUSH3.price() + OpCode::PUSH5.price() + OpCode::ADD.price();
    assert_eq!(engine.fee_consumed(), expected);
}

#[test]
fn stack_size_limit_faults() {
    let limits = ExecutionEngineLimits {
        max_stack_size: 4,
        ..ExecutionEngineLimits::default()
    };
    let mut engine = ExecutionEngine::with_limits(limits);
    engine
        .load_script(
            Script::new(ops(&[
                OpCode::PUSH1,
                OpCode::PUSH2,
                OpCode::PUSH3,
                OpCode::PUSH4,
                OpCode::PUSH5,
            ])),
            -1,
            0,
        )
        .unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
}

struct CountingHost {
    calls: Vec<u32>,
}

impl InteropHost for CountingHost {
    fn on_syscall(&mut self, engine: &mut ExecutionEngine, hash: u32) -> VmResult<()> {
        self.calls.push(hash);
        if hash == 0xdead_beef {
            return Err(VmError::dispatch("unknown syscall"));
        }
        engine.push(StackItem::from_int(42))
    }
}

#[test]
fn syscalls_are_routed_to_the_host() {
    let mut builder = ScriptBuilder::new();
    builder.emit_syscall(0x0102_0304);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.to_script(), -1, 0).unwrap();
    let mut host = CountingHost { calls: Vec::new() };
    assert_eq!(engine.execute_with(&mut host), VMState::HALT);
    assert_eq!(host.calls, vec![0x0102_0304]);
    assert_eq!(ints(&engine), vec![42]);
}

#[test]
fn dispatch_errors_fault_even_inside_try() {
    let mut builder = ScriptBuilder::new();
    builder.emit_try(8, 0).emit_syscall(0xdead_beef).emit_opcode(OpCode::RET);
    builder.emit_opcode(OpCode::PUSH1);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.to_script(), -1, 0).unwrap();
    let mut host = CountingHost { calls: Vec::new() };
    assert!(matches!(
        engine.execute_next(&mut host),
        ExecResult::Continue
    ));
    assert!(matches!(
        engine.execute_next(&mut host),
        ExecResult::Fault(VmError::Dispatch(_))
    ));
    assert_eq!(engine.state(), VMState::FAULT);
}
