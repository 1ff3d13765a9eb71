//! Execution engine for the Neo Virtual Machine.
//!
//! The engine owns the invocation stack and the result stack and runs the
//! fetch-decode-execute loop. `SYSCALL` and `CALLT` are delegated to an
//! [`InteropHost`]; every other opcode is dispatched through the
//! [`JumpTable`].

use crate::error::{VmError, VmResult};
use crate::evaluation_stack::EvaluationStack;
use crate::exception_handling::ExceptionHandlingState;
use crate::execution_context::ExecutionContext;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::reference_counter::ReferenceCounter;
use crate::script::Script;
use crate::stack_item::{StackItem, MAX_COMPARABLE_SIZE, MAX_ITEM_SIZE};
use crate::vm_state::VMState;
use log::{debug, trace};
use num_bigint::BigInt;
use std::collections::VecDeque;

/// Resource limits of an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionEngineLimits {
    /// Maximum shift of `SHL`/`SHR`.
    pub max_shift: u32,
    /// Maximum number of counted stack references.
    pub max_stack_size: usize,
    /// Maximum size of a ByteString or Buffer.
    pub max_item_size: usize,
    /// Maximum size compared by `EQUAL`.
    pub max_comparable_size: usize,
    /// Maximum depth of the invocation stack.
    pub max_invocation_stack_size: usize,
    /// Maximum depth of a context's try stack.
    pub max_try_nesting_depth: usize,
    /// Turn catchable engine errors into script exceptions.
    pub catch_engine_exceptions: bool,
}

impl Default for ExecutionEngineLimits {
    fn default() -> Self {
        Self {
            max_shift: 256,
            max_stack_size: 2 * 1024,
            max_item_size: MAX_ITEM_SIZE,
            max_comparable_size: MAX_COMPARABLE_SIZE,
            max_invocation_stack_size: 1024,
            max_try_nesting_depth: 16,
            catch_engine_exceptions: true,
        }
    }
}

impl ExecutionEngineLimits {
    /// Fails when `size` exceeds `max_item_size`.
    pub fn assert_max_item_size(&self, size: usize) -> VmResult<()> {
        if size > self.max_item_size {
            return Err(VmError::ItemTooLarge {
                size,
                limit: self.max_item_size,
            });
        }
        Ok(())
    }

    /// Fails when `shift` is negative or exceeds `max_shift`.
    pub fn assert_shift(&self, shift: i64) -> VmResult<()> {
        if shift < 0 || shift > self.max_shift as i64 {
            return Err(VmError::out_of_range(format!(
                "shift {shift} outside 0..={}",
                self.max_shift
            )));
        }
        Ok(())
    }
}

/// Outcome of a single step.
#[derive(Debug)]
pub enum ExecResult {
    /// More instructions remain.
    Continue,
    /// The invocation stack emptied.
    Halt,
    /// A breakpoint was hit.
    Break,
    /// The engine faulted.
    Fault(VmError),
}

/// Services the engine delegates to its embedder.
pub trait InteropHost {
    /// Handles `SYSCALL` with the given interop hash.
    fn on_syscall(&mut self, engine: &mut ExecutionEngine, hash: u32) -> VmResult<()>;

    /// Handles `CALLT` with the given method token index.
    fn on_call_token(&mut self, _engine: &mut ExecutionEngine, token: u16) -> VmResult<()> {
        Err(VmError::invalid_operation(format!(
            "CALLT {token} is not supported by this host"
        )))
    }

    /// Called for each context popped from the invocation stack.
    /// `exceptional` is set when the context was unloaded while an exception
    /// was in flight.
    fn on_context_unloaded(
        &mut self,
        _engine: &mut ExecutionEngine,
        _context: &ExecutionContext,
        _exceptional: bool,
    ) {
    }
}

/// A host without interop services.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl InteropHost for NullHost {
    fn on_syscall(&mut self, _engine: &mut ExecutionEngine, hash: u32) -> VmResult<()> {
        Err(VmError::dispatch(format!(
            "no interop service with hash 0x{hash:08x}"
        )))
    }
}

/// Represents the VM used to execute scripts.
pub struct ExecutionEngine {
    state: VMState,
    pub(crate) is_jumping: bool,
    limits: ExecutionEngineLimits,
    jump_table: JumpTable,
    reference_counter: ReferenceCounter,
    invocation_stack: Vec<ExecutionContext>,
    result_stack: EvaluationStack,
    uncaught_exception: Option<StackItem>,
    fault_message: Option<String>,
    unloaded: VecDeque<(ExecutionContext, bool)>,
    gas_limit: Option<i64>,
    fee_consumed: i64,
    exec_fee_factor: i64,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEngine {
    /// Creates an engine with default limits and the default jump table.
    pub fn new() -> Self {
        Self::with_limits(ExecutionEngineLimits::default())
    }

    pub fn with_limits(limits: ExecutionEngineLimits) -> Self {
        Self::with_jump_table(limits, JumpTable::default_table().clone())
    }

    /// Creates an engine with a customised jump table.
    pub fn with_jump_table(limits: ExecutionEngineLimits, jump_table: JumpTable) -> Self {
        let reference_counter = ReferenceCounter::new();
        Self {
            state: VMState::NONE,
            is_jumping: false,
            limits,
            jump_table,
            result_stack: EvaluationStack::new(reference_counter.clone()),
            reference_counter,
            invocation_stack: Vec::new(),
            uncaught_exception: None,
            fault_message: None,
            unloaded: VecDeque::new(),
            gas_limit: None,
            fee_consumed: 0,
            exec_fee_factor: 1,
        }
    }

    pub fn state(&self) -> VMState {
        self.state
    }

    pub fn set_state(&mut self, state: VMState) {
        if self.state != state {
            debug!("vm state {} -> {}", self.state, state);
        }
        self.state = state;
    }

    pub fn limits(&self) -> &ExecutionEngineLimits {
        &self.limits
    }

    pub fn jump_table(&self) -> &JumpTable {
        &self.jump_table
    }

    pub fn reference_counter(&self) -> &ReferenceCounter {
        &self.reference_counter
    }

    /// Frames from the entry (index 0) to the current one.
    pub fn invocation_stack(&self) -> &[ExecutionContext] {
        &self.invocation_stack
    }

    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.last()
    }

    pub fn current_context_mut(&mut self) -> Option<&mut ExecutionContext> {
        self.invocation_stack.last_mut()
    }

    /// The first frame loaded since the invocation stack was last empty.
    pub fn entry_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.first()
    }

    /// The frame that called the current one.
    pub fn calling_context(&self) -> Option<&ExecutionContext> {
        let len = self.invocation_stack.len();
        if len < 2 {
            return None;
        }
        self.invocation_stack.get(len - 2)
    }

    pub fn result_stack(&self) -> &EvaluationStack {
        &self.result_stack
    }

    pub fn result_stack_mut(&mut self) -> &mut EvaluationStack {
        &mut self.result_stack
    }

    /// The exception currently in flight, if any.
    pub fn uncaught_exception(&self) -> Option<&StackItem> {
        self.uncaught_exception.as_ref()
    }

    /// Description of the error that faulted the engine.
    pub fn fault_message(&self) -> Option<&str> {
        self.fault_message.as_deref()
    }

    /// Enables gas metering with the given limit in datoshi.
    pub fn set_gas_limit(&mut self, limit: Option<i64>) {
        self.gas_limit = limit;
    }

    pub fn gas_limit(&self) -> Option<i64> {
        self.gas_limit
    }

    pub fn fee_consumed(&self) -> i64 {
        self.fee_consumed
    }

    /// Remaining gas, or `None` when metering is disabled.
    pub fn gas_left(&self) -> Option<i64> {
        self.gas_limit.map(|limit| limit - self.fee_consumed)
    }

    pub fn exec_fee_factor(&self) -> i64 {
        self.exec_fee_factor
    }

    pub fn set_exec_fee_factor(&mut self, factor: i64) {
        self.exec_fee_factor = factor;
    }

    /// Charges `datoshi` and faults once consumption exceeds the limit.
    pub fn add_fee(&mut self, datoshi: i64) -> VmResult<()> {
        self.fee_consumed = self
            .fee_consumed
            .checked_add(datoshi)
            .ok_or_else(|| VmError::invalid_operation("fee overflow"))?;
        if let Some(limit) = self.gas_limit {
            if self.fee_consumed > limit {
                return Err(VmError::OutOfGas {
                    consumed: self.fee_consumed,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Loads `script` as a new frame. Execution starts at `initial_position`.
    pub fn load_script(
        &mut self,
        script: Script,
        rv_count: i32,
        initial_position: usize,
    ) -> VmResult<()> {
        let mut context = ExecutionContext::new(script, rv_count, self.reference_counter.clone());
        context.set_instruction_pointer(initial_position)?;
        self.load_context(context)
    }

    /// Pushes a frame onto the invocation stack.
    pub fn load_context(&mut self, context: ExecutionContext) -> VmResult<()> {
        if self.invocation_stack.len() >= self.limits.max_invocation_stack_size {
            return Err(VmError::InvocationStackOverflow(self.invocation_stack.len()));
        }
        debug!(
            "load context at {} (depth {})",
            context.instruction_pointer(),
            self.invocation_stack.len() + 1
        );
        self.invocation_stack.push(context);
        Ok(())
    }

    /// Pops the current frame and releases its slots.
    pub(crate) fn unload_context(&mut self) -> VmResult<ExecutionContext> {
        let mut context = self
            .invocation_stack
            .pop()
            .ok_or_else(|| VmError::invalid_operation("no context to unload"))?;
        let release_static = match self.invocation_stack.last() {
            Some(current) => !current.shares_stack_with(&context),
            None => true,
        };
        context.release_slots(release_static);
        let exceptional = self.uncaught_exception.is_some();
        self.unloaded.push_back((context.detached(), exceptional));
        Ok(context)
    }

    pub fn current_context_or_err(&self) -> VmResult<&ExecutionContext> {
        self.current_context()
            .ok_or_else(|| VmError::invalid_operation("no current context"))
    }

    pub fn current_context_mut_or_err(&mut self) -> VmResult<&mut ExecutionContext> {
        self.current_context_mut()
            .ok_or_else(|| VmError::invalid_operation("no current context"))
    }

    /// Pushes onto the current evaluation stack.
    pub fn push(&mut self, item: StackItem) -> VmResult<()> {
        self.current_context_or_err()?.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> VmResult<StackItem> {
        self.current_context_or_err()?.pop()
    }

    pub fn peek(&self, index: isize) -> VmResult<StackItem> {
        self.current_context_or_err()?.peek(index)
    }

    pub fn pop_integer(&mut self) -> VmResult<BigInt> {
        self.pop()?.get_integer()
    }

    pub fn pop_i64(&mut self) -> VmResult<i64> {
        self.pop()?.get_i64()
    }

    pub fn pop_boolean(&mut self) -> VmResult<bool> {
        self.pop()?.get_boolean()
    }

    pub fn pop_bytes(&mut self) -> VmResult<Vec<u8>> {
        self.pop()?.get_bytes()
    }

    /// Pushes an arithmetic result, enforcing the integer size limit.
    pub fn push_integer(&mut self, value: BigInt) -> VmResult<()> {
        let item = StackItem::checked_int(value)?;
        self.push(item)
    }

    /// Runs without interop services until HALT, FAULT or BREAK.
    pub fn execute(&mut self) -> VMState {
        self.execute_with(&mut NullHost)
    }

    /// Runs until HALT, FAULT or BREAK.
    pub fn execute_with(&mut self, host: &mut dyn InteropHost) -> VMState {
        if self.state == VMState::BREAK {
            self.state = VMState::NONE;
        }
        while !self.state.is_terminal() && self.state != VMState::BREAK {
            self.execute_next(host);
        }
        self.state
    }

    /// Executes exactly one instruction.
    pub fn execute_next(&mut self, host: &mut dyn InteropHost) -> ExecResult {
        if self.invocation_stack.is_empty() {
            self.set_state(VMState::HALT);
            return ExecResult::Halt;
        }
        let outcome = self.execute_instruction(host);
        self.drain_unloaded(host);
        match outcome {
            Ok(()) if self.state == VMState::HALT => ExecResult::Halt,
            Ok(()) if self.state == VMState::BREAK => ExecResult::Break,
            Ok(()) => ExecResult::Continue,
            Err(error) => {
                self.on_fault(&error);
                ExecResult::Fault(error)
            }
        }
    }

    fn execute_instruction(&mut self, host: &mut dyn InteropHost) -> VmResult<()> {
        let context_index = self.invocation_stack.len() - 1;
        let instruction = self.current_context_or_err()?.current_instruction()?;
        self.pre_execute_instruction(&instruction)?;

        let result = match instruction.opcode() {
            OpCode::SYSCALL => host.on_syscall(self, instruction.token_u32()),
            OpCode::CALLT => host.on_call_token(self, instruction.token_u16()),
            opcode => match self.jump_table.get(opcode) {
                Some(handler) => handler(self, &instruction),
                None => Err(VmError::InvalidOpCode(opcode as u8)),
            },
        };

        match result {
            Ok(()) => {}
            Err(VmError::Throw(exception)) => self.execute_throw(exception)?,
            Err(error) if error.is_catchable() && self.limits.catch_engine_exceptions => {
                debug!("catchable engine exception: {error}");
                self.execute_throw(StackItem::from_byte_string(error.to_string()))?
            }
            Err(error) => return Err(error),
        }

        self.post_execute_instruction()?;
        if !self.is_jumping {
            if let Some(context) = self.invocation_stack.get_mut(context_index) {
                context.move_next()?;
            }
        }
        self.is_jumping = false;
        Ok(())
    }

    fn pre_execute_instruction(&mut self, instruction: &Instruction) -> VmResult<()> {
        trace!(
            "{:>5} {:?}",
            self.current_context()
                .map(|c| c.instruction_pointer())
                .unwrap_or_default(),
            instruction
        );
        if self.gas_limit.is_some() {
            self.add_fee(instruction.opcode().price() * self.exec_fee_factor)?;
        }
        Ok(())
    }

    fn post_execute_instruction(&mut self) -> VmResult<()> {
        let limit = self.limits.max_stack_size;
        if self.reference_counter.count() < limit {
            return Ok(());
        }
        let count = self.reference_counter.check_zero_referred();
        if count > limit {
            return Err(VmError::StackOverflow { count, limit });
        }
        Ok(())
    }

    fn on_fault(&mut self, error: &VmError) {
        debug!("vm fault: {error}");
        self.fault_message = Some(error.to_string());
        self.set_state(VMState::FAULT);
    }

    fn drain_unloaded(&mut self, host: &mut dyn InteropHost) {
        while let Some((context, exceptional)) = self.unloaded.pop_front() {
            host.on_context_unloaded(self, &context, exceptional);
        }
    }

    /// Jumps the current frame to an absolute position.
    pub fn execute_jump(&mut self, position: i64) -> VmResult<()> {
        let context = self.current_context_mut_or_err()?;
        let len = context.script().len() as i64;
        if position < 0 || position >= len {
            return Err(VmError::out_of_range(format!(
                "jump target {position} outside script of {len} bytes"
            )));
        }
        context.set_instruction_pointer(position as usize)?;
        self.is_jumping = true;
        Ok(())
    }

    /// Jumps relative to the current instruction.
    pub fn execute_jump_offset(&mut self, offset: i32) -> VmResult<()> {
        let ip = self.current_context_or_err()?.instruction_pointer() as i64;
        self.execute_jump(ip + offset as i64)
    }

    /// Calls a position of the current script in a new frame.
    pub fn execute_call(&mut self, position: i64) -> VmResult<()> {
        let context = self.current_context_or_err()?;
        let len = context.script().len() as i64;
        if position < 0 || position >= len {
            return Err(VmError::out_of_range(format!(
                "call target {position} outside script of {len} bytes"
            )));
        }
        let callee = context.clone_with_position(position as usize);
        self.load_context(callee)
    }

    /// Raises `exception` and transfers control to the nearest handler.
    ///
    /// Frames above the handling frame are unloaded. Fails with
    /// [`VmError::UnhandledException`] when no frame handles it.
    pub fn execute_throw(&mut self, exception: StackItem) -> VmResult<()> {
        self.uncaught_exception = Some(exception);

        let mut frames_to_pop = 0;
        for index in (0..self.invocation_stack.len()).rev() {
            loop {
                let context = &mut self.invocation_stack[index];
                let Some(handler) = context.try_stack().last() else {
                    break;
                };
                let discard = handler.state == ExceptionHandlingState::Finally
                    || (handler.state == ExceptionHandlingState::Catch && !handler.has_finally());
                if discard {
                    context.try_stack_mut().pop();
                    continue;
                }

                for _ in 0..frames_to_pop {
                    let frame = self.unload_context()?;
                    let shared = self
                        .current_context()
                        .map_or(false, |current| current.shares_stack_with(&frame));
                    if !shared {
                        frame.evaluation_stack().clear();
                    }
                }

                let context = self.current_context_mut_or_err()?;
                let Some(handler) = context.try_stack_mut().last_mut() else {
                    break;
                };
                if handler.state == ExceptionHandlingState::Try && handler.has_catch() {
                    handler.state = ExceptionHandlingState::Catch;
                    let target = handler.catch_pointer as usize;
                    context.set_instruction_pointer(target)?;
                    if let Some(exception) = self.uncaught_exception.take() {
                        self.push(exception)?;
                    }
                } else {
                    handler.state = ExceptionHandlingState::Finally;
                    let target = handler.finally_pointer as usize;
                    context.set_instruction_pointer(target)?;
                }
                self.is_jumping = true;
                return Ok(());
            }
            frames_to_pop += 1;
        }

        Err(VmError::UnhandledException(describe_exception(
            self.uncaught_exception.as_ref(),
        )))
    }
}

/// Human-readable text of a thrown item.
pub fn describe_exception(exception: Option<&StackItem>) -> String {
    match exception {
        Some(StackItem::ByteString(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        Some(StackItem::Integer(value)) => value.to_string(),
        Some(item) => format!("{item:?}"),
        None => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_code::OpCode;

    fn run(bytes: Vec<u8>) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        engine.load_script(Script::new(bytes), -1, 0).unwrap();
        engine.execute();
        engine
    }

    #[test]
    fn add_halts_with_sum() {
        let engine = run(vec![OpCode::PUSH3 as u8, OpCode::PUSH5 as u8, OpCode::ADD as u8]);
        assert_eq!(engine.state(), VMState::HALT);
        assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_int(8)]);
    }

    #[test]
    fn division_by_zero_faults() {
        let engine = run(vec![OpCode::PUSH5 as u8, OpCode::PUSH0 as u8, OpCode::DIV as u8]);
        assert_eq!(engine.state(), VMState::FAULT);
        assert!(engine.fault_message().is_some());
    }

    #[test]
    fn empty_invocation_stack_halts() {
        let mut engine = ExecutionEngine::new();
        assert!(matches!(engine.execute_next(&mut NullHost), ExecResult::Halt));
        assert_eq!(engine.state(), VMState::HALT);
    }

    #[test]
    fn syscall_without_host_faults() {
        let mut bytes = vec![OpCode::SYSCALL as u8];
        bytes.extend_from_slice(&0x1234_5678u32.to_le_bytes());
        let engine = run(bytes);
        assert_eq!(engine.state(), VMState::FAULT);
    }

    #[test]
    fn gas_is_charged_per_instruction() {
        let mut engine = ExecutionEngine::new();
        engine.set_gas_limit(Some(1_000));
        engine
            .load_script(
                Script::new(vec![OpCode::PUSH1 as u8, OpCode::PUSH2 as u8, OpCode::ADD as u8]),
                -1,
                0,
            )
            .unwrap();
        assert_eq!(engine.execute(), VMState::HALT);
        // PUSH1 + PUSH2 + ADD + implicit RET
        assert_eq!(engine.fee_consumed(), 1 + 1 + 8);
    }

    #[test]
    fn out_of_gas_faults_on_the_exceeding_step() {
        let mut engine = ExecutionEngine::new();
        engine.set_gas_limit(Some(9));
        engine
            .load_script(
                Script::new(vec![OpCode::PUSH1 as u8, OpCode::PUSH2 as u8, OpCode::ADD as u8]),
                -1,
                0,
            )
            .unwrap();
        assert_eq!(engine.execute(), VMState::FAULT);
        assert_eq!(engine.fee_consumed(), 10);
    }

    #[test]
    fn invocation_depth_is_bounded() {
        // CALL 0 recurses forever.
        let limits = ExecutionEngineLimits {
            max_invocation_stack_size: 8,
            ..Default::default()
        };
        let mut engine = ExecutionEngine::with_limits(limits);
        engine
            .load_script(Script::new(vec![OpCode::CALL as u8, 0x00]), -1, 0)
            .unwrap();
        assert_eq!(engine.execute(), VMState::FAULT);
        assert_eq!(engine.invocation_stack().len(), 8);
    }
}
