//! Debugger for the Neo Virtual Machine.
//!
//! Wraps an engine and its interop host, and stops with [`VMState::BREAK`]
//! when execution reaches a registered breakpoint.

use crate::execution_engine::{ExecutionEngine, InteropHost, NullHost};
use crate::script::Script;
use crate::vm_state::VMState;
use hashbrown::{HashMap, HashSet};

/// Steps an [`ExecutionEngine`] one instruction or one frame at a time.
pub struct Debugger<H: InteropHost = NullHost> {
    engine: ExecutionEngine,
    host: H,
    break_points: HashMap<Vec<u8>, HashSet<usize>>,
}

impl Debugger<NullHost> {
    /// Creates a debugger for an engine that needs no interop services.
    pub fn new(engine: ExecutionEngine) -> Self {
        Self::with_host(engine, NullHost)
    }
}

impl<H: InteropHost> Debugger<H> {
    pub fn with_host(engine: ExecutionEngine, host: H) -> Self {
        Self {
            engine,
            host,
            break_points: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Adds a breakpoint at `position` of `script`.
    pub fn add_break_point(&mut self, script: &Script, position: usize) {
        self.break_points
            .entry(script.as_bytes().to_vec())
            .or_default()
            .insert(position);
    }

    /// Removes a breakpoint. Returns `false` if it did not exist.
    pub fn remove_break_point(&mut self, script: &Script, position: usize) -> bool {
        let Some(positions) = self.break_points.get_mut(script.as_bytes()) else {
            return false;
        };
        let removed = positions.remove(&position);
        if positions.is_empty() {
            self.break_points.remove(script.as_bytes());
        }
        removed
    }

    pub fn has_break_point(&self, script: &Script, position: usize) -> bool {
        self.break_points
            .get(script.as_bytes())
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Runs until HALT, FAULT or a breakpoint.
    pub fn execute(&mut self) -> VMState {
        if self.engine.state() == VMState::BREAK {
            self.engine.set_state(VMState::NONE);
        }
        while self.engine.state() == VMState::NONE {
            self.execute_and_check_break_points();
        }
        self.engine.state()
    }

    /// Executes one instruction, entering calls.
    pub fn step_into(&mut self) -> VMState {
        if self.engine.state().is_terminal() {
            return self.engine.state();
        }
        self.engine.set_state(VMState::NONE);
        self.engine.execute_next(&mut self.host);
        self.break_if_running()
    }

    /// Runs until the current frame returns.
    pub fn step_out(&mut self) -> VMState {
        if self.engine.state() == VMState::BREAK {
            self.engine.set_state(VMState::NONE);
        }
        let depth = self.engine.invocation_stack().len();
        while self.engine.state() == VMState::NONE && self.engine.invocation_stack().len() >= depth {
            self.execute_and_check_break_points();
        }
        self.break_if_running()
    }

    /// Executes one instruction of the current frame, running any call it makes
    /// to completion.
    pub fn step_over(&mut self) -> VMState {
        if self.engine.state().is_terminal() {
            return self.engine.state();
        }
        self.engine.set_state(VMState::NONE);
        let depth = self.engine.invocation_stack().len();
        loop {
            self.execute_and_check_break_points();
            if self.engine.state() != VMState::NONE
                || self.engine.invocation_stack().len() <= depth
            {
                break;
            }
        }
        self.break_if_running()
    }

    fn execute_and_check_break_points(&mut self) {
        self.engine.execute_next(&mut self.host);
        if self.engine.state() != VMState::NONE {
            return;
        }
        let hit = self
            .engine
            .current_context()
            .is_some_and(|context| self.has_break_point(context.script(), context.instruction_pointer()));
        if hit {
            self.engine.set_state(VMState::BREAK);
        }
    }

    fn break_if_running(&mut self) -> VMState {
        if self.engine.state() == VMState::NONE {
            self.engine.set_state(VMState::BREAK);
        }
        self.engine.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_code::OpCode;
    use crate::stack_item::StackItem;

    fn engine_with(script: &Script) -> ExecutionEngine {
        let mut engine = ExecutionEngine::new();
        engine.load_script(script.clone(), -1, 0).unwrap();
        engine
    }

    fn script(ops: &[OpCode]) -> Script {
        Script::new(ops.iter().map(|op| *op as u8).collect::<Vec<_>>())
    }

    #[test]
    fn break_points_stop_execution() {
        let script = script(&[OpCode::PUSH1, OpCode::PUSH2, OpCode::ADD, OpCode::RET]);
        let mut debugger = Debugger::new(engine_with(&script));
        debugger.add_break_point(&script, 2);
        assert!(debugger.has_break_point(&script, 2));

        assert_eq!(debugger.execute(), VMState::BREAK);
        assert_eq!(debugger.engine().current_context().unwrap().instruction_pointer(), 2);

        assert!(debugger.remove_break_point(&script, 2));
        assert!(!debugger.remove_break_point(&script, 2));
        assert_eq!(debugger.execute(), VMState::HALT);
        assert_eq!(
            debugger.engine().result_stack().as_slice(),
            &[StackItem::from_int(3)]
        );
    }

    #[test]
    fn step_into_executes_one_instruction() {
        let script = script(&[OpCode::PUSH1, OpCode::PUSH2, OpCode::RET]);
        let mut debugger = Debugger::new(engine_with(&script));
        assert_eq!(debugger.step_into(), VMState::BREAK);
        assert_eq!(debugger.engine().current_context().unwrap().instruction_pointer(), 1);
    }

    #[test]
    fn step_over_runs_the_called_frame() {
        // The callee is PUSH5 RET at offset 3.
        let script = Script::new(vec![
            OpCode::CALL as u8,
            3,
            OpCode::RET as u8,
            OpCode::PUSH5 as u8,
            OpCode::RET as u8,
        ]);
        let mut debugger = Debugger::new(engine_with(&script));
        assert_eq!(debugger.step_over(), VMState::BREAK);
        let context = debugger.engine().current_context().unwrap();
        assert_eq!(context.instruction_pointer(), 2);
        assert_eq!(debugger.engine().invocation_stack().len(), 1);
        assert_eq!(debugger.step_over(), VMState::HALT);
    }

    #[test]
    fn step_out_returns_to_the_caller() {
        let script = Script::new(vec![
            OpCode::CALL as u8,
            3,
            OpCode::RET as u8,
            OpCode::PUSH5 as u8,
            OpCode::RET as u8,
        ]);
        let mut debugger = Debugger::new(engine_with(&script));
        debugger.step_into();
        assert_eq!(debugger.engine().invocation_stack().len(), 2);
        assert_eq!(debugger.step_out(), VMState::BREAK);
        assert_eq!(debugger.engine().invocation_stack().len(), 1);
    }
}
