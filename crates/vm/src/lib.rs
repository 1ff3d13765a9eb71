//! # Neo Virtual Machine (NeoVM)
//!
//! A stack-based virtual machine executing Neo N3 scripts.
//!
//! ## Architecture
//!
//! - **ExecutionEngine**: the dispatch loop, invocation stack, gas accounting
//!   and exception unwinding.
//! - **JumpTable**: one handler per opcode. `SYSCALL` and `CALLT` are routed to
//!   an [`InteropHost`] instead.
//! - **EvaluationStack** / **Slot**: per-frame storage, tracked by the
//!   [`ReferenceCounter`].
//! - **StackItem**: the value model shared by all of the above.
//! - **ScriptBuilder** and **Debugger**: tooling around the engine.
//!
//! ## Example
//!
//! ```rust
//! use neo_vm::{ExecutionEngine, ScriptBuilder, StackItem, VMState};
//! use neo_vm::op_code::OpCode;
//!
//! let mut builder = ScriptBuilder::new();
//! builder.emit_push_int(3).emit_push_int(5).emit_opcode(OpCode::ADD);
//!
//! let mut engine = ExecutionEngine::new();
//! engine.load_script(builder.to_script(), -1, 0).unwrap();
//! assert_eq!(engine.execute(), VMState::HALT);
//! assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_int(8)]);
//! ```

pub mod call_flags;
pub mod debugger;
pub mod error;
pub mod evaluation_stack;
pub mod exception_handling;
pub mod execution_context;
pub mod execution_engine;
pub mod instruction;
pub mod jump_table;
pub mod op_code;
pub mod reference_counter;
pub mod script;
pub mod script_builder;
pub mod slot;
pub mod stack_item;
pub mod vm_state;

pub use call_flags::CallFlags;
pub use debugger::Debugger;
pub use error::{VmError, VmResult};
pub use evaluation_stack::EvaluationStack;
pub use exception_handling::{ExceptionHandlingContext, ExceptionHandlingState};
pub use execution_context::ExecutionContext;
pub use execution_engine::{
    describe_exception, ExecResult, ExecutionEngine, ExecutionEngineLimits, InteropHost,
    NullHost,
};
pub use instruction::Instruction;
pub use jump_table::{InstructionHandler, JumpTable};
pub use op_code::OpCode;
pub use reference_counter::ReferenceCounter;
pub use script::Script;
pub use script_builder::ScriptBuilder;
pub use slot::Slot;
pub use stack_item::{Array, InteropObject, Map, StackItem, StackItemType, Struct};
pub use vm_state::VMState;
