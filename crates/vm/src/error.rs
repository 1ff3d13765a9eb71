//! Error types raised while executing NeoVM scripts.

use crate::stack_item::{StackItem, StackItemType};
use thiserror::Error;

/// Errors raised by the virtual machine and by interop hosts.
///
/// Every variant except [`VmError::Throw`] and [`VmError::Catchable`] is
/// fatal: the engine transitions to `FAULT` as soon as a handler returns it.
#[derive(Debug, Error)]
pub enum VmError {
    /// Not enough items on a stack.
    #[error("stack underflow: requested index {requested}, stack holds {available} item(s)")]
    StackUnderflow { requested: usize, available: usize },

    /// An index or count operand was outside the permitted range.
    #[error("index out of range: {0}")]
    OutOfRange(String),

    /// A stack item had an unexpected type.
    #[error("invalid type: expected {expected}, found {actual}")]
    InvalidType {
        expected: &'static str,
        actual: StackItemType,
    },

    /// A conversion between stack item types is not defined.
    #[error("invalid cast from {from} to {to}")]
    InvalidCast {
        from: StackItemType,
        to: StackItemType,
    },

    /// An operation was invalid in the current engine state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The byte at the instruction pointer is not a defined opcode.
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpCode(u8),

    /// An instruction operand was truncated or malformed.
    #[error("invalid operand at position {position}: {message}")]
    InvalidOperand { position: usize, message: String },

    /// Integer division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An item exceeded the size limit.
    #[error("item size {size} exceeds the limit {limit}")]
    ItemTooLarge { size: usize, limit: usize },

    /// The reference counter exceeded `max_stack_size`.
    #[error("MaxStackSize exceed: {count}/{limit}")]
    StackOverflow { count: usize, limit: usize },

    /// Too many nested execution contexts.
    #[error("MaxInvocationStackSize exceed: {0}")]
    InvocationStackOverflow(usize),

    /// Too many nested TRY blocks in one context.
    #[error("MaxTryNestingDepth exceed: {0}")]
    TryNestingDepthExceeded(usize),

    /// `ABORT` or `ABORTMSG` was executed.
    #[error("{0}")]
    Abort(String),

    /// `ASSERT` or `ASSERTMSG` failed.
    #[error("{0}")]
    AssertFailed(String),

    /// The gas limit was exceeded.
    #[error("insufficient GAS: consumed {consumed}, limit {limit}")]
    OutOfGas { consumed: i64, limit: i64 },

    /// A native method or syscall could not be dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// An engine exception scripts may catch with TRY/CATCH.
    #[error("{0}")]
    Catchable(String),

    /// A script exception in flight. The engine consults the try stack
    /// before turning it into a fault.
    #[error("script exception: {0:?}")]
    Throw(StackItem),

    /// A script exception reached the bottom of the invocation stack.
    #[error("an unhandled exception was thrown: {0}")]
    UnhandledException(String),
}

impl VmError {
    /// Shorthand for [`VmError::InvalidOperation`].
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        VmError::InvalidOperation(message.into())
    }

    /// Shorthand for [`VmError::OutOfRange`].
    pub fn out_of_range(message: impl Into<String>) -> Self {
        VmError::OutOfRange(message.into())
    }

    /// Shorthand for [`VmError::Dispatch`].
    pub fn dispatch(message: impl Into<String>) -> Self {
        VmError::Dispatch(message.into())
    }

    /// Shorthand for [`VmError::Catchable`].
    pub fn catchable(message: impl Into<String>) -> Self {
        VmError::Catchable(message.into())
    }

    /// Returns `true` for engine exceptions that become script exceptions
    /// when `catch_engine_exceptions` is enabled.
    pub fn is_catchable(&self) -> bool {
        matches!(self, VmError::Catchable(_))
    }
}

/// Result alias used across the VM.
pub type VmResult<T> = std::result::Result<T, VmError>;
