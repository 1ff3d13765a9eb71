//! VM execution states.

use derive_more::Display;

/// Indicates the status of the VM.
#[repr(u8)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VMState {
    /// Execution is in progress or has not yet begun.
    #[default]
    NONE = 0,

    /// Execution completed successfully.
    HALT = 1 << 0,

    /// Execution ended with an exception that was not caught.
    FAULT = 1 << 1,

    /// A breakpoint was hit.
    BREAK = 1 << 2,
}

impl VMState {
    #[inline]
    pub fn is_halt(self) -> bool {
        self == VMState::HALT
    }

    #[inline]
    pub fn is_fault(self) -> bool {
        self == VMState::FAULT
    }

    #[inline]
    pub fn is_break(self) -> bool {
        self == VMState::BREAK
    }

    /// HALT or FAULT.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, VMState::HALT | VMState::FAULT)
    }
}
