//! Operand size rules for instructions.

/// Describes the operand that follows an opcode.
///
/// An opcode either carries a fixed number of operand bytes or a
/// little-endian length prefix of `size_prefix` bytes followed by the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperandSize {
    size: usize,
    size_prefix: usize,
}

impl OperandSize {
    /// No operand.
    pub const NONE: OperandSize = OperandSize {
        size: 0,
        size_prefix: 0,
    };

    /// A fixed operand of `size` bytes.
    pub const fn fixed(size: usize) -> Self {
        Self {
            size,
            size_prefix: 0,
        }
    }

    /// A payload preceded by a `size_prefix`-byte length.
    pub const fn prefix(size_prefix: usize) -> Self {
        Self {
            size: 0,
            size_prefix,
        }
    }

    /// Fixed operand size in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Size of the length prefix in bytes.
    pub const fn size_prefix(&self) -> usize {
        self.size_prefix
    }

    /// Returns `true` when the operand has a fixed size.
    pub const fn has_fixed_size(&self) -> bool {
        self.size_prefix == 0
    }
}
