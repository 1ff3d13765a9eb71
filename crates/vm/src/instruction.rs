//! Decoded NeoVM instructions.

use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use std::fmt;

/// A single decoded instruction.
///
/// For length-prefixed opcodes (`PUSHDATA1/2/4`) the operand holds the
/// payload only; `size` still counts the prefix bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: OpCode,
    operand: Vec<u8>,
    size: usize,
}

impl Instruction {
    /// The implicit `RET` executed when the instruction pointer reaches the
    /// end of a script.
    pub fn ret() -> Self {
        Self {
            opcode: OpCode::RET,
            operand: Vec::new(),
            size: 1,
        }
    }

    /// Decodes the instruction starting at `position`.
    pub fn parse(script: &[u8], position: usize) -> VmResult<Self> {
        let byte = *script.get(position).ok_or_else(|| VmError::InvalidOperand {
            position,
            message: "instruction pointer is past the end of the script".into(),
        })?;
        let opcode = OpCode::from_u8(byte).ok_or(VmError::InvalidOpCode(byte))?;
        let operand_size = opcode.operand_size();
        let mut cursor = position + 1;

        let payload_len = if operand_size.has_fixed_size() {
            operand_size.size()
        } else {
            let prefix = operand_size.size_prefix();
            let bytes = take(script, cursor, prefix, position)?;
            cursor += prefix;
            let mut len = [0u8; 4];
            len[..prefix].copy_from_slice(bytes);
            u32::from_le_bytes(len) as usize
        };

        let operand = take(script, cursor, payload_len, position)?.to_vec();
        Ok(Self {
            opcode,
            size: cursor + payload_len - position,
            operand,
        })
    }

    /// The opcode.
    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Operand bytes (payload only for prefixed operands).
    pub fn operand(&self) -> &[u8] {
        &self.operand
    }

    /// Encoded size in bytes including opcode and prefix.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn token_i8(&self) -> i8 {
        self.byte_at(0) as i8
    }

    pub fn token_i8_1(&self) -> i8 {
        self.byte_at(1) as i8
    }

    pub fn token_u8(&self) -> u8 {
        self.byte_at(0)
    }

    pub fn token_u8_1(&self) -> u8 {
        self.byte_at(1)
    }

    pub fn token_u16(&self) -> u16 {
        u16::from_le_bytes([self.byte_at(0), self.byte_at(1)])
    }

    pub fn token_i32(&self) -> i32 {
        self.token_u32_at(0) as i32
    }

    /// Second 4-byte operand (used by `TRY_L`).
    pub fn token_i32_1(&self) -> i32 {
        self.token_u32_at(4) as i32
    }

    pub fn token_u32(&self) -> u32 {
        self.token_u32_at(0)
    }

    /// Signed jump offset regardless of short or long encoding.
    pub fn jump_offset(&self) -> i32 {
        match self.operand.len() {
            1 => self.token_i8() as i32,
            _ => self.token_i32(),
        }
    }

    /// The `(catch, finally)` offsets of a `TRY`/`TRY_L`.
    pub fn try_offsets(&self) -> (i32, i32) {
        match self.opcode {
            OpCode::TRY => (self.token_i8() as i32, self.token_i8_1() as i32),
            _ => (self.token_i32(), self.token_i32_1()),
        }
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.operand.get(index).copied().unwrap_or_default()
    }

    fn token_u32_at(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.byte_at(offset),
            self.byte_at(offset + 1),
            self.byte_at(offset + 2),
            self.byte_at(offset + 3),
        ])
    }
}

fn take(script: &[u8], start: usize, len: usize, position: usize) -> VmResult<&[u8]> {
    script
        .get(start..start + len)
        .ok_or_else(|| VmError::InvalidOperand {
            position,
            message: format!("operand needs {len} byte(s) at offset {start}"),
        })
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operand.is_empty() {
            write!(f, "{}", self.opcode)
        } else {
            write!(f, "{} ", self.opcode)?;
            for byte in &self.operand {
                write!(f, "{byte:02x}")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pushdata_with_prefix() {
        let script = [0x0C, 0x03, b'a', b'b', b'c', 0x40];
        let instruction = Instruction::parse(&script, 0).unwrap();
        assert_eq!(instruction.opcode(), OpCode::PUSHDATA1);
        assert_eq!(instruction.operand(), b"abc");
        assert_eq!(instruction.size(), 5);
    }

    #[test]
    fn decodes_long_try_offsets() {
        let mut script = vec![OpCode::TRY_L as u8];
        script.extend_from_slice(&(-8i32).to_le_bytes());
        script.extend_from_slice(&20i32.to_le_bytes());
        let instruction = Instruction::parse(&script, 0).unwrap();
        assert_eq!(instruction.try_offsets(), (-8, 20));
        assert_eq!(instruction.size(), 9);
    }

    #[test]
    fn truncated_operand_is_rejected() {
        let script = [OpCode::PUSHINT32 as u8, 0x01, 0x02];
        assert!(matches!(
            Instruction::parse(&script, 0),
            Err(VmError::InvalidOperand { position: 0, .. })
        ));
        let script = [OpCode::PUSHDATA1 as u8, 0x05, 0x00];
        assert!(Instruction::parse(&script, 0).is_err());
    }

    #[test]
    fn undefined_opcode_is_rejected() {
        assert!(matches!(
            Instruction::parse(&[0x06], 0),
            Err(VmError::InvalidOpCode(0x06))
        ));
    }
}
