//! Script builder module for the Neo Virtual Machine.
//!
//! This module provides a way to programmatically construct scripts for the Neo VM.

use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::script::Script;
use crate::stack_item::StackItem;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

/// Helps construct VM scripts programmatically.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    /// Creates a new script builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length of the script in bytes.
    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Emits an opcode followed by its raw operand.
    pub fn emit(&mut self, opcode: OpCode, operand: &[u8]) -> &mut Self {
        self.script.push(opcode as u8);
        self.script.extend_from_slice(operand);
        self
    }

    /// Emits an opcode without operand.
    pub fn emit_opcode(&mut self, opcode: OpCode) -> &mut Self {
        self.emit(opcode, &[])
    }

    /// Emits raw bytes to the script.
    pub fn emit_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.script.extend_from_slice(bytes);
        self
    }

    /// Pushes a byte string with the smallest PUSHDATA form.
    pub fn emit_push(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len <= u8::MAX as usize {
            self.emit(OpCode::PUSHDATA1, &[len as u8]);
        } else if len <= u16::MAX as usize {
            self.emit(OpCode::PUSHDATA2, &(len as u16).to_le_bytes());
        } else {
            self.emit(OpCode::PUSHDATA4, &(len as u32).to_le_bytes());
        }
        self.emit_raw(data)
    }

    /// Pushes a UTF-8 string.
    pub fn emit_push_string(&mut self, value: &str) -> &mut Self {
        self.emit_push(value.as_bytes())
    }

    /// Pushes an integer with PUSHM1..PUSH16 or the narrowest PUSHINT form.
    pub fn emit_push_int(&mut self, value: i64) -> &mut Self {
        if (-1..=16).contains(&value) {
            let code = (OpCode::PUSH0 as i64 + value) as u8;
            self.script.push(code);
            return self;
        }
        let bytes = value.to_le_bytes();
        let (opcode, width) = if i8::try_from(value).is_ok() {
            (OpCode::PUSHINT8, 1)
        } else if i16::try_from(value).is_ok() {
            (OpCode::PUSHINT16, 2)
        } else if i32::try_from(value).is_ok() {
            (OpCode::PUSHINT32, 4)
        } else {
            (OpCode::PUSHINT64, 8)
        };
        self.emit(opcode, &bytes[..width])
    }

    /// Pushes an arbitrary integer of up to 256 bits.
    pub fn emit_push_bigint(&mut self, value: &BigInt) -> VmResult<&mut Self> {
        if let Some(small) = value.to_i64() {
            return Ok(self.emit_push_int(small));
        }
        let mut bytes = value.to_signed_bytes_le();
        let (opcode, width) = match bytes.len() {
            0..=16 => (OpCode::PUSHINT128, 16),
            17..=32 => (OpCode::PUSHINT256, 32),
            size => {
                return Err(VmError::ItemTooLarge { size, limit: 32 });
            }
        };
        let fill = if value.is_negative() { 0xff } else { 0x00 };
        bytes.resize(width, fill);
        Ok(self.emit(opcode, &bytes))
    }

    /// Pushes a boolean.
    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit_opcode(if value { OpCode::PUSHT } else { OpCode::PUSHF })
    }

    /// Pushes a primitive item, or a packed array of them.
    pub fn emit_push_item(&mut self, item: &StackItem) -> VmResult<&mut Self> {
        match item {
            StackItem::Null => {
                self.emit_opcode(OpCode::PUSHNULL);
            }
            StackItem::Boolean(value) => {
                self.emit_push_bool(*value);
            }
            StackItem::Integer(value) => {
                self.emit_push_bigint(value)?;
            }
            StackItem::ByteString(bytes) => {
                self.emit_push(bytes);
            }
            StackItem::Buffer(buffer) => {
                let bytes = buffer.borrow().clone();
                self.emit_push(&bytes);
            }
            StackItem::Array(array) => {
                let items = array.to_vec();
                self.emit_pack_items(&items, OpCode::PACK)?;
            }
            StackItem::Struct(s) => {
                let items = s.to_vec();
                self.emit_pack_items(&items, OpCode::PACKSTRUCT)?;
            }
            other => {
                return Err(VmError::invalid_operation(format!(
                    "cannot emit a push for {}",
                    other.stack_item_type()
                )))
            }
        }
        Ok(self)
    }

    fn emit_pack_items(&mut self, items: &[StackItem], pack: OpCode) -> VmResult<()> {
        for item in items.iter().rev() {
            self.emit_push_item(item)?;
        }
        self.emit_push_int(items.len() as i64);
        self.emit_opcode(pack);
        Ok(())
    }

    /// Emits a jump, call or ENDTRY with a relative offset. The short form is
    /// used when the opcode has one and the offset fits.
    pub fn emit_jump(&mut self, opcode: OpCode, offset: i32) -> VmResult<&mut Self> {
        if !opcode.is_jump() && !matches!(opcode, OpCode::ENDTRY | OpCode::ENDTRY_L) {
            return Err(VmError::invalid_operation(format!(
                "{opcode} is not a jump instruction"
            )));
        }
        let is_long = (opcode as u8) % 2 == 1 && opcode.is_jump()
            || opcode == OpCode::ENDTRY_L;
        match i8::try_from(offset) {
            Ok(short) if !is_long => Ok(self.emit(opcode, &short.to_le_bytes())),
            _ => {
                let long = if is_long {
                    opcode
                } else {
                    OpCode::from_u8(opcode as u8 + 1).ok_or(VmError::InvalidOpCode(opcode as u8 + 1))?
                };
                Ok(self.emit(long, &offset.to_le_bytes()))
            }
        }
    }

    /// Emits a CALL to a relative offset.
    pub fn emit_call(&mut self, offset: i32) -> VmResult<&mut Self> {
        self.emit_jump(OpCode::CALL, offset)
    }

    /// Emits a SYSCALL with its 32-bit interop hash.
    pub fn emit_syscall(&mut self, hash: u32) -> &mut Self {
        self.emit(OpCode::SYSCALL, &hash.to_le_bytes())
    }

    /// Emits TRY with catch and finally offsets relative to the TRY itself.
    pub fn emit_try(&mut self, catch_offset: i8, finally_offset: i8) -> &mut Self {
        self.emit(
            OpCode::TRY,
            &[catch_offset as u8, finally_offset as u8],
        )
    }

    /// Converts the builder to a script.
    pub fn to_script(&self) -> Script {
        Script::new(self.script.clone())
    }

    /// Converts the builder to a byte array.
    pub fn to_array(&self) -> Vec<u8> {
        self.script.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integers_use_single_opcodes() {
        let mut builder = ScriptBuilder::new();
        builder.emit_push_int(-1).emit_push_int(0).emit_push_int(16);
        assert_eq!(
            builder.to_array(),
            vec![OpCode::PUSHM1 as u8, OpCode::PUSH0 as u8, OpCode::PUSH16 as u8]
        );
    }

    #[test]
    fn integers_pick_the_narrowest_width() {
        let mut builder = ScriptBuilder::new();
        builder.emit_push_int(100);
        assert_eq!(builder.to_array(), vec![OpCode::PUSHINT8 as u8, 100]);

        let mut builder = ScriptBuilder::new();
        builder.emit_push_int(-200);
        assert_eq!(builder.to_array(), vec![OpCode::PUSHINT16 as u8, 0x38, 0xff]);

        let mut builder = ScriptBuilder::new();
        builder.emit_push_int(i64::MAX);
        assert_eq!(builder.to_array()[0], OpCode::PUSHINT64 as u8);
        assert_eq!(builder.len(), 9);
    }

    #[test]
    fn big_integers_are_sign_extended() {
        let value = -(BigInt::from(1) << 100usize);
        let mut builder = ScriptBuilder::new();
        builder.emit_push_bigint(&value).unwrap();
        let bytes = builder.to_array();
        assert_eq!(bytes[0], OpCode::PUSHINT128 as u8);
        assert_eq!(bytes.len(), 17);
        assert_eq!(BigInt::from_signed_bytes_le(&bytes[1..]), value);

        let too_big = BigInt::from(1) << 256usize;
        assert!(ScriptBuilder::new().emit_push_bigint(&too_big).is_err());
    }

    #[test]
    fn byte_pushes_use_pushdata() {
        let mut builder = ScriptBuilder::new();
        builder.emit_push(&[1, 2, 3]);
        assert_eq!(builder.to_array(), vec![OpCode::PUSHDATA1 as u8, 3, 1, 2, 3]);

        let mut builder = ScriptBuilder::new();
        builder.emit_push(&[0u8; 300]);
        assert_eq!(&builder.to_array()[..3], &[OpCode::PUSHDATA2 as u8, 0x2c, 0x01]);
    }

    #[test]
    fn jumps_widen_when_needed() {
        let mut builder = ScriptBuilder::new();
        builder.emit_jump(OpCode::JMP, 3).unwrap();
        builder.emit_jump(OpCode::JMPIF, 1000).unwrap();
        assert_eq!(
            builder.to_array(),
            vec![OpCode::JMP as u8, 3, OpCode::JMPIF_L as u8, 0xe8, 0x03, 0, 0]
        );
        assert!(builder.emit_jump(OpCode::ADD, 1).is_err());
    }

    #[test]
    fn syscall_operand_is_little_endian() {
        let mut builder = ScriptBuilder::new();
        builder.emit_syscall(0x0102_0304);
        assert_eq!(builder.to_array(), vec![OpCode::SYSCALL as u8, 4, 3, 2, 1]);
    }

    #[test]
    fn arrays_are_packed_in_reverse() {
        let item = StackItem::from_array(vec![StackItem::from_int(1), StackItem::from_int(2)]);
        let mut builder = ScriptBuilder::new();
        builder.emit_push_item(&item).unwrap();
        assert_eq!(
            builder.to_array(),
            vec![
                OpCode::PUSH2 as u8,
                OpCode::PUSH1 as u8,
                OpCode::PUSH2 as u8,
                OpCode::PACK as u8
            ]
        );
    }
}
