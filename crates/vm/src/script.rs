//! Immutable script bytecode shared between execution contexts.

use crate::error::{VmError, VmResult};
use crate::instruction::Instruction;
use crate::op_code::OpCode;
use crate::stack_item::StackItemType;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// NeoVM bytecode. Cloning a script shares the underlying bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Script {
    value: Rc<[u8]>,
}

impl Script {
    /// Wraps raw bytecode without validation.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            value: Rc::from(bytes.into().into_boxed_slice()),
        }
    }

    /// Wraps bytecode after checking that every instruction decodes and that
    /// every jump and try target lands on an instruction boundary.
    pub fn new_strict(bytes: impl Into<Vec<u8>>) -> VmResult<Self> {
        let script = Self::new(bytes);
        script.validate()?;
        Ok(script)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    /// Returns `true` when both handles share the same bytes.
    pub fn ptr_eq(&self, other: &Script) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    /// Decodes the instruction at `ip`. Reaching the end yields `RET`.
    pub fn get_instruction(&self, ip: usize) -> VmResult<Instruction> {
        if ip >= self.value.len() {
            return Ok(Instruction::ret());
        }
        Instruction::parse(&self.value, ip)
    }

    fn validate(&self) -> VmResult<()> {
        let mut boundaries = BTreeSet::new();
        let mut instructions = Vec::new();
        let mut ip = 0;
        while ip < self.len() {
            let instruction = Instruction::parse(&self.value, ip)?;
            boundaries.insert(ip);
            ip += instruction.size();
            instructions.push((ip - instruction.size(), instruction));
        }

        let check_target = |position: usize, offset: i32| -> VmResult<()> {
            let target = position as i64 + offset as i64;
            if target < 0 || !boundaries.contains(&(target as usize)) {
                return Err(VmError::InvalidOperand {
                    position,
                    message: format!("target {target} is not an instruction boundary"),
                });
            }
            Ok(())
        };

        for (position, instruction) in &instructions {
            match instruction.opcode() {
                op if op.is_jump() => check_target(*position, instruction.jump_offset())?,
                OpCode::PUSHA | OpCode::ENDTRY | OpCode::ENDTRY_L => {
                    check_target(*position, instruction.jump_offset())?
                }
                OpCode::TRY | OpCode::TRY_L => {
                    let (catch, finally) = instruction.try_offsets();
                    if catch != 0 {
                        check_target(*position, catch)?;
                    }
                    if finally != 0 {
                        check_target(*position, finally)?;
                    }
                }
                OpCode::NEWARRAY_T | OpCode::ISTYPE | OpCode::CONVERT => {
                    let code = instruction.token_u8();
                    let valid = StackItemType::from_u8(code).ok_or_else(|| {
                        VmError::InvalidOperand {
                            position: *position,
                            message: format!("invalid stack item type 0x{code:02x}"),
                        }
                    })?;
                    if instruction.opcode() != OpCode::NEWARRAY_T && valid == StackItemType::Any {
                        return Err(VmError::InvalidOperand {
                            position: *position,
                            message: format!("{} cannot target Any", instruction.opcode()),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Deref for Script {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.value
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script::new(bytes)
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Script::new(bytes.to_vec())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({} bytes)", self.value.len())
    }
}
