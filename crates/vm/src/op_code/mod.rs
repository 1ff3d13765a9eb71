//! The NeoVM opcode table.
//!
//! Each entry fixes the byte value, the operand rule and the base gas price
//! of an instruction. The price is multiplied by the execution fee factor
//! when the engine meters gas.

pub mod operand_size;

pub use operand_size::OperandSize;

use std::fmt;

const NONE: OperandSize = OperandSize::NONE;

const fn fixed(size: usize) -> OperandSize {
    OperandSize::fixed(size)
}

const fn prefix(size: usize) -> OperandSize {
    OperandSize::prefix(size)
}

macro_rules! opcodes {
    ($($(#[$doc:meta])* $name:ident = $value:literal, $operand:expr, $price:expr;)*) => {
        /// Represents the opcode of an instruction.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum OpCode {
            $($(#[$doc])* $name = $value,)*
        }

        impl OpCode {
            /// Every defined opcode in byte order.
            pub const ALL: &'static [OpCode] = &[$(OpCode::$name,)*];

            /// Decodes an opcode byte.
            pub const fn from_u8(value: u8) -> Option<OpCode> {
                match value {
                    $($value => Some(OpCode::$name),)*
                    _ => None,
                }
            }

            /// Operand rule of this opcode.
            pub const fn operand_size(self) -> OperandSize {
                match self {
                    $(OpCode::$name => $operand,)*
                }
            }

            /// Base gas price of this opcode.
            pub const fn price(self) -> i64 {
                match self {
                    $(OpCode::$name => $price,)*
                }
            }

            /// Mnemonic of this opcode.
            pub const fn name(self) -> &'static str {
                match self {
                    $(OpCode::$name => stringify!($name),)*
                }
            }
        }
    };
}

opcodes! {
    // Constants
    /// Pushes a 1-byte signed integer.
    PUSHINT8 = 0x00, fixed(1), 1;
    /// Pushes a 2-byte signed integer.
    PUSHINT16 = 0x01, fixed(2), 1;
    /// Pushes a 4-byte signed integer.
    PUSHINT32 = 0x02, fixed(4), 1;
    /// Pushes an 8-byte signed integer.
    PUSHINT64 = 0x03, fixed(8), 1;
    /// Pushes a 16-byte signed integer.
    PUSHINT128 = 0x04, fixed(16), 1 << 2;
    /// Pushes a 32-byte signed integer.
    PUSHINT256 = 0x05, fixed(32), 1 << 2;
    /// Pushes `true`.
    PUSHT = 0x08, NONE, 1;
    /// Pushes `false`.
    PUSHF = 0x09, NONE, 1;
    /// Pushes a pointer relative to the current position.
    PUSHA = 0x0A, fixed(4), 1 << 2;
    /// Pushes null.
    PUSHNULL = 0x0B, NONE, 1;
    /// Pushes up to 255 bytes.
    PUSHDATA1 = 0x0C, prefix(1), 1 << 3;
    /// Pushes up to 65535 bytes.
    PUSHDATA2 = 0x0D, prefix(2), 1 << 9;
    /// Pushes up to 4 GiB (bounded by the item size limit).
    PUSHDATA4 = 0x0E, prefix(4), 1 << 12;
    /// Pushes -1.
    PUSHM1 = 0x0F, NONE, 1;
    PUSH0 = 0x10, NONE, 1;
    PUSH1 = 0x11, NONE, 1;
    PUSH2 = 0x12, NONE, 1;
    PUSH3 = 0x13, NONE, 1;
    PUSH4 = 0x14, NONE, 1;
    PUSH5 = 0x15, NONE, 1;
    PUSH6 = 0x16, NONE, 1;
    PUSH7 = 0x17, NONE, 1;
    PUSH8 = 0x18, NONE, 1;
    PUSH9 = 0x19, NONE, 1;
    PUSH10 = 0x1A, NONE, 1;
    PUSH11 = 0x1B, NONE, 1;
    PUSH12 = 0x1C, NONE, 1;
    PUSH13 = 0x1D, NONE, 1;
    PUSH14 = 0x1E, NONE, 1;
    PUSH15 = 0x1F, NONE, 1;
    PUSH16 = 0x20, NONE, 1;

    // Flow control
    NOP = 0x21, NONE, 1;
    JMP = 0x22, fixed(1), 1 << 1;
    JMP_L = 0x23, fixed(4), 1 << 1;
    JMPIF = 0x24, fixed(1), 1 << 1;
    JMPIF_L = 0x25, fixed(4), 1 << 1;
    JMPIFNOT = 0x26, fixed(1), 1 << 1;
    JMPIFNOT_L = 0x27, fixed(4), 1 << 1;
    JMPEQ = 0x28, fixed(1), 1 << 1;
    JMPEQ_L = 0x29, fixed(4), 1 << 1;
    JMPNE = 0x2A, fixed(1), 1 << 1;
    JMPNE_L = 0x2B, fixed(4), 1 << 1;
    JMPGT = 0x2C, fixed(1), 1 << 1;
    JMPGT_L = 0x2D, fixed(4), 1 << 1;
    JMPGE = 0x2E, fixed(1), 1 << 1;
    JMPGE_L = 0x2F, fixed(4), 1 << 1;
    JMPLT = 0x30, fixed(1), 1 << 1;
    JMPLT_L = 0x31, fixed(4), 1 << 1;
    JMPLE = 0x32, fixed(1), 1 << 1;
    JMPLE_L = 0x33, fixed(4), 1 << 1;
    CALL = 0x34, fixed(1), 1 << 9;
    CALL_L = 0x35, fixed(4), 1 << 9;
    CALLA = 0x36, NONE, 1 << 9;
    /// Calls a method token of the current contract.
    CALLT = 0x37, fixed(2), 1 << 15;
    /// Faults the engine. Never catchable.
    ABORT = 0x38, NONE, 0;
    ASSERT = 0x39, NONE, 1;
    THROW = 0x3A, NONE, 1 << 9;
    TRY = 0x3B, fixed(2), 1 << 2;
    TRY_L = 0x3C, fixed(8), 1 << 2;
    ENDTRY = 0x3D, fixed(1), 1 << 2;
    ENDTRY_L = 0x3E, fixed(4), 1 << 2;
    ENDFINALLY = 0x3F, NONE, 1 << 2;
    RET = 0x40, NONE, 0;
    /// Calls an interop service identified by a 4-byte hash.
    SYSCALL = 0x41, fixed(4), 0;

    // Stack
    DEPTH = 0x43, NONE, 1 << 1;
    DROP = 0x45, NONE, 1 << 1;
    NIP = 0x46, NONE, 1 << 1;
    XDROP = 0x48, NONE, 1 << 4;
    CLEAR = 0x49, NONE, 1 << 4;
    DUP = 0x4A, NONE, 1 << 1;
    OVER = 0x4B, NONE, 1 << 1;
    PICK = 0x4D, NONE, 1 << 1;
    TUCK = 0x4E, NONE, 1 << 1;
    SWAP = 0x50, NONE, 1 << 1;
    ROT = 0x51, NONE, 1 << 1;
    ROLL = 0x52, NONE, 1 << 4;
    REVERSE3 = 0x53, NONE, 1 << 1;
    REVERSE4 = 0x54, NONE, 1 << 1;
    REVERSEN = 0x55, NONE, 1 << 4;

    // Slot
    INITSSLOT = 0x56, fixed(1), 1 << 4;
    INITSLOT = 0x57, fixed(2), 1 << 6;
    LDSFLD0 = 0x58, NONE, 1 << 1;
    LDSFLD1 = 0x59, NONE, 1 << 1;
    LDSFLD2 = 0x5A, NONE, 1 << 1;
    LDSFLD3 = 0x5B, NONE, 1 << 1;
    LDSFLD4 = 0x5C, NONE, 1 << 1;
    LDSFLD5 = 0x5D, NONE, 1 << 1;
    LDSFLD6 = 0x5E, NONE, 1 << 1;
    LDSFLD = 0x5F, fixed(1), 1 << 1;
    STSFLD0 = 0x60, NONE, 1 << 1;
    STSFLD1 = 0x61, NONE, 1 << 1;
    STSFLD2 = 0x62, NONE, 1 << 1;
    STSFLD3 = 0x63, NONE, 1 << 1;
    STSFLD4 = 0x64, NONE, 1 << 1;
    STSFLD5 = 0x65, NONE, 1 << 1;
    STSFLD6 = 0x66, NONE, 1 << 1;
    STSFLD = 0x67, fixed(1), 1 << 1;
    LDLOC0 = 0x68, NONE, 1 << 1;
    LDLOC1 = 0x69, NONE, 1 << 1;
    LDLOC2 = 0x6A, NONE, 1 << 1;
    LDLOC3 = 0x6B, NONE, 1 << 1;
    LDLOC4 = 0x6C, NONE, 1 << 1;
    LDLOC5 = 0x6D, NONE, 1 << 1;
    LDLOC6 = 0x6E, NONE, 1 << 1;
    LDLOC = 0x6F, fixed(1), 1 << 1;
    STLOC0 = 0x70, NONE, 1 << 1;
    STLOC1 = 0x71, NONE, 1 << 1;
    STLOC2 = 0x72, NONE, 1 << 1;
    STLOC3 = 0x73, NONE, 1 << 1;
    STLOC4 = 0x74, NONE, 1 << 1;
    STLOC5 = 0x75, NONE, 1 << 1;
    STLOC6 = 0x76, NONE, 1 << 1;
    STLOC = 0x77, fixed(1), 1 << 1;
    LDARG0 = 0x78, NONE, 1 << 1;
    LDARG1 = 0x79, NONE, 1 << 1;
    LDARG2 = 0x7A, NONE, 1 << 1;
    LDARG3 = 0x7B, NONE, 1 << 1;
    LDARG4 = 0x7C, NONE, 1 << 1;
    LDARG5 = 0x7D, NONE, 1 << 1;
    LDARG6 = 0x7E, NONE, 1 << 1;
    LDARG = 0x7F, fixed(1), 1 << 1;
    STARG0 = 0x80, NONE, 1 << 1;
    STARG1 = 0x81, NONE, 1 << 1;
    STARG2 = 0x82, NONE, 1 << 1;
    STARG3 = 0x83, NONE, 1 << 1;
    STARG4 = 0x84, NONE, 1 << 1;
    STARG5 = 0x85, NONE, 1 << 1;
    STARG6 = 0x86, NONE, 1 << 1;
    STARG = 0x87, fixed(1), 1 << 1;

    // Splice
    NEWBUFFER = 0x88, NONE, 1 << 8;
    MEMCPY = 0x89, NONE, 1 << 11;
    CAT = 0x8B, NONE, 1 << 11;
    SUBSTR = 0x8C, NONE, 1 << 11;
    LEFT = 0x8D, NONE, 1 << 11;
    RIGHT = 0x8E, NONE, 1 << 11;

    // Bitwise logic
    INVERT = 0x90, NONE, 1 << 2;
    AND = 0x91, NONE, 1 << 3;
    OR = 0x92, NONE, 1 << 3;
    XOR = 0x93, NONE, 1 << 3;
    EQUAL = 0x97, NONE, 1 << 5;
    NOTEQUAL = 0x98, NONE, 1 << 5;

    // Arithmetic
    SIGN = 0x99, NONE, 1 << 2;
    ABS = 0x9A, NONE, 1 << 2;
    NEGATE = 0x9B, NONE, 1 << 2;
    INC = 0x9C, NONE, 1 << 2;
    DEC = 0x9D, NONE, 1 << 2;
    ADD = 0x9E, NONE, 1 << 3;
    SUB = 0x9F, NONE, 1 << 3;
    MUL = 0xA0, NONE, 1 << 3;
    DIV = 0xA1, NONE, 1 << 3;
    MOD = 0xA2, NONE, 1 << 3;
    POW = 0xA3, NONE, 1 << 6;
    SQRT = 0xA4, NONE, 1 << 6;
    MODMUL = 0xA5, NONE, 1 << 5;
    MODPOW = 0xA6, NONE, 1 << 11;
    SHL = 0xA8, NONE, 1 << 3;
    SHR = 0xA9, NONE, 1 << 3;
    NOT = 0xAA, NONE, 1 << 2;
    BOOLAND = 0xAB, NONE, 1 << 3;
    BOOLOR = 0xAC, NONE, 1 << 3;
    NZ = 0xB1, NONE, 1 << 2;
    NUMEQUAL = 0xB3, NONE, 1 << 3;
    NUMNOTEQUAL = 0xB4, NONE, 1 << 3;
    LT = 0xB5, NONE, 1 << 3;
    LE = 0xB6, NONE, 1 << 3;
    GT = 0xB7, NONE, 1 << 3;
    GE = 0xB8, NONE, 1 << 3;
    MIN = 0xB9, NONE, 1 << 3;
    MAX = 0xBA, NONE, 1 << 3;
    WITHIN = 0xBB, NONE, 1 << 3;

    // Compound types
    PACKMAP = 0xBE, NONE, 1 << 11;
    PACKSTRUCT = 0xBF, NONE, 1 << 11;
    PACK = 0xC0, NONE, 1 << 11;
    UNPACK = 0xC1, NONE, 1 << 11;
    NEWARRAY0 = 0xC2, NONE, 1 << 4;
    NEWARRAY = 0xC3, NONE, 1 << 9;
    NEWARRAY_T = 0xC4, fixed(1), 1 << 9;
    NEWSTRUCT0 = 0xC5, NONE, 1 << 4;
    NEWSTRUCT = 0xC6, NONE, 1 << 9;
    NEWMAP = 0xC8, NONE, 1 << 3;
    SIZE = 0xCA, NONE, 1 << 2;
    HASKEY = 0xCB, NONE, 1 << 6;
    KEYS = 0xCC, NONE, 1 << 4;
    VALUES = 0xCD, NONE, 1 << 13;
    PICKITEM = 0xCE, NONE, 1 << 6;
    APPEND = 0xCF, NONE, 1 << 13;
    SETITEM = 0xD0, NONE, 1 << 13;
    REVERSEITEMS = 0xD1, NONE, 1 << 13;
    REMOVE = 0xD2, NONE, 1 << 4;
    CLEARITEMS = 0xD3, NONE, 1 << 4;
    POPITEM = 0xD4, NONE, 1 << 4;

    // Types
    ISNULL = 0xD8, NONE, 1 << 1;
    ISTYPE = 0xD9, fixed(1), 1 << 1;
    CONVERT = 0xDB, fixed(1), 1 << 13;

    // Extensions
    /// Faults with a message popped from the stack.
    ABORTMSG = 0xE0, NONE, 0;
    /// Faults with a message when the condition is false.
    ASSERTMSG = 0xE1, NONE, 1;
}

impl OpCode {
    /// Returns `true` for PUSHINT*, PUSHDATA*, PUSHM1..PUSH16 and friends.
    pub fn is_push(self) -> bool {
        (self as u8) <= OpCode::PUSH16 as u8
    }

    /// Returns `true` for instructions that carry a jump offset.
    pub fn is_jump(self) -> bool {
        (OpCode::JMP as u8..=OpCode::CALL_L as u8).contains(&(self as u8))
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OpCode::from_u8(value).ok_or(value)
    }
}
