//! Parameter types used by contract ABIs.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The type of a contract method parameter or return value.
#[repr(u8)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractParameterType {
    Any = 0x00,
    Boolean = 0x10,
    Integer = 0x11,
    ByteArray = 0x12,
    String = 0x13,
    Hash160 = 0x14,
    Hash256 = 0x15,
    PublicKey = 0x16,
    Signature = 0x17,
    Array = 0x20,
    Map = 0x22,
    InteropInterface = 0x30,
    Void = 0xff,
}

impl ContractParameterType {
    pub fn from_u8(value: u8) -> Option<Self> {
        use ContractParameterType::*;
        Some(match value {
            0x00 => Any,
            0x10 => Boolean,
            0x11 => Integer,
            0x12 => ByteArray,
            0x13 => String,
            0x14 => Hash160,
            0x15 => Hash256,
            0x16 => PublicKey,
            0x17 => Signature,
            0x20 => Array,
            0x22 => Map,
            0x30 => InteropInterface,
            0xff => Void,
            _ => return None,
        })
    }
}
