//! Stack item type tags.

use derive_more::Display;

/// The type tag of a [`StackItem`](super::StackItem). The byte values are
/// part of the instruction encoding (`NEWARRAY_T`, `ISTYPE`, `CONVERT`).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum StackItemType {
    Any = 0x00,
    Pointer = 0x10,
    Boolean = 0x20,
    Integer = 0x21,
    ByteString = 0x28,
    Buffer = 0x30,
    Array = 0x40,
    Struct = 0x41,
    Map = 0x48,
    InteropInterface = 0x60,
}

impl StackItemType {
    /// Decodes a type byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => Self::Any,
            0x10 => Self::Pointer,
            0x20 => Self::Boolean,
            0x21 => Self::Integer,
            0x28 => Self::ByteString,
            0x30 => Self::Buffer,
            0x40 => Self::Array,
            0x41 => Self::Struct,
            0x48 => Self::Map,
            0x60 => Self::InteropInterface,
            _ => return None,
        })
    }

    /// Boolean, Integer and ByteString.
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::Boolean | Self::Integer | Self::ByteString)
    }

    /// Array, Struct and Map.
    pub fn is_compound(self) -> bool {
        matches!(self, Self::Array | Self::Struct | Self::Map)
    }
}

impl From<StackItemType> for u8 {
    fn from(value: StackItemType) -> Self {
        value as u8
    }
}
