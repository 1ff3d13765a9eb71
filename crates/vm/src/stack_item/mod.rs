//! Stack item module for the Neo Virtual Machine.
//!
//! Primitive items (Boolean, Integer, ByteString) have value semantics.
//! Buffer, Array, Map and InteropInterface items are shared handles compared
//! by identity. Struct shares its storage like Array but is copied when
//! stored into another container and compared element by element.

pub mod array;
pub mod interop_interface;
pub mod map;
#[allow(clippy::module_inception)]
pub mod stack_item;
pub mod stack_item_type;

pub use array::{Array, Struct};
pub use interop_interface::InteropObject;
pub use map::{Map, MAX_KEY_SIZE};
pub use stack_item::{
    encode_integer, StackItem, MAX_COMPARABLE_SIZE, MAX_INTEGER_SIZE, MAX_ITEM_SIZE,
};
pub use stack_item_type::StackItemType;
