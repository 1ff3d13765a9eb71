//! The NeoVM value type.

use super::array::{Array, Struct};
use super::interop_interface::InteropObject;
use super::map::{Map, MAX_KEY_SIZE};
use super::stack_item_type::StackItemType;
use crate::error::{VmError, VmResult};
use crate::script::Script;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Maximum size in bytes of an Integer item.
pub const MAX_INTEGER_SIZE: usize = 32;

/// Maximum size in bytes of a ByteString or Buffer item.
pub const MAX_ITEM_SIZE: usize = 131_070;

/// Maximum total size compared by `EQUAL` on byte strings and structs.
pub const MAX_COMPARABLE_SIZE: usize = 65_536;

/// Represents a value in the Neo VM.
#[derive(Clone)]
pub enum StackItem {
    Null,
    Boolean(bool),
    Integer(BigInt),
    /// Immutable bytes.
    ByteString(Vec<u8>),
    /// Mutable bytes, compared by identity.
    Buffer(Rc<RefCell<Vec<u8>>>),
    Array(Array),
    Struct(Struct),
    Map(Map),
    /// A position inside a specific script.
    Pointer { script: Script, position: usize },
    InteropInterface(Rc<RefCell<dyn InteropObject>>),
}

impl Default for StackItem {
    fn default() -> Self {
        StackItem::Null
    }
}

impl StackItem {
    pub fn null() -> Self {
        StackItem::Null
    }

    pub fn from_bool(value: bool) -> Self {
        StackItem::Boolean(value)
    }

    /// Creates an Integer item. The size limit is enforced by
    /// [`StackItem::checked_int`] where results come from arithmetic.
    pub fn from_int<T: Into<BigInt>>(value: T) -> Self {
        StackItem::Integer(value.into())
    }

    /// Creates an Integer item, failing when its encoding exceeds 32 bytes.
    pub fn checked_int(value: BigInt) -> VmResult<Self> {
        let size = encoded_integer_len(&value);
        if size > MAX_INTEGER_SIZE {
            return Err(VmError::ItemTooLarge {
                size,
                limit: MAX_INTEGER_SIZE,
            });
        }
        Ok(StackItem::Integer(value))
    }

    pub fn from_byte_string<T: Into<Vec<u8>>>(value: T) -> Self {
        StackItem::ByteString(value.into())
    }

    pub fn from_buffer<T: Into<Vec<u8>>>(value: T) -> Self {
        StackItem::Buffer(Rc::new(RefCell::new(value.into())))
    }

    pub fn from_array(items: Vec<StackItem>) -> Self {
        StackItem::Array(Array::new(items))
    }

    pub fn from_struct(items: Vec<StackItem>) -> Self {
        StackItem::Struct(Struct::new(items))
    }

    pub fn from_map(entries: impl IntoIterator<Item = (StackItem, StackItem)>) -> Self {
        StackItem::Map(Map::from_entries(entries))
    }

    pub fn from_interface<T: InteropObject + 'static>(value: T) -> Self {
        StackItem::InteropInterface(Rc::new(RefCell::new(value)))
    }

    /// Returns the type tag.
    pub fn stack_item_type(&self) -> StackItemType {
        match self {
            StackItem::Null => StackItemType::Any,
            StackItem::Boolean(_) => StackItemType::Boolean,
            StackItem::Integer(_) => StackItemType::Integer,
            StackItem::ByteString(_) => StackItemType::ByteString,
            StackItem::Buffer(_) => StackItemType::Buffer,
            StackItem::Array(_) => StackItemType::Array,
            StackItem::Struct(_) => StackItemType::Struct,
            StackItem::Map(_) => StackItemType::Map,
            StackItem::Pointer { .. } => StackItemType::Pointer,
            StackItem::InteropInterface(_) => StackItemType::InteropInterface,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StackItem::Null)
    }

    /// Boolean, Integer or ByteString.
    pub fn is_primitive(&self) -> bool {
        self.stack_item_type().is_primitive()
    }

    pub fn is_compound(&self) -> bool {
        self.stack_item_type().is_compound()
    }

    /// Truthiness used by conditional jumps and logic opcodes.
    pub fn get_boolean(&self) -> VmResult<bool> {
        match self {
            StackItem::Null => Ok(false),
            StackItem::Boolean(value) => Ok(*value),
            StackItem::Integer(value) => Ok(!value.is_zero()),
            StackItem::ByteString(bytes) => {
                if bytes.len() > MAX_INTEGER_SIZE {
                    return Err(VmError::InvalidCast {
                        from: StackItemType::ByteString,
                        to: StackItemType::Boolean,
                    });
                }
                Ok(bytes.iter().any(|b| *b != 0))
            }
            _ => Ok(true),
        }
    }

    /// Numeric value of Boolean, Integer and short ByteString items.
    pub fn get_integer(&self) -> VmResult<BigInt> {
        match self {
            StackItem::Boolean(value) => Ok(if *value { BigInt::one() } else { BigInt::zero() }),
            StackItem::Integer(value) => Ok(value.clone()),
            StackItem::ByteString(bytes) => {
                if bytes.len() > MAX_INTEGER_SIZE {
                    return Err(VmError::InvalidCast {
                        from: StackItemType::ByteString,
                        to: StackItemType::Integer,
                    });
                }
                Ok(BigInt::from_signed_bytes_le(bytes))
            }
            other => Err(VmError::InvalidType {
                expected: "Integer",
                actual: other.stack_item_type(),
            }),
        }
    }

    /// Integer value that must fit an `i64`.
    pub fn get_i64(&self) -> VmResult<i64> {
        let value = self.get_integer()?;
        i64::try_from(&value).map_err(|_| VmError::out_of_range(format!("{value} does not fit i64")))
    }

    /// Byte representation of primitive and Buffer items.
    pub fn get_bytes(&self) -> VmResult<Vec<u8>> {
        match self {
            StackItem::Boolean(value) => Ok(vec![u8::from(*value)]),
            StackItem::Integer(value) => Ok(encode_integer(value)),
            StackItem::ByteString(bytes) => Ok(bytes.clone()),
            StackItem::Buffer(buffer) => Ok(buffer.borrow().clone()),
            other => Err(VmError::InvalidType {
                expected: "ByteString or Buffer",
                actual: other.stack_item_type(),
            }),
        }
    }

    /// UTF-8 decoding of [`StackItem::get_bytes`].
    pub fn get_string(&self) -> VmResult<String> {
        String::from_utf8(self.get_bytes()?)
            .map_err(|_| VmError::invalid_operation("byte string is not valid UTF-8"))
    }

    /// Size in bytes of a primitive or buffer, element count of a compound.
    pub fn size(&self) -> VmResult<usize> {
        match self {
            StackItem::Boolean(_) => Ok(1),
            StackItem::Integer(value) => Ok(encoded_integer_len(value)),
            StackItem::ByteString(bytes) => Ok(bytes.len()),
            StackItem::Buffer(buffer) => Ok(buffer.borrow().len()),
            StackItem::Array(array) => Ok(array.len()),
            StackItem::Struct(s) => Ok(s.len()),
            StackItem::Map(map) => Ok(map.len()),
            other => Err(VmError::InvalidType {
                expected: "a sized item",
                actual: other.stack_item_type(),
            }),
        }
    }

    /// Converts to another type following the `CONVERT` rules.
    pub fn convert_to(&self, target: StackItemType) -> VmResult<StackItem> {
        let source = self.stack_item_type();
        if target == StackItemType::Any {
            return Err(VmError::InvalidCast { from: source, to: target });
        }
        if self.is_null() {
            return Ok(StackItem::Null);
        }
        if source == target {
            return Ok(self.clone());
        }
        if target == StackItemType::Boolean {
            return Ok(StackItem::Boolean(self.get_boolean()?));
        }
        let invalid = || VmError::InvalidCast { from: source, to: target };
        match (self, target) {
            (StackItem::Boolean(_) | StackItem::Integer(_) | StackItem::ByteString(_), _) => {
                match target {
                    StackItemType::Integer => Ok(StackItem::Integer(self.get_integer()?)),
                    StackItemType::ByteString => Ok(StackItem::ByteString(self.get_bytes()?)),
                    StackItemType::Buffer => Ok(StackItem::from_buffer(self.get_bytes()?)),
                    _ => Err(invalid()),
                }
            }
            (StackItem::Buffer(buffer), StackItemType::Integer) => {
                let bytes = buffer.borrow();
                if bytes.len() > MAX_INTEGER_SIZE {
                    return Err(invalid());
                }
                Ok(StackItem::Integer(BigInt::from_signed_bytes_le(&bytes)))
            }
            (StackItem::Buffer(buffer), StackItemType::ByteString) => {
                Ok(StackItem::ByteString(buffer.borrow().clone()))
            }
            (StackItem::Array(array), StackItemType::Struct) => {
                Ok(StackItem::Struct(Struct::new(array.to_vec())))
            }
            (StackItem::Struct(s), StackItemType::Array) => {
                Ok(StackItem::Array(Array::new(s.to_vec())))
            }
            _ => Err(invalid()),
        }
    }

    /// `EQUAL` semantics with the comparison budget of the engine.
    ///
    /// Byte strings larger than `max_comparable_size` cannot be compared,
    /// and struct comparison visits at most `max_items` elements.
    pub fn equals_with_limits(
        &self,
        other: &StackItem,
        max_comparable_size: usize,
        max_items: usize,
    ) -> VmResult<bool> {
        let mut comparable = max_comparable_size as isize;
        let mut items = max_items as isize;
        self.equals_counted(other, &mut comparable, &mut items)
    }

    fn equals_counted(
        &self,
        other: &StackItem,
        comparable: &mut isize,
        items: &mut isize,
    ) -> VmResult<bool> {
        match (self, other) {
            (StackItem::ByteString(a), StackItem::ByteString(b)) => {
                let size = a.len().max(b.len()) as isize;
                *comparable -= size;
                if *comparable < 0 {
                    return Err(VmError::invalid_operation("the operand exceeds the maximum comparable size"));
                }
                Ok(a == b)
            }
            (StackItem::Struct(a), StackItem::Struct(b)) => {
                if a.ptr_eq(b) {
                    return Ok(true);
                }
                let (left, right) = (a.to_vec(), b.to_vec());
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (x, y) in left.iter().zip(right.iter()) {
                    *items -= 1;
                    if *items < 0 {
                        return Err(VmError::invalid_operation("too many struct items to compare"));
                    }
                    if !x.equals_counted(y, comparable, items)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(self == other),
        }
    }

    /// Validates a map key: a primitive of at most 64 bytes.
    pub fn check_map_key(&self) -> VmResult<()> {
        if !self.is_primitive() {
            return Err(VmError::InvalidType {
                expected: "a primitive map key",
                actual: self.stack_item_type(),
            });
        }
        let size = self.size()?;
        if size > MAX_KEY_SIZE {
            return Err(VmError::ItemTooLarge {
                size,
                limit: MAX_KEY_SIZE,
            });
        }
        Ok(())
    }

    /// Identity of a compound item, if any.
    pub fn compound_id(&self) -> Option<usize> {
        match self {
            StackItem::Array(a) => Some(a.id()),
            StackItem::Struct(s) => Some(s.id()),
            StackItem::Map(m) => Some(m.id()),
            _ => None,
        }
    }

    /// Direct children of a compound item. Map keys and values are both
    /// children.
    pub fn sub_items(&self) -> Vec<StackItem> {
        match self {
            StackItem::Array(a) => a.to_vec(),
            StackItem::Struct(s) => s.to_vec(),
            StackItem::Map(m) => m
                .borrow()
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of child references a compound holds.
    pub fn sub_items_count(&self) -> usize {
        match self {
            StackItem::Array(a) => a.len(),
            StackItem::Struct(s) => s.len(),
            StackItem::Map(m) => m.len() * 2,
            _ => 0,
        }
    }
}

/// Minimal little-endian two's-complement encoding; zero encodes as empty.
pub fn encode_integer(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_signed_bytes_le()
    }
}

fn encoded_integer_len(value: &BigInt) -> usize {
    if value.is_zero() {
        0
    } else {
        value.to_signed_bytes_le().len()
    }
}

impl PartialEq for StackItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StackItem::Null, StackItem::Null) => true,
            (StackItem::Boolean(a), StackItem::Boolean(b)) => a == b,
            (StackItem::Integer(a), StackItem::Integer(b)) => a == b,
            (StackItem::ByteString(a), StackItem::ByteString(b)) => a == b,
            (StackItem::Buffer(a), StackItem::Buffer(b)) => Rc::ptr_eq(a, b),
            (StackItem::Array(a), StackItem::Array(b)) => a.ptr_eq(b),
            (StackItem::Struct(_), StackItem::Struct(_)) => self
                .equals_with_limits(other, MAX_COMPARABLE_SIZE, 2048)
                .unwrap_or(false),
            (StackItem::Map(a), StackItem::Map(b)) => a.ptr_eq(b),
            (
                StackItem::Pointer { script: sa, position: pa },
                StackItem::Pointer { script: sb, position: pb },
            ) => pa == pb && sa.ptr_eq(sb),
            (StackItem::InteropInterface(a), StackItem::InteropInterface(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl Eq for StackItem {}

impl Hash for StackItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.stack_item_type() as u8).hash(state);
        match self {
            StackItem::Null | StackItem::Struct(_) => {}
            StackItem::Boolean(value) => value.hash(state),
            StackItem::Integer(value) => value.hash(state),
            StackItem::ByteString(bytes) => bytes.hash(state),
            StackItem::Buffer(buffer) => (Rc::as_ptr(buffer) as *const () as usize).hash(state),
            StackItem::Array(array) => array.id().hash(state),
            StackItem::Map(map) => map.id().hash(state),
            StackItem::Pointer { position, .. } => position.hash(state),
            StackItem::InteropInterface(object) => {
                (Rc::as_ptr(object) as *const () as usize).hash(state)
            }
        }
    }
}

impl fmt::Debug for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackItem::Null => write!(f, "Null"),
            StackItem::Boolean(value) => write!(f, "Boolean({value})"),
            StackItem::Integer(value) => write!(f, "Integer({value})"),
            StackItem::ByteString(bytes) => write!(f, "ByteString({})", hex_string(bytes)),
            StackItem::Buffer(buffer) => write!(f, "Buffer({})", hex_string(&buffer.borrow())),
            // Compounds print their size only; they may be cyclic.
            StackItem::Array(array) => write!(f, "Array(len={})", array.len()),
            StackItem::Struct(s) => write!(f, "Struct(len={})", s.len()),
            StackItem::Map(map) => write!(f, "Map(len={})", map.len()),
            StackItem::Pointer { position, .. } => write!(f, "Pointer({position})"),
            StackItem::InteropInterface(object) => match object.try_borrow() {
                Ok(inner) => write!(f, "InteropInterface({})", inner.interface_type()),
                Err(_) => write!(f, "InteropInterface(<borrowed>)"),
            },
        }
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array(len={})", self.len())
    }
}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Struct(len={})", self.len())
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Map(len={})", self.len())
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl From<bool> for StackItem {
    fn from(value: bool) -> Self {
        StackItem::Boolean(value)
    }
}

impl From<BigInt> for StackItem {
    fn from(value: BigInt) -> Self {
        StackItem::Integer(value)
    }
}

impl From<i64> for StackItem {
    fn from(value: i64) -> Self {
        StackItem::Integer(value.into())
    }
}

impl From<Vec<u8>> for StackItem {
    fn from(value: Vec<u8>) -> Self {
        StackItem::ByteString(value)
    }
}

impl From<&str> for StackItem {
    fn from(value: &str) -> Self {
        StackItem::ByteString(value.as_bytes().to_vec())
    }
}
