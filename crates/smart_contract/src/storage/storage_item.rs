//! Storage values.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Represents a value in the contract storage system.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageItem {
    /// The stored bytes.
    pub value: Vec<u8>,
}

impl StorageItem {
    /// Creates a new storage item.
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Creates an item holding an integer in the NeoVM encoding
    /// (little-endian two's complement, empty for zero).
    pub fn from_bigint(value: &BigInt) -> Self {
        Self::new(neo_vm::stack_item::encode_integer(value))
    }

    pub fn from_i64(value: i64) -> Self {
        Self::from_bigint(&BigInt::from(value))
    }

    /// Decodes the value as an integer.
    pub fn to_bigint(&self) -> BigInt {
        if self.value.is_empty() {
            BigInt::from(0)
        } else {
            BigInt::from_signed_bytes_le(&self.value)
        }
    }

    /// Replaces the value with an encoded integer.
    pub fn set_bigint(&mut self, value: &BigInt) {
        self.value = neo_vm::stack_item::encode_integer(value);
    }

    /// Checks if the storage item is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Gets the length of the value.
    pub fn len(&self) -> usize {
        self.value.len()
    }
}

impl From<Vec<u8>> for StorageItem {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_use_the_vm_encoding() {
        assert!(StorageItem::from_i64(0).is_empty());
        assert_eq!(StorageItem::from_i64(255).value, vec![0xff, 0x00]);
        assert_eq!(StorageItem::from_i64(-1).value, vec![0xff]);
        assert_eq!(StorageItem::new(vec![0x00, 0x01]).to_bigint(), BigInt::from(256));

        let mut item = StorageItem::default();
        item.set_bigint(&BigInt::from(1_000_000));
        assert_eq!(item.to_bigint(), BigInt::from(1_000_000));
    }
}
