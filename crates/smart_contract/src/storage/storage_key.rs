//! Storage keys scoped to a contract id.

use neo_core::UInt160;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a key in the contract storage system.
///
/// Keys order by contract id first and then bytewise, which is the order
/// `Find` iterates in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct StorageKey {
    /// The id of the contract that owns this key.
    pub id: i32,

    /// The key data.
    pub key: Vec<u8>,
}

impl StorageKey {
    /// Creates a new storage key.
    pub fn new(id: i32, key: Vec<u8>) -> Self {
        Self { id, key }
    }

    /// Creates a key holding only a one-byte prefix, the layout native
    /// contracts use for their records.
    pub fn create(id: i32, prefix: u8) -> Self {
        Self::new(id, vec![prefix])
    }

    /// Appends raw bytes.
    pub fn add(mut self, data: &[u8]) -> Self {
        self.key.extend_from_slice(data);
        self
    }

    /// Appends a script hash.
    pub fn add_hash(self, hash: &UInt160) -> Self {
        self.add(hash.as_bytes())
    }

    /// Appends a big-endian integer so numeric keys sort by value.
    pub fn add_u32_be(self, value: u32) -> Self {
        self.add(&value.to_be_bytes())
    }

    /// Appends a big-endian signed integer.
    pub fn add_i32_be(self, value: i32) -> Self {
        self.add(&value.to_be_bytes())
    }

    /// Checks if this key has a specific prefix.
    pub fn has_prefix(&self, prefix: &[u8]) -> bool {
        self.key.starts_with(prefix)
    }

    /// Gets the size of the key data in bytes.
    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, hex::encode(&self.key))
    }
}
