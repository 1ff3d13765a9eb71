//! Contract storage: keys, values and the [`DataCache`] collaborator.

pub mod data_cache;
pub mod storage_item;
pub mod storage_key;

pub use data_cache::{DataCache, MemoryStore, SeekDirection};
pub use storage_item::StorageItem;
pub use storage_key::StorageKey;

/// Maximum size of a storage key written by a contract.
pub const MAX_STORAGE_KEY_SIZE: usize = 64;

/// Maximum size of a storage value written by a contract.
pub const MAX_STORAGE_VALUE_SIZE: usize = u16::MAX as usize;
