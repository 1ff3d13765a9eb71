//! Contract storage access: storage contexts, find options and iterators.

use super::{script_hash_of, storage_put_fee, EngineHost, ExecutionContextState};
use crate::native::contract_management;
use crate::storage::{
    SeekDirection, StorageItem, StorageKey, MAX_STORAGE_KEY_SIZE, MAX_STORAGE_VALUE_SIZE,
};
use crate::{Error, Result};
use bitflags::bitflags;
use neo_vm::{ExecutionEngine, InteropObject, StackItem};
use std::any::Any;
use tracing::trace;

/// Handle scripts use to address the storage of one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageContext {
    /// Id of the contract that owns the storage.
    pub id: i32,
    pub is_read_only: bool,
}

impl StorageContext {
    pub fn new(id: i32, is_read_only: bool) -> Self {
        Self { id, is_read_only }
    }

    pub fn as_read_only(self) -> Self {
        Self {
            is_read_only: true,
            ..self
        }
    }
}

impl InteropObject for StorageContext {
    fn interface_type(&self) -> &str {
        "StorageContext"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

bitflags! {
    /// Options of `System.Storage.Find`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FindOptions: u8 {
        const NONE = 0;
        /// Yield keys only.
        const KEYS_ONLY = 1 << 0;
        /// Strip the search prefix from yielded keys.
        const REMOVE_PREFIX = 1 << 1;
        /// Yield values only.
        const VALUES_ONLY = 1 << 2;
        /// Deserialize values into stack items.
        const DESERIALIZE_VALUES = 1 << 3;
        /// Yield field 0 of deserialized values.
        const PICK_FIELD_0 = 1 << 4;
        /// Yield field 1 of deserialized values.
        const PICK_FIELD_1 = 1 << 5;
        /// Iterate in descending key order.
        const BACKWARDS = 1 << 7;
    }
}

impl FindOptions {
    /// Parses a script value and rejects contradictory combinations.
    pub fn from_script_value(value: i64) -> Result<Self> {
        let options = u8::try_from(value)
            .ok()
            .and_then(Self::from_bits)
            .ok_or_else(|| Error::invalid_argument(format!("invalid find options {value}")))?;
        let picks = Self::PICK_FIELD_0 | Self::PICK_FIELD_1;
        if options.contains(Self::KEYS_ONLY)
            && options.intersects(Self::VALUES_ONLY | Self::DESERIALIZE_VALUES | picks)
        {
            return Err(Error::invalid_argument("KeysOnly cannot be combined with value options"));
        }
        if options.contains(Self::VALUES_ONLY)
            && options.intersects(Self::KEYS_ONLY | Self::REMOVE_PREFIX)
        {
            return Err(Error::invalid_argument("ValuesOnly cannot be combined with key options"));
        }
        if options.contains(picks) {
            return Err(Error::invalid_argument("PickField0 and PickField1 are exclusive"));
        }
        if options.intersects(picks) && !options.contains(Self::DESERIALIZE_VALUES) {
            return Err(Error::invalid_argument("PickField requires DeserializeValues"));
        }
        if options.contains(Self::DESERIALIZE_VALUES) {
            return Err(Error::invalid_argument("DeserializeValues is not supported"));
        }
        Ok(options)
    }
}

/// Iterator returned by `System.Storage.Find`.
#[derive(Debug, Clone)]
pub struct StorageIterator {
    entries: Vec<(StorageKey, StorageItem)>,
    prefix_length: usize,
    options: FindOptions,
    /// Index of the current entry plus one; zero before the first `next`.
    position: usize,
}

impl StorageIterator {
    pub fn new(
        entries: Vec<(StorageKey, StorageItem)>,
        prefix_length: usize,
        options: FindOptions,
    ) -> Self {
        Self {
            entries,
            prefix_length,
            options,
            position: 0,
        }
    }

    /// Advances to the next entry. Returns `false` once exhausted.
    pub fn next(&mut self) -> bool {
        if self.position < self.entries.len() {
            self.position += 1;
            true
        } else {
            self.position = self.entries.len() + 1;
            false
        }
    }

    /// The current entry shaped by the find options.
    pub fn value(&self) -> Result<StackItem> {
        let (key, item) = self
            .position
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .ok_or_else(|| Error::invalid_operation("iterator is not positioned on an entry"))?;
        let mut key_bytes = key.key.as_slice();
        if self.options.contains(FindOptions::REMOVE_PREFIX) {
            key_bytes = &key_bytes[self.prefix_length.min(key_bytes.len())..];
        }
        let key = StackItem::from_byte_string(key_bytes);
        let value = StackItem::from_byte_string(item.value.clone());
        Ok(if self.options.contains(FindOptions::KEYS_ONLY) {
            key
        } else if self.options.contains(FindOptions::VALUES_ONLY) {
            value
        } else {
            StackItem::from_struct(vec![key, value])
        })
    }
}

impl InteropObject for StorageIterator {
    fn interface_type(&self) -> &str {
        "StorageIterator"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EngineHost {
    /// Storage context of the executing contract.
    pub fn storage_context(&self, engine: &ExecutionEngine, read_only: bool) -> Result<StorageContext> {
        let context = engine.current_context_or_err()?;
        let id = match ExecutionContextState::of(context).contract {
            Some(contract) => contract.id,
            None => {
                let hash = script_hash_of(context);
                match contract_management::get_contract(self.snapshot(), &hash)? {
                    Some(contract) => contract.id,
                    None => self
                        .natives()
                        .get(&hash)
                        .map(|native| native.id())
                        .ok_or_else(|| {
                            Error::invalid_operation(format!("contract {hash} has no storage"))
                        })?,
                }
            }
        };
        Ok(StorageContext::new(id, read_only))
    }

    pub fn storage_get(&self, context: &StorageContext, key: &[u8]) -> Option<Vec<u8>> {
        self.snapshot()
            .get(&StorageKey::new(context.id, key.to_vec()))
            .map(|item| item.value)
    }

    /// Writes `value` under `key`, charging the storage fee first.
    pub fn storage_put(
        &mut self,
        engine: &mut ExecutionEngine,
        context: &StorageContext,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        if key.len() > MAX_STORAGE_KEY_SIZE {
            return Err(Error::invalid_argument(format!("storage key of {} bytes", key.len())));
        }
        if value.len() > MAX_STORAGE_VALUE_SIZE {
            return Err(Error::invalid_argument(format!(
                "storage value of {} bytes",
                value.len()
            )));
        }
        if context.is_read_only {
            return Err(Error::invalid_operation("storage context is read-only"));
        }
        let storage_key = StorageKey::new(context.id, key.to_vec());
        let old_len = self.snapshot().get(&storage_key).map(|item| item.len());
        engine.add_fee(storage_put_fee(key.len(), old_len, value.len(), self.storage_price()))?;
        trace!(key = %storage_key, len = value.len(), "storage put");
        self.snapshot_mut()
            .put(storage_key, StorageItem::new(value.to_vec()));
        Ok(())
    }

    pub fn storage_delete(&mut self, context: &StorageContext, key: &[u8]) -> Result<()> {
        if context.is_read_only {
            return Err(Error::invalid_operation("storage context is read-only"));
        }
        self.snapshot_mut()
            .delete(&StorageKey::new(context.id, key.to_vec()));
        Ok(())
    }

    /// Entries of `context` whose key starts with `prefix`.
    pub fn storage_find(
        &self,
        context: &StorageContext,
        prefix: &[u8],
        options: FindOptions,
    ) -> StorageIterator {
        let direction = if options.contains(FindOptions::BACKWARDS) {
            SeekDirection::Backward
        } else {
            SeekDirection::Forward
        };
        let entries = self
            .snapshot()
            .find(&StorageKey::new(context.id, prefix.to_vec()), direction);
        StorageIterator::new(entries, prefix.len(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<(StorageKey, StorageItem)> {
        vec![
            (StorageKey::new(1, vec![0xaa, 0x01]), StorageItem::new(vec![0x10])),
            (StorageKey::new(1, vec![0xaa, 0x02]), StorageItem::new(vec![0x20])),
        ]
    }

    #[test]
    fn find_option_combinations() {
        assert!(FindOptions::from_script_value(0).is_ok());
        assert!(FindOptions::from_script_value(0x83).is_ok());
        assert!(FindOptions::from_script_value(0x05).is_err());
        assert!(FindOptions::from_script_value(0x06).is_err());
        assert!(FindOptions::from_script_value(0x10).is_err());
        assert!(FindOptions::from_script_value(0x40).is_err());
        assert!(FindOptions::from_script_value(256).is_err());
    }

    #[test]
    fn iterator_shapes_entries() {
        let mut iterator = StorageIterator::new(entries(), 1, FindOptions::NONE);
        assert!(iterator.value().is_err());
        assert!(iterator.next());
        assert_eq!(
            iterator.value().unwrap(),
            StackItem::from_struct(vec![
                StackItem::from_byte_string(vec![0xaa, 0x01]),
                StackItem::from_byte_string(vec![0x10]),
            ])
        );

        let mut keys = StorageIterator::new(
            entries(),
            1,
            FindOptions::KEYS_ONLY | FindOptions::REMOVE_PREFIX,
        );
        assert!(keys.next());
        assert!(keys.next());
        assert_eq!(keys.value().unwrap(), StackItem::from_byte_string(vec![0x02]));
        assert!(!keys.next());
        assert!(keys.value().is_err());

        let mut values = StorageIterator::new(entries(), 1, FindOptions::VALUES_ONLY);
        values.next();
        assert_eq!(values.value().unwrap(), StackItem::from_byte_string(vec![0x10]));
    }
}
