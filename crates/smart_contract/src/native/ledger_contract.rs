//! Native ledger contract: exposes the chain tip to scripts.
//!
//! Blocks and transactions are persisted by the node, which records each new
//! tip through [`set_current_block`].

use super::native_contract::{MethodTable, NativeArgs, NativeContract, NativeMethod, NativeValue};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::storage::{DataCache, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_core::{UInt256, UInt160};
use neo_vm::{CallFlags, ExecutionEngine};

/// Storage id of LedgerContract.
pub const ID: i32 = -4;

/// Prefix for block-hash-by-index storage
const PREFIX_BLOCK_HASH: u8 = 9;
/// Prefix for the current block pointer
const PREFIX_CURRENT_BLOCK: u8 = 12;

/// LedgerContract native contract
pub struct LedgerContract {
    methods: MethodTable,
}

impl Default for LedgerContract {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerContract {
    const CPU_FEE: i64 = 1 << 15;

    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods
            .register_method("currentHash", Self::current_hash, Self::CPU_FEE, 0, CallFlags::READ_STATES, None)
            .returns(T::Hash256);
        methods
            .register_method("currentIndex", Self::current_index, Self::CPU_FEE, 0, CallFlags::READ_STATES, None)
            .returns(T::Integer);
        Self { methods }
    }

    fn current_hash(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(current_block(host.snapshot())?
            .map_or(NativeValue::Null, |(hash, _)| hash.into()))
    }

    fn current_index(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(current_block(host.snapshot())?
            .map_or(NativeValue::Null, |(_, index)| index.into()))
    }
}

impl NativeContract for LedgerContract {
    fn id(&self) -> i32 {
        ID
    }

    fn name(&self) -> &'static str {
        "LedgerContract"
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }
}

/// Records `hash` at `index` as the chain tip.
pub fn set_current_block(snapshot: &mut dyn DataCache, hash: &UInt256, index: u32) {
    let mut value = hash.to_vec();
    value.extend_from_slice(&index.to_le_bytes());
    snapshot.put(
        StorageKey::create(ID, PREFIX_BLOCK_HASH).add_u32_be(index),
        StorageItem::new(hash.to_vec()),
    );
    snapshot.put(StorageKey::create(ID, PREFIX_CURRENT_BLOCK), StorageItem::new(value));
}

/// The chain tip as `(hash, index)`, if any block was recorded.
pub fn current_block(snapshot: &dyn DataCache) -> Result<Option<(UInt256, u32)>> {
    let Some(item) = snapshot.get(&StorageKey::create(ID, PREFIX_CURRENT_BLOCK)) else {
        return Ok(None);
    };
    if item.value.len() != 36 {
        return Err(Error::StorageError(format!(
            "current block record has {} bytes",
            item.value.len()
        )));
    }
    let hash = UInt256::from_bytes(&item.value[..32])?;
    let index = u32::from_le_bytes([item.value[32], item.value[33], item.value[34], item.value[35]]);
    Ok(Some((hash, index)))
}

/// Index of the chain tip.
pub fn current_index(snapshot: &dyn DataCache) -> Option<u32> {
    current_block(snapshot).ok().flatten().map(|(_, index)| index)
}

/// Hash of the block at `index`.
pub fn block_hash(snapshot: &dyn DataCache, index: u32) -> Result<Option<UInt256>> {
    snapshot
        .get(&StorageKey::create(ID, PREFIX_BLOCK_HASH).add_u32_be(index))
        .map(|item| UInt256::from_bytes(&item.value).map_err(Error::from))
        .transpose()
}

/// Hash of LedgerContract.
pub fn hash() -> UInt160 {
    super::native_hash("LedgerContract")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::test_support::{call, genesis, open_engine, result, settings};
    use crate::storage::MemoryStore;
    use neo_vm::{StackItem, VMState};

    #[test]
    fn tip_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(current_index(&store), None);
        let hash = UInt256::from_array([7; 32]);
        set_current_block(&mut store, &hash, 42);
        assert_eq!(current_block(&store).unwrap(), Some((hash, 42)));
        assert_eq!(current_index(&store), Some(42));
        assert_eq!(block_hash(&store, 42).unwrap(), Some(hash));
        assert_eq!(block_hash(&store, 41).unwrap(), None);
    }

    #[test]
    fn hash_matches_the_network() {
        assert_eq!(
            hash().to_string(),
            "0xda65b600f7124ce6c79950c1772a36403104f2be"
        );
    }

    #[test]
    fn scripts_read_the_tip() {
        let settings = settings(1);
        let mut store = genesis(&settings);
        set_current_block(store.as_mut(), &UInt256::from_array([1; 32]), 7);
        let mut engine = open_engine(&settings, store, Vec::new());
        assert_eq!(call(&mut engine, "LedgerContract", "currentIndex", vec![]), VMState::HALT);
        assert_eq!(result(&engine), StackItem::from_int(7));
    }
}
