//! ContractManagement native contract.
//!
//! Owns the registry of contract records, including the records of the
//! native contracts themselves, which it writes when they are initialized.

use super::native_contract::{assert_committee, MethodTable, NativeArgs, NativeContract, NativeEvent, NativeMethod, NativeValue};
use crate::application_engine::{EngineHost, FindOptions, StorageIterator};
use crate::contract_parameter_type::ContractParameterType as T;
use crate::contract_state::ContractState;
use crate::storage::{DataCache, SeekDirection, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_core::{Hardfork, UInt160};
use neo_vm::{CallFlags, ExecutionEngine, StackItem};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use std::sync::Arc;
use tracing::{debug, info};

/// Storage id of ContractManagement.
pub const ID: i32 = -1;

const PREFIX_MINIMUM_DEPLOYMENT_FEE: u8 = 20;
const PREFIX_NEXT_AVAILABLE_ID: u8 = 15;
const PREFIX_CONTRACT: u8 = 8;
const PREFIX_CONTRACT_HASH: u8 = 12;

/// Default minimum deployment fee (10 GAS).
pub const DEFAULT_MINIMUM_DEPLOYMENT_FEE: i64 = 10_0000_0000;

/// ContractManagement native contract
pub struct ContractManagement {
    methods: MethodTable,
}

impl Default for ContractManagement {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractManagement {
    const CPU_FEE: i64 = 1 << 15;

    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods
            .register_method("getContract", Self::get_contract, Self::CPU_FEE, 0, CallFlags::READ_STATES, None)
            .params(&[("hash", T::Hash160)])
            .returns(T::Array);
        methods
            .register_method("getContractById", Self::get_contract_by_id, Self::CPU_FEE, 0, CallFlags::READ_STATES, None)
            .params(&[("id", T::Integer)])
            .returns(T::Array);
        methods
            .register_method("getContractHashes", Self::get_contract_hashes, Self::CPU_FEE, 0, CallFlags::READ_STATES, None)
            .returns(T::InteropInterface);
        methods
            .register_method("hasMethod", Self::has_method, Self::CPU_FEE, 0, CallFlags::READ_STATES, None)
            .params(&[("hash", T::Hash160), ("method", T::String), ("pcount", T::Integer)])
            .returns(T::Boolean);
        methods
            .register_method("isContract", Self::is_contract, 1 << 14, 0, CallFlags::READ_STATES, Some(Hardfork::HF_Echidna))
            .params(&[("hash", T::Hash160)])
            .returns(T::Boolean);
        methods
            .register_method("getMinimumDeploymentFee", Self::get_minimum_deployment_fee, Self::CPU_FEE, 0, CallFlags::READ_STATES, None)
            .returns(T::Integer);
        methods
            .register_method("setMinimumDeploymentFee", Self::set_minimum_deployment_fee, Self::CPU_FEE, 0, CallFlags::STATES, None)
            .params(&[("value", T::Integer)]);
        Self { methods }
    }

    fn get_contract(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let hash = args.hash160(0)?;
        Ok(match self::get_contract(host.snapshot(), &hash)? {
            Some(contract) => NativeValue::Item(contract.to_stack_item()?),
            None => NativeValue::Null,
        })
    }

    fn get_contract_by_id(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let Some(id) = args.integer(0)?.to_i32() else {
            return Ok(NativeValue::Null);
        };
        Ok(match self::get_contract_by_id(host.snapshot(), id)? {
            Some(contract) => NativeValue::Item(contract.to_stack_item()?),
            None => NativeValue::Null,
        })
    }

    /// Iterator of `[id, hash]` for every deployed, non-native contract.
    fn get_contract_hashes(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        let prefix = StorageKey::create(ID, PREFIX_CONTRACT_HASH);
        let entries = host
            .snapshot()
            .find(&prefix, SeekDirection::Forward)
            .into_iter()
            .filter(|(key, _)| {
                key.key
                    .get(1..5)
                    .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
                    .is_some_and(|bytes| i32::from_be_bytes(bytes) >= 0)
            })
            .collect();
        let iterator = StorageIterator::new(entries, 1, FindOptions::REMOVE_PREFIX);
        Ok(NativeValue::Item(StackItem::from_interface(iterator)))
    }

    fn has_method(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let hash = args.hash160(0)?;
        let method = args.string(1)?;
        let count = args.integer(2)?.to_i32().unwrap_or(i32::MIN);
        let found = self::get_contract(host.snapshot(), &hash)?
            .is_some_and(|contract| contract.manifest.abi.get_method(&method, count).is_some());
        Ok(found.into())
    }

    fn is_contract(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let hash = args.hash160(0)?;
        Ok(self::get_contract(host.snapshot(), &hash)?.is_some().into())
    }

    fn get_minimum_deployment_fee(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(minimum_deployment_fee(host.snapshot()).into())
    }

    fn set_minimum_deployment_fee(host: &mut EngineHost, engine: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let value = args.integer(0)?;
        if value.is_negative() {
            return Err(Error::invalid_argument(format!("minimum deployment fee {value} is negative")));
        }
        assert_committee(host, engine)?;
        host.snapshot_mut().put(
            StorageKey::create(ID, PREFIX_MINIMUM_DEPLOYMENT_FEE),
            StorageItem::from_bigint(&value),
        );
        Ok(NativeValue::Void)
    }
}

impl NativeContract for ContractManagement {
    fn id(&self) -> i32 {
        ID
    }

    fn name(&self) -> &'static str {
        "ContractManagement"
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }

    fn events(&self) -> Vec<NativeEvent> {
        vec![
            NativeEvent::new("Deploy", &[("Hash", T::Hash160)]),
            NativeEvent::new("Update", &[("Hash", T::Hash160)]),
            NativeEvent::new("Destroy", &[("Hash", T::Hash160)]),
        ]
    }

    fn initialize(&self, host: &mut EngineHost, _: &ExecutionEngine, hardfork: Option<Hardfork>) -> Result<()> {
        if hardfork.is_none() {
            let snapshot = host.snapshot_mut();
            snapshot.put(
                StorageKey::create(ID, PREFIX_MINIMUM_DEPLOYMENT_FEE),
                StorageItem::from_i64(DEFAULT_MINIMUM_DEPLOYMENT_FEE),
            );
            snapshot.put(
                StorageKey::create(ID, PREFIX_NEXT_AVAILABLE_ID),
                StorageItem::from_i64(1),
            );
        }
        Ok(())
    }
}

fn contract_key(hash: &UInt160) -> StorageKey {
    StorageKey::create(ID, PREFIX_CONTRACT).add_hash(hash)
}

fn contract_hash_key(id: i32) -> StorageKey {
    StorageKey::create(ID, PREFIX_CONTRACT_HASH).add_i32_be(id)
}

/// Reads the record of the contract deployed at `hash`.
pub fn get_contract(snapshot: &dyn DataCache, hash: &UInt160) -> Result<Option<ContractState>> {
    snapshot
        .get(&contract_key(hash))
        .map(|item| serde_json::from_slice(&item.value).map_err(Error::from))
        .transpose()
}

/// Reads the record of the contract with storage id `id`.
pub fn get_contract_by_id(snapshot: &dyn DataCache, id: i32) -> Result<Option<ContractState>> {
    let Some(item) = snapshot.get(&contract_hash_key(id)) else {
        return Ok(None);
    };
    get_contract(snapshot, &UInt160::from_bytes(&item.value)?)
}

/// Writes `contract` and its id index.
pub fn put_contract(snapshot: &mut dyn DataCache, contract: &ContractState) -> Result<()> {
    snapshot.put(
        contract_key(&contract.hash),
        StorageItem::new(serde_json::to_vec(contract)?),
    );
    snapshot.put(
        contract_hash_key(contract.id),
        StorageItem::new(contract.hash.to_vec()),
    );
    Ok(())
}

/// Minimum fee to deploy a contract, in datoshi.
pub fn minimum_deployment_fee(snapshot: &dyn DataCache) -> BigInt {
    snapshot
        .get(&StorageKey::create(ID, PREFIX_MINIMUM_DEPLOYMENT_FEE))
        .map_or_else(|| BigInt::from(DEFAULT_MINIMUM_DEPLOYMENT_FEE), |item| item.to_bigint())
}

/// Hardforks activating at `height` that `native` uses, or `None` when
/// nothing about `native` is initialized at this height.
fn initialize_hardforks(native: &dyn NativeContract, host: &EngineHost) -> Option<Vec<Hardfork>> {
    let height = host.block_height();
    let hardforks: Vec<Hardfork> = native
        .used_hardforks()
        .into_iter()
        .filter(|hf| host.settings().hardfork_height(*hf) == Some(height))
        .collect();
    if !hardforks.is_empty() || (height == 0 && native.active_in().is_none()) {
        Some(hardforks)
    } else {
        None
    }
}

/// Deploys or upgrades `native` when the engine's height is one of its
/// initialization blocks. Does nothing otherwise.
pub fn initialize_native(host: &mut EngineHost, engine: &ExecutionEngine, native: &dyn NativeContract) -> Result<()> {
    let Some(hardforks) = initialize_hardforks(native, host) else {
        return Ok(());
    };
    let natives = Arc::clone(host.natives());
    let state = natives.contract_state(native, host.settings(), host.block_height());
    let hash = native.hash();

    let event = match self::get_contract(host.snapshot(), &hash)? {
        None => {
            put_contract(host.snapshot_mut(), &state)?;
            info!(contract = native.name(), %hash, "native contract deployed");
            if native.active_in().is_none() {
                native.initialize(host, engine, None)?;
            }
            "Deploy"
        }
        Some(mut existing) => {
            existing.update_counter = existing.update_counter.wrapping_add(1);
            existing.nef = state.nef;
            existing.manifest = state.manifest;
            put_contract(host.snapshot_mut(), &existing)?;
            info!(contract = native.name(), counter = existing.update_counter, "native contract updated");
            "Update"
        }
    };
    for hardfork in hardforks {
        debug!(contract = native.name(), %hardfork, "initializing for hardfork");
        native.initialize(host, engine, Some(hardfork))?;
    }

    let management = natives
        .get_by_id(ID)
        .map_or_else(|| super::native_hash("ContractManagement"), |native| native.hash());
    host.send_notification(
        engine,
        management,
        event,
        vec![StackItem::from_byte_string(hash.to_vec())],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_state::NefFile;
    use crate::manifest::ContractManifest;
    use crate::storage::MemoryStore;

    fn sample(id: i32, name: &str) -> ContractState {
        let nef = NefFile::new("test", vec![0x11, 0x40]);
        let hash = ContractState::calculate_hash(&UInt160::from_array([1; 20]), nef.checksum, name);
        ContractState::new(id, hash, nef, ContractManifest::new(name))
    }

    #[test]
    fn records_are_found_by_hash_and_id() {
        let mut store = MemoryStore::new();
        let contract = sample(3, "sample");
        put_contract(&mut store, &contract).unwrap();

        assert_eq!(get_contract(&store, &contract.hash).unwrap(), Some(contract.clone()));
        assert_eq!(get_contract_by_id(&store, 3).unwrap(), Some(contract));
        assert_eq!(get_contract_by_id(&store, 4).unwrap(), None);
        assert_eq!(get_contract(&store, &UInt160::zero()).unwrap(), None);
    }

    #[test]
    fn id_index_uses_big_endian_keys() {
        let key = contract_hash_key(0x0102_0304);
        assert_eq!(key.id, ID);
        assert_eq!(key.key, vec![PREFIX_CONTRACT_HASH, 1, 2, 3, 4]);
    }

    #[test]
    fn minimum_fee_defaults_to_ten_gas() {
        let store = MemoryStore::new();
        assert_eq!(minimum_deployment_fee(&store), BigInt::from(10_0000_0000i64));
    }

    #[test]
    fn method_table() {
        let management = ContractManagement::new();
        let names: Vec<&str> = management.methods().iter().map(|m| m.name).collect();
        assert!(names.contains(&"getContract"));
        assert!(names.contains(&"isContract"));
        assert!(management
            .methods()
            .iter()
            .filter(|m| m.name != "setMinimumDeploymentFee")
            .all(NativeMethod::safe));
        assert_eq!(
            management.hash().to_string(),
            "0xfffdc93764dbaddd97c48f252a53ea4643faa3fd"
        );
    }
}
