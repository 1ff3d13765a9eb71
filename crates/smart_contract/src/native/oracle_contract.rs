//! OracleContract native contract.
//!
//! Only the request price is exposed; request and response handling live
//! in the node.

use super::native_contract::{assert_committee, MethodTable, NativeArgs, NativeContract, NativeMethod, NativeValue};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::storage::{DataCache, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_core::Hardfork;
use neo_vm::{CallFlags, ExecutionEngine};
use num_traits::ToPrimitive;

/// Storage id of OracleContract.
pub const ID: i32 = -9;

const PREFIX_PRICE: u8 = 5;

/// Price of an oracle request at genesis (0.5 GAS).
pub const DEFAULT_PRICE: i64 = 5000_0000;

/// OracleContract native contract
pub struct OracleContract {
    methods: MethodTable,
}

impl Default for OracleContract {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleContract {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods
            .register_method("getPrice", Self::get_price, 1 << 15, 0, CallFlags::READ_STATES, None)
            .returns(T::Integer);
        methods
            .register_method("setPrice", Self::set_price, 1 << 15, 0, CallFlags::STATES, None)
            .params(&[("price", T::Integer)]);
        Self { methods }
    }

    fn get_price(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(price(host.snapshot()).into())
    }

    fn set_price(host: &mut EngineHost, engine: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let price = args.i64(0)?;
        if price <= 0 {
            return Err(Error::invalid_argument(format!("oracle price {price} must be positive")));
        }
        assert_committee(host, engine)?;
        host.snapshot_mut()
            .put(StorageKey::create(ID, PREFIX_PRICE), StorageItem::from_i64(price));
        Ok(NativeValue::Void)
    }
}

impl NativeContract for OracleContract {
    fn id(&self) -> i32 {
        ID
    }

    fn name(&self) -> &'static str {
        "OracleContract"
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }

    fn initialize(&self, host: &mut EngineHost, _: &ExecutionEngine, hardfork: Option<Hardfork>) -> Result<()> {
        if hardfork.is_none() {
            host.snapshot_mut()
                .put(self.storage_key(PREFIX_PRICE), StorageItem::from_i64(DEFAULT_PRICE));
        }
        Ok(())
    }
}

/// Current price of an oracle request.
pub fn price(snapshot: &dyn DataCache) -> i64 {
    snapshot
        .get(&StorageKey::create(ID, PREFIX_PRICE))
        .and_then(|item| item.to_bigint().to_i64())
        .unwrap_or(DEFAULT_PRICE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::test_support::{call, committee_signer, genesis, open_engine, result, settings};
    use neo_vm::{StackItem, VMState};

    #[test]
    fn price_defaults_and_updates() {
        let settings = settings(1);
        let mut engine = open_engine(&settings, genesis(&settings), vec![committee_signer(&settings)]);
        assert_eq!(price(engine.snapshot()), DEFAULT_PRICE);
        assert_eq!(
            call(&mut engine, "OracleContract", "setPrice", vec![StackItem::from_int(7)]),
            VMState::HALT
        );
        let store = engine.into_snapshot();
        let mut engine = open_engine(&settings, store, Vec::new());
        assert_eq!(call(&mut engine, "OracleContract", "getPrice", vec![]), VMState::HALT);
        assert_eq!(result(&engine), StackItem::from_int(7));
    }

    #[test]
    fn price_must_be_positive() {
        let settings = settings(1);
        let mut engine = open_engine(&settings, genesis(&settings), vec![committee_signer(&settings)]);
        assert_eq!(
            call(&mut engine, "OracleContract", "setPrice", vec![StackItem::from_int(0)]),
            VMState::FAULT
        );
    }

    #[test]
    fn hash_matches_the_network() {
        assert_eq!(
            OracleContract::new().hash().to_string(),
            "0xfe924b7cfe89ddd271abaf7210a80a7e11178758"
        );
    }
}
