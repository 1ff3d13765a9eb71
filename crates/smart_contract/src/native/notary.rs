//! Notary native contract, active from Echidna.
//!
//! Tracks the GAS deposits that pay for notary-assisted transactions and
//! the limit on how far ahead a notary request may be valid.

use super::native_contract::{assert_committee, MethodTable, NativeArgs, NativeContract, NativeMethod, NativeValue};
use super::policy_contract;
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::storage::{DataCache, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_core::{Hardfork, UInt160};
use neo_vm::{CallFlags, ExecutionEngine};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Storage id of Notary.
pub const ID: i32 = -10;

const PREFIX_DEPOSIT: u8 = 1;
const PREFIX_MAX_NOT_VALID_BEFORE_DELTA: u8 = 10;

/// Maximum `NotValidBefore` delta at activation.
pub const DEFAULT_MAX_NOT_VALID_BEFORE_DELTA: u32 = 140;

/// GAS locked for notary service fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub amount: i64,
    /// Height until which the deposit is locked.
    pub till: u32,
}

/// Notary native contract
pub struct Notary {
    methods: MethodTable,
}

impl Default for Notary {
    fn default() -> Self {
        Self::new()
    }
}

impl Notary {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods
            .register_method("balanceOf", Self::balance_of, 1 << 15, 0, CallFlags::READ_STATES, None)
            .params(&[("account", T::Hash160)])
            .returns(T::Integer);
        methods
            .register_method("expirationOf", Self::expiration_of, 1 << 15, 0, CallFlags::READ_STATES, None)
            .params(&[("account", T::Hash160)])
            .returns(T::Integer);
        methods
            .register_method(
                "getMaxNotValidBeforeDelta",
                Self::get_max_not_valid_before_delta,
                1 << 15,
                0,
                CallFlags::READ_STATES,
                None,
            )
            .returns(T::Integer);
        methods
            .register_method(
                "setMaxNotValidBeforeDelta",
                Self::set_max_not_valid_before_delta,
                1 << 15,
                0,
                CallFlags::STATES,
                None,
            )
            .params(&[("value", T::Integer)]);
        Self { methods }
    }

    fn balance_of(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let deposit = deposit_of(host.snapshot(), &args.hash160(0)?)?;
        Ok(deposit.map_or(0, |deposit| deposit.amount).into())
    }

    fn expiration_of(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let deposit = deposit_of(host.snapshot(), &args.hash160(0)?)?;
        Ok(deposit.map_or(0, |deposit| deposit.till).into())
    }

    fn get_max_not_valid_before_delta(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(max_not_valid_before_delta(host.snapshot()).into())
    }

    fn set_max_not_valid_before_delta(host: &mut EngineHost, engine: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let value = args.u32(0)?;
        let increment = policy_contract::max_valid_until_block_increment(host.snapshot(), host.settings());
        let validators = host.settings().validators_count;
        if i64::from(value) > increment / 2 || value < validators {
            return Err(Error::invalid_argument(format!(
                "MaxNotValidBeforeDelta {value} must be between {validators} and {}",
                increment / 2
            )));
        }
        assert_committee(host, engine)?;
        host.snapshot_mut().put(
            StorageKey::create(ID, PREFIX_MAX_NOT_VALID_BEFORE_DELTA),
            StorageItem::from_i64(i64::from(value)),
        );
        Ok(NativeValue::Void)
    }
}

impl NativeContract for Notary {
    fn id(&self) -> i32 {
        ID
    }

    fn name(&self) -> &'static str {
        "Notary"
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }

    fn active_in(&self) -> Option<Hardfork> {
        Some(Hardfork::HF_Echidna)
    }

    fn initialize(&self, host: &mut EngineHost, _: &ExecutionEngine, hardfork: Option<Hardfork>) -> Result<()> {
        if hardfork == self.active_in() {
            host.snapshot_mut().put(
                self.storage_key(PREFIX_MAX_NOT_VALID_BEFORE_DELTA),
                StorageItem::from_i64(i64::from(DEFAULT_MAX_NOT_VALID_BEFORE_DELTA)),
            );
        }
        Ok(())
    }
}

fn deposit_key(account: &UInt160) -> StorageKey {
    StorageKey::create(ID, PREFIX_DEPOSIT).add_hash(account)
}

/// The deposit held for `account`, if any.
pub fn deposit_of(snapshot: &dyn DataCache, account: &UInt160) -> Result<Option<Deposit>> {
    snapshot
        .get(&deposit_key(account))
        .map(|item| serde_json::from_slice(&item.value).map_err(Error::from))
        .transpose()
}

/// Records `deposit` for `account`.
pub fn put_deposit(snapshot: &mut dyn DataCache, account: &UInt160, deposit: &Deposit) -> Result<()> {
    snapshot.put(deposit_key(account), StorageItem::new(serde_json::to_vec(deposit)?));
    Ok(())
}

pub fn max_not_valid_before_delta(snapshot: &dyn DataCache) -> u32 {
    snapshot
        .get(&StorageKey::create(ID, PREFIX_MAX_NOT_VALID_BEFORE_DELTA))
        .and_then(|item| item.to_bigint().to_u32())
        .unwrap_or(DEFAULT_MAX_NOT_VALID_BEFORE_DELTA)
}
