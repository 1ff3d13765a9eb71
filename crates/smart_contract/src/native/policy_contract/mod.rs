//! Policy native contract.
//!
//! Holds the network's economic and blocking policy: fee factors, storage
//! price, per-attribute fees, timing limits and the list of blocked accounts.

use super::native_contract::{assert_committee, native_hash, MethodTable, NativeArgs, NativeContract, NativeEvent, NativeMethod, NativeValue};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::storage::{DataCache, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_core::{Hardfork, ProtocolSettings, UInt160};
use neo_vm::{CallFlags, ExecutionEngine};
use num_traits::ToPrimitive;

mod getters;
mod setters;

/// Storage id of PolicyContract.
pub const ID: i32 = -7;

const NAME: &str = "PolicyContract";

/// Default execution fee factor.
pub const DEFAULT_EXEC_FEE_FACTOR: i64 = 30;

/// Default price of one stored byte, in datoshi.
pub const DEFAULT_STORAGE_PRICE: i64 = 100_000;

/// Default network fee per transaction byte, in datoshi.
pub const DEFAULT_FEE_PER_BYTE: i64 = 1_000;

/// Default fee of `NotaryAssisted` attributes from Echidna.
pub const DEFAULT_NOTARY_ASSISTED_ATTRIBUTE_FEE: i64 = 10_000_000;

pub const MAX_EXEC_FEE_FACTOR: i64 = 100;
pub const MAX_STORAGE_PRICE: i64 = 10_000_000;
pub const MAX_FEE_PER_BYTE: i64 = 1_0000_0000;
pub const MAX_ATTRIBUTE_FEE: i64 = 10_0000_0000;
pub const MAX_MILLISECONDS_PER_BLOCK: i64 = 30_000;
pub const MAX_MAX_VALID_UNTIL_BLOCK_INCREMENT: i64 = 86_400;
pub const MAX_MAX_TRACEABLE_BLOCKS: i64 = 2_102_400;

const PREFIX_FEE_PER_BYTE: u8 = 10;
const PREFIX_BLOCKED_ACCOUNT: u8 = 15;
const PREFIX_EXEC_FEE_FACTOR: u8 = 18;
const PREFIX_STORAGE_PRICE: u8 = 19;
const PREFIX_ATTRIBUTE_FEE: u8 = 20;
const PREFIX_MILLISECONDS_PER_BLOCK: u8 = 21;
const PREFIX_MAX_VALID_UNTIL_BLOCK_INCREMENT: u8 = 22;
const PREFIX_MAX_TRACEABLE_BLOCKS: u8 = 23;

/// Transaction attribute types with a configurable fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttributeType {
    HighPriority = 0x01,
    OracleResponse = 0x11,
    NotValidBefore = 0x20,
    Conflicts = 0x21,
    NotaryAssisted = 0x22,
}

impl AttributeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::HighPriority),
            0x11 => Some(Self::OracleResponse),
            0x20 => Some(Self::NotValidBefore),
            0x21 => Some(Self::Conflicts),
            0x22 => Some(Self::NotaryAssisted),
            _ => None,
        }
    }

    /// Parses an attribute type argument, rejecting types not yet defined
    /// at the engine's height.
    fn from_argument(host: &EngineHost, value: &num_bigint::BigInt) -> Result<Self> {
        let attribute = value
            .to_u8()
            .and_then(Self::from_u8)
            .ok_or_else(|| Error::invalid_argument(format!("unknown attribute type {value}")))?;
        if attribute == Self::NotaryAssisted && !host.is_hardfork_enabled(Hardfork::HF_Echidna) {
            return Err(Error::invalid_argument("NotaryAssisted is not enabled"));
        }
        Ok(attribute)
    }
}

/// The Policy native contract.
pub struct PolicyContract {
    methods: MethodTable,
}

impl Default for PolicyContract {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyContract {
    const CPU_FEE: i64 = 1 << 15;

    pub fn new() -> Self {
        let read = CallFlags::READ_STATES;
        let write = CallFlags::STATES;
        let echidna = Some(Hardfork::HF_Echidna);
        let mut methods = MethodTable::new();

        methods
            .register_method("getFeePerByte", Self::get_fee_per_byte, Self::CPU_FEE, 0, read, None)
            .returns(T::Integer);
        methods
            .register_method("getExecFeeFactor", Self::get_exec_fee_factor, Self::CPU_FEE, 0, read, None)
            .returns(T::Integer);
        methods
            .register_method("getStoragePrice", Self::get_storage_price, Self::CPU_FEE, 0, read, None)
            .returns(T::Integer);
        methods
            .register_method("getMillisecondsPerBlock", Self::get_milliseconds_per_block, Self::CPU_FEE, 0, read, echidna)
            .returns(T::Integer);
        methods
            .register_method("getMaxValidUntilBlockIncrement", Self::get_max_valid_until_block_increment, Self::CPU_FEE, 0, read, echidna)
            .returns(T::Integer);
        methods
            .register_method("getMaxTraceableBlocks", Self::get_max_traceable_blocks, Self::CPU_FEE, 0, read, echidna)
            .returns(T::Integer);
        methods
            .register_method("getAttributeFee", Self::get_attribute_fee, Self::CPU_FEE, 0, read, None)
            .params(&[("attributeType", T::Integer)])
            .returns(T::Integer);
        methods
            .register_method("isBlocked", Self::is_blocked, Self::CPU_FEE, 0, read, None)
            .params(&[("account", T::Hash160)])
            .returns(T::Boolean);

        methods
            .register_method("setFeePerByte", Self::set_fee_per_byte, Self::CPU_FEE, 0, write, None)
            .params(&[("value", T::Integer)]);
        methods
            .register_method("setExecFeeFactor", Self::set_exec_fee_factor, Self::CPU_FEE, 0, write, None)
            .params(&[("value", T::Integer)]);
        methods
            .register_method("setStoragePrice", Self::set_storage_price, Self::CPU_FEE, 0, write, None)
            .params(&[("value", T::Integer)]);
        methods
            .register_method(
                "setMillisecondsPerBlock",
                Self::set_milliseconds_per_block,
                Self::CPU_FEE,
                0,
                write | CallFlags::ALLOW_NOTIFY,
                echidna,
            )
            .params(&[("value", T::Integer)]);
        methods
            .register_method("setMaxValidUntilBlockIncrement", Self::set_max_valid_until_block_increment, Self::CPU_FEE, 0, write, echidna)
            .params(&[("value", T::Integer)]);
        methods
            .register_method("setMaxTraceableBlocks", Self::set_max_traceable_blocks, Self::CPU_FEE, 0, write, echidna)
            .params(&[("value", T::Integer)]);
        methods
            .register_method("setAttributeFee", Self::set_attribute_fee, Self::CPU_FEE, 0, write, None)
            .params(&[("attributeType", T::Integer), ("value", T::Integer)]);
        methods
            .register_method("blockAccount", Self::block_account, Self::CPU_FEE, 0, write, None)
            .params(&[("account", T::Hash160)])
            .returns(T::Boolean);
        methods
            .register_method("unblockAccount", Self::unblock_account, Self::CPU_FEE, 0, write, None)
            .params(&[("account", T::Hash160)])
            .returns(T::Boolean);

        Self { methods }
    }
}

impl NativeContract for PolicyContract {
    fn id(&self) -> i32 {
        ID
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }

    fn events(&self) -> Vec<NativeEvent> {
        vec![NativeEvent::new(
            "MillisecondsPerBlockChanged",
            &[("old", T::Integer), ("new", T::Integer)],
        )
        .since(Hardfork::HF_Echidna)]
    }

    fn initialize(&self, host: &mut EngineHost, _: &ExecutionEngine, hardfork: Option<Hardfork>) -> Result<()> {
        match hardfork {
            None => {
                let snapshot = host.snapshot_mut();
                put_i64(snapshot, PREFIX_FEE_PER_BYTE, DEFAULT_FEE_PER_BYTE);
                put_i64(snapshot, PREFIX_EXEC_FEE_FACTOR, DEFAULT_EXEC_FEE_FACTOR);
                put_i64(snapshot, PREFIX_STORAGE_PRICE, DEFAULT_STORAGE_PRICE);
            }
            Some(Hardfork::HF_Echidna) => {
                let settings = host.settings();
                let milliseconds_per_block = i64::from(settings.milliseconds_per_block);
                let max_valid_until_block_increment = i64::from(settings.max_valid_until_block_increment);
                let max_traceable_blocks = i64::from(settings.max_traceable_blocks);
                let snapshot = host.snapshot_mut();
                snapshot.put(
                    attribute_fee_key(AttributeType::NotaryAssisted),
                    StorageItem::from_i64(DEFAULT_NOTARY_ASSISTED_ATTRIBUTE_FEE),
                );
                put_i64(snapshot, PREFIX_MILLISECONDS_PER_BLOCK, milliseconds_per_block);
                put_i64(snapshot, PREFIX_MAX_VALID_UNTIL_BLOCK_INCREMENT, max_valid_until_block_increment);
                put_i64(snapshot, PREFIX_MAX_TRACEABLE_BLOCKS, max_traceable_blocks);
            }
            Some(_) => {}
        }
        Ok(())
    }
}

fn put_i64(snapshot: &mut dyn DataCache, prefix: u8, value: i64) {
    snapshot.put(StorageKey::create(ID, prefix), StorageItem::from_i64(value));
}

fn read_i64(snapshot: &dyn DataCache, prefix: u8, default: i64) -> i64 {
    snapshot
        .get(&StorageKey::create(ID, prefix))
        .and_then(|item| item.to_bigint().to_i64())
        .unwrap_or(default)
}

fn attribute_fee_key(attribute: AttributeType) -> StorageKey {
    StorageKey::create(ID, PREFIX_ATTRIBUTE_FEE).add(&[attribute as u8])
}

fn blocked_key(account: &UInt160) -> StorageKey {
    StorageKey::create(ID, PREFIX_BLOCKED_ACCOUNT).add_hash(account)
}

/// Execution fee factor in effect for new engines.
pub fn exec_fee_factor(snapshot: &dyn DataCache) -> i64 {
    read_i64(snapshot, PREFIX_EXEC_FEE_FACTOR, DEFAULT_EXEC_FEE_FACTOR)
}

/// Price of one stored byte.
pub fn storage_price(snapshot: &dyn DataCache) -> i64 {
    read_i64(snapshot, PREFIX_STORAGE_PRICE, DEFAULT_STORAGE_PRICE)
}

pub fn fee_per_byte(snapshot: &dyn DataCache) -> i64 {
    read_i64(snapshot, PREFIX_FEE_PER_BYTE, DEFAULT_FEE_PER_BYTE)
}

pub fn attribute_fee(snapshot: &dyn DataCache, attribute: AttributeType) -> i64 {
    snapshot
        .get(&attribute_fee_key(attribute))
        .and_then(|item| item.to_bigint().to_i64())
        .unwrap_or(0)
}

/// Largest `ValidUntilBlock` distance a transaction may use.
pub fn max_valid_until_block_increment(snapshot: &dyn DataCache, settings: &ProtocolSettings) -> i64 {
    read_i64(
        snapshot,
        PREFIX_MAX_VALID_UNTIL_BLOCK_INCREMENT,
        i64::from(settings.max_valid_until_block_increment),
    )
}

/// Whether calls into `account` are refused.
pub fn is_blocked(snapshot: &dyn DataCache, account: &UInt160) -> bool {
    snapshot.contains(&blocked_key(account))
}

#[cfg(test)]
mod tests;
