//! NeoToken native contract: the NEP-17 governance token.
//!
//! Balances and transfers come from [`fungible_token`]. The governance side
//! is reduced to what scripts can observe without voting: the committee is
//! the standby committee, and the per-block GAS reward and the candidate
//! registration price are committee-controlled settings.

use super::fungible_token::{self, FungibleToken};
use super::native_contract::{
    assert_committee, MethodTable, NativeArgs, NativeContract, NativeEvent, NativeMethod, NativeValue,
};
use crate::account::{bft_address, committee_address};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::storage::{DataCache, SeekDirection, StorageKey};
use crate::{Error, Result};
use neo_core::{Hardfork, ProtocolSettings, PublicKey};
use neo_vm::{CallFlags, ExecutionEngine};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use tracing::{debug, warn};

/// Total NEO supply, minted at genesis.
pub const TOTAL_AMOUNT: i64 = 100_000_000;

const PREFIX_REGISTER_PRICE: u8 = 13;
const PREFIX_GAS_PER_BLOCK: u8 = 29;

/// GAS generated per block at genesis (5 GAS).
pub const DEFAULT_GAS_PER_BLOCK: i64 = 5_0000_0000;

/// Candidate registration price at genesis (1000 GAS).
pub const DEFAULT_REGISTER_PRICE: i64 = 1000_0000_0000;

const MAX_GAS_PER_BLOCK: i64 = 10_0000_0000;

/// NeoToken native contract
pub struct NeoToken {
    methods: MethodTable,
}

impl FungibleToken for NeoToken {
    const ID: i32 = -5;
    const NAME: &'static str = "NeoToken";
    const SYMBOL: &'static str = "NEO";
    const DECIMALS: u8 = 0;
}

impl Default for NeoToken {
    fn default() -> Self {
        Self::new()
    }
}

impl NeoToken {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        fungible_token::register_methods::<Self>(&mut methods);
        methods
            .register_method("getCommittee", Self::get_committee, 1 << 16, 0, CallFlags::READ_STATES, None)
            .returns(T::Array);
        methods
            .register_method(
                "getCommitteeAddress",
                Self::get_committee_address,
                1 << 16,
                0,
                CallFlags::READ_STATES,
                Some(Hardfork::HF_Cockatrice),
            )
            .returns(T::Hash160);
        methods
            .register_method(
                "getNextBlockValidators",
                Self::get_next_block_validators,
                1 << 16,
                0,
                CallFlags::READ_STATES,
                None,
            )
            .returns(T::Array);
        methods
            .register_method("getGasPerBlock", Self::get_gas_per_block, 1 << 15, 0, CallFlags::READ_STATES, None)
            .returns(T::Integer);
        methods
            .register_method("setGasPerBlock", Self::set_gas_per_block, 1 << 15, 0, CallFlags::STATES, None)
            .params(&[("gasPerBlock", T::Integer)]);
        methods
            .register_method("getRegisterPrice", Self::get_register_price, 1 << 15, 0, CallFlags::READ_STATES, None)
            .returns(T::Integer);
        methods
            .register_method("setRegisterPrice", Self::set_register_price, 1 << 15, 0, CallFlags::STATES, None)
            .params(&[("registerPrice", T::Integer)]);
        Self { methods }
    }

    fn get_committee(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(NativeValue::array(committee(host.settings())))
    }

    fn get_committee_address(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(committee_address(&committee(host.settings()))?.into())
    }

    fn get_next_block_validators(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(NativeValue::array(next_block_validators(host.settings())))
    }

    fn get_gas_per_block(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(gas_per_block(host.snapshot(), host.block_height()).into())
    }

    fn set_gas_per_block(host: &mut EngineHost, engine: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let value = args.integer(0)?;
        if value.is_negative() || value > BigInt::from(MAX_GAS_PER_BLOCK) {
            return Err(Error::invalid_argument(format!("gas per block {value} is out of range")));
        }
        assert_committee(host, engine)?;
        let index = host.block_height() + 1;
        debug!(%value, index, "gas per block changed");
        fungible_token::put_integer(host.snapshot_mut(), gas_per_block_key(index), &value);
        Ok(NativeValue::Void)
    }

    fn get_register_price(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
        Ok(register_price(host.snapshot()).into())
    }

    fn set_register_price(host: &mut EngineHost, engine: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let value = args.integer(0)?;
        if !value.is_positive() {
            return Err(Error::invalid_argument(format!("register price {value} must be positive")));
        }
        assert_committee(host, engine)?;
        fungible_token::put_integer(
            host.snapshot_mut(),
            StorageKey::create(Self::ID, PREFIX_REGISTER_PRICE),
            &value,
        );
        Ok(NativeValue::Void)
    }
}

impl NativeContract for NeoToken {
    fn id(&self) -> i32 {
        Self::ID
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }

    fn events(&self) -> Vec<NativeEvent> {
        vec![fungible_token::transfer_event()]
    }

    fn supported_standards(&self) -> &'static [&'static str] {
        &["NEP-17"]
    }

    fn initialize(&self, host: &mut EngineHost, engine: &ExecutionEngine, hardfork: Option<Hardfork>) -> Result<()> {
        if hardfork.is_some() {
            return Ok(());
        }
        fungible_token::put_integer(
            host.snapshot_mut(),
            gas_per_block_key(0),
            &BigInt::from(DEFAULT_GAS_PER_BLOCK),
        );
        fungible_token::put_integer(
            host.snapshot_mut(),
            StorageKey::create(Self::ID, PREFIX_REGISTER_PRICE),
            &BigInt::from(DEFAULT_REGISTER_PRICE),
        );
        let validators = host.settings().standby_validators().to_vec();
        if validators.is_empty() {
            warn!("no standby validators configured, NEO is not minted");
            return Ok(());
        }
        let account = bft_address(&validators)?;
        fungible_token::mint::<Self>(host, engine, &account, &BigInt::from(TOTAL_AMOUNT))
    }
}

fn gas_per_block_key(index: u32) -> StorageKey {
    StorageKey::create(NeoToken::ID, PREFIX_GAS_PER_BLOCK).add_u32_be(index)
}

/// Members of the committee, in ascending key order.
pub fn committee(settings: &ProtocolSettings) -> Vec<PublicKey> {
    let mut members = settings.standby_committee.clone();
    members.sort();
    members
}

/// Validators of the next block, in ascending key order.
pub fn next_block_validators(settings: &ProtocolSettings) -> Vec<PublicKey> {
    let mut validators = settings.standby_validators().to_vec();
    validators.sort();
    validators
}

/// GAS generated per block at `height`: the latest record at or below it.
pub fn gas_per_block(snapshot: &dyn DataCache, height: u32) -> BigInt {
    let prefix = StorageKey::create(NeoToken::ID, PREFIX_GAS_PER_BLOCK);
    snapshot
        .find(&prefix, SeekDirection::Backward)
        .into_iter()
        .find(|(key, _)| {
            key.key
                .get(1..5)
                .and_then(|bytes| bytes.try_into().ok())
                .map_or(false, |bytes: [u8; 4]| u32::from_be_bytes(bytes) <= height)
        })
        .map_or_else(BigInt::zero, |(_, item)| item.to_bigint())
}

/// Price of registering a candidate.
pub fn register_price(snapshot: &dyn DataCache) -> BigInt {
    snapshot
        .get(&StorageKey::create(NeoToken::ID, PREFIX_REGISTER_PRICE))
        .map_or_else(BigInt::zero, |item| item.to_bigint())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::test_support::{call, committee_signer, elements, genesis, keys, open_engine, result, settings};
    use neo_vm::{StackItem, VMState};

    #[test]
    fn genesis_state() {
        let settings = settings(4);
        let store = genesis(&settings);
        let holder = bft_address(settings.standby_validators()).unwrap();
        assert_eq!(
            fungible_token::balance_of::<NeoToken>(store.as_ref(), &holder),
            BigInt::from(TOTAL_AMOUNT)
        );
        assert_eq!(gas_per_block(store.as_ref(), 0), BigInt::from(DEFAULT_GAS_PER_BLOCK));
        assert_eq!(register_price(store.as_ref()), BigInt::from(DEFAULT_REGISTER_PRICE));
    }

    #[test]
    fn committee_is_sorted() {
        let mut members = keys(5);
        members.reverse();
        let settings = ProtocolSettings {
            standby_committee: members,
            validators_count: 3,
            ..ProtocolSettings::default()
        };
        let committee = committee(&settings);
        assert!(committee.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(next_block_validators(&settings).len(), 3);
    }

    #[test]
    fn get_committee_returns_keys() {
        let settings = settings(3);
        let mut engine = open_engine(&settings, genesis(&settings), Vec::new());
        assert_eq!(call(&mut engine, "NeoToken", "getCommittee", vec![]), VMState::HALT);
        let expected: Vec<StackItem> = committee(&settings)
            .iter()
            .map(|key| StackItem::from_byte_string(key.to_vec()))
            .collect();
        assert_eq!(elements(&result(&engine)), expected);
    }

    #[test]
    fn gas_per_block_takes_effect_next_block() {
        let settings = settings(1);
        let mut engine = open_engine(&settings, genesis(&settings), vec![committee_signer(&settings)]);
        let state = call(
            &mut engine,
            "NeoToken",
            "setGasPerBlock",
            vec![StackItem::from_int(2_0000_0000)],
        );
        assert_eq!(state, VMState::HALT);
        assert_eq!(gas_per_block(engine.snapshot(), 1), BigInt::from(DEFAULT_GAS_PER_BLOCK));
        assert_eq!(gas_per_block(engine.snapshot(), 2), BigInt::from(2_0000_0000));
    }

    #[test]
    fn gas_per_block_is_bounded() {
        let settings = settings(1);
        let mut engine = open_engine(&settings, genesis(&settings), vec![committee_signer(&settings)]);
        let state = call(
            &mut engine,
            "NeoToken",
            "setGasPerBlock",
            vec![StackItem::from_int(MAX_GAS_PER_BLOCK + 1)],
        );
        assert_eq!(state, VMState::FAULT);
    }

    #[test]
    fn register_price_needs_the_committee() {
        let settings = settings(1);
        let mut engine = open_engine(&settings, genesis(&settings), Vec::new());
        let state = call(&mut engine, "NeoToken", "setRegisterPrice", vec![StackItem::from_int(1)]);
        assert_eq!(state, VMState::FAULT);
    }

    #[test]
    fn hash_matches_the_network() {
        assert_eq!(
            NeoToken::token_hash().to_string(),
            "0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5"
        );
    }
}
