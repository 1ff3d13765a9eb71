//! Shared NEP-17 behaviour of the native tokens.
//!
//! [`NeoToken`](super::NeoToken) and [`GasToken`](super::GasToken) describe
//! themselves through [`FungibleToken`]; the balance bookkeeping, the
//! `Transfer` event and the NEP-17 method surface are implemented once here
//! and monomorphized per token.

use super::native_contract::{native_hash, MethodTable, NativeArgs, NativeEvent, NativeValue};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::storage::{DataCache, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_core::UInt160;
use neo_vm::{CallFlags, ExecutionEngine, StackItem};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use tracing::trace;

/// Prefix for storing total supply in storage.
pub const PREFIX_TOTAL_SUPPLY: u8 = 11;

/// Prefix for storing account balances in storage.
pub const PREFIX_ACCOUNT: u8 = 20;

/// Static description of a native NEP-17 token.
pub trait FungibleToken: 'static {
    const ID: i32;
    const NAME: &'static str;
    const SYMBOL: &'static str;
    const DECIMALS: u8;

    fn token_hash() -> UInt160 {
        native_hash(Self::NAME)
    }

    /// `10^decimals`.
    fn factor() -> BigInt {
        BigInt::from(10).pow(u32::from(Self::DECIMALS))
    }
}

fn account_key(id: i32, account: &UInt160) -> StorageKey {
    StorageKey::create(id, PREFIX_ACCOUNT).add_hash(account)
}

fn supply_key(id: i32) -> StorageKey {
    StorageKey::create(id, PREFIX_TOTAL_SUPPLY)
}

/// Balance of `account`.
pub fn balance_of<F: FungibleToken>(snapshot: &dyn DataCache, account: &UInt160) -> BigInt {
    snapshot
        .get(&account_key(F::ID, account))
        .map_or_else(BigInt::zero, |item| item.to_bigint())
}

pub fn total_supply<F: FungibleToken>(snapshot: &dyn DataCache) -> BigInt {
    snapshot
        .get(&supply_key(F::ID))
        .map_or_else(BigInt::zero, |item| item.to_bigint())
}

/// Adds `delta` to an integer record, deleting it when it reaches zero.
fn adjust(snapshot: &mut dyn DataCache, key: StorageKey, delta: &BigInt) {
    let mut item = snapshot.get(&key).unwrap_or_default();
    let value = item.to_bigint() + delta;
    if value.is_zero() {
        snapshot.delete(&key);
    } else {
        item.set_bigint(&value);
        snapshot.put(key, item);
    }
}

fn emit_transfer<F: FungibleToken>(
    host: &mut EngineHost,
    engine: &ExecutionEngine,
    from: Option<&UInt160>,
    to: Option<&UInt160>,
    amount: &BigInt,
) {
    let party = |account: Option<&UInt160>| {
        account.map_or(StackItem::Null, |account| StackItem::from_byte_string(account.to_vec()))
    };
    host.send_notification(
        engine,
        F::token_hash(),
        "Transfer",
        vec![party(from), party(to), StackItem::from_int(amount.clone())],
    );
}

/// Creates `amount` tokens on `account`.
pub fn mint<F: FungibleToken>(
    host: &mut EngineHost,
    engine: &ExecutionEngine,
    account: &UInt160,
    amount: &BigInt,
) -> Result<()> {
    if amount.is_negative() {
        return Err(Error::invalid_argument(format!("cannot mint {amount}")));
    }
    if amount.is_zero() {
        return Ok(());
    }
    trace!(token = F::SYMBOL, %account, %amount, "mint");
    adjust(host.snapshot_mut(), account_key(F::ID, account), amount);
    adjust(host.snapshot_mut(), supply_key(F::ID), amount);
    emit_transfer::<F>(host, engine, None, Some(account), amount);
    Ok(())
}

/// Destroys `amount` tokens held by `account`.
pub fn burn<F: FungibleToken>(
    host: &mut EngineHost,
    engine: &ExecutionEngine,
    account: &UInt160,
    amount: &BigInt,
) -> Result<()> {
    if amount.is_negative() {
        return Err(Error::invalid_argument(format!("cannot burn {amount}")));
    }
    if amount.is_zero() {
        return Ok(());
    }
    let balance = balance_of::<F>(host.snapshot(), account);
    if balance < *amount {
        return Err(Error::invalid_operation(format!(
            "{account} holds {balance} {}, cannot burn {amount}",
            F::SYMBOL
        )));
    }
    trace!(token = F::SYMBOL, %account, %amount, "burn");
    let delta = -amount;
    adjust(host.snapshot_mut(), account_key(F::ID, account), &delta);
    adjust(host.snapshot_mut(), supply_key(F::ID), &delta);
    emit_transfer::<F>(host, engine, Some(account), None, amount);
    Ok(())
}

/// Moves `amount` from `from` to `to`. Returns `false` when `from` did not
/// witness the call or cannot cover the amount.
pub fn transfer<F: FungibleToken>(
    host: &mut EngineHost,
    engine: &ExecutionEngine,
    from: &UInt160,
    to: &UInt160,
    amount: &BigInt,
) -> Result<bool> {
    if amount.is_negative() {
        return Err(Error::invalid_argument(format!("transfer amount {amount} is negative")));
    }
    if !host.check_witness(engine, from)? {
        return Ok(false);
    }
    if !amount.is_zero() {
        if balance_of::<F>(host.snapshot(), from) < *amount {
            return Ok(false);
        }
        if from != to {
            adjust(host.snapshot_mut(), account_key(F::ID, from), &-amount);
            adjust(host.snapshot_mut(), account_key(F::ID, to), amount);
        }
    }
    emit_transfer::<F>(host, engine, Some(from), Some(to), amount);
    Ok(true)
}

/// Registers the NEP-17 methods of `F`.
pub fn register_methods<F: FungibleToken>(methods: &mut MethodTable) {
    methods
        .register_method("symbol", symbol::<F>, 0, 0, CallFlags::NONE, None)
        .returns(T::String);
    methods
        .register_method("decimals", decimals::<F>, 0, 0, CallFlags::NONE, None)
        .returns(T::Integer);
    methods
        .register_method("totalSupply", total_supply_method::<F>, 1 << 15, 0, CallFlags::READ_STATES, None)
        .returns(T::Integer);
    methods
        .register_method("balanceOf", balance_of_method::<F>, 1 << 15, 0, CallFlags::READ_STATES, None)
        .params(&[("account", T::Hash160)])
        .returns(T::Integer);
    methods
        .register_method(
            "transfer",
            transfer_method::<F>,
            1 << 17,
            50,
            CallFlags::STATES | CallFlags::ALLOW_CALL | CallFlags::ALLOW_NOTIFY,
            None,
        )
        .params(&[("from", T::Hash160), ("to", T::Hash160), ("amount", T::Integer), ("data", T::Any)])
        .returns(T::Boolean);
}

/// The NEP-17 `Transfer` event.
pub fn transfer_event() -> NativeEvent {
    NativeEvent::new("Transfer", &[("from", T::Hash160), ("to", T::Hash160), ("amount", T::Integer)])
}

fn symbol<F: FungibleToken>(_: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
    Ok(F::SYMBOL.into())
}

fn decimals<F: FungibleToken>(_: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
    Ok(F::DECIMALS.into())
}

fn total_supply_method<F: FungibleToken>(host: &mut EngineHost, _: &mut ExecutionEngine, _: &NativeArgs) -> Result<NativeValue> {
    Ok(total_supply::<F>(host.snapshot()).into())
}

fn balance_of_method<F: FungibleToken>(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
    Ok(balance_of::<F>(host.snapshot(), &args.hash160(0)?).into())
}

fn transfer_method<F: FungibleToken>(host: &mut EngineHost, engine: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
    let from = args.hash160(0)?;
    let to = args.hash160(1)?;
    let amount = args.integer(2)?;
    Ok(transfer::<F>(host, engine, &from, &to, &amount)?.into())
}

/// Persists an integer record, used by token-specific settings.
pub(crate) fn put_integer(snapshot: &mut dyn DataCache, key: StorageKey, value: &BigInt) {
    snapshot.put(key, StorageItem::from_bigint(value));
}
