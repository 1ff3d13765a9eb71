//! `System.Contract.*` services.

use super::InteropRegistry;
use crate::account::{self, CHECK_SIG_PRICE};
use crate::application_engine::EngineHost;
use crate::native;
use crate::{Error, Result};
use neo_core::{Hardfork, PublicKey, UInt160};
use neo_vm::{CallFlags, ExecutionEngine, StackItem};

/// Hash of `System.Contract.CallNative`, emitted by every native stub.
pub const SYSTEM_CONTRACT_CALL_NATIVE: u32 = 0x677b_f71a;

/// Price of account creation before Aspidochelone, per key.
const LEGACY_ACCOUNT_PRICE: i64 = 1 << 8;

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register(
        "System.Contract.Call",
        call,
        1 << 15,
        CallFlags::READ_STATES | CallFlags::ALLOW_CALL,
    );
    registry.register("System.Contract.CallNative", call_native, 0, CallFlags::NONE);
    registry.register("System.Contract.GetCallFlags", get_call_flags, 1 << 10, CallFlags::NONE);
    registry.register(
        "System.Contract.CreateStandardAccount",
        create_standard_account,
        0,
        CallFlags::NONE,
    );
    registry.register(
        "System.Contract.CreateMultisigAccount",
        create_multisig_account,
        0,
        CallFlags::NONE,
    );
}

/// Pops the items of an Array or Struct.
pub(crate) fn pop_array(engine: &mut ExecutionEngine) -> Result<Vec<StackItem>> {
    match engine.pop()? {
        StackItem::Array(array) => Ok(array.to_vec()),
        StackItem::Struct(fields) => Ok(fields.to_vec()),
        other => Err(Error::invalid_argument(format!(
            "expected an array, found {}",
            other.stack_item_type()
        ))),
    }
}

fn call(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let hash = UInt160::from_bytes(&engine.pop_bytes()?)?;
    let method = engine.pop()?.get_string()?;
    let value = engine.pop_i64()?;
    let flags = CallFlags::from_script_value(value)
        .ok_or_else(|| Error::invalid_argument(format!("invalid call flags {value}")))?;
    let args = pop_array(engine)?;
    host.call_contract(engine, hash, &method, flags, args)
}

fn call_native(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    native::call_native(host, engine)
}

fn get_call_flags(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let flags = EngineHost::current_call_flags(engine);
    engine.push(StackItem::from_int(flags.bits()))?;
    Ok(())
}

fn account_price(host: &EngineHost) -> i64 {
    if host.is_hardfork_enabled(Hardfork::HF_Aspidochelone) {
        CHECK_SIG_PRICE
    } else {
        LEGACY_ACCOUNT_PRICE
    }
}

fn create_standard_account(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let key = PublicKey::from_bytes(&engine.pop_bytes()?)?;
    engine.add_fee(account_price(host) * engine.exec_fee_factor())?;
    let hash = account::standard_account(&key);
    engine.push(StackItem::from_byte_string(hash.to_vec()))?;
    Ok(())
}

fn create_multisig_account(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let m = usize::try_from(engine.pop_i64()?)
        .map_err(|_| Error::invalid_argument("negative signature threshold"))?;
    let keys = pop_array(engine)?
        .iter()
        .map(|item| Ok(PublicKey::from_bytes(&item.get_bytes()?)?))
        .collect::<Result<Vec<_>>>()?;
    engine.add_fee(account_price(host) * keys.len() as i64 * engine.exec_fee_factor())?;
    let hash = account::multisig_account(m, &keys)?;
    engine.push(StackItem::from_byte_string(hash.to_vec()))?;
    Ok(())
}
