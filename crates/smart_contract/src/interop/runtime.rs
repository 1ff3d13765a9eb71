//! `System.Runtime.*` services.

use super::contract::pop_array;
use super::InteropRegistry;
use crate::account;
use crate::application_engine::{deep_copy, EngineHost, ExecutionContextState};
use crate::contract_parameter_type::ContractParameterType;
use crate::witness::Signer;
use crate::{Error, Result};
use neo_core::{Hardfork, PublicKey, UInt160};
use neo_vm::{CallFlags, ExecutionEngine, StackItem};

/// Longest event name accepted by `Notify`.
pub const MAX_EVENT_NAME: usize = 32;

/// Longest message accepted by `Log`, in bytes.
pub const MAX_NOTIFICATION_SIZE: usize = 1024;

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register("System.Runtime.Platform", platform, 1 << 3, CallFlags::NONE);
    registry.register("System.Runtime.GetNetwork", get_network, 1 << 3, CallFlags::NONE);
    registry.register(
        "System.Runtime.GetAddressVersion",
        get_address_version,
        1 << 3,
        CallFlags::NONE,
    );
    registry.register("System.Runtime.GetTrigger", get_trigger, 1 << 3, CallFlags::NONE);
    registry.register(
        "System.Runtime.GetExecutingScriptHash",
        get_executing_script_hash,
        1 << 4,
        CallFlags::NONE,
    );
    registry.register(
        "System.Runtime.GetCallingScriptHash",
        get_calling_script_hash,
        1 << 4,
        CallFlags::NONE,
    );
    registry.register(
        "System.Runtime.GetEntryScriptHash",
        get_entry_script_hash,
        1 << 4,
        CallFlags::NONE,
    );
    registry.register("System.Runtime.CheckWitness", check_witness, 1 << 10, CallFlags::NONE);
    registry.register(
        "System.Runtime.GetInvocationCounter",
        get_invocation_counter,
        1 << 4,
        CallFlags::NONE,
    );
    registry.register("System.Runtime.Log", log, 1 << 15, CallFlags::ALLOW_NOTIFY);
    registry.register("System.Runtime.Notify", notify, 1 << 15, CallFlags::ALLOW_NOTIFY);
    registry.register(
        "System.Runtime.GetNotifications",
        get_notifications,
        1 << 12,
        CallFlags::NONE,
    );
    registry.register("System.Runtime.GasLeft", gas_left, 1 << 4, CallFlags::NONE);
    registry.register("System.Runtime.BurnGas", burn_gas, 1 << 4, CallFlags::NONE);
    registry.register_since(
        "System.Runtime.CurrentSigners",
        current_signers,
        1 << 4,
        CallFlags::NONE,
        Some(Hardfork::HF_Echidna),
    );
}

fn push_hash(engine: &mut ExecutionEngine, hash: Option<UInt160>) -> Result<()> {
    let item = match hash {
        Some(hash) => StackItem::from_byte_string(hash.to_vec()),
        None => StackItem::Null,
    };
    engine.push(item)?;
    Ok(())
}

fn platform(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    engine.push(StackItem::from_byte_string("NEO"))?;
    Ok(())
}

fn get_network(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    engine.push(StackItem::from_int(host.settings().network))?;
    Ok(())
}

fn get_address_version(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    engine.push(StackItem::from_int(host.settings().address_version))?;
    Ok(())
}

fn get_trigger(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    engine.push(StackItem::from_int(host.trigger().as_u8()))?;
    Ok(())
}

fn get_executing_script_hash(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let hash = EngineHost::current_script_hash(engine);
    push_hash(engine, hash)
}

fn get_calling_script_hash(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let hash = EngineHost::calling_script_hash(engine);
    push_hash(engine, hash)
}

fn get_entry_script_hash(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let hash = EngineHost::entry_script_hash(engine);
    push_hash(engine, hash)
}

fn check_witness(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let bytes = engine.pop_bytes()?;
    let hash = match bytes.len() {
        20 => UInt160::from_bytes(&bytes)?,
        33 => account::standard_account(&PublicKey::from_bytes(&bytes)?),
        len => {
            return Err(Error::invalid_argument(format!(
                "expected a script hash or public key, got {len} bytes"
            )))
        }
    };
    let witnessed = host.check_witness(engine, &hash)?;
    engine.push(StackItem::from_bool(witnessed))?;
    Ok(())
}

fn get_invocation_counter(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let hash = EngineHost::current_script_hash(engine)
        .ok_or_else(|| Error::invalid_operation("no executing script"))?;
    let count = match host.invocation_count(&hash) {
        Some(count) => count,
        None => {
            host.set_invocation_count(hash, 1);
            1
        }
    };
    engine.push(StackItem::from_int(count))?;
    Ok(())
}

fn log(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let bytes = engine.pop_bytes()?;
    if bytes.len() > MAX_NOTIFICATION_SIZE {
        return Err(Error::invalid_argument(format!(
            "log message of {} bytes exceeds {MAX_NOTIFICATION_SIZE}",
            bytes.len()
        )));
    }
    let message = String::from_utf8(bytes)
        .map_err(|_| Error::invalid_argument("log message is not valid UTF-8"))?;
    let hash = EngineHost::current_script_hash(engine)
        .ok_or_else(|| Error::invalid_operation("no executing script"))?;
    host.send_log(hash, message);
    Ok(())
}

fn notify(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let name = engine.pop_bytes()?;
    if name.len() > MAX_EVENT_NAME {
        return Err(Error::invalid_argument(format!(
            "event name of {} bytes exceeds {MAX_EVENT_NAME}",
            name.len()
        )));
    }
    let name = String::from_utf8(name)
        .map_err(|_| Error::invalid_argument("event name is not valid UTF-8"))?;
    let state = pop_array(engine)?;

    if host.is_hardfork_enabled(Hardfork::HF_Basilisk) {
        let context = engine.current_context_or_err()?;
        let contract = ExecutionContextState::of(context).contract.ok_or_else(|| {
            Error::invalid_operation("notifications are not allowed in dynamic scripts")
        })?;
        let event = contract
            .manifest
            .abi
            .get_event(&name)
            .ok_or_else(|| Error::invalid_operation(format!("event `{name}` does not exist")))?;
        if event.parameters.len() != state.len() {
            return Err(Error::invalid_operation(format!(
                "event `{name}` takes {} argument(s), got {}",
                event.parameters.len(),
                state.len()
            )));
        }
        for (item, parameter) in state.iter().zip(&event.parameters) {
            if !check_item_type(item, parameter.parameter_type) {
                return Err(Error::invalid_argument(format!(
                    "argument `{}` of event `{name}` is not a {}",
                    parameter.name, parameter.parameter_type
                )));
            }
        }
    }

    let hash = EngineHost::current_script_hash(engine)
        .ok_or_else(|| Error::invalid_operation("no executing script"))?;
    let state = state.iter().map(deep_copy).collect();
    host.send_notification(engine, hash, name, state);
    Ok(())
}

/// Checks that `item` can stand for a parameter of type `parameter_type`.
/// Null is accepted for every reference-like type.
pub fn check_item_type(item: &StackItem, parameter_type: ContractParameterType) -> bool {
    use ContractParameterType as T;
    let bytes_len = |item: &StackItem| match item {
        StackItem::ByteString(bytes) => Some(bytes.len()),
        StackItem::Buffer(buffer) => Some(buffer.borrow().len()),
        _ => None,
    };
    match parameter_type {
        T::Any => true,
        T::Boolean => matches!(item, StackItem::Boolean(_)),
        T::Integer => matches!(item, StackItem::Integer(_)),
        _ if item.is_null() => true,
        T::ByteArray => bytes_len(item).is_some(),
        T::String => bytes_len(item).is_some() && item.get_string().is_ok(),
        T::Hash160 => bytes_len(item) == Some(20),
        T::Hash256 => bytes_len(item) == Some(32),
        T::PublicKey => bytes_len(item) == Some(33),
        T::Signature => bytes_len(item) == Some(64),
        T::Array => matches!(item, StackItem::Array(_) | StackItem::Struct(_)),
        T::Map => matches!(item, StackItem::Map(_)),
        T::InteropInterface => matches!(item, StackItem::InteropInterface(_)),
        T::Void => false,
    }
}

fn get_notifications(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let item = engine.pop()?;
    let filter = if item.is_null() {
        None
    } else {
        Some(UInt160::from_bytes(&item.get_bytes()?)?)
    };
    let events = host.notifications_from(filter.as_ref());
    if events.len() > engine.limits().max_stack_size {
        return Err(Error::invalid_operation("too many notifications"));
    }
    let items = events.iter().map(|event| event.to_stack_item()).collect();
    engine.push(StackItem::from_array(items))?;
    Ok(())
}

fn gas_left(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let left = engine.gas_left().unwrap_or(-1);
    engine.push(StackItem::from_int(left))?;
    Ok(())
}

fn burn_gas(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let datoshi = engine.pop_i64()?;
    if datoshi <= 0 {
        return Err(Error::invalid_argument("GAS must be positive"));
    }
    engine.add_fee(datoshi)?;
    Ok(())
}

fn signer_to_stack_item(signer: &Signer) -> StackItem {
    StackItem::from_array(vec![
        StackItem::from_byte_string(signer.account.to_vec()),
        StackItem::from_int(signer.scopes.bits()),
        StackItem::from_array(
            signer
                .allowed_contracts
                .iter()
                .map(|hash| StackItem::from_byte_string(hash.to_vec()))
                .collect(),
        ),
        StackItem::from_array(
            signer
                .allowed_groups
                .iter()
                .map(|key| StackItem::from_byte_string(key.to_vec()))
                .collect(),
        ),
        StackItem::from_array(Vec::new()),
    ])
}

fn current_signers(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let item = match host.signers() {
        Some(signers) => StackItem::from_array(signers.iter().map(signer_to_stack_item).collect()),
        None => StackItem::Null,
    };
    engine.push(item)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_types() {
        use ContractParameterType as T;
        assert!(check_item_type(&StackItem::from_int(1), T::Integer));
        assert!(!check_item_type(&StackItem::Null, T::Integer));
        assert!(check_item_type(&StackItem::Null, T::Hash160));
        assert!(check_item_type(&StackItem::from_byte_string(vec![0; 20]), T::Hash160));
        assert!(!check_item_type(&StackItem::from_byte_string(vec![0; 21]), T::Hash160));
        assert!(!check_item_type(&StackItem::from_byte_string(vec![0xff]), T::String));
        assert!(check_item_type(&StackItem::from_struct(Vec::new()), T::Array));
        assert!(check_item_type(&StackItem::from_bool(true), T::Any));
    }
}
