//! `System.Storage.*` services.

use super::InteropRegistry;
use crate::application_engine::{EngineHost, FindOptions, StorageContext};
use crate::{Error, Result};
use neo_vm::{CallFlags, ExecutionEngine, InteropObject, StackItem};
use std::cell::RefCell;
use std::rc::Rc;

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register("System.Storage.GetContext", get_context, 1 << 4, CallFlags::READ_STATES);
    registry.register(
        "System.Storage.GetReadOnlyContext",
        get_read_only_context,
        1 << 4,
        CallFlags::READ_STATES,
    );
    registry.register("System.Storage.AsReadOnly", as_read_only, 1 << 4, CallFlags::READ_STATES);
    registry.register("System.Storage.Get", get, 1 << 15, CallFlags::READ_STATES);
    registry.register("System.Storage.Find", find, 1 << 15, CallFlags::READ_STATES);
    registry.register("System.Storage.Put", put, 1 << 15, CallFlags::WRITE_STATES);
    registry.register("System.Storage.Delete", delete, 1 << 15, CallFlags::WRITE_STATES);
}

/// Pops an interop interface item and returns its host object.
pub(crate) fn pop_interface(engine: &mut ExecutionEngine) -> Result<Rc<RefCell<dyn InteropObject>>> {
    match engine.pop()? {
        StackItem::InteropInterface(object) => Ok(object),
        other => Err(Error::invalid_argument(format!(
            "expected an interop interface, found {}",
            other.stack_item_type()
        ))),
    }
}

fn pop_storage_context(engine: &mut ExecutionEngine) -> Result<StorageContext> {
    let object = pop_interface(engine)?;
    let object = object.borrow();
    object
        .as_any()
        .downcast_ref::<StorageContext>()
        .copied()
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "expected a storage context, found {}",
                object.interface_type()
            ))
        })
}

fn get_context(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let context = host.storage_context(engine, false)?;
    engine.push(StackItem::from_interface(context))?;
    Ok(())
}

fn get_read_only_context(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let context = host.storage_context(engine, true)?;
    engine.push(StackItem::from_interface(context))?;
    Ok(())
}

fn as_read_only(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let context = pop_storage_context(engine)?;
    engine.push(StackItem::from_interface(context.as_read_only()))?;
    Ok(())
}

fn get(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let context = pop_storage_context(engine)?;
    let key = engine.pop_bytes()?;
    let item = match host.storage_get(&context, &key) {
        Some(value) => StackItem::from_byte_string(value),
        None => StackItem::Null,
    };
    engine.push(item)?;
    Ok(())
}

fn find(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let context = pop_storage_context(engine)?;
    let prefix = engine.pop_bytes()?;
    let options = FindOptions::from_script_value(engine.pop_i64()?)?;
    let iterator = host.storage_find(&context, &prefix, options);
    engine.push(StackItem::from_interface(iterator))?;
    Ok(())
}

fn put(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let context = pop_storage_context(engine)?;
    let key = engine.pop_bytes()?;
    let value = engine.pop_bytes()?;
    host.storage_put(engine, &context, &key, &value)
}

fn delete(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let context = pop_storage_context(engine)?;
    let key = engine.pop_bytes()?;
    host.storage_delete(&context, &key)
}
