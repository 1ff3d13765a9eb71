//! `System.Iterator.*` services.

use super::storage::pop_interface;
use super::InteropRegistry;
use crate::application_engine::{EngineHost, StorageIterator};
use crate::{Error, Result};
use neo_vm::{CallFlags, ExecutionEngine};

pub(super) fn register(registry: &mut InteropRegistry) {
    registry.register("System.Iterator.Next", next, 1 << 15, CallFlags::NONE);
    registry.register("System.Iterator.Value", value, 1 << 4, CallFlags::NONE);
}

fn not_an_iterator(kind: &str) -> Error {
    Error::invalid_argument(format!("expected an iterator, found {kind}"))
}

fn next(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let object = pop_interface(engine)?;
    let advanced = {
        let mut object = object.borrow_mut();
        let kind = object.interface_type().to_string();
        object
            .as_any_mut()
            .downcast_mut::<StorageIterator>()
            .ok_or_else(|| not_an_iterator(&kind))?
            .next()
    };
    engine.push(advanced.into())?;
    Ok(())
}

fn value(_host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let object = pop_interface(engine)?;
    let item = {
        let object = object.borrow();
        object
            .as_any()
            .downcast_ref::<StorageIterator>()
            .ok_or_else(|| not_an_iterator(object.interface_type()))?
            .value()?
    };
    engine.push(item)?;
    Ok(())
}
