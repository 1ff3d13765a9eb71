//! Notifications, logs and witness checks.

use super::{EngineHost, ExecutionContextState};
use crate::native::contract_management;
use crate::witness::WitnessContext;
use crate::Result;
use neo_core::{PublicKey, UInt160};
use neo_vm::{Array, ExecutionEngine, Map, StackItem};
use std::collections::HashMap;
use tracing::debug;

/// A notification sent by a contract through `System.Runtime.Notify` or by a
/// native contract event.
#[derive(Debug, Clone)]
pub struct NotifyEventArgs {
    pub script_hash: UInt160,
    pub event_name: String,
    /// Immutable copy of the state taken when the event was sent.
    pub state: Vec<StackItem>,
}

impl NotifyEventArgs {
    pub fn new(script_hash: UInt160, event_name: impl Into<String>, state: Vec<StackItem>) -> Self {
        Self {
            script_hash,
            event_name: event_name.into(),
            state,
        }
    }

    /// `[script hash, event name, state]` as returned by
    /// `System.Runtime.GetNotifications`.
    pub fn to_stack_item(&self) -> StackItem {
        StackItem::from_array(vec![
            StackItem::from_byte_string(self.script_hash.to_vec()),
            StackItem::from_byte_string(self.event_name.as_bytes()),
            StackItem::from_array(self.state.iter().map(deep_copy).collect()),
        ])
    }
}

/// A message sent through `System.Runtime.Log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEventArgs {
    pub script_hash: UInt160,
    pub message: String,
}

/// Copies `item` so later changes to the original are not observed.
/// Buffers become byte strings and shared or cyclic compounds keep their
/// shape.
pub fn deep_copy(item: &StackItem) -> StackItem {
    deep_copy_inner(item, &mut HashMap::new())
}

fn deep_copy_inner(item: &StackItem, copies: &mut HashMap<usize, StackItem>) -> StackItem {
    if let Some(id) = item.compound_id() {
        if let Some(copy) = copies.get(&id) {
            return copy.clone();
        }
    }
    match item {
        StackItem::Buffer(buffer) => StackItem::from_byte_string(buffer.borrow().clone()),
        StackItem::Array(array) => {
            let copy = Array::new(Vec::with_capacity(array.len()));
            copies.insert(array.id(), StackItem::Array(copy.clone()));
            for element in array.to_vec() {
                let element = deep_copy_inner(&element, copies);
                copy.borrow_mut().push(element);
            }
            StackItem::Array(copy)
        }
        StackItem::Struct(s) => {
            let fields = s.to_vec();
            let copy = StackItem::from_struct(Vec::with_capacity(fields.len()));
            if let StackItem::Struct(target) = &copy {
                copies.insert(s.id(), copy.clone());
                for field in fields {
                    let field = deep_copy_inner(&field, copies);
                    target.borrow_mut().push(field);
                }
            }
            copy
        }
        StackItem::Map(map) => {
            let copy = Map::new();
            copies.insert(map.id(), StackItem::Map(copy.clone()));
            for (key, value) in map.borrow().iter() {
                let value = deep_copy_inner(value, copies);
                copy.insert(key.clone(), value);
            }
            StackItem::Map(copy)
        }
        other => other.clone(),
    }
}

impl EngineHost {
    /// Records a notification from `script_hash` and counts it against the
    /// current context, so it is discarded if that context faults.
    pub fn send_notification(
        &mut self,
        engine: &ExecutionEngine,
        script_hash: UInt160,
        event_name: impl Into<String>,
        state: Vec<StackItem>,
    ) {
        let event_name = event_name.into();
        debug!(contract = %script_hash, event = %event_name, "notification");
        self.notifications
            .push(NotifyEventArgs::new(script_hash, event_name, state));
        if let Some(context) = engine.current_context() {
            context.update_state::<ExecutionContextState, _>(|state| state.notification_count += 1);
        }
    }

    /// Records a log message from `script_hash`.
    pub fn send_log(&mut self, script_hash: UInt160, message: String) {
        debug!(contract = %script_hash, "log: {message}");
        self.logs.push(LogEventArgs {
            script_hash,
            message,
        });
    }

    /// Notifications sent so far, optionally only those from `hash`.
    pub fn notifications_from(&self, hash: Option<&UInt160>) -> Vec<&NotifyEventArgs> {
        self.notifications
            .iter()
            .filter(|event| hash.map_or(true, |hash| event.script_hash == *hash))
            .collect()
    }

    /// Drops the last `count` notifications.
    pub(crate) fn discard_notifications(&mut self, count: usize) {
        let keep = self.notifications.len().saturating_sub(count);
        self.notifications.truncate(keep);
    }

    /// Checks whether `hash` witnessed the current execution: either it is
    /// the calling script, or it signed the container with a scope that
    /// covers the current context.
    pub fn check_witness(&self, engine: &ExecutionEngine, hash: &UInt160) -> Result<bool> {
        let calling = Self::calling_script_hash(engine);
        if calling.as_ref() == Some(hash) {
            return Ok(true);
        }
        let Some(signer) = self
            .signers()
            .and_then(|signers| signers.iter().find(|signer| signer.account == *hash))
        else {
            return Ok(false);
        };

        let Some(context) = engine.current_context() else {
            return Ok(false);
        };
        let state = ExecutionContextState::of(context);
        let current = super::script_hash_of(context);
        let groups: Vec<PublicKey> = match &state.contract {
            Some(contract) => contract.manifest.groups.iter().map(|g| g.pub_key).collect(),
            None => contract_management::get_contract(self.snapshot(), &current)?
                .map(|contract| contract.manifest.groups.iter().map(|g| g.pub_key).collect())
                .unwrap_or_default(),
        };
        let entry = Self::entry_script_hash(engine).unwrap_or(current);
        Ok(signer.allows(&WitnessContext {
            current_script_hash: current,
            calling_script_hash: calling,
            entry_script_hash: entry,
            current_groups: &groups,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_copy_detaches_compounds() {
        let inner = StackItem::from_buffer(vec![1, 2]);
        let original = StackItem::from_array(vec![inner.clone(), StackItem::from_int(3)]);
        let copy = deep_copy(&original);

        if let StackItem::Array(array) = &original {
            array.borrow_mut().push(StackItem::Null);
        }
        match copy {
            StackItem::Array(array) => {
                assert_eq!(array.len(), 2);
                assert_eq!(array.get(0), Some(StackItem::from_byte_string(vec![1, 2])));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deep_copy_keeps_cycles() {
        let array = Array::new(Vec::new());
        array.borrow_mut().push(StackItem::Array(array.clone()));
        let copy = deep_copy(&StackItem::Array(array.clone()));
        match copy {
            StackItem::Array(copied) => {
                assert!(!copied.ptr_eq(&array));
                match copied.get(0) {
                    Some(StackItem::Array(inner)) => assert!(inner.ptr_eq(&copied)),
                    other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
