//! RoleManagement native contract.
//!
//! The committee designates the nodes holding a system role. Every
//! designation takes effect at the next block and is kept under
//! `[role] ++ index` so earlier lists stay queryable.

use super::native_contract::{
    assert_committee, MethodTable, NativeArgs, NativeContract, NativeEvent, NativeMethod, NativeValue,
};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::storage::{DataCache, SeekDirection, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_core::PublicKey;
use neo_vm::{CallFlags, ExecutionEngine, StackItem};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Storage id of RoleManagement.
pub const ID: i32 = -8;

/// Most nodes a single designation may name.
pub const MAX_NODES: usize = 32;

const KEY_LENGTH: usize = 33;

/// Designated roles in the Neo blockchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    StateValidator = 4,
    Oracle = 8,
    NeoFSAlphabetNode = 16,
    /// Nodes signing notary-assisted transactions.
    P2PNotary = 32,
}

impl Role {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            4 => Some(Role::StateValidator),
            8 => Some(Role::Oracle),
            16 => Some(Role::NeoFSAlphabetNode),
            32 => Some(Role::P2PNotary),
            _ => None,
        }
    }

    fn from_argument(args: &NativeArgs, index: usize) -> Result<Self> {
        let value = args.i64(index)?;
        u8::try_from(value)
            .ok()
            .and_then(Self::from_u8)
            .ok_or_else(|| Error::invalid_argument(format!("unknown role {value}")))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// RoleManagement native contract
pub struct RoleManagement {
    methods: MethodTable,
}

impl Default for RoleManagement {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleManagement {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods
            .register_method(
                "getDesignatedByRole",
                Self::get_designated_by_role,
                1 << 15,
                0,
                CallFlags::READ_STATES,
                None,
            )
            .params(&[("role", T::Integer), ("index", T::Integer)])
            .returns(T::Array);
        methods
            .register_method(
                "designateAsRole",
                Self::designate_as_role,
                1 << 15,
                0,
                CallFlags::STATES | CallFlags::ALLOW_NOTIFY,
                None,
            )
            .params(&[("role", T::Integer), ("nodes", T::Array)]);
        Self { methods }
    }

    fn get_designated_by_role(host: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let role = Role::from_argument(args, 0)?;
        let index = args.u32(1)?;
        let next = host.block_height().saturating_add(1);
        if index > next {
            return Err(Error::invalid_argument(format!(
                "index {index} is beyond the next block {next}"
            )));
        }
        Ok(NativeValue::array(designated_by_role(host.snapshot(), role, index)?))
    }

    fn designate_as_role(host: &mut EngineHost, engine: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let role = Role::from_argument(args, 0)?;
        let mut nodes = args
            .array(1)?
            .iter()
            .map(|item| Ok(PublicKey::from_bytes(&item.get_bytes()?)?))
            .collect::<Result<Vec<_>>>()?;
        if nodes.is_empty() || nodes.len() > MAX_NODES {
            return Err(Error::invalid_argument(format!(
                "designation must name 1 to {MAX_NODES} nodes, got {}",
                nodes.len()
            )));
        }
        assert_committee(host, engine)?;

        let index = host.block_height() + 1;
        let key = node_list_key(role, index);
        if host.snapshot().contains(&key) {
            return Err(Error::invalid_operation(format!(
                "{role} is already designated at {index}"
            )));
        }
        nodes.sort();
        let value = nodes.iter().flat_map(|node| node.to_vec()).collect();
        host.snapshot_mut().put(key, StorageItem::new(value));
        info!(%role, index, nodes = nodes.len(), "role designated");

        let hash = super::native_hash("RoleManagement");
        host.send_notification(
            engine,
            hash,
            "Designation",
            vec![StackItem::from_int(role as u8), StackItem::from_int(index)],
        );
        Ok(NativeValue::Void)
    }
}

impl NativeContract for RoleManagement {
    fn id(&self) -> i32 {
        ID
    }

    fn name(&self) -> &'static str {
        "RoleManagement"
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }

    fn events(&self) -> Vec<NativeEvent> {
        vec![NativeEvent::new(
            "Designation",
            &[("Role", T::Integer), ("BlockIndex", T::Integer)],
        )]
    }
}

fn node_list_key(role: Role, index: u32) -> StorageKey {
    StorageKey::create(ID, role as u8).add_u32_be(index)
}

/// Nodes holding `role` at block `index`: the latest designation at or
/// before it, or none.
pub fn designated_by_role(snapshot: &dyn DataCache, role: Role, index: u32) -> Result<Vec<PublicKey>> {
    let prefix = StorageKey::create(ID, role as u8);
    let latest = snapshot
        .find(&prefix, SeekDirection::Backward)
        .into_iter()
        .find(|(key, _)| {
            key.key
                .get(1..5)
                .and_then(|bytes| bytes.try_into().ok())
                .map_or(false, |bytes: [u8; 4]| u32::from_be_bytes(bytes) <= index)
        });
    let Some((_, item)) = latest else {
        return Ok(Vec::new());
    };
    if item.value.len() % KEY_LENGTH != 0 {
        return Err(Error::StorageError(format!(
            "node list of {role} has {} bytes",
            item.value.len()
        )));
    }
    item.value
        .chunks(KEY_LENGTH)
        .map(|chunk| Ok(PublicKey::from_bytes(chunk)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::test_support::{call, committee_signer, elements, genesis, keys, open_engine, result, settings};
    use neo_vm::VMState;

    fn node_array(nodes: &[PublicKey]) -> StackItem {
        StackItem::from_array(
            nodes
                .iter()
                .map(|node| StackItem::from_byte_string(node.to_vec()))
                .collect(),
        )
    }

    #[test]
    fn designation_applies_from_next_block() {
        let settings = settings(1);
        let mut nodes = keys(3);
        nodes.reverse();
        let mut engine = open_engine(&settings, genesis(&settings), vec![committee_signer(&settings)]);
        let state = call(
            &mut engine,
            "RoleManagement",
            "designateAsRole",
            vec![StackItem::from_int(Role::Oracle as u8), node_array(&nodes)],
        );
        assert_eq!(state, VMState::HALT);

        nodes.sort();
        assert_eq!(designated_by_role(engine.snapshot(), Role::Oracle, 2).unwrap(), nodes);
        assert!(designated_by_role(engine.snapshot(), Role::Oracle, 1).unwrap().is_empty());
        assert!(designated_by_role(engine.snapshot(), Role::StateValidator, 2).unwrap().is_empty());

        let [event] = engine.notifications() else {
            panic!("expected one notification");
        };
        assert_eq!(event.event_name, "Designation");
        assert_eq!(event.state, vec![StackItem::from_int(8), StackItem::from_int(2)]);
    }

    #[test]
    fn scripts_query_designations() {
        let settings = settings(1);
        let nodes = keys(2);
        let mut engine = open_engine(&settings, genesis(&settings), vec![committee_signer(&settings)]);
        call(
            &mut engine,
            "RoleManagement",
            "designateAsRole",
            vec![StackItem::from_int(Role::P2PNotary as u8), node_array(&nodes)],
        );
        let store = engine.into_snapshot();

        let mut engine = open_engine(&settings, store, Vec::new());
        let state = call(
            &mut engine,
            "RoleManagement",
            "getDesignatedByRole",
            vec![StackItem::from_int(32), StackItem::from_int(2)],
        );
        assert_eq!(state, VMState::HALT);
        assert_eq!(elements(&result(&engine)).len(), 2);
    }

    #[test]
    fn index_beyond_next_block_faults() {
        let settings = settings(1);
        let mut engine = open_engine(&settings, genesis(&settings), Vec::new());
        let state = call(
            &mut engine,
            "RoleManagement",
            "getDesignatedByRole",
            vec![StackItem::from_int(4), StackItem::from_int(3)],
        );
        assert_eq!(state, VMState::FAULT);
    }

    #[test]
    fn designation_rules() {
        let settings = settings(1);
        let cases = [
            (StackItem::from_int(8), node_array(&[]), vec![committee_signer(&settings)]),
            (StackItem::from_int(5), node_array(&keys(1)), vec![committee_signer(&settings)]),
            (StackItem::from_int(8), node_array(&keys(1)), Vec::new()),
        ];
        for (role, nodes, signers) in cases {
            let mut engine = open_engine(&settings, genesis(&settings), signers);
            let state = call(&mut engine, "RoleManagement", "designateAsRole", vec![role, nodes]);
            assert_eq!(state, VMState::FAULT);
        }
    }

    #[test]
    fn hash_matches_the_network() {
        assert_eq!(
            RoleManagement::new().hash().to_string(),
            "0x49cf4e5378ffcd4dec034fd98a174c5491e395e2"
        );
    }
}
