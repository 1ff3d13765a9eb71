//! Chain fixtures shared by the native contract tests.

use crate::account::committee_address;
use crate::application_engine::ApplicationEngine;
use crate::storage::{DataCache, MemoryStore};
use crate::trigger::TriggerType;
use crate::witness::Signer;
use neo_core::{ProtocolSettings, PublicKey, UInt160};
use neo_vm::{CallFlags, StackItem, VMState};
use std::sync::Arc;

pub(crate) fn keys(count: u8) -> Vec<PublicKey> {
    (1..=count)
        .map(|i| {
            let mut bytes = [i; 33];
            bytes[0] = 0x02 + (i % 2);
            PublicKey::from_bytes(&bytes).unwrap()
        })
        .collect()
}

/// Settings with a committee of `size` members, all of them validators.
pub(crate) fn settings(size: u8) -> Arc<ProtocolSettings> {
    Arc::new(ProtocolSettings {
        standby_committee: keys(size),
        validators_count: u32::from(size),
        ..ProtocolSettings::default()
    })
}

pub(crate) fn committee_signer(settings: &ProtocolSettings) -> Signer {
    Signer::called_by_entry(committee_address(&settings.standby_committee).unwrap())
}

/// A store holding the genesis state of every native contract.
pub(crate) fn genesis(settings: &Arc<ProtocolSettings>) -> Box<dyn DataCache> {
    let mut engine = ApplicationEngine::builder(Arc::clone(settings))
        .trigger(TriggerType::OnPersist)
        .snapshot(MemoryStore::new())
        .height(0)
        .build();
    engine.initialize_natives().unwrap();
    engine.into_snapshot()
}

pub(crate) fn open_engine(
    settings: &Arc<ProtocolSettings>,
    snapshot: Box<dyn DataCache>,
    signers: Vec<Signer>,
) -> ApplicationEngine {
    ApplicationEngine::builder(Arc::clone(settings))
        .boxed_snapshot(snapshot)
        .height(1)
        .signers(signers)
        .build()
}

/// Calls `method` of the native named `contract` as the entry context.
pub(crate) fn call(
    engine: &mut ApplicationEngine,
    contract: &str,
    method: &str,
    args: Vec<StackItem>,
) -> VMState {
    let natives = Arc::clone(engine.host().natives());
    let native = natives.get_by_name(contract).unwrap();
    let state = natives.contract_state(
        native.as_ref(),
        engine.host().settings(),
        engine.host().block_height(),
    );
    engine
        .load_contract(state, method, args, CallFlags::ALL)
        .unwrap();
    engine.execute()
}

/// The single result of a halted call.
pub(crate) fn result(engine: &ApplicationEngine) -> StackItem {
    match engine.result_stack().as_slice() {
        [item] => item.clone(),
        other => panic!("expected one result, got {other:?}"),
    }
}

pub(crate) fn hash_arg(hash: &UInt160) -> StackItem {
    StackItem::from_byte_string(hash.to_vec())
}

/// Elements of an Array result.
pub(crate) fn elements(item: &StackItem) -> Vec<StackItem> {
    match item {
        StackItem::Array(array) => array.to_vec(),
        other => panic!("expected an array, got {other:?}"),
    }
}
