use super::*;
use crate::native::test_support::{call, committee_signer, genesis, hash_arg, open_engine, result, settings};
use neo_vm::{StackItem, VMState};

#[test]
fn genesis_writes_defaults() {
    let settings = settings(4);
    let store = genesis(&settings);
    assert_eq!(exec_fee_factor(store.as_ref()), 30);
    assert_eq!(storage_price(store.as_ref()), 100_000);
    assert_eq!(fee_per_byte(store.as_ref()), 1_000);
    assert_eq!(
        attribute_fee(store.as_ref(), AttributeType::NotaryAssisted),
        DEFAULT_NOTARY_ASSISTED_ATTRIBUTE_FEE
    );
}

#[test]
fn getters_are_callable_without_witness() {
    let settings = settings(4);
    let mut engine = open_engine(&settings, genesis(&settings), Vec::new());
    assert_eq!(call(&mut engine, "PolicyContract", "getFeePerByte", vec![]), VMState::HALT);
    assert_eq!(result(&engine), StackItem::from_int(1_000));

    let mut engine = engine_with(&settings, Vec::new());
    let state = call(
        &mut engine,
        "PolicyContract",
        "getMillisecondsPerBlock",
        vec![],
    );
    assert_eq!(state, VMState::HALT);
    assert_eq!(
        result(&engine),
        StackItem::from_int(settings.milliseconds_per_block)
    );
}

fn engine_with(
    settings: &std::sync::Arc<neo_core::ProtocolSettings>,
    signers: Vec<crate::witness::Signer>,
) -> crate::application_engine::ApplicationEngine {
    open_engine(settings, genesis(settings), signers)
}

#[test]
fn setters_require_the_committee() {
    let settings = settings(4);
    let mut unsigned = engine_with(&settings, Vec::new());
    let state = call(
        &mut unsigned,
        "PolicyContract",
        "setFeePerByte",
        vec![StackItem::from_int(5)],
    );
    assert_eq!(state, VMState::FAULT);
    assert!(unsigned
        .fault_message()
        .unwrap()
        .contains("invalid committee signature"));

    let mut signed = engine_with(&settings, vec![committee_signer(&settings)]);
    let state = call(
        &mut signed,
        "PolicyContract",
        "setFeePerByte",
        vec![StackItem::from_int(5)],
    );
    assert_eq!(state, VMState::HALT);
    assert!(signed.result_stack().is_empty());
    assert_eq!(fee_per_byte(signed.snapshot()), 5);
}

#[test]
fn setter_ranges() {
    let settings = settings(1);
    for (method, value) in [
        ("setExecFeeFactor", 0),
        ("setExecFeeFactor", 101),
        ("setStoragePrice", 10_000_001),
        ("setFeePerByte", -1),
    ] {
        let mut engine = engine_with(&settings, vec![committee_signer(&settings)]);
        let state = call(&mut engine, "PolicyContract", method, vec![StackItem::from_int(value)]);
        assert_eq!(state, VMState::FAULT, "{method}({value})");
    }
}

#[test]
fn blocking_accounts() {
    let settings = settings(1);
    let account = UInt160::from_array([9; 20]);
    let mut engine = engine_with(&settings, vec![committee_signer(&settings)]);
    assert_eq!(
        call(&mut engine, "PolicyContract", "blockAccount", vec![hash_arg(&account)]),
        VMState::HALT
    );
    assert_eq!(result(&engine), StackItem::from_bool(true));
    assert!(is_blocked(engine.snapshot(), &account));

    let store = engine.into_snapshot();
    let mut engine = open_engine(&settings, store, vec![committee_signer(&settings)]);
    call(&mut engine, "PolicyContract", "blockAccount", vec![hash_arg(&account)]);
    assert_eq!(result(&engine), StackItem::from_bool(false));

    let store = engine.into_snapshot();
    let mut engine = open_engine(&settings, store, vec![committee_signer(&settings)]);
    call(&mut engine, "PolicyContract", "unblockAccount", vec![hash_arg(&account)]);
    assert_eq!(result(&engine), StackItem::from_bool(true));
    assert!(!is_blocked(engine.snapshot(), &account));
}

#[test]
fn natives_cannot_be_blocked() {
    let settings = settings(1);
    let mut engine = engine_with(&settings, vec![committee_signer(&settings)]);
    let gas = native_hash("GasToken");
    assert_eq!(
        call(&mut engine, "PolicyContract", "blockAccount", vec![hash_arg(&gas)]),
        VMState::FAULT
    );
}

#[test]
fn milliseconds_per_block_change_is_announced() {
    let settings = settings(1);
    let mut engine = engine_with(&settings, vec![committee_signer(&settings)]);
    let state = call(
        &mut engine,
        "PolicyContract",
        "setMillisecondsPerBlock",
        vec![StackItem::from_int(3_000)],
    );
    assert_eq!(state, VMState::HALT);
    let [event] = engine.notifications() else {
        panic!("expected one notification");
    };
    assert_eq!(event.event_name, "MillisecondsPerBlockChanged");
    assert_eq!(
        event.state,
        vec![
            StackItem::from_int(settings.milliseconds_per_block),
            StackItem::from_int(3_000)
        ]
    );
}

#[test]
fn attribute_types_are_validated() {
    let settings = settings(1);
    let mut engine = engine_with(&settings, Vec::new());
    assert_eq!(
        call(&mut engine, "PolicyContract", "getAttributeFee", vec![StackItem::from_int(0x02)]),
        VMState::FAULT
    );
    let mut engine = engine_with(&settings, Vec::new());
    assert_eq!(
        call(&mut engine, "PolicyContract", "getAttributeFee", vec![StackItem::from_int(0x22)]),
        VMState::HALT
    );
    assert_eq!(
        result(&engine),
        StackItem::from_int(DEFAULT_NOTARY_ASSISTED_ATTRIBUTE_FEE)
    );
}
