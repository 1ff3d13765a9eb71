//! End-to-end scenarios: scripts run by an application engine on top of a
//! genesis store.

use neo_engine::prelude::*;
use neo_engine::smart_contract::native::fungible_token;
use neo_engine::smart_contract::native::{native_hash, GasToken, NeoToken};
use num_bigint::BigInt;
use proptest::prelude::*;
use std::sync::Arc;

fn settings() -> Arc<ProtocolSettings> {
    let mut key = [7u8; 33];
    key[0] = 0x03;
    Arc::new(ProtocolSettings {
        standby_committee: vec![PublicKey::from_bytes(&key).unwrap()],
        validators_count: 1,
        ..ProtocolSettings::default()
    })
}

fn engine(settings: &Arc<ProtocolSettings>) -> ApplicationEngine {
    ApplicationEngine::builder(Arc::clone(settings))
        .boxed_snapshot(neo_engine::genesis(settings).unwrap())
        .height(1)
        .gas_limit(10_0000_0000)
        .build()
}

fn run(settings: &Arc<ProtocolSettings>, script: Vec<u8>) -> ApplicationEngine {
    let mut engine = engine(settings);
    engine.load_script(script, CallFlags::ALL).unwrap();
    engine.execute();
    engine
}

fn ops(codes: &[OpCode]) -> Vec<u8> {
    codes.iter().map(|code| *code as u8).collect()
}

#[test]
fn addition_halts_with_the_sum() {
    let engine = run(&settings(), ops(&[OpCode::PUSH3, OpCode::PUSH5, OpCode::ADD]));
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_int(8)]);
}

#[test]
fn division_by_zero_faults() {
    let engine = run(&settings(), ops(&[OpCode::PUSH5, OpCode::PUSH0, OpCode::DIV]));
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(engine.fault_message().is_some());
}

#[test]
fn caught_exception_resumes_after_endtry() {
    let script = hex::decode("3b0500113a453d0219").unwrap();
    assert_eq!(script[0], OpCode::TRY as u8);
    let engine = run(&settings(), script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_int(9)]);
}

#[test]
fn genesis_distributes_initial_tokens() {
    let settings = settings();
    let store = neo_engine::genesis(&settings).unwrap();
    assert_eq!(
        fungible_token::total_supply::<GasToken>(store.as_ref()),
        BigInt::from(settings.initial_gas_distribution)
    );
    assert_eq!(
        fungible_token::total_supply::<NeoToken>(store.as_ref()),
        BigInt::from(100_000_000)
    );
}

#[test]
fn call_native_rejects_unknown_versions() {
    let settings = settings();
    let natives = NativeRegistry::new();
    let policy = natives.get_by_name("PolicyContract").unwrap();
    assert_eq!(policy.hash(), native_hash("PolicyContract"));

    let state = natives.contract_state(policy.as_ref(), &settings, 1);
    let offset = state.manifest.abi.get_method("isBlocked", 1).unwrap().offset as usize;
    let account = StackItem::from_byte_string(vec![0; 20]);

    let mut current = engine(&settings);
    current
        .load_contract(state.clone(), "isBlocked", vec![account.clone()], CallFlags::ALL)
        .unwrap();
    assert_eq!(current.execute(), VMState::HALT);
    assert_eq!(current.result_stack().as_slice(), &[StackItem::from_bool(false)]);

    // the stub pushes the version before its CallNative syscall
    let mut patched = state;
    patched.nef.script[offset] = OpCode::PUSH1 as u8;
    let mut future = engine(&settings);
    future
        .load_contract(patched, "isBlocked", vec![account], CallFlags::ALL)
        .unwrap();
    assert_eq!(future.execute(), VMState::FAULT);
    assert!(future.fault_message().unwrap().contains("dispatch error"));
}

#[test]
fn tracing_initialises_once() {
    neo_engine::init_tracing();
    neo_engine::init_tracing();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn identical_scripts_are_deterministic(values in proptest::collection::vec(any::<i32>(), 1..16)) {
        let settings = settings();
        let mut builder = ScriptBuilder::new();
        builder.emit_push_int(0);
        for value in &values {
            builder.emit_push_int(i64::from(*value)).emit_opcode(OpCode::ADD);
        }
        let script = builder.to_array();

        let first = run(&settings, script.clone());
        let second = run(&settings, script);
        prop_assert_eq!(first.state(), VMState::HALT);
        prop_assert_eq!(first.gas_consumed(), second.gas_consumed());
        let sum: i64 = values.iter().map(|value| i64::from(*value)).sum();
        prop_assert_eq!(first.result_stack().as_slice(), &[StackItem::from_int(sum)]);
        prop_assert_eq!(first.result_stack().as_slice(), second.result_stack().as_slice());
    }

    #[test]
    fn gas_grows_with_every_instruction(count in 1usize..64) {
        let settings = settings();
        let shorter = run(&settings, vec![OpCode::NOP as u8; count]);
        let longer = run(&settings, vec![OpCode::NOP as u8; count + 1]);
        prop_assert!(longer.gas_consumed() > shorter.gas_consumed());
    }
}
