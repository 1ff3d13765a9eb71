//! Native contract dispatch, driven through scripts the way a transaction
//! would reach it.

use neo_core::{hashing, Hardfork, ProtocolSettings, PublicKey, UInt160};
use neo_smart_contract::account::committee_address;
use neo_smart_contract::interop::interop_hash;
use neo_smart_contract::native::fungible_token::{self, FungibleToken};
use neo_smart_contract::native::{contract_management, native_hash, GasToken, NATIVE_METHOD_STRIDE};
use neo_smart_contract::{
    ApplicationEngine, DataCache, MemoryStore, NativeContract, NativeRegistry, Signer, TriggerType,
};
use neo_vm::op_code::OpCode;
use neo_vm::{CallFlags, ScriptBuilder, StackItem, VMState};
use num_bigint::BigInt;
use std::sync::Arc;

fn committee(size: u8) -> Vec<PublicKey> {
    (1..=size)
        .map(|i| {
            let mut bytes = [i; 33];
            bytes[0] = 0x02;
            PublicKey::from_bytes(&bytes).unwrap()
        })
        .collect()
}

fn settings() -> Arc<ProtocolSettings> {
    Arc::new(ProtocolSettings {
        standby_committee: committee(4),
        validators_count: 4,
        ..ProtocolSettings::default()
    })
}

fn genesis(settings: &Arc<ProtocolSettings>) -> Box<dyn DataCache> {
    let mut engine = ApplicationEngine::builder(Arc::clone(settings))
        .trigger(TriggerType::OnPersist)
        .snapshot(MemoryStore::new())
        .height(0)
        .build();
    engine.initialize_natives().unwrap();
    engine.into_snapshot()
}

fn engine(settings: &Arc<ProtocolSettings>, signers: Vec<Signer>) -> ApplicationEngine {
    ApplicationEngine::builder(Arc::clone(settings))
        .boxed_snapshot(genesis(settings))
        .height(1)
        .gas_limit(20_0000_0000)
        .signers(signers)
        .build()
}

/// Emits `System.Contract.Call(hash, method, flags, args)`.
fn emit_call(builder: &mut ScriptBuilder, hash: &UInt160, method: &str, flags: CallFlags, args: Vec<StackItem>) {
    builder.emit_push_item(&StackItem::from_array(args)).unwrap();
    builder
        .emit_push_int(i64::from(flags.bits()))
        .emit_push_string(method)
        .emit_push(hash.as_bytes())
        .emit_syscall(interop_hash("System.Contract.Call"));
}

fn run(engine: &mut ApplicationEngine, script: Vec<u8>) -> VMState {
    engine.load_script(script, CallFlags::ALL).unwrap();
    engine.execute()
}

/// `TRY { body; ENDTRY } CATCH { DROP; PUSH1; ENDTRY } RET`
fn try_drop_push1(body: &[u8]) -> Vec<u8> {
    let mut builder = ScriptBuilder::new();
    builder.emit_try(i8::try_from(3 + body.len() + 2).unwrap(), 0);
    builder.emit_raw(body);
    builder.emit_jump(OpCode::ENDTRY, 6).unwrap();
    builder.emit_opcode(OpCode::DROP).emit_opcode(OpCode::PUSH1);
    builder.emit_jump(OpCode::ENDTRY, 2).unwrap();
    builder.emit_opcode(OpCode::RET);
    builder.to_array()
}

#[test]
fn native_hashes_match_the_network() {
    let expected = [
        ("ContractManagement", "0xfffdc93764dbaddd97c48f252a53ea4643faa3fd"),
        ("StdLib", "0xacce6fd80d44e1796aa0c2c625e9e4e0ce39efc0"),
        ("CryptoLib", "0x726cb6e0cd8628a1350a611384688911ab75f51b"),
        ("LedgerContract", "0xda65b600f7124ce6c79950c1772a36403104f2be"),
        ("NeoToken", "0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5"),
        ("GasToken", "0xd2a4cff31913016155e38e474a2c06d08be276cf"),
        ("PolicyContract", "0xcc5e4edd9f5f8dba8bb65734541df7a1c081c67b"),
        ("RoleManagement", "0x49cf4e5378ffcd4dec034fd98a174c5491e395e2"),
        ("OracleContract", "0xfe924b7cfe89ddd271abaf7210a80a7e11178758"),
        ("Notary", "0xc1e14f19c3e60d0b9244d06dd7ba9b113135ec3b"),
    ];
    let registry = NativeRegistry::new();
    for (name, hash) in expected {
        assert_eq!(native_hash(name).to_string(), hash, "{name}");
        assert_eq!(registry.get_by_name(name).unwrap().hash().to_string(), hash);
    }
}

#[test]
fn genesis_deploys_every_native() {
    let settings = settings();
    let store = genesis(&settings);
    let registry = NativeRegistry::new();
    for native in registry.iter() {
        let state = contract_management::get_contract(store.as_ref(), &native.hash())
            .unwrap()
            .unwrap_or_else(|| panic!("{} is not deployed", native.name()));
        assert_eq!(state.id, native.id());
        assert_eq!(state.manifest.name, native.name());
        assert_eq!(state.script().len() % NATIVE_METHOD_STRIDE, 0);
    }
}

#[test]
fn scripts_call_std_lib() {
    let settings = settings();
    let mut engine = engine(&settings, Vec::new());
    let mut builder = ScriptBuilder::new();
    emit_call(
        &mut builder,
        &native_hash("StdLib"),
        "itoa",
        CallFlags::ALL,
        vec![StackItem::from_int(255), StackItem::from_int(16)],
    );
    assert_eq!(run(&mut engine, builder.to_array()), VMState::HALT);
    assert_eq!(
        engine.result_stack().as_slice(),
        &[StackItem::from_byte_string(b"0ff".to_vec())]
    );
}

#[test]
fn handler_errors_are_catchable() {
    let settings = settings();
    let mut engine = engine(&settings, Vec::new());

    let mut call = ScriptBuilder::new();
    emit_call(
        &mut call,
        &native_hash("StdLib"),
        "atoi",
        CallFlags::ALL,
        vec![StackItem::from_byte_string(b"x".to_vec())],
    );

    assert_eq!(run(&mut engine, try_drop_push1(&call.to_array())), VMState::HALT);
    assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_int(1)]);
}

#[test]
fn calls_leave_only_the_declared_result() {
    let settings = settings();
    let mut engine = engine(&settings, Vec::new());
    let mut builder = ScriptBuilder::new();
    emit_call(
        &mut builder,
        &native_hash("StdLib"),
        "itoa",
        CallFlags::ALL,
        vec![StackItem::from_int(10)],
    );
    assert_eq!(run(&mut engine, builder.to_array()), VMState::HALT);
    assert_eq!(
        engine.result_stack().as_slice(),
        &[StackItem::from_byte_string(b"10".to_vec())]
    );

    // Void methods reached dynamically still hand one value back.
    let committee = committee_address(&settings.standby_committee).unwrap();
    let mut engine = self::engine(&settings, vec![Signer::called_by_entry(committee)]);
    let mut builder = ScriptBuilder::new();
    emit_call(
        &mut builder,
        &native_hash("PolicyContract"),
        "setFeePerByte",
        CallFlags::ALL,
        vec![StackItem::from_int(3)],
    );
    assert_eq!(run(&mut engine, builder.to_array()), VMState::HALT);
    assert_eq!(engine.result_stack().as_slice(), &[StackItem::Null]);
}

#[test]
fn stack_faults_inside_syscalls_are_not_catchable() {
    let settings = settings();
    let mut engine = engine(&settings, Vec::new());
    let mut call = ScriptBuilder::new();
    call.emit_syscall(interop_hash("System.Contract.Call"));

    assert_eq!(run(&mut engine, try_drop_push1(&call.to_array())), VMState::FAULT);
    assert!(engine.result_stack().is_empty());
}

#[test]
fn caught_native_errors_release_the_callee_stack() {
    let settings = settings();
    let mut engine = engine(&settings, Vec::new());
    let mut call = ScriptBuilder::new();
    emit_call(
        &mut call,
        &native_hash("StdLib"),
        "atoi",
        CallFlags::ALL,
        vec![StackItem::from_byte_string(b"x".to_vec())],
    );

    assert_eq!(run(&mut engine, try_drop_push1(&call.to_array())), VMState::HALT);
    assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_int(1)]);
    let counter = engine.vm().reference_counter();
    assert_eq!(counter.check_zero_referred(), engine.result_stack().len());
    assert_eq!(counter.count(), 1);
}

#[test]
fn native_offsets_follow_the_hardforks_of_the_height() {
    let settings = Arc::new(ProtocolSettings {
        standby_committee: committee(4),
        validators_count: 4,
        hardforks: [(Hardfork::HF_Cockatrice, 100), (Hardfork::HF_Echidna, 200)]
            .into_iter()
            .collect(),
        ..ProtocolSettings::default()
    });
    let registry = NativeRegistry::new();
    let crypto = registry.get_by_name("CryptoLib").unwrap();
    let state = registry.contract_state(crypto.as_ref(), &settings, 100);
    let offset = state.manifest.abi.get_method("ripemd160", 1).unwrap().offset;
    assert_eq!(offset, 2 * NATIVE_METHOD_STRIDE as i32);

    let hash_at = |height: u32| {
        let mut engine = ApplicationEngine::builder(Arc::clone(&settings))
            .boxed_snapshot(genesis(&settings))
            .height(height)
            .gas_limit(20_0000_0000)
            .build();
        engine
            .load_contract(
                state.clone(),
                "ripemd160",
                vec![StackItem::from_byte_string(b"abc".to_vec())],
                CallFlags::ALL,
            )
            .unwrap();
        assert_eq!(engine.execute(), VMState::HALT);
        let [result] = engine.result_stack().as_slice() else {
            panic!("expected one result");
        };
        result.get_bytes().unwrap()
    };

    assert_eq!(hash_at(100), hashing::ripemd160(b"abc").to_vec());
    // Before Cockatrice keccak256 is absent, so the same stub is sha256.
    assert_eq!(hash_at(99), hashing::sha256(b"abc").to_vec());
}

#[test]
fn missing_call_flags_fault_past_try() {
    let settings = settings();
    let mut engine = engine(&settings, Vec::new());

    let mut call = ScriptBuilder::new();
    emit_call(
        &mut call,
        &native_hash("PolicyContract"),
        "setFeePerByte",
        CallFlags::READ_ONLY,
        vec![StackItem::from_int(1)],
    );

    assert_eq!(run(&mut engine, try_drop_push1(&call.to_array())), VMState::FAULT);
    assert!(engine.fault_message().unwrap().contains("dispatch error"));
}

#[test]
fn unknown_native_version_is_a_dispatch_error() {
    let settings = settings();
    let mut engine = engine(&settings, Vec::new());
    let natives = Arc::clone(engine.host().natives());
    let policy = natives.get_by_name("PolicyContract").unwrap();
    let mut state = natives.contract_state(policy.as_ref(), &settings, 1);
    let offset = state.manifest.abi.get_method("isBlocked", 1).unwrap().offset as usize;
    assert_eq!(state.nef.script[offset], OpCode::PUSH0 as u8);
    state.nef.script[offset] = OpCode::PUSH1 as u8;

    engine
        .load_contract(
            state,
            "isBlocked",
            vec![StackItem::from_byte_string(vec![0; 20])],
            CallFlags::ALL,
        )
        .unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
    assert!(engine.fault_message().unwrap().contains("dispatch error"));
}

#[test]
fn committee_witness_reaches_natives_through_calls() {
    let settings = settings();
    let committee = committee_address(&settings.standby_committee).unwrap();
    let mut builder = ScriptBuilder::new();
    emit_call(
        &mut builder,
        &native_hash("PolicyContract"),
        "setFeePerByte",
        CallFlags::ALL,
        vec![StackItem::from_int(7)],
    );
    let script = builder.to_array();

    let mut unsigned = engine(&settings, Vec::new());
    assert_eq!(run(&mut unsigned, script.clone()), VMState::FAULT);

    let mut signed = engine(&settings, vec![Signer::called_by_entry(committee)]);
    assert_eq!(run(&mut signed, script), VMState::HALT);
    assert_eq!(
        neo_smart_contract::native::policy_contract::fee_per_byte(signed.snapshot()),
        7
    );
}

#[test]
fn native_fees_scale_with_the_exec_fee_factor() {
    let settings = settings();
    let gas = native_hash("GasToken");
    let consumed = |method: &str| {
        let mut engine = engine(&settings, Vec::new());
        let mut builder = ScriptBuilder::new();
        emit_call(&mut builder, &gas, method, CallFlags::ALL, Vec::new());
        assert_eq!(run(&mut engine, builder.to_array()), VMState::HALT);
        engine.gas_consumed()
    };
    // symbol costs nothing, totalSupply costs 1 << 15 units
    assert_eq!(consumed("totalSupply") - consumed("symbol"), (1 << 15) * 30);
}

#[test]
fn transfers_charge_storage_fees() {
    let settings = settings();
    let holder = neo_smart_contract::account::bft_address(settings.standby_validators()).unwrap();
    let receiver = UInt160::from_array([9; 20]);
    let mut engine = engine(&settings, vec![Signer::called_by_entry(holder)]);
    let mut builder = ScriptBuilder::new();
    emit_call(
        &mut builder,
        &GasToken::token_hash(),
        "transfer",
        CallFlags::ALL,
        vec![
            StackItem::from_byte_string(holder.to_vec()),
            StackItem::from_byte_string(receiver.to_vec()),
            StackItem::from_int(5),
            StackItem::Null,
        ],
    );
    assert_eq!(run(&mut engine, builder.to_array()), VMState::HALT);
    assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_bool(true)]);
    assert!(engine.gas_consumed() >= (1 << 17) * 30 + 50 * 100_000);
    assert_eq!(
        fungible_token::balance_of::<GasToken>(engine.snapshot(), &receiver),
        BigInt::from(5)
    );
    let [event] = engine.notifications() else {
        panic!("expected one notification");
    };
    assert_eq!(event.event_name, "Transfer");
}
