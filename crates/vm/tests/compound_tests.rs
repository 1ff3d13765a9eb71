//! Array, struct and map opcodes, with reference counting.

use neo_vm::op_code::OpCode;
use neo_vm::{ExecutionEngine, Script, ScriptBuilder, StackItem, VMState};

fn run(builder: &ScriptBuilder) -> ExecutionEngine {
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.to_script(), -1, 0).unwrap();
    engine.execute();
    engine
}

fn single_result(engine: &ExecutionEngine) -> StackItem {
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_message());
    let results = engine.result_stack().as_slice();
    assert_eq!(results.len(), 1);
    results[0].clone()
}

#[test]
fn pack_and_unpack_preserve_order() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(3)
        .emit_push_int(2)
        .emit_push_int(1)
        .emit_push_int(3)
        .emit_opcode(OpCode::PACK)
        .emit_opcode(OpCode::DUP)
        .emit_push_int(0)
        .emit_opcode(OpCode::PICKITEM);
    let engine = run(&builder);
    let items = engine.result_stack().as_slice();
    assert_eq!(items[1], StackItem::from_int(1));
    match &items[0] {
        StackItem::Array(array) => assert_eq!(
            array.to_vec(),
            vec![StackItem::from_int(1), StackItem::from_int(2), StackItem::from_int(3)]
        ),
        other => panic!("unexpected {other:?}"),
    }

    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(20)
        .emit_push_int(10)
        .emit_push_int(2)
        .emit_opcode(OpCode::PACK)
        .emit_opcode(OpCode::UNPACK);
    let engine = run(&builder);
    let items: Vec<i64> = engine
        .result_stack()
        .as_slice()
        .iter()
        .map(|item| item.get_i64().unwrap())
        .collect();
    assert_eq!(items, vec![20, 10, 2]);
}

#[test]
fn map_set_pick_and_remove() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_opcode(OpCode::NEWMAP)
        .emit_opcode(OpCode::DUP)
        .emit_push_string("key")
        .emit_push_int(42)
        .emit_opcode(OpCode::SETITEM)
        .emit_opcode(OpCode::DUP)
        .emit_push_string("key")
        .emit_opcode(OpCode::PICKITEM);
    let engine = run(&builder);
    let items = engine.result_stack().as_slice();
    assert_eq!(items[1], StackItem::from_int(42));

    let mut builder = ScriptBuilder::new();
    builder
        .emit_opcode(OpCode::NEWMAP)
        .emit_opcode(OpCode::DUP)
        .emit_push_int(1)
        .emit_push_int(2)
        .emit_opcode(OpCode::SETITEM)
        .emit_opcode(OpCode::DUP)
        .emit_push_int(1)
        .emit_opcode(OpCode::REMOVE)
        .emit_opcode(OpCode::SIZE);
    assert_eq!(single_result(&run(&builder)), StackItem::from_int(0));
}

#[test]
fn missing_map_key_faults_without_try() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_opcode(OpCode::NEWMAP)
        .emit_push_int(7)
        .emit_opcode(OpCode::PICKITEM);
    assert_eq!(run(&builder).state(), VMState::FAULT);
}

#[test]
fn structs_are_copied_on_append() {
    // The appended struct is a copy, so changing the original after APPEND
    // leaves the array's element untouched.
    let mut builder = ScriptBuilder::new();
    builder
        .emit_opcode(OpCode::NEWARRAY0)
        .emit_opcode(OpCode::DUP)
        .emit_push_int(1)
        .emit_opcode(OpCode::NEWSTRUCT)
        .emit_opcode(OpCode::DUP)
        .emit_opcode(OpCode::ROT)
        .emit_opcode(OpCode::SWAP)
        .emit_opcode(OpCode::APPEND)
        .emit_push_int(0)
        .emit_push_int(5)
        .emit_opcode(OpCode::SETITEM);
    let array = match single_result(&run(&builder)) {
        StackItem::Array(array) => array,
        other => panic!("unexpected {other:?}"),
    };
    match array.get(0).unwrap() {
        StackItem::Struct(s) => assert_eq!(s.get(0), Some(StackItem::Null)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn struct_equality_is_structural() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(1)
        .emit_push_int(1)
        .emit_opcode(OpCode::PACKSTRUCT)
        .emit_push_int(1)
        .emit_push_int(1)
        .emit_opcode(OpCode::PACKSTRUCT)
        .emit_opcode(OpCode::EQUAL);
    assert_eq!(single_result(&run(&builder)), StackItem::Boolean(true));

    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(0)
        .emit_opcode(OpCode::PACK)
        .emit_push_int(0)
        .emit_opcode(OpCode::PACK)
        .emit_opcode(OpCode::EQUAL);
    assert_eq!(single_result(&run(&builder)), StackItem::Boolean(false));
}

#[test]
fn newarray_t_uses_type_defaults() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(2)
        .emit(OpCode::NEWARRAY_T, &[0x21])
        .emit_push_int(1)
        .emit_opcode(OpCode::PICKITEM);
    assert_eq!(single_result(&run(&builder)), StackItem::from_int(0));
}

#[test]
fn buffer_items_are_bytes() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(2)
        .emit_opcode(OpCode::NEWBUFFER)
        .emit_opcode(OpCode::DUP)
        .emit_push_int(1)
        .emit_push_int(-1)
        .emit_opcode(OpCode::SETITEM);
    let result = single_result(&run(&builder));
    assert_eq!(result.get_bytes().unwrap(), vec![0x00, 0xff]);

    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(1)
        .emit_opcode(OpCode::NEWBUFFER)
        .emit_push_int(0)
        .emit_push_int(256)
        .emit_opcode(OpCode::SETITEM);
    assert_eq!(run(&builder).state(), VMState::FAULT);
}

#[test]
fn reference_count_returns_to_zero() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_opcode(OpCode::NEWMAP)
        .emit_opcode(OpCode::DUP)
        .emit_push_int(1)
        .emit_opcode(OpCode::NEWARRAY0)
        .emit_opcode(OpCode::SETITEM)
        .emit_opcode(OpCode::DROP);
    let mut engine = ExecutionEngine::new();
    engine.load_script(builder.to_script(), -1, 0).unwrap();
    assert_eq!(engine.execute(), VMState::HALT);
    assert!(engine.result_stack().is_empty());
    engine.reference_counter().check_zero_referred();
    assert_eq!(engine.reference_counter().count(), 0);
}

#[test]
fn self_referencing_array_is_collected() {
    // NEWARRAY0 DUP DUP APPEND DROP: the array holds itself.
    let script = hex::decode("c24a4acf45").unwrap();
    let mut engine = ExecutionEngine::new();
    engine.load_script(Script::new(script), -1, 0).unwrap();
    assert_eq!(engine.execute(), VMState::HALT);
    engine.reference_counter().check_zero_referred();
    assert_eq!(engine.reference_counter().count(), 0);
}
