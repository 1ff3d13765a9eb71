use super::encoding::{base58_check_decode, base58_check_encode, format_hex_twos_complement, parse_hex_twos_complement};
use super::*;
use crate::native::test_support::{call, elements, genesis, open_engine, result, settings};
use neo_vm::{StackItem, VMState};
use num_bigint::BigInt;

fn run(method: &str, args: Vec<StackItem>) -> (VMState, Option<StackItem>) {
    let settings = settings(1);
    let mut engine = open_engine(&settings, genesis(&settings), Vec::new());
    let state = call(&mut engine, "StdLib", method, args);
    let item = (state == VMState::HALT).then(|| result(&engine));
    (state, item)
}

fn text(value: &str) -> StackItem {
    StackItem::from_byte_string(value.as_bytes().to_vec())
}

#[test]
fn hex_twos_complement() {
    for (value, expected) in [(0, "0"), (15, "0f"), (255, "0ff"), (16, "10"), (-1, "f"), (-8, "8"), (-9, "f7"), (-128, "80")] {
        let value = BigInt::from(value);
        let formatted = format_hex_twos_complement(&value);
        assert_eq!(formatted, expected, "{value}");
        assert_eq!(parse_hex_twos_complement(&formatted).unwrap(), value);
    }
    assert!(parse_hex_twos_complement("").is_err());
    assert!(parse_hex_twos_complement("-1").is_err());
}

#[test]
fn atoi_and_itoa() {
    assert_eq!(run("atoi", vec![text("-42")]).1, Some(StackItem::from_int(-42)));
    assert_eq!(
        run("atoi", vec![text("ff"), StackItem::from_int(16)]).1,
        Some(StackItem::from_int(-1))
    );
    assert_eq!(run("atoi", vec![text("1a")]).0, VMState::FAULT);
    assert_eq!(run("atoi", vec![text("1"), StackItem::from_int(8)]).0, VMState::FAULT);
    assert_eq!(
        run("itoa", vec![StackItem::from_int(255), StackItem::from_int(16)]).1,
        Some(text("0ff"))
    );
    assert_eq!(run("itoa", vec![StackItem::from_int(-7)]).1, Some(text("-7")));
}

#[test]
fn base64() {
    assert_eq!(
        run("base64Encode", vec![StackItem::from_byte_string(b"neo".to_vec())]).1,
        Some(text("bmVv"))
    );
    assert_eq!(
        run("base64Decode", vec![text("bm Vv")]).1,
        Some(StackItem::from_byte_string(b"neo".to_vec()))
    );
    assert_eq!(run("base64Decode", vec![text("b!")]).0, VMState::FAULT);
    assert_eq!(run("base64UrlEncode", vec![text("??>")]).1, Some(text("Pz8-")));
    assert_eq!(run("base64UrlDecode", vec![text("Pz8-")]).1, Some(text("??>")));
}

#[test]
fn base58_check() {
    let encoded = base58_check_encode(&[0x17]);
    assert_eq!(base58_check_decode(&encoded).unwrap(), vec![0x17]);

    let mut corrupted = encoded.into_bytes();
    let last = corrupted.len() - 1;
    corrupted[last] = if corrupted[last] == b'1' { b'2' } else { b'1' };
    assert!(base58_check_decode(std::str::from_utf8(&corrupted).unwrap()).is_err());

    assert_eq!(
        run("base58Encode", vec![StackItem::from_byte_string(vec![0, 0, 1])]).1,
        Some(text("112"))
    );
    assert_eq!(run("base58Decode", vec![text("0OIl")]).0, VMState::FAULT);
}

#[test]
fn input_length_is_bounded() {
    let long = StackItem::from_byte_string(vec![b'a'; StdLib::MAX_INPUT_LENGTH + 1]);
    assert_eq!(run("base64Encode", vec![long.clone()]).0, VMState::FAULT);
    assert_eq!(run("strLen", vec![long]).0, VMState::FAULT);
    let max = StackItem::from_byte_string(vec![b'a'; StdLib::MAX_INPUT_LENGTH]);
    assert_eq!(run("strLen", vec![max]).1, Some(StackItem::from_int(1024)));
}

#[test]
fn memory_compare_orders_bytes() {
    let bytes = |value: &[u8]| StackItem::from_byte_string(value.to_vec());
    assert_eq!(run("memoryCompare", vec![bytes(b"abc"), bytes(b"abc")]).1, Some(StackItem::from_int(0)));
    assert_eq!(run("memoryCompare", vec![bytes(b"ab"), bytes(b"abc")]).1, Some(StackItem::from_int(-1)));
    assert_eq!(run("memoryCompare", vec![bytes(b"b"), bytes(b"abc")]).1, Some(StackItem::from_int(1)));
}

#[test]
fn memory_search_directions() {
    let mem = b"abcabc";
    assert_eq!(memory_search(mem, b"c", 0, false), Some(2));
    assert_eq!(memory_search(mem, b"c", 3, false), Some(5));
    assert_eq!(memory_search(mem, b"c", 6, true), Some(5));
    assert_eq!(memory_search(mem, b"c", 5, true), Some(2));
    assert_eq!(memory_search(mem, b"abc", 2, true), None);
    assert_eq!(memory_search(mem, b"", 6, false), Some(6));
    assert_eq!(memory_search(mem, b"x", 0, false), None);

    let bytes = |value: &[u8]| StackItem::from_byte_string(value.to_vec());
    let (state, item) = run(
        "memorySearch",
        vec![bytes(mem), bytes(b"b"), StackItem::from_int(6), StackItem::from_bool(true)],
    );
    assert_eq!(state, VMState::HALT);
    assert_eq!(item, Some(StackItem::from_int(4)));
    assert_eq!(run("memorySearch", vec![bytes(mem), bytes(b"z")]).1, Some(StackItem::from_int(-1)));
    assert_eq!(
        run("memorySearch", vec![bytes(mem), bytes(b"a"), StackItem::from_int(7)]).0,
        VMState::FAULT
    );
}

#[test]
fn string_split_and_length() {
    let (_, item) = run("stringSplit", vec![text("a,,b"), text(",")]);
    assert_eq!(elements(&item.unwrap()), vec![text("a"), text(""), text("b")]);
    let (_, item) = run("stringSplit", vec![text("a,,b"), text(","), StackItem::from_bool(true)]);
    assert_eq!(elements(&item.unwrap()), vec![text("a"), text("b")]);
    let (_, item) = run("stringSplit", vec![text("a,b"), text("")]);
    assert_eq!(elements(&item.unwrap()), vec![text("a,b")]);
    assert_eq!(run("strLen", vec![text("héllo")]).1, Some(StackItem::from_int(5)));
}

#[test]
fn hash_matches_the_network() {
    assert_eq!(
        StdLib::new().hash().to_string(),
        "0xacce6fd80d44e1796aa0c2c625e9e4e0ce39efc0"
    );
}

mod properties {
    use super::super::memory_search;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn memory_search_finds_the_first_and_last_window(
            mem in proptest::collection::vec(0u8..4, 0..48),
            value in proptest::collection::vec(0u8..4, 1..4),
        ) {
            let first = mem.windows(value.len()).position(|window| window == value.as_slice());
            let last = mem.windows(value.len()).rposition(|window| window == value.as_slice());
            prop_assert_eq!(memory_search(&mem, &value, 0, false), first);
            prop_assert_eq!(memory_search(&mem, &value, mem.len(), true), last);
        }
    }
}
