//! StdLib native contract: string, number and encoding helpers for scripts.

mod encoding;
#[cfg(test)]
mod tests;

use super::native_contract::{MethodTable, NativeArgs, NativeContract, NativeMethod, NativeValue};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::{Error, Result};
use neo_core::Hardfork;
use neo_vm::{CallFlags, ExecutionEngine};
use std::cmp::Ordering;

/// StdLib native contract
pub struct StdLib {
    methods: MethodTable,
}

impl Default for StdLib {
    fn default() -> Self {
        Self::new()
    }
}

impl StdLib {
    /// Longest string or byte array the helpers accept.
    pub const MAX_INPUT_LENGTH: usize = 1024;

    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods
            .register_method("atoi", Self::atoi, 1 << 6, 0, CallFlags::NONE, None)
            .params(&[("value", T::String)])
            .returns(T::Integer);
        methods
            .register_method("atoi", Self::atoi, 1 << 6, 0, CallFlags::NONE, None)
            .params(&[("value", T::String), ("base", T::Integer)])
            .returns(T::Integer);
        methods
            .register_method("itoa", Self::itoa, 1 << 12, 0, CallFlags::NONE, None)
            .params(&[("value", T::Integer)])
            .returns(T::String);
        methods
            .register_method("itoa", Self::itoa, 1 << 12, 0, CallFlags::NONE, None)
            .params(&[("value", T::Integer), ("base", T::Integer)])
            .returns(T::String);
        methods
            .register_method("base64Encode", Self::base64_encode, 1 << 5, 0, CallFlags::NONE, None)
            .params(&[("data", T::ByteArray)])
            .returns(T::String);
        methods
            .register_method("base64Decode", Self::base64_decode, 1 << 5, 0, CallFlags::NONE, None)
            .params(&[("s", T::String)])
            .returns(T::ByteArray);
        methods
            .register_method(
                "base64UrlEncode",
                Self::base64_url_encode,
                1 << 5,
                0,
                CallFlags::NONE,
                Some(Hardfork::HF_Echidna),
            )
            .params(&[("data", T::String)])
            .returns(T::String);
        methods
            .register_method(
                "base64UrlDecode",
                Self::base64_url_decode,
                1 << 5,
                0,
                CallFlags::NONE,
                Some(Hardfork::HF_Echidna),
            )
            .params(&[("s", T::String)])
            .returns(T::String);
        methods
            .register_method("base58Encode", Self::base58_encode, 1 << 13, 0, CallFlags::NONE, None)
            .params(&[("data", T::ByteArray)])
            .returns(T::String);
        methods
            .register_method("base58Decode", Self::base58_decode, 1 << 10, 0, CallFlags::NONE, None)
            .params(&[("s", T::String)])
            .returns(T::ByteArray);
        methods
            .register_method("base58CheckEncode", Self::base58_check_encode, 1 << 16, 0, CallFlags::NONE, None)
            .params(&[("data", T::ByteArray)])
            .returns(T::String);
        methods
            .register_method("base58CheckDecode", Self::base58_check_decode, 1 << 16, 0, CallFlags::NONE, None)
            .params(&[("s", T::String)])
            .returns(T::ByteArray);
        methods
            .register_method("memoryCompare", Self::memory_compare, 1 << 5, 0, CallFlags::NONE, None)
            .params(&[("str1", T::ByteArray), ("str2", T::ByteArray)])
            .returns(T::Integer);
        methods
            .register_method("memorySearch", Self::memory_search, 1 << 6, 0, CallFlags::NONE, None)
            .params(&[("mem", T::ByteArray), ("value", T::ByteArray)])
            .returns(T::Integer);
        methods
            .register_method("memorySearch", Self::memory_search, 1 << 6, 0, CallFlags::NONE, None)
            .params(&[("mem", T::ByteArray), ("value", T::ByteArray), ("start", T::Integer)])
            .returns(T::Integer);
        methods
            .register_method("memorySearch", Self::memory_search, 1 << 6, 0, CallFlags::NONE, None)
            .params(&[
                ("mem", T::ByteArray),
                ("value", T::ByteArray),
                ("start", T::Integer),
                ("backward", T::Boolean),
            ])
            .returns(T::Integer);
        methods
            .register_method("stringSplit", Self::string_split, 1 << 8, 0, CallFlags::NONE, None)
            .params(&[("str", T::String), ("separator", T::String)])
            .returns(T::Array);
        methods
            .register_method("stringSplit", Self::string_split, 1 << 8, 0, CallFlags::NONE, None)
            .params(&[("str", T::String), ("separator", T::String), ("removeEmptyEntries", T::Boolean)])
            .returns(T::Array);
        methods
            .register_method("strLen", Self::str_len, 1 << 8, 0, CallFlags::NONE, None)
            .params(&[("str", T::String)])
            .returns(T::Integer);
        Self { methods }
    }

    fn memory_compare(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let left = args.bytes(0)?;
        let right = args.bytes(1)?;
        ensure_max_input_len(&left, "memoryCompare")?;
        ensure_max_input_len(&right, "memoryCompare")?;
        Ok(match left.cmp(&right) {
            Ordering::Less => -1i32,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
        .into())
    }

    fn memory_search(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let mem = args.bytes(0)?;
        let value = args.bytes(1)?;
        ensure_max_input_len(&mem, "memorySearch")?;
        ensure_max_input_len(&value, "memorySearch")?;
        let start = if args.len() > 2 { args.i64(2)? } else { 0 };
        let backward = args.len() > 3 && args.boolean(3)?;
        let start = usize::try_from(start)
            .ok()
            .filter(|start| *start <= mem.len())
            .ok_or_else(|| Error::invalid_argument(format!("start {start} is outside the memory")))?;
        Ok(memory_search(&mem, &value, start, backward)
            .map_or(-1, |index| index as i64)
            .into())
    }

    fn string_split(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let text = args.string(0)?;
        let separator = args.string(1)?;
        ensure_max_input_len(text.as_bytes(), "stringSplit")?;
        let remove_empty = args.len() > 2 && args.boolean(2)?;
        // An empty separator leaves the string whole.
        let parts: Vec<&str> = if separator.is_empty() {
            vec![text.as_str()]
        } else {
            text.split(separator.as_str()).collect()
        };
        Ok(NativeValue::array(
            parts
                .into_iter()
                .filter(|part| !remove_empty || !part.is_empty())
                .map(str::to_string),
        ))
    }

    fn str_len(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let text = args.string(0)?;
        ensure_max_input_len(text.as_bytes(), "strLen")?;
        Ok((text.chars().count() as i64).into())
    }
}

impl NativeContract for StdLib {
    fn id(&self) -> i32 {
        -2
    }

    fn name(&self) -> &'static str {
        "StdLib"
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }
}

fn ensure_max_input_len(data: &[u8], method: &str) -> Result<()> {
    if data.len() > StdLib::MAX_INPUT_LENGTH {
        return Err(Error::invalid_argument(format!(
            "{method} input exceeds max length {}",
            StdLib::MAX_INPUT_LENGTH
        )));
    }
    Ok(())
}

/// Index of `value` in `mem`. Forward searches start at `start`; backward
/// searches look for the last match ending at or before `start`.
pub fn memory_search(mem: &[u8], value: &[u8], start: usize, backward: bool) -> Option<usize> {
    if backward {
        let end = start.min(mem.len());
        if value.len() > end {
            return None;
        }
        (0..=end - value.len())
            .rev()
            .find(|&index| mem[index..index + value.len()] == *value)
    } else {
        if start > mem.len() || value.len() > mem.len() - start {
            return None;
        }
        (start..=mem.len() - value.len()).find(|&index| mem[index..index + value.len()] == *value)
    }
}
