//! CryptoLib native contract: hash functions for scripts.

use super::native_contract::{MethodTable, NativeArgs, NativeContract, NativeMethod, NativeValue};
use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType as T;
use crate::{Error, Result};
use neo_core::hashing::{ripemd160, sha256};
use neo_core::Hardfork;
use neo_vm::{CallFlags, ExecutionEngine};
use sha3::{Digest, Keccak256};
use std::io::Cursor;

pub struct CryptoLib {
    methods: MethodTable,
}

impl Default for CryptoLib {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoLib {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        methods
            .register_method("sha256", Self::sha256, 1 << 15, 0, CallFlags::NONE, None)
            .params(&[("data", T::ByteArray)])
            .returns(T::ByteArray);
        methods
            .register_method("ripemd160", Self::ripemd160, 1 << 15, 0, CallFlags::NONE, None)
            .params(&[("data", T::ByteArray)])
            .returns(T::ByteArray);
        methods
            .register_method("murmur32", Self::murmur32, 1 << 13, 0, CallFlags::NONE, None)
            .params(&[("data", T::ByteArray), ("seed", T::Integer)])
            .returns(T::ByteArray);
        methods
            .register_method(
                "keccak256",
                Self::keccak256,
                1 << 15,
                0,
                CallFlags::NONE,
                Some(Hardfork::HF_Cockatrice),
            )
            .params(&[("data", T::ByteArray)])
            .returns(T::ByteArray);
        Self { methods }
    }

    fn sha256(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        Ok(sha256(&args.bytes(0)?).to_vec().into())
    }

    fn ripemd160(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        Ok(ripemd160(&args.bytes(0)?).to_vec().into())
    }

    fn murmur32(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        let data = args.bytes(0)?;
        let seed = args.u32(1)?;
        Ok(murmur32(&data, seed)?.to_le_bytes().to_vec().into())
    }

    fn keccak256(_: &mut EngineHost, _: &mut ExecutionEngine, args: &NativeArgs) -> Result<NativeValue> {
        Ok(Keccak256::digest(args.bytes(0)?).to_vec().into())
    }
}

impl NativeContract for CryptoLib {
    fn id(&self) -> i32 {
        -3
    }

    fn name(&self) -> &'static str {
        "CryptoLib"
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }
}

/// 32-bit MurmurHash3 of `data`.
pub fn murmur32(data: &[u8], seed: u32) -> Result<u32> {
    murmur3::murmur3_32(&mut Cursor::new(data), seed)
        .map_err(|e| Error::invalid_operation(format!("murmur32 failed: {e}")))
}
