//! Native contracts module.
//!
//! This module provides the built-in native contracts of Neo N3 and the
//! dispatch path that routes `System.Contract.CallNative` to them.
//!
//! A native contract's script is a sequence of fixed-size stubs, one per
//! active method: `PUSH0; SYSCALL System.Contract.CallNative; RET`. A call
//! enters the stub at the method's ABI offset, and the dispatcher recovers
//! the method from the position of the `SYSCALL`.

pub mod contract_management;
pub mod crypto_lib;
pub mod fungible_token;
pub mod gas_token;
pub mod ledger_contract;
pub mod native_contract;
pub mod neo_token;
pub mod notary;
pub mod oracle_contract;
pub mod policy_contract;
pub mod role_management;
pub mod std_lib;

#[cfg(test)]
pub(crate) mod test_support;

pub use contract_management::ContractManagement;
pub use crypto_lib::CryptoLib;
pub use gas_token::GasToken;
pub use ledger_contract::LedgerContract;
pub use native_contract::{
    native_hash, MethodTable, NativeArgs, NativeContract, NativeEvent, NativeHandler,
    NativeMethod, NativeValue,
};
pub use neo_token::NeoToken;
pub use notary::Notary;
pub use oracle_contract::OracleContract;
pub use policy_contract::PolicyContract;
pub use role_management::{Role, RoleManagement};
pub use std_lib::StdLib;

use crate::application_engine::EngineHost;
use crate::contract_parameter_type::ContractParameterType;
use crate::contract_state::{ContractState, NefFile};
use crate::interop::contract::SYSTEM_CONTRACT_CALL_NATIVE;
use crate::manifest::ContractManifest;
use crate::{Error, Result};
use neo_core::{ProtocolSettings, UInt160};
use neo_vm::op_code::OpCode;
use neo_vm::{ExecutionEngine, VmError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Bytes taken by one method stub in a native contract script.
pub const NATIVE_METHOD_STRIDE: usize = 7;

/// Compiler recorded in native contract NEF files.
pub const NATIVE_COMPILER: &str = "neo-core-v3.0";

/// Registry for native contracts.
pub struct NativeRegistry {
    contracts: Vec<Arc<dyn NativeContract>>,
    by_hash: HashMap<UInt160, usize>,
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRegistry {
    /// Creates a registry with the standard native contracts, ordered by
    /// descending id (ContractManagement first).
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ContractManagement::new()));
        registry.register(Arc::new(StdLib::new()));
        registry.register(Arc::new(CryptoLib::new()));
        registry.register(Arc::new(LedgerContract::new()));
        registry.register(Arc::new(NeoToken::new()));
        registry.register(Arc::new(GasToken::new()));
        registry.register(Arc::new(PolicyContract::new()));
        registry.register(Arc::new(RoleManagement::new()));
        registry.register(Arc::new(OracleContract::new()));
        registry.register(Arc::new(Notary::new()));
        registry
    }

    /// Creates a registry with no contracts.
    pub fn empty() -> Self {
        Self {
            contracts: Vec::new(),
            by_hash: HashMap::new(),
        }
    }

    /// Registers a native contract, replacing one with the same hash.
    pub fn register(&mut self, contract: Arc<dyn NativeContract>) {
        let hash = contract.hash();
        match self.by_hash.get(&hash) {
            Some(&index) => self.contracts[index] = contract,
            None => {
                self.by_hash.insert(hash, self.contracts.len());
                self.contracts.push(contract);
            }
        }
    }

    /// Gets a native contract by hash.
    pub fn get(&self, hash: &UInt160) -> Option<&Arc<dyn NativeContract>> {
        self.by_hash.get(hash).map(|&index| &self.contracts[index])
    }

    /// Gets a native contract by name, ignoring ASCII case.
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<dyn NativeContract>> {
        self.contracts
            .iter()
            .find(|contract| contract.name().eq_ignore_ascii_case(name))
    }

    pub fn get_by_id(&self, id: i32) -> Option<&Arc<dyn NativeContract>> {
        self.contracts.iter().find(|contract| contract.id() == id)
    }

    /// Checks if a contract hash is a native contract.
    pub fn is_native(&self, hash: &UInt160) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Contracts in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn NativeContract>> + '_ {
        self.contracts.iter()
    }

    /// Whether `native` exists at `height`.
    pub fn is_active(&self, native: &dyn NativeContract, settings: &ProtocolSettings, height: u32) -> bool {
        native
            .active_in()
            .map_or(true, |hf| settings.is_hardfork_enabled(hf, height))
    }

    /// Methods of `native` active at `height`, in script order: sorted by
    /// name, then by parameter count.
    pub fn active_methods<'a>(
        &self,
        native: &'a dyn NativeContract,
        settings: &ProtocolSettings,
        height: u32,
    ) -> Vec<&'a NativeMethod> {
        let mut methods: Vec<&NativeMethod> = native
            .methods()
            .iter()
            .filter(|method| method.is_active(settings, height))
            .collect();
        methods.sort_by(|a, b| {
            a.name
                .cmp(b.name)
                .then(a.parameters.len().cmp(&b.parameters.len()))
        });
        methods
    }

    /// The contract record of `native` at `height`: a stub script with one
    /// entry per active method and a manifest describing them.
    pub fn contract_state(
        &self,
        native: &dyn NativeContract,
        settings: &ProtocolSettings,
        height: u32,
    ) -> ContractState {
        let methods = self.active_methods(native, settings, height);
        let mut script = Vec::with_capacity(methods.len() * NATIVE_METHOD_STRIDE);
        let mut descriptors = Vec::with_capacity(methods.len());
        for (index, method) in methods.iter().enumerate() {
            descriptors.push(method.descriptor(index * NATIVE_METHOD_STRIDE));
            script.extend_from_slice(&method_stub());
        }

        let mut manifest = ContractManifest::new(native.name());
        manifest.supported_standards = native
            .supported_standards()
            .iter()
            .map(|standard| standard.to_string())
            .collect();
        manifest.abi.methods = descriptors;
        manifest.abi.events = native
            .events()
            .iter()
            .filter(|event| {
                event
                    .active_in
                    .map_or(true, |hf| settings.is_hardfork_enabled(hf, height))
            })
            .map(NativeEvent::descriptor)
            .collect();

        ContractState::new(
            native.id(),
            native.hash(),
            NefFile::new(NATIVE_COMPILER, script),
            manifest,
        )
    }
}

/// `PUSH0; SYSCALL System.Contract.CallNative; RET`
fn method_stub() -> [u8; NATIVE_METHOD_STRIDE] {
    let hash = SYSTEM_CONTRACT_CALL_NATIVE.to_le_bytes();
    [
        OpCode::PUSH0 as u8,
        OpCode::SYSCALL as u8,
        hash[0],
        hash[1],
        hash[2],
        hash[3],
        OpCode::RET as u8,
    ]
}

fn dispatch_error(message: String) -> Error {
    Error::Vm(VmError::dispatch(message))
}

/// Handles `System.Contract.CallNative` from a native stub: resolves the
/// method from the stub position, checks permissions, charges the fee,
/// runs the handler and replaces the arguments with its result.
pub fn call_native(host: &mut EngineHost, engine: &mut ExecutionEngine) -> Result<()> {
    let version = engine.pop_i64()?;
    if version != 0 {
        return Err(dispatch_error(format!(
            "native contract version {version} is not active"
        )));
    }
    let hash = EngineHost::current_script_hash(engine)
        .ok_or_else(|| dispatch_error("CallNative outside a contract".into()))?;
    let natives = Arc::clone(host.natives());
    let native = natives
        .get(&hash)
        .ok_or_else(|| dispatch_error(format!("{hash} is not a native contract")))?
        .as_ref();
    let height = host.block_height();
    if !natives.is_active(native, host.settings(), height) {
        return Err(dispatch_error(format!(
            "native contract {} is not active",
            native.name()
        )));
    }

    let position = engine.current_context_or_err()?.instruction_pointer();
    let offset = position
        .checked_sub(1)
        .filter(|offset| offset % NATIVE_METHOD_STRIDE == 0)
        .ok_or_else(|| dispatch_error(format!("no native method at {position}")))?;
    let methods = natives.active_methods(native, host.settings(), height);
    let method = *methods.get(offset / NATIVE_METHOD_STRIDE).ok_or_else(|| {
        dispatch_error(format!("{} has no method at offset {offset}", native.name()))
    })?;

    let granted = EngineHost::current_call_flags(engine);
    if !granted.contains(method.required_call_flags) {
        return Err(dispatch_error(format!(
            "cannot call {}.{} with flags {granted:?}, it requires {:?}",
            native.name(),
            method.name,
            method.required_call_flags
        )));
    }
    engine.add_fee(
        method.cpu_fee * engine.exec_fee_factor() + method.storage_fee * host.storage_price(),
    )?;

    let count = method.parameters.len();
    let items = (0..count)
        .map(|index| engine.peek(index as isize))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let args = NativeArgs::convert(items, &method.parameters)?;
    // Frame sharing the caller's stack, so the result lands there even if
    // the handler loads new contexts.
    let frame = engine.current_context_or_err()?.clone_with_position(position);

    trace!(contract = native.name(), method = method.name, "native call");
    let result = (method.handler)(host, engine, &args)?;

    for _ in 0..count {
        frame.pop()?;
    }
    if method.return_type != ContractParameterType::Void {
        frame.push(result.into_stack_item()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_core::Hardfork;

    #[test]
    fn standard_registry() {
        let registry = NativeRegistry::new();
        assert_eq!(registry.len(), 10);
        let ids: Vec<i32> = registry.iter().map(|native| native.id()).collect();
        assert_eq!(ids, (-10..=-1).rev().collect::<Vec<_>>());
        let policy = registry.get_by_name("policycontract").unwrap();
        assert_eq!(
            policy.hash().to_string(),
            "0xcc5e4edd9f5f8dba8bb65734541df7a1c081c67b"
        );
        assert!(registry.is_native(&policy.hash()));
        assert_eq!(registry.get_by_id(-6).unwrap().name(), "GasToken");
    }

    #[test]
    fn stub_layout() {
        let stub = method_stub();
        assert_eq!(stub[0], OpCode::PUSH0 as u8);
        assert_eq!(stub[1], OpCode::SYSCALL as u8);
        assert_eq!(&stub[2..6], &[0x1a, 0xf7, 0x7b, 0x67]);
        assert_eq!(stub[6], OpCode::RET as u8);
    }

    #[test]
    fn contract_state_offsets_follow_sorted_methods() {
        let registry = NativeRegistry::new();
        let settings = ProtocolSettings::default();
        let std_lib = registry.get_by_name("StdLib").unwrap();
        let state = registry.contract_state(std_lib.as_ref(), &settings, 0);
        let methods = &state.manifest.abi.methods;
        assert_eq!(state.script().len(), methods.len() * NATIVE_METHOD_STRIDE);
        for (index, method) in methods.iter().enumerate() {
            assert_eq!(method.offset as usize, index * NATIVE_METHOD_STRIDE);
        }
        let keys: Vec<(&str, usize)> = methods
            .iter()
            .map(|method| (method.name.as_str(), method.parameters.len()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn hardforks_change_the_method_table() {
        let registry = NativeRegistry::new();
        let settings = ProtocolSettings {
            hardforks: [(Hardfork::HF_Cockatrice, 100), (Hardfork::HF_Echidna, 200)]
                .into_iter()
                .collect(),
            ..ProtocolSettings::default()
        };
        let crypto = registry.get_by_name("CryptoLib").unwrap();
        let before = registry.contract_state(crypto.as_ref(), &settings, 99);
        let after = registry.contract_state(crypto.as_ref(), &settings, 100);
        assert!(before.manifest.abi.get_method("keccak256", 1).is_none());
        assert!(after.manifest.abi.get_method("keccak256", 1).is_some());
        assert_ne!(before.script(), after.script());

        let notary = registry.get_by_name("Notary").unwrap();
        assert!(!registry.is_active(notary.as_ref(), &settings, 199));
        assert!(registry.is_active(notary.as_ref(), &settings, 200));
    }
}
