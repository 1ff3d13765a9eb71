//! Interop services for smart contracts.
//!
//! Scripts reach the host through `SYSCALL <hash>`, where the hash is the
//! first four bytes of the SHA-256 of the service name read as a
//! little-endian `u32`. Each service has a fixed price, the call flags it
//! requires and, for late additions, the hardfork that activates it.

pub mod contract;
pub mod iterator;
pub mod runtime;
pub mod storage;

use crate::application_engine::EngineHost;
use crate::Result;
use neo_core::{hashing, Hardfork};
use neo_vm::{CallFlags, ExecutionEngine};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Signature of a syscall handler. Arguments are popped from and results
/// pushed to the current evaluation stack.
pub type InteropHandler = fn(&mut EngineHost, &mut ExecutionEngine) -> Result<()>;

/// Describes one interop service.
#[derive(Clone, Copy)]
pub struct InteropDescriptor {
    pub name: &'static str,
    pub hash: u32,
    pub handler: InteropHandler,
    /// Fixed price, multiplied by the execution fee factor.
    pub price: i64,
    pub required_call_flags: CallFlags,
    pub active_in: Option<Hardfork>,
}

impl std::fmt::Debug for InteropDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteropDescriptor")
            .field("name", &self.name)
            .field("hash", &format_args!("0x{:08x}", self.hash))
            .field("price", &self.price)
            .field("required_call_flags", &self.required_call_flags)
            .field("active_in", &self.active_in)
            .finish()
    }
}

/// Computes the interop hash of a service name.
pub fn interop_hash(name: &str) -> u32 {
    let digest = hashing::sha256(name.as_bytes());
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Registry for interop services.
pub struct InteropRegistry {
    services: HashMap<u32, InteropDescriptor>,
}

impl InteropRegistry {
    /// Creates a registry with every standard service.
    pub fn new() -> Self {
        let mut registry = Self {
            services: HashMap::new(),
        };
        contract::register(&mut registry);
        runtime::register(&mut registry);
        storage::register(&mut registry);
        iterator::register(&mut registry);
        registry
    }

    /// Registers a service active from genesis.
    pub fn register(
        &mut self,
        name: &'static str,
        handler: InteropHandler,
        price: i64,
        required_call_flags: CallFlags,
    ) -> u32 {
        self.register_since(name, handler, price, required_call_flags, None)
    }

    /// Registers a service activated by `active_in`.
    pub fn register_since(
        &mut self,
        name: &'static str,
        handler: InteropHandler,
        price: i64,
        required_call_flags: CallFlags,
        active_in: Option<Hardfork>,
    ) -> u32 {
        let hash = interop_hash(name);
        self.services.insert(
            hash,
            InteropDescriptor {
                name,
                hash,
                handler,
                price,
                required_call_flags,
                active_in,
            },
        );
        hash
    }

    pub fn get(&self, hash: u32) -> Option<&InteropDescriptor> {
        self.services.get(&hash)
    }

    /// Finds a service by name.
    pub fn by_name(&self, name: &str) -> Option<&InteropDescriptor> {
        self.get(interop_hash(name))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteropDescriptor> {
        self.services.values()
    }
}

impl Default for InteropRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static INTEROP_SERVICES: Lazy<InteropRegistry> = Lazy::new(InteropRegistry::new);

/// The standard service table.
pub fn services() -> &'static InteropRegistry {
    &INTEROP_SERVICES
}

/// Looks up a standard service by hash.
pub fn get_interop_descriptor(hash: u32) -> Option<&'static InteropDescriptor> {
    INTEROP_SERVICES.get(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_match_the_network() {
        assert_eq!(interop_hash("System.Contract.CallNative"), 0x677b_f71a);
        assert_eq!(interop_hash("System.Contract.Call"), 0x525b_7d62);
        assert_eq!(interop_hash("System.Runtime.Platform"), 0xf6fc_79b2);
        assert_eq!(contract::SYSTEM_CONTRACT_CALL_NATIVE, 0x677b_f71a);
    }

    #[test]
    fn standard_services_are_registered() {
        let registry = services();
        for name in [
            "System.Contract.Call",
            "System.Contract.CallNative",
            "System.Contract.GetCallFlags",
            "System.Contract.CreateStandardAccount",
            "System.Contract.CreateMultisigAccount",
            "System.Runtime.Platform",
            "System.Runtime.GetNetwork",
            "System.Runtime.GetAddressVersion",
            "System.Runtime.GetTrigger",
            "System.Runtime.GetExecutingScriptHash",
            "System.Runtime.GetCallingScriptHash",
            "System.Runtime.GetEntryScriptHash",
            "System.Runtime.CheckWitness",
            "System.Runtime.GetInvocationCounter",
            "System.Runtime.Log",
            "System.Runtime.Notify",
            "System.Runtime.GetNotifications",
            "System.Runtime.GasLeft",
            "System.Runtime.BurnGas",
            "System.Runtime.CurrentSigners",
            "System.Storage.GetContext",
            "System.Storage.GetReadOnlyContext",
            "System.Storage.AsReadOnly",
            "System.Storage.Get",
            "System.Storage.Find",
            "System.Storage.Put",
            "System.Storage.Delete",
            "System.Iterator.Next",
            "System.Iterator.Value",
        ] {
            let descriptor = registry.by_name(name).unwrap_or_else(|| panic!("{name} missing"));
            assert_eq!(descriptor.name, name);
        }
        assert_eq!(registry.len(), 29);

        let signers = registry.by_name("System.Runtime.CurrentSigners").unwrap();
        assert_eq!(signers.active_in, Some(Hardfork::HF_Echidna));
        let put = registry.by_name("System.Storage.Put").unwrap();
        assert_eq!(put.price, 1 << 15);
        assert_eq!(put.required_call_flags, CallFlags::WRITE_STATES);
    }
}
