//! # Neo Smart Contract
//!
//! The Neo-specific layer on top of [`neo_vm`]: the application engine that
//! hosts contract execution, the interop services reachable through
//! `SYSCALL`, contract storage, and the native contracts.
//!
//! ## Layout
//!
//! - [`application_engine`]: [`ApplicationEngine`] and its host state
//!   (gas, notifications, invocation counters, the storage snapshot).
//! - [`interop`]: the syscall table and its handlers.
//! - [`native`]: the native contract registry and the `CallNative` dispatcher.
//! - [`storage`]: the key/value view contracts read and write.
//! - [`manifest`], [`contract_state`]: deployed contract records.

pub mod account;
pub mod application_engine;
pub mod contract_parameter_type;
pub mod contract_state;
pub mod error;
pub mod interop;
pub mod manifest;
pub mod native;
pub mod storage;
pub mod trigger;
pub mod witness;

pub use application_engine::{ApplicationEngine, ApplicationEngineBuilder, EngineHost, NotifyEventArgs};
pub use contract_parameter_type::ContractParameterType;
pub use contract_state::{ContractState, NefFile};
pub use error::{Error, Result};
pub use manifest::ContractManifest;
pub use native::{NativeContract, NativeRegistry};
pub use storage::{DataCache, MemoryStore, StorageItem, StorageKey};
pub use trigger::TriggerType;
pub use witness::Signer;
