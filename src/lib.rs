//! # neo-engine
//!
//! NeoVM execution engine and native contract dispatch for the Neo N3
//! protocol.
//!
//! ## Architecture
//!
//! - [`neo_core`] - value types, hashing, hardforks and protocol settings
//! - [`neo_vm`] - the NeoVM: stack items, contexts, exception handling and
//!   the instruction loop
//! - [`neo_smart_contract`] - the application engine, syscalls, storage and
//!   the native contracts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neo_engine::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! neo_engine::init_tracing();
//! let settings = Arc::new(ProtocolSettings::default());
//! let store = neo_engine::genesis(&settings)?;
//!
//! let mut engine = ApplicationEngine::builder(settings)
//!     .boxed_snapshot(store)
//!     .gas_limit(10_0000_0000)
//!     .build();
//! let mut script = ScriptBuilder::new();
//! script.emit_push_int(3).emit_push_int(5).emit_opcode(OpCode::ADD);
//! engine.load_script(script.to_array(), CallFlags::ALL)?;
//! assert_eq!(engine.execute(), VMState::HALT);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub use neo_core as core;
pub use neo_smart_contract as smart_contract;
pub use neo_vm as vm;

/// Common imports for running scripts
pub mod prelude {
    pub use crate::core::{Hardfork, ProtocolSettings, PublicKey, UInt160, UInt256};
    pub use crate::smart_contract::{
        ApplicationEngine, DataCache, MemoryStore, NativeContract, NativeRegistry, Signer,
        TriggerType,
    };
    pub use crate::vm::op_code::OpCode;
    pub use crate::vm::{CallFlags, ScriptBuilder, StackItem, VMState};
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info` when the variable is unset. Calling it again, or
/// after another subscriber was installed, does nothing.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(env_filter).try_init();
}

/// Runs the `OnPersist` initialisation of every native contract at height 0
/// and returns the resulting store.
pub fn genesis(
    settings: &Arc<core::ProtocolSettings>,
) -> smart_contract::Result<Box<dyn smart_contract::DataCache>> {
    let mut engine = smart_contract::ApplicationEngine::builder(Arc::clone(settings))
        .trigger(smart_contract::TriggerType::OnPersist)
        .snapshot(smart_contract::MemoryStore::new())
        .height(0)
        .build();
    engine.initialize_natives()?;
    info!(network = settings.network, "genesis state initialised");
    Ok(engine.into_snapshot())
}
