//! The application engine: a NeoVM [`ExecutionEngine`] paired with the host
//! state that interop services and native contracts operate on.
//!
//! The VM drives execution and calls back into [`EngineHost`] through the
//! [`InteropHost`](neo_vm::InteropHost) seam for `SYSCALL`, `CALLT` and
//! context unloading. The host owns the storage snapshot, notifications,
//! logs, signers and the native contract registry.

pub mod contracts;
pub mod gas;
pub mod interop_host;
pub mod runtime;
pub mod storage;

pub use gas::{storage_put_fee, GAS_FACTOR, TEST_MODE_GAS};
pub use runtime::{deep_copy, LogEventArgs, NotifyEventArgs};
pub use storage::{FindOptions, StorageContext, StorageIterator};

use crate::contract_state::ContractState;
use crate::native::{ledger_contract, policy_contract, NativeRegistry};
use crate::storage::{DataCache, MemoryStore};
use crate::trigger::TriggerType;
use crate::witness::Signer;
use crate::{Error, Result};
use neo_core::{Hardfork, ProtocolSettings, UInt160};
use neo_vm::{
    CallFlags, EvaluationStack, ExecutionContext, ExecutionEngine, ExecutionEngineLimits, Script,
    StackItem, VMState,
};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// State attached to every execution context loaded by the application
/// engine.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContextState {
    /// Hash of the executing script. Computed from the script when unset.
    pub script_hash: Option<UInt160>,
    /// Hash of the script that loaded this context.
    pub calling_script_hash: Option<UInt160>,
    pub call_flags: CallFlags,
    /// The deployed contract, when the context runs one.
    pub contract: Option<Rc<ContractState>>,
    /// Notifications sent while this context was current.
    pub notification_count: usize,
    /// Loaded through `System.Contract.Call` rather than by the embedder.
    pub is_dynamic_call: bool,
}

impl ExecutionContextState {
    /// Returns the state of `context`, or the default when none was set.
    pub fn of(context: &ExecutionContext) -> Self {
        context.get_state::<Self>().unwrap_or_default()
    }
}

/// Returns the script hash of `context`.
pub fn script_hash_of(context: &ExecutionContext) -> UInt160 {
    context
        .get_state::<ExecutionContextState>()
        .and_then(|state| state.script_hash)
        .unwrap_or_else(|| UInt160::from_script(context.script().as_bytes()))
}

/// Host side of an application engine run.
pub struct EngineHost {
    trigger: TriggerType,
    settings: Arc<ProtocolSettings>,
    natives: Arc<NativeRegistry>,
    snapshot: Box<dyn DataCache>,
    signers: Option<Vec<Signer>>,
    block_height: u32,
    storage_price: i64,
    notifications: Vec<NotifyEventArgs>,
    logs: Vec<LogEventArgs>,
    invocation_counter: HashMap<UInt160, u32>,
}

impl std::fmt::Debug for EngineHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHost")
            .field("trigger", &self.trigger)
            .field("block_height", &self.block_height)
            .field("storage_price", &self.storage_price)
            .field("notifications", &self.notifications.len())
            .field("logs", &self.logs.len())
            .finish_non_exhaustive()
    }
}

impl EngineHost {
    pub fn trigger(&self) -> TriggerType {
        self.trigger
    }

    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    pub fn natives(&self) -> &Arc<NativeRegistry> {
        &self.natives
    }

    pub fn snapshot(&self) -> &dyn DataCache {
        self.snapshot.as_ref()
    }

    pub fn snapshot_mut(&mut self) -> &mut dyn DataCache {
        self.snapshot.as_mut()
    }

    /// Signers of the script container, if there is one.
    pub fn signers(&self) -> Option<&[Signer]> {
        self.signers.as_deref()
    }

    /// Index of the block the engine executes in.
    pub fn block_height(&self) -> u32 {
        self.block_height
    }

    /// Price per byte of storage, in datoshi.
    pub fn storage_price(&self) -> i64 {
        self.storage_price
    }

    pub fn notifications(&self) -> &[NotifyEventArgs] {
        &self.notifications
    }

    pub fn logs(&self) -> &[LogEventArgs] {
        &self.logs
    }

    /// Returns `true` when `hardfork` is active at the current height.
    pub fn is_hardfork_enabled(&self, hardfork: Hardfork) -> bool {
        self.settings.is_hardfork_enabled(hardfork, self.block_height)
    }

    /// Number of times `hash` has been loaded, or `None` if it never was.
    pub fn invocation_count(&self, hash: &UInt160) -> Option<u32> {
        self.invocation_counter.get(hash).copied()
    }

    pub(crate) fn set_invocation_count(&mut self, hash: UInt160, count: u32) {
        self.invocation_counter.insert(hash, count);
    }

    /// Loads `script` as a new context carrying `state`.
    pub fn load_context_with_state(
        &mut self,
        engine: &mut ExecutionEngine,
        script: Script,
        rv_count: i32,
        position: usize,
        mut state: ExecutionContextState,
    ) -> Result<()> {
        let mut context = ExecutionContext::new(script, rv_count, engine.reference_counter().clone());
        context.set_instruction_pointer(position)?;
        let hash = *state
            .script_hash
            .get_or_insert_with(|| UInt160::from_script(context.script().as_bytes()));
        context.set_state(state);
        engine.load_context(context)?;
        *self.invocation_counter.entry(hash).or_insert(0) += 1;
        Ok(())
    }

    /// Hash of the executing script.
    pub fn current_script_hash(engine: &ExecutionEngine) -> Option<UInt160> {
        engine.current_context().map(script_hash_of)
    }

    /// Hash of the script that loaded the executing one.
    pub fn calling_script_hash(engine: &ExecutionEngine) -> Option<UInt160> {
        engine
            .current_context()
            .and_then(|context| ExecutionContextState::of(context).calling_script_hash)
    }

    /// Hash of the first script loaded into the engine.
    pub fn entry_script_hash(engine: &ExecutionEngine) -> Option<UInt160> {
        engine.entry_context().map(script_hash_of)
    }

    /// Call flags granted to the executing context.
    pub fn current_call_flags(engine: &ExecutionEngine) -> CallFlags {
        engine
            .current_context()
            .map(|context| ExecutionContextState::of(context).call_flags)
            .unwrap_or(CallFlags::NONE)
    }

    /// Fails unless the executing context holds `required`.
    pub fn check_call_flags(engine: &ExecutionEngine, required: CallFlags) -> Result<()> {
        let granted = Self::current_call_flags(engine);
        if granted.contains(required) {
            Ok(())
        } else {
            Err(Error::invalid_operation(format!(
                "call flags {granted:?} do not include {required:?}"
            )))
        }
    }
}

/// A NeoVM engine bound to its host state.
pub struct ApplicationEngine {
    vm: ExecutionEngine,
    host: EngineHost,
}

impl ApplicationEngine {
    /// Starts building an engine for `settings`.
    pub fn builder(settings: Arc<ProtocolSettings>) -> ApplicationEngineBuilder {
        ApplicationEngineBuilder::new(settings)
    }

    pub fn vm(&self) -> &ExecutionEngine {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.vm
    }

    pub fn host(&self) -> &EngineHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut EngineHost {
        &mut self.host
    }

    /// Mutable access to both halves, for callers driving natives directly.
    pub fn split_mut(&mut self) -> (&mut EngineHost, &mut ExecutionEngine) {
        (&mut self.host, &mut self.vm)
    }

    pub fn state(&self) -> VMState {
        self.vm.state()
    }

    pub fn result_stack(&self) -> &EvaluationStack {
        self.vm.result_stack()
    }

    /// Gas consumed so far, in datoshi.
    pub fn gas_consumed(&self) -> i64 {
        self.vm.fee_consumed()
    }

    pub fn fault_message(&self) -> Option<&str> {
        self.vm.fault_message()
    }

    pub fn notifications(&self) -> &[NotifyEventArgs] {
        self.host.notifications()
    }

    pub fn logs(&self) -> &[LogEventArgs] {
        self.host.logs()
    }

    pub fn snapshot(&self) -> &dyn DataCache {
        self.host.snapshot()
    }

    pub fn snapshot_mut(&mut self) -> &mut dyn DataCache {
        self.host.snapshot_mut()
    }

    /// Consumes the engine and returns its storage.
    pub fn into_snapshot(self) -> Box<dyn DataCache> {
        self.host.snapshot
    }

    /// Loads an entry script with `call_flags`.
    pub fn load_script(&mut self, script: impl Into<Vec<u8>>, call_flags: CallFlags) -> Result<()> {
        let state = ExecutionContextState {
            call_flags,
            ..ExecutionContextState::default()
        };
        self.host
            .load_context_with_state(&mut self.vm, Script::new(script), -1, 0, state)
    }

    /// Loads `method` of `contract` with `args`, the first argument on top.
    pub fn load_contract(
        &mut self,
        contract: ContractState,
        method: &str,
        args: Vec<StackItem>,
        call_flags: CallFlags,
    ) -> Result<()> {
        let descriptor = contract
            .manifest
            .abi
            .get_method(method, args.len() as i32)
            .cloned()
            .ok_or_else(|| {
                Error::invalid_operation(format!(
                    "method {method} with {} parameter(s) not found in {}",
                    args.len(),
                    contract.hash
                ))
            })?;
        let rv_count = if descriptor.return_type == crate::ContractParameterType::Void {
            0
        } else {
            1
        };
        let position = usize::try_from(descriptor.offset)
            .map_err(|_| Error::invalid_operation("negative method offset"))?;
        let script = Script::new(contract.script().to_vec());
        let state = ExecutionContextState {
            script_hash: Some(contract.hash),
            call_flags,
            contract: Some(Rc::new(contract)),
            ..ExecutionContextState::default()
        };
        self.host
            .load_context_with_state(&mut self.vm, script, rv_count, position, state)?;
        for arg in args.into_iter().rev() {
            self.vm.push(arg)?;
        }
        Ok(())
    }

    /// Runs the loaded scripts to completion.
    pub fn execute(&mut self) -> VMState {
        let state = self.vm.execute_with(&mut self.host);
        match state {
            VMState::FAULT => warn!(
                trigger = %self.host.trigger,
                gas = self.vm.fee_consumed(),
                "execution faulted: {}",
                self.vm.fault_message().unwrap_or("unknown fault")
            ),
            _ => debug!(
                trigger = %self.host.trigger,
                gas = self.vm.fee_consumed(),
                "execution finished in {state}"
            ),
        }
        state
    }

    /// Runs the native initialisation due at the engine's height: genesis
    /// setup and per-hardfork upgrades.
    pub fn initialize_natives(&mut self) -> Result<()> {
        let natives = Arc::clone(&self.host.natives);
        for native in natives.iter() {
            crate::native::contract_management::initialize_native(
                &mut self.host,
                &self.vm,
                native.as_ref(),
            )?;
        }
        Ok(())
    }
}

/// Configures an [`ApplicationEngine`].
pub struct ApplicationEngineBuilder {
    settings: Arc<ProtocolSettings>,
    natives: Option<Arc<NativeRegistry>>,
    snapshot: Option<Box<dyn DataCache>>,
    trigger: TriggerType,
    gas_limit: i64,
    height: Option<u32>,
    signers: Option<Vec<Signer>>,
    limits: ExecutionEngineLimits,
}

impl ApplicationEngineBuilder {
    pub fn new(settings: Arc<ProtocolSettings>) -> Self {
        Self {
            settings,
            natives: None,
            snapshot: None,
            trigger: TriggerType::Application,
            gas_limit: TEST_MODE_GAS,
            height: None,
            signers: None,
            limits: ExecutionEngineLimits::default(),
        }
    }

    pub fn trigger(mut self, trigger: TriggerType) -> Self {
        self.trigger = trigger;
        self
    }

    /// Shares a native registry between engines.
    pub fn natives(mut self, natives: Arc<NativeRegistry>) -> Self {
        self.natives = Some(natives);
        self
    }

    pub fn snapshot(mut self, snapshot: impl DataCache + 'static) -> Self {
        self.snapshot = Some(Box::new(snapshot));
        self
    }

    pub fn boxed_snapshot(mut self, snapshot: Box<dyn DataCache>) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Gas limit in datoshi.
    pub fn gas_limit(mut self, gas_limit: i64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Block index used for hardfork checks. Defaults to the ledger's
    /// current index.
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn signers(mut self, signers: Vec<Signer>) -> Self {
        self.signers = Some(signers);
        self
    }

    pub fn limits(mut self, limits: ExecutionEngineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> ApplicationEngine {
        let snapshot = self
            .snapshot
            .unwrap_or_else(|| Box::new(MemoryStore::new()));
        let height = self
            .height
            .unwrap_or_else(|| ledger_contract::current_index(snapshot.as_ref()).unwrap_or(0));
        let exec_fee_factor = policy_contract::exec_fee_factor(snapshot.as_ref());
        let storage_price = policy_contract::storage_price(snapshot.as_ref());

        let mut vm = ExecutionEngine::with_limits(self.limits);
        vm.set_gas_limit(Some(self.gas_limit));
        vm.set_exec_fee_factor(exec_fee_factor);

        debug!(
            trigger = %self.trigger,
            height,
            exec_fee_factor,
            storage_price,
            "application engine created"
        );

        ApplicationEngine {
            vm,
            host: EngineHost {
                trigger: self.trigger,
                settings: self.settings,
                natives: self
                    .natives
                    .unwrap_or_else(|| Arc::new(NativeRegistry::new())),
                snapshot,
                signers: self.signers,
                block_height: height,
                storage_price,
                notifications: Vec::new(),
                logs: Vec::new(),
                invocation_counter: HashMap::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_vm::op_code::OpCode;

    fn engine() -> ApplicationEngine {
        ApplicationEngine::builder(Arc::new(ProtocolSettings::default())).build()
    }

    #[test]
    fn builder_reads_policy_defaults() {
        let engine = engine();
        assert_eq!(engine.vm().exec_fee_factor(), policy_contract::DEFAULT_EXEC_FEE_FACTOR);
        assert_eq!(engine.host().storage_price(), policy_contract::DEFAULT_STORAGE_PRICE);
        assert_eq!(engine.vm().gas_limit(), Some(TEST_MODE_GAS));
        assert_eq!(engine.host().block_height(), 0);
    }

    #[test]
    fn entry_script_state() {
        let mut engine = engine();
        let script = vec![OpCode::PUSH1 as u8];
        engine.load_script(script.clone(), CallFlags::ALL).unwrap();
        let hash = UInt160::from_script(&script);
        assert_eq!(EngineHost::current_script_hash(engine.vm()), Some(hash));
        assert_eq!(EngineHost::entry_script_hash(engine.vm()), Some(hash));
        assert_eq!(EngineHost::calling_script_hash(engine.vm()), None);
        assert_eq!(EngineHost::current_call_flags(engine.vm()), CallFlags::ALL);
        assert_eq!(engine.host().invocation_count(&hash), Some(1));

        assert_eq!(engine.execute(), VMState::HALT);
        assert_eq!(engine.result_stack().as_slice(), &[StackItem::from_int(1)]);
        assert_eq!(engine.gas_consumed(), OpCode::PUSH1.price() * 30);
    }
}
