//! Cross-contract calls.

use super::{EngineHost, ExecutionContextState};
use crate::contract_parameter_type::ContractParameterType;
use crate::contract_state::ContractState;
use crate::manifest::ContractMethod;
use crate::native::{contract_management, policy_contract};
use crate::{Error, Result};
use neo_core::{Hardfork, UInt160};
use neo_vm::{CallFlags, ExecutionEngine, Script, StackItem};
use std::rc::Rc;
use tracing::debug;

impl EngineHost {
    /// Looks up a contract. Natives come from the registry at the current
    /// height, deployed contracts from ContractManagement storage.
    pub fn resolve_contract(&self, hash: &UInt160) -> Result<Option<ContractState>> {
        if let Some(native) = self.natives().get(hash) {
            if !self.natives().is_active(native.as_ref(), self.settings(), self.block_height()) {
                return Ok(None);
            }
            return Ok(Some(self.natives().contract_state(
                native.as_ref(),
                self.settings(),
                self.block_height(),
            )));
        }
        contract_management::get_contract(self.snapshot(), hash)
    }

    /// `System.Contract.Call`: calls `method` of `hash` with `args`, the
    /// result always pushed back as one item.
    pub fn call_contract(
        &mut self,
        engine: &mut ExecutionEngine,
        hash: UInt160,
        method: &str,
        flags: CallFlags,
        args: Vec<StackItem>,
    ) -> Result<()> {
        if method.starts_with('_') {
            return Err(Error::invalid_argument(format!(
                "method {method} cannot be called from scripts"
            )));
        }
        let contract = self.resolve_contract(&hash)?.ok_or_else(|| {
            Error::invalid_operation(format!("called contract does not exist: {hash}.{method}"))
        })?;
        let descriptor = contract
            .manifest
            .abi
            .get_method(method, args.len() as i32)
            .cloned()
            .ok_or_else(|| {
                Error::invalid_operation(format!(
                    "method {method} with {} parameter(s) does not exist in {hash}",
                    args.len()
                ))
            })?;
        let has_return_value = descriptor.return_type != ContractParameterType::Void;
        self.call_contract_internal(
            engine,
            Rc::new(contract),
            &descriptor,
            flags,
            has_return_value,
            args,
            true,
        )
    }

    /// `CALLT`: calls the method token `index` of the executing contract.
    pub(crate) fn call_token(&mut self, engine: &mut ExecutionEngine, index: u16) -> Result<()> {
        let context = engine.current_context_or_err()?;
        let contract = ExecutionContextState::of(context)
            .contract
            .ok_or_else(|| Error::invalid_operation("CALLT outside of a deployed contract"))?;
        let token = contract
            .nef
            .tokens
            .get(usize::from(index))
            .cloned()
            .ok_or_else(|| Error::invalid_operation(format!("method token {index} not found")))?;
        let available = context.evaluation_stack().len();
        if usize::from(token.parameters_count) > available {
            return Err(Error::invalid_operation(format!(
                "method token {index} needs {} argument(s), stack holds {available}",
                token.parameters_count
            )));
        }
        let mut args = Vec::with_capacity(usize::from(token.parameters_count));
        for _ in 0..token.parameters_count {
            args.push(engine.pop()?);
        }
        let target = self.resolve_contract(&token.hash)?.ok_or_else(|| {
            Error::invalid_operation(format!("called contract does not exist: {}", token.hash))
        })?;
        let descriptor = target
            .manifest
            .abi
            .get_method(&token.method, i32::from(token.parameters_count))
            .cloned()
            .ok_or_else(|| {
                Error::invalid_operation(format!(
                    "method {} does not exist in {}",
                    token.method, token.hash
                ))
            })?;
        self.call_contract_internal(
            engine,
            Rc::new(target),
            &descriptor,
            token.call_flags,
            token.has_return_value,
            args,
            false,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn call_contract_internal(
        &mut self,
        engine: &mut ExecutionEngine,
        contract: Rc<ContractState>,
        method: &ContractMethod,
        mut flags: CallFlags,
        has_return_value: bool,
        args: Vec<StackItem>,
        is_dynamic_call: bool,
    ) -> Result<()> {
        if policy_contract::is_blocked(self.snapshot(), &contract.hash) {
            return Err(Error::invalid_operation(format!(
                "contract {} is blocked",
                contract.hash
            )));
        }
        let caller = ExecutionContextState::of(engine.current_context_or_err()?);
        if !caller.call_flags.contains(flags) {
            return Err(Error::invalid_operation(format!(
                "requested call flags {flags:?} exceed the caller's {:?}",
                caller.call_flags
            )));
        }
        let caller_hash = Self::current_script_hash(engine)
            .ok_or_else(|| Error::invalid_operation("no executing script"))?;

        if method.safe {
            flags.remove(CallFlags::WRITE_STATES | CallFlags::ALLOW_NOTIFY);
        } else {
            let executing = if self.is_hardfork_enabled(Hardfork::HF_Domovoi) {
                caller.contract.as_deref().cloned()
            } else {
                self.resolve_contract(&caller_hash)?
            };
            if let Some(executing) = executing {
                if !executing
                    .manifest
                    .can_call(&contract.hash, &contract.manifest, &method.name)
                {
                    return Err(Error::invalid_operation(format!(
                        "cannot call method {} of contract {} from contract {caller_hash}",
                        method.name, contract.hash
                    )));
                }
            }
        }
        if args.len() != method.parameters.len() {
            return Err(Error::invalid_operation(format!(
                "method {} takes {} argument(s), got {}",
                method.name,
                method.parameters.len(),
                args.len()
            )));
        }
        if has_return_value != (method.return_type != ContractParameterType::Void) {
            return Err(Error::invalid_operation("the return value type does not match"));
        }

        let position = usize::try_from(method.offset)
            .map_err(|_| Error::invalid_operation("negative method offset"))?;
        let rv_count = if has_return_value { 1 } else { 0 };
        debug!(
            caller = %caller_hash,
            contract = %contract.hash,
            method = %method.name,
            ?flags,
            "contract call"
        );
        let state = ExecutionContextState {
            script_hash: Some(contract.hash),
            calling_script_hash: Some(caller_hash),
            call_flags: flags,
            contract: Some(Rc::clone(&contract)),
            notification_count: 0,
            is_dynamic_call,
        };
        let script = Script::new(contract.script().to_vec());
        self.load_context_with_state(engine, script, rv_count, position, state)?;
        for arg in args.into_iter().rev() {
            engine.push(arg)?;
        }
        Ok(())
    }
}
