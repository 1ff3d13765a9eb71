//! The [`InteropHost`] implementation that connects the VM to syscalls,
//! method tokens and per-context bookkeeping.

use super::{EngineHost, ExecutionContextState};
use crate::interop;
use crate::Error;
use neo_vm::{
    CallFlags, ExecutionContext, ExecutionEngine, InteropHost, StackItem, VmError, VmResult,
};
use tracing::{debug, trace};

impl InteropHost for EngineHost {
    fn on_syscall(&mut self, engine: &mut ExecutionEngine, hash: u32) -> VmResult<()> {
        let descriptor = interop::get_interop_descriptor(hash).ok_or_else(|| {
            VmError::dispatch(format!("syscall 0x{hash:08x} not found"))
        })?;
        if let Some(hardfork) = descriptor.active_in {
            if !self.is_hardfork_enabled(hardfork) {
                return Err(VmError::dispatch(format!(
                    "syscall {} is not active before {hardfork}",
                    descriptor.name
                )));
            }
        }
        let granted = Self::current_call_flags(engine);
        if !granted.contains(descriptor.required_call_flags) {
            return Err(VmError::dispatch(format!(
                "syscall {} requires {:?}, context has {granted:?}",
                descriptor.name, descriptor.required_call_flags
            )));
        }
        engine.add_fee(descriptor.price * engine.exec_fee_factor())?;
        trace!(syscall = descriptor.name, "syscall");
        (descriptor.handler)(self, engine).map_err(Error::into_vm_error)
    }

    fn on_call_token(&mut self, engine: &mut ExecutionEngine, token: u16) -> VmResult<()> {
        let granted = Self::current_call_flags(engine);
        if !granted.contains(CallFlags::READ_STATES | CallFlags::ALLOW_CALL) {
            return Err(VmError::dispatch(format!(
                "CALLT requires ReadStates and AllowCall, context has {granted:?}"
            )));
        }
        self.call_token(engine, token).map_err(Error::into_vm_error)
    }

    fn on_context_unloaded(
        &mut self,
        engine: &mut ExecutionEngine,
        context: &ExecutionContext,
        exceptional: bool,
    ) {
        // Frames created by CALL share their contract's state; only a
        // cross-contract return settles it.
        let cross_contract = engine
            .current_context()
            .map_or(true, |current| !current.shares_stack_with(context));
        if !cross_contract {
            return;
        }
        let state = ExecutionContextState::of(context);
        if exceptional {
            if state.notification_count > 0 {
                debug!(
                    count = state.notification_count,
                    "discarding notifications of a faulted context"
                );
                self.discard_notifications(state.notification_count);
                context.update_state::<ExecutionContextState, _>(|s| s.notification_count = 0);
            }
            return;
        }
        let Some(current) = engine.current_context() else {
            return;
        };
        current.update_state::<ExecutionContextState, _>(|caller| {
            caller.notification_count += state.notification_count
        });
        if state.is_dynamic_call && context.rv_count() == 0 {
            current.push(StackItem::Null);
        }
    }
}
