//! GasToken native contract: the NEP-17 utility token paying for execution.

use super::fungible_token::{self, FungibleToken};
use super::native_contract::{MethodTable, NativeContract, NativeEvent, NativeMethod};
use crate::account::bft_address;
use crate::application_engine::EngineHost;
use crate::Result;
use neo_core::Hardfork;
use neo_vm::ExecutionEngine;
use num_bigint::BigInt;
use tracing::warn;

/// GasToken native contract
pub struct GasToken {
    methods: MethodTable,
}

impl FungibleToken for GasToken {
    const ID: i32 = -6;
    const NAME: &'static str = "GasToken";
    const SYMBOL: &'static str = "GAS";
    const DECIMALS: u8 = 8;
}

impl Default for GasToken {
    fn default() -> Self {
        Self::new()
    }
}

impl GasToken {
    pub fn new() -> Self {
        let mut methods = MethodTable::new();
        fungible_token::register_methods::<Self>(&mut methods);
        Self { methods }
    }
}

impl NativeContract for GasToken {
    fn id(&self) -> i32 {
        Self::ID
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn methods(&self) -> &[NativeMethod] {
        self.methods.as_slice()
    }

    fn events(&self) -> Vec<NativeEvent> {
        vec![fungible_token::transfer_event()]
    }

    fn supported_standards(&self) -> &'static [&'static str] {
        &["NEP-17"]
    }

    fn initialize(&self, host: &mut EngineHost, engine: &ExecutionEngine, hardfork: Option<Hardfork>) -> Result<()> {
        if hardfork.is_some() {
            return Ok(());
        }
        let validators = host.settings().standby_validators().to_vec();
        if validators.is_empty() {
            warn!("no standby validators configured, initial GAS is not distributed");
            return Ok(());
        }
        let account = bft_address(&validators)?;
        let amount = BigInt::from(host.settings().initial_gas_distribution);
        fungible_token::mint::<Self>(host, engine, &account, &amount)
    }
}
