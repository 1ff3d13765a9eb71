//! Transaction signers and witness scopes.

use bitflags::bitflags;
use neo_core::{PublicKey, UInt160};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Where a signer's witness is valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WitnessScope: u8 {
        /// Only for the transaction fee payment.
        const NONE = 0;
        /// Valid in the entry script and contracts it calls directly.
        const CALLED_BY_ENTRY = 0x01;
        /// Valid in the listed contracts.
        const CUSTOM_CONTRACTS = 0x10;
        /// Valid in contracts of the listed groups.
        const CUSTOM_GROUPS = 0x20;
        /// Valid everywhere.
        const GLOBAL = 0x80;
    }
}

/// An account that signed the script container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub account: UInt160,
    pub scopes: WitnessScope,
    #[serde(default, rename = "allowedcontracts")]
    pub allowed_contracts: Vec<UInt160>,
    #[serde(default, rename = "allowedgroups")]
    pub allowed_groups: Vec<PublicKey>,
}

impl Signer {
    pub fn new(account: UInt160, scopes: WitnessScope) -> Self {
        Self {
            account,
            scopes,
            allowed_contracts: Vec::new(),
            allowed_groups: Vec::new(),
        }
    }

    pub fn called_by_entry(account: UInt160) -> Self {
        Self::new(account, WitnessScope::CALLED_BY_ENTRY)
    }

    pub fn global(account: UInt160) -> Self {
        Self::new(account, WitnessScope::GLOBAL)
    }
}

/// The execution position a witness is checked at.
#[derive(Debug, Clone, Copy)]
pub struct WitnessContext<'a> {
    pub current_script_hash: UInt160,
    pub calling_script_hash: Option<UInt160>,
    pub entry_script_hash: UInt160,
    /// Groups of the currently executing contract.
    pub current_groups: &'a [PublicKey],
}

impl Signer {
    /// Checks whether this signer's witness covers `context`.
    pub fn allows(&self, context: &WitnessContext<'_>) -> bool {
        if self.scopes.contains(WitnessScope::GLOBAL) {
            return true;
        }
        if self.scopes.contains(WitnessScope::CALLED_BY_ENTRY) {
            match context.calling_script_hash {
                None => return true,
                Some(calling) if calling == context.entry_script_hash => return true,
                _ => {}
            }
        }
        if self.scopes.contains(WitnessScope::CUSTOM_CONTRACTS)
            && self.allowed_contracts.contains(&context.current_script_hash)
        {
            return true;
        }
        self.scopes.contains(WitnessScope::CUSTOM_GROUPS)
            && context
                .current_groups
                .iter()
                .any(|group| self.allowed_groups.contains(group))
    }
}
