//! Execution triggers.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Why a script is being executed.
#[repr(u8)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TriggerType {
    /// Native contract hooks run before the block's transactions.
    OnPersist = 0x01,
    /// Native contract hooks run after the block's transactions.
    PostPersist = 0x02,
    /// Witness verification.
    Verification = 0x20,
    /// Transaction scripts and calls.
    #[default]
    Application = 0x40,
}

impl TriggerType {
    /// Value returned by `System.Runtime.GetTrigger`.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// `OnPersist` and `PostPersist`.
    pub fn is_system(self) -> bool {
        matches!(self, TriggerType::OnPersist | TriggerType::PostPersist)
    }
}
