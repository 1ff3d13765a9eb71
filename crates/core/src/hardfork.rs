// Copyright (C) 2015-2025 The Neo Project.
//
// hardfork.rs file belongs to the neo project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Named, height-gated protocol changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a hardfork in the Neo blockchain.
///
/// Variants are ordered by activation; a later hardfork is never enabled
/// before an earlier one on a well-formed network.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Hardfork {
    /// Aspidochelone hardfork
    HF_Aspidochelone = 0,
    /// Basilisk hardfork
    HF_Basilisk = 1,
    /// Cockatrice hardfork
    HF_Cockatrice = 2,
    /// Domovoi hardfork
    HF_Domovoi = 3,
    /// Echidna hardfork
    HF_Echidna = 4,
}

impl Hardfork {
    /// Every known hardfork in activation order.
    pub const ALL: [Hardfork; 5] = [
        Hardfork::HF_Aspidochelone,
        Hardfork::HF_Basilisk,
        Hardfork::HF_Cockatrice,
        Hardfork::HF_Domovoi,
        Hardfork::HF_Echidna,
    ];

    /// Configuration name, e.g. `HF_Basilisk`.
    pub fn name(self) -> &'static str {
        match self {
            Hardfork::HF_Aspidochelone => "HF_Aspidochelone",
            Hardfork::HF_Basilisk => "HF_Basilisk",
            Hardfork::HF_Cockatrice => "HF_Cockatrice",
            Hardfork::HF_Domovoi => "HF_Domovoi",
            Hardfork::HF_Echidna => "HF_Echidna",
        }
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
