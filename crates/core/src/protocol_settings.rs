// Copyright (C) 2015-2025 The Neo Project.
//
// protocol_settings.rs file belongs to the neo project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Protocol settings consumed by the execution engine.

use crate::error::CoreResult;
use crate::hardfork::Hardfork;
use crate::public_key::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Protocol settings for a Neo network.
///
/// Field names serialize in PascalCase so the `ProtocolConfiguration` section
/// of a node `config.json` deserializes directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProtocolSettings {
    /// The magic number of the network.
    pub network: u32,
    /// The address version byte.
    pub address_version: u8,
    /// The public keys of the standby committee members.
    pub standby_committee: Vec<PublicKey>,
    /// The number of validators.
    pub validators_count: u32,
    /// Time between two blocks in milliseconds.
    pub milliseconds_per_block: u32,
    /// The maximum increment of the `ValidUntilBlock` field.
    pub max_valid_until_block_increment: u32,
    /// The maximum number of transactions in a block.
    pub max_transactions_per_block: u32,
    /// The maximum number of blocks that can be traced by contracts.
    pub max_traceable_blocks: u32,
    /// The initial amount of GAS distributed, in datoshi.
    pub initial_gas_distribution: u64,
    /// Activation height per hardfork. Missing entries are disabled.
    pub hardforks: BTreeMap<Hardfork, u32>,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            network: 0,
            address_version: 0x35,
            standby_committee: Vec::new(),
            validators_count: 0,
            milliseconds_per_block: 15_000,
            max_valid_until_block_increment: 86_400_000 / 15_000,
            max_transactions_per_block: 512,
            max_traceable_blocks: 2_102_400,
            initial_gas_distribution: 52_000_000_00000000,
            hardforks: Hardfork::ALL.iter().map(|hf| (*hf, 0)).collect(),
        }
    }
}

impl ProtocolSettings {
    /// MainNet settings (hardfork heights from the published `config.mainnet.json`).
    pub fn mainnet() -> Self {
        Self {
            network: 860_833_102,
            validators_count: 7,
            hardforks: [
                (Hardfork::HF_Aspidochelone, 1_730_000),
                (Hardfork::HF_Basilisk, 4_120_000),
                (Hardfork::HF_Cockatrice, 5_450_000),
                (Hardfork::HF_Domovoi, 5_570_000),
                (Hardfork::HF_Echidna, 7_300_000),
            ]
            .into_iter()
            .collect(),
            ..Self::default()
        }
    }

    /// TestNet settings (hardfork heights from the published `config.testnet.json`).
    pub fn testnet() -> Self {
        Self {
            network: 894_710_606,
            validators_count: 7,
            max_transactions_per_block: 5_000,
            hardforks: [
                (Hardfork::HF_Aspidochelone, 210_000),
                (Hardfork::HF_Basilisk, 2_680_000),
                (Hardfork::HF_Cockatrice, 3_967_000),
                (Hardfork::HF_Domovoi, 4_144_000),
                (Hardfork::HF_Echidna, 5_870_000),
            ]
            .into_iter()
            .collect(),
            ..Self::default()
        }
    }

    /// Parses settings from JSON.
    ///
    /// Accepts either a full node configuration with a `ProtocolConfiguration`
    /// section or the bare settings object. Hardforks omitted before the first
    /// configured one are treated as active from genesis.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let mut document: serde_json::Value = serde_json::from_str(json)?;
        if let Some(section) = document.get_mut("ProtocolConfiguration") {
            document = section.take();
        }
        let mut settings: ProtocolSettings = serde_json::from_value(document)?;
        settings.fill_omitted_hardforks();
        debug!(
            network = settings.network,
            hardforks = settings.hardforks.len(),
            "loaded protocol settings"
        );
        Ok(settings)
    }

    fn fill_omitted_hardforks(&mut self) {
        for hardfork in Hardfork::ALL {
            if self.hardforks.contains_key(&hardfork) {
                break;
            }
            self.hardforks.insert(hardfork, 0);
        }
    }

    /// Activation height of `hardfork`, if configured.
    pub fn hardfork_height(&self, hardfork: Hardfork) -> Option<u32> {
        self.hardforks.get(&hardfork).copied()
    }

    /// Returns `true` when `hardfork` is active at block `index`.
    pub fn is_hardfork_enabled(&self, hardfork: Hardfork, index: u32) -> bool {
        self.hardfork_height(hardfork)
            .is_some_and(|height| index >= height)
    }

    /// Number of committee members.
    pub fn committee_members_count(&self) -> usize {
        self.standby_committee.len()
    }

    /// The first `validators_count` members of the standby committee.
    pub fn standby_validators(&self) -> &[PublicKey] {
        let count = (self.validators_count as usize).min(self.standby_committee.len());
        &self.standby_committee[..count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_every_hardfork_at_genesis() {
        let settings = ProtocolSettings::default();
        for hardfork in Hardfork::ALL {
            assert!(settings.is_hardfork_enabled(hardfork, 0));
        }
    }

    #[test]
    fn mainnet_gates_by_height() {
        let settings = ProtocolSettings::mainnet();
        assert!(!settings.is_hardfork_enabled(Hardfork::HF_Basilisk, 4_119_999));
        assert!(settings.is_hardfork_enabled(Hardfork::HF_Basilisk, 4_120_000));
    }

    #[test]
    fn unconfigured_hardfork_is_disabled() {
        let mut settings = ProtocolSettings::default();
        settings.hardforks.remove(&Hardfork::HF_Echidna);
        assert!(!settings.is_hardfork_enabled(Hardfork::HF_Echidna, u32::MAX));
    }
}
