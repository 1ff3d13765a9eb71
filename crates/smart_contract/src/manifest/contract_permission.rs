//! Contract permissions.
//!
//! A permission names the contracts (by hash, by group or `*`) and the
//! methods a contract may call.

use super::{ContractManifest, WildcardContainer};
use neo_core::{PublicKey, UInt160};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Describes what contract or group a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractPermissionDescriptor {
    /// Every contract.
    Wildcard,
    Hash(UInt160),
    Group(PublicKey),
}

impl ContractPermissionDescriptor {
    /// Checks whether the descriptor covers the contract with `hash` and
    /// `manifest`.
    pub fn matches(&self, hash: &UInt160, manifest: &ContractManifest) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Hash(expected) => expected == hash,
            Self::Group(key) => manifest.groups.iter().any(|group| group.pub_key == *key),
        }
    }
}

impl fmt::Display for ContractPermissionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str("*"),
            Self::Hash(hash) => write!(f, "{hash}"),
            Self::Group(key) => write!(f, "{key}"),
        }
    }
}

impl Serialize for ContractPermissionDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContractPermissionDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        match text.len() {
            1 if text == "*" => Ok(Self::Wildcard),
            42 => text.parse().map(Self::Hash).map_err(serde::de::Error::custom),
            66 => text.parse().map(Self::Group).map_err(serde::de::Error::custom),
            _ => Err(serde::de::Error::custom(format!(
                "invalid permission descriptor {text}"
            ))),
        }
    }
}

/// Represents a permission that a contract requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPermission {
    pub contract: ContractPermissionDescriptor,
    pub methods: WildcardContainer<String>,
}

impl ContractPermission {
    pub fn new(contract: ContractPermissionDescriptor, methods: WildcardContainer<String>) -> Self {
        Self { contract, methods }
    }

    /// Allows calling any method on any contract.
    pub fn default_wildcard() -> Self {
        Self::new(
            ContractPermissionDescriptor::Wildcard,
            WildcardContainer::create_wildcard(),
        )
    }

    /// Checks whether calling `method` on the target contract is allowed.
    pub fn is_allowed(&self, hash: &UInt160, manifest: &ContractManifest, method: &str) -> bool {
        self.contract.matches(hash, manifest) && self.methods.contains(&method.to_string())
    }
}
