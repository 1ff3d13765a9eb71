//! Contract manifests.
//!
//! The manifest declares a contract's ABI, the groups it belongs to, the
//! standards it supports and the contracts it is permitted to call.

use super::{ContractAbi, ContractGroup, ContractPermission, ContractPermissionDescriptor, WildcardContainer};
use crate::{Error, Result};
use neo_core::UInt160;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Maximum length of a serialized manifest in bytes.
pub const MAX_MANIFEST_LENGTH: usize = u16::MAX as usize;

/// Represents the manifest of a smart contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractManifest {
    pub name: String,
    pub groups: Vec<ContractGroup>,
    /// Reserved. Must be an empty object.
    pub features: Map<String, Value>,
    #[serde(rename = "supportedstandards")]
    pub supported_standards: Vec<String>,
    pub abi: ContractAbi,
    pub permissions: Vec<ContractPermission>,
    pub trusts: WildcardContainer<ContractPermissionDescriptor>,
    pub extra: Option<Value>,
}

impl ContractManifest {
    /// Creates a manifest with an empty ABI that may call anything.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            features: Map::new(),
            supported_standards: Vec::new(),
            abi: ContractAbi::default(),
            permissions: vec![ContractPermission::default_wildcard()],
            trusts: WildcardContainer::default(),
            extra: None,
        }
    }

    /// Parses and validates a manifest.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.len() > MAX_MANIFEST_LENGTH {
            return Err(Error::InvalidManifest(format!(
                "manifest is {} bytes, the limit is {MAX_MANIFEST_LENGTH}",
                json.len()
            )));
        }
        let manifest: ContractManifest = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks the structural rules of a manifest.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidManifest("contract name is empty".into()));
        }
        if !self.features.is_empty() {
            return Err(Error::InvalidManifest("features must be empty".into()));
        }
        for group in &self.groups {
            group.validate()?;
        }
        let mut descriptors = HashSet::new();
        for permission in &self.permissions {
            if !descriptors.insert(permission.contract) {
                return Err(Error::InvalidManifest(format!(
                    "duplicate permission for {}",
                    permission.contract
                )));
            }
        }
        self.abi.validate()
    }

    /// Checks whether this contract may call `method` on the target.
    pub fn can_call(&self, hash: &UInt160, target: &ContractManifest, method: &str) -> bool {
        self.permissions
            .iter()
            .any(|permission| permission.is_allowed(hash, target, method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ContractPermission;

    const TOKEN: &str = r#"{
        "name": "token",
        "groups": [],
        "features": {},
        "supportedstandards": ["NEP-17"],
        "abi": {
            "methods": [
                {"name": "balanceOf", "parameters": [{"name": "account", "type": "Hash160"}],
                 "returntype": "Integer", "offset": 0, "safe": true}
            ],
            "events": [
                {"name": "Transfer", "parameters": []}
            ]
        },
        "permissions": [{"contract": "0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5", "methods": ["transfer"]}],
        "trusts": "*",
        "extra": null
    }"#;

    #[test]
    fn parses_reference_json() {
        let manifest = ContractManifest::from_json(TOKEN).unwrap();
        assert_eq!(manifest.supported_standards, vec!["NEP-17"]);
        assert!(manifest.trusts.is_wildcard());
        assert!(manifest.abi.get_method("balanceOf", 1).unwrap().safe);

        let neo: UInt160 = "0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5".parse().unwrap();
        let other = ContractManifest::new("other");
        assert!(manifest.can_call(&neo, &other, "transfer"));
        assert!(!manifest.can_call(&neo, &other, "vote"));
        assert!(!manifest.can_call(&UInt160::zero(), &other, "transfer"));

        let again = ContractManifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(again, manifest);
    }

    #[test]
    fn duplicate_permissions_are_rejected() {
        let mut manifest = ContractManifest::new("dup");
        manifest.permissions.push(ContractPermission::default_wildcard());
        assert!(manifest.validate().is_err());
    }
}
