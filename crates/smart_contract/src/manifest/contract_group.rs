//! Contract groups.

use crate::{Error, Result};
use base64::{engine::general_purpose, Engine as _};
use neo_core::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A set of mutually trusted contracts identified by a public key. The
/// signature covers the contract hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractGroup {
    #[serde(rename = "pubkey")]
    pub pub_key: PublicKey,

    /// Base64 in JSON.
    #[serde(serialize_with = "to_base64", deserialize_with = "from_base64")]
    pub signature: Vec<u8>,
}

impl ContractGroup {
    pub fn new(pub_key: PublicKey, signature: Vec<u8>) -> Self {
        Self { pub_key, signature }
    }

    /// Checks the signature length. Signature verification belongs to the
    /// deployment path, which this crate does not implement.
    pub fn validate(&self) -> Result<()> {
        if self.signature.len() != 64 {
            return Err(Error::InvalidManifest(format!(
                "group signature must be 64 bytes, got {}",
                self.signature.len()
            )));
        }
        Ok(())
    }
}

fn to_base64<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(text)
        .map_err(serde::de::Error::custom)
}
