// Copyright (C) 2015-2025 The Neo Project.
//
// public_key.rs file belongs to the neo project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Compressed secp256r1 public keys as opaque, format-checked bytes.
//!
//! Curve arithmetic lives outside the execution engine; committee and role
//! management only need stable identity, ordering and encoding.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Encoded size of a compressed public key.
pub const PUBLIC_KEY_SIZE: usize = 33;

/// A compressed public key (`0x02`/`0x03` prefix followed by the X coordinate).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Validates the compressed encoding and wraps it.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        let array: [u8; PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| CoreError::InvalidLength {
                kind: "PublicKey",
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            })?;
        if array[0] != 0x02 && array[0] != 0x03 {
            return Err(CoreError::InvalidFormat(format!(
                "unsupported public key prefix 0x{:02x}",
                array[0]
            )));
        }
        Ok(Self(array))
    }

    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Encoded bytes as a vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

// Keys order by X coordinate first, then by the parity prefix.
impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0[1..]
            .cmp(&other.0[1..])
            .then_with(|| self.0[0].cmp(&other.0[0]))
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::from_bytes(&hex::decode(s)?)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_uncompressed_prefix() {
        let mut bytes = [0u8; 33];
        bytes[0] = 0x04;
        assert!(PublicKey::from_bytes(&bytes).is_err());
        bytes[0] = 0x02;
        assert!(PublicKey::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn orders_by_x_coordinate() {
        let mut a = [0u8; 33];
        a[0] = 0x03;
        a[32] = 1;
        let mut b = [0u8; 33];
        b[0] = 0x02;
        b[32] = 2;
        let a = PublicKey::from_bytes(&a).expect("valid key");
        let b = PublicKey::from_bytes(&b).expect("valid key");
        assert!(a < b);
    }
}
