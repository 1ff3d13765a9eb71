// Copyright (C) 2015-2025 The Neo Project.
//
// uint160.rs file belongs to the neo project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Implementation of `UInt160`, the 20-byte script hash.

use crate::error::{CoreError, CoreResult};
use crate::hashing::hash160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The length of `UInt160` values in bytes.
pub const UINT160_SIZE: usize = 20;

/// A 160-bit value stored little-endian, used for script hashes and accounts.
///
/// The textual form is big-endian hex prefixed with `0x`, matching how block
/// explorers and the reference node print contract hashes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UInt160([u8; UINT160_SIZE]);

impl UInt160 {
    /// Size in bytes.
    pub const LENGTH: usize = UINT160_SIZE;

    /// The all-zero value.
    pub const fn zero() -> Self {
        Self([0u8; UINT160_SIZE])
    }

    /// Wraps raw little-endian bytes.
    pub const fn from_array(bytes: [u8; UINT160_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a value from a little-endian byte slice.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        let array: [u8; UINT160_SIZE] =
            bytes.try_into().map_err(|_| CoreError::InvalidLength {
                kind: "UInt160",
                expected: UINT160_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Computes the script hash of `script`.
    pub fn from_script(script: &[u8]) -> Self {
        Self(hash160(script))
    }

    /// Returns `true` for the all-zero value.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Little-endian bytes.
    pub fn as_bytes(&self) -> &[u8; UINT160_SIZE] {
        &self.0
    }

    /// Little-endian bytes as a vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Ord for UInt160 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for UInt160 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for UInt160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "0x{}", hex::encode(reversed))
    }
}

impl fmt::Debug for UInt160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UInt160({self})")
    }
}

impl FromStr for UInt160 {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        if trimmed.len() != UINT160_SIZE * 2 {
            return Err(CoreError::InvalidFormat(format!(
                "UInt160 expects {} hex characters, got {}",
                UINT160_SIZE * 2,
                trimmed.len()
            )));
        }
        let mut bytes = hex::decode(trimmed)?;
        bytes.reverse();
        Self::from_bytes(&bytes)
    }
}

impl From<[u8; UINT160_SIZE]> for UInt160 {
    fn from(bytes: [u8; UINT160_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for UInt160 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for UInt160 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for UInt160 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
