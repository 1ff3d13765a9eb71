// Copyright (C) 2015-2025 The Neo Project.
//
// lib.rs file belongs to the neo project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! # Neo Core
//!
//! Value types shared by the virtual machine and the smart contract layer.
//!
//! ## Features
//!
//! - **Hashes**: `UInt160` script hashes and `UInt256` block/transaction hashes
//! - **Keys**: compressed `PublicKey` values with protocol ordering
//! - **Hardforks**: the `Hardfork` enumeration and height gating
//! - **Settings**: `ProtocolSettings` with MainNet/TestNet presets and JSON loading
//!
//! ## Example
//!
//! ```rust
//! use neo_core::{Hardfork, ProtocolSettings};
//!
//! let settings = ProtocolSettings::mainnet();
//! assert!(settings.is_hardfork_enabled(Hardfork::HF_Aspidochelone, 1_730_000));
//! ```

/// Error types
pub mod error;
/// Hash helpers
pub mod hashing;
/// Hardfork definitions
pub mod hardfork;
/// Protocol settings
pub mod protocol_settings;
/// Compressed public keys
pub mod public_key;
/// 160-bit hashes
pub mod uint160;
/// 256-bit hashes
pub mod uint256;

pub use error::{CoreError, CoreResult};
pub use hardfork::Hardfork;
pub use protocol_settings::ProtocolSettings;
pub use public_key::PublicKey;
pub use uint160::UInt160;
pub use uint256::UInt256;
