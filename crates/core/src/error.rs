// Copyright (C) 2015-2025 The Neo Project.
//
// error.rs file belongs to the neo project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Error types for the core crate.

use thiserror::Error;

/// Errors produced while parsing or validating core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A value had the wrong byte length.
    #[error("invalid length for {kind}: expected {expected}, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A textual value could not be parsed.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Settings JSON could not be read.
    #[error("invalid settings document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
