//! Error types for the smart contract layer.

use neo_core::CoreError;
use neo_vm::VmError;
use thiserror::Error;

/// Errors raised by the application engine, interop services and native
/// contracts.
#[derive(Debug, Error)]
pub enum Error {
    /// An error raised by the virtual machine. Keeps its VM classification
    /// when handed back to the engine.
    #[error(transparent)]
    Vm(#[from] VmError),

    /// A core value could not be parsed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An argument had the wrong type, size or value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not allowed in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A native contract rejected the call.
    #[error("native contract error: {0}")]
    NativeContractError(String),

    /// A storage access failed.
    #[error("storage error: {0}")]
    StorageError(String),

    /// A manifest failed validation.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// A persisted record could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation(message.into())
    }

    pub fn native(message: impl Into<String>) -> Self {
        Error::NativeContractError(message.into())
    }

    /// Converts the error for the engine. VM errors keep their own
    /// classification; every other error becomes a script exception the
    /// caller may catch.
    pub fn into_vm_error(self) -> VmError {
        match self {
            Error::Vm(error) => error,
            other => VmError::catchable(other.to_string()),
        }
    }
}

/// Result alias for the smart contract layer.
pub type Result<T> = std::result::Result<T, Error>;
