//! Error types for the licensing module.

use casefile_crypto::CryptoError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Machine identifier is empty.
    #[error("invalid machine id: must not be empty")]
    InvalidMachineId,

    /// Invalid license key format.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Well-formed key that was not issued for this machine.
    #[error("license key does not match this machine")]
    KeyMismatch,

    /// Issuance metadata rejected before anything was written.
    #[error("invalid license record: {0}")]
    InvalidRecord(String),

    /// The persisted activation state could not be read back.
    #[error("activation state is corrupt: {0}")]
    CorruptState(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Sealing or unsealing failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
