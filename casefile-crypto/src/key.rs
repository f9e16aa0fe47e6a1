//! Key derivation from the shared licensing secret.
//!
//! Uses Argon2id so that each sealed payload gets its own key (via a fresh
//! salt) even though every install shares the same secret.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Size of salt in bytes.
pub const SALT_SIZE: usize = 16;

/// A derived encryption key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Creates a derived key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Salt for key derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// Generates a random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a salt from raw bytes.
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }
}

/// Upper bound on [`KdfParams::memory_cost`] (256 MiB).
pub const MAX_MEMORY_COST: u32 = 256 * 1024;

/// Upper bound on [`KdfParams::time_cost`].
pub const MAX_TIME_COST: u32 = 16;

/// Upper bound on [`KdfParams::parallelism`].
pub const MAX_PARALLELISM: u32 = 16;

/// Key derivation parameters.
///
/// These travel inside every sealed payload, so changing the defaults never
/// makes previously written state unreadable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendations for Argon2id (2023)
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Returns true if every cost is non-zero and within the `MAX_*` limits.
    ///
    /// Parameters read back from disk must pass this before they reach
    /// Argon2, which would otherwise try to allocate whatever the file says.
    #[must_use]
    pub fn is_within_limits(&self) -> bool {
        (1..=MAX_MEMORY_COST).contains(&self.memory_cost)
            && (1..=MAX_TIME_COST).contains(&self.time_cost)
            && (1..=MAX_PARALLELISM).contains(&self.parallelism)
    }
}

/// Derives an encryption key from the shared secret using Argon2id.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if the parameters exceed the
/// `MAX_*` limits or are out of Argon2's accepted range.
pub fn derive_key(secret: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    if !params.is_within_limits() {
        return Err(CryptoError::KeyDerivation(format!(
            "parameters out of range: {params:?}"
        )));
    }

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(secret.as_bytes(), salt.as_bytes(), &mut key_bytes)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey::from_bytes(key_bytes))
}
