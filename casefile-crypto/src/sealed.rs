//! Sealed JSON payloads.
//!
//! A sealed payload is a serde value encrypted under a key derived from the
//! shared secret. The envelope is self-describing:
//!
//! ```text
//! version(1) | memory_cost(4, LE) | time_cost(4, LE) | parallelism(4, LE)
//!            | salt(16) | nonce(12) | ciphertext+tag
//! ```
//!
//! and is usually stored as standard base64.

use crate::cipher::{self, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{self, KdfParams, SALT_SIZE, Salt};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Serialize, de::DeserializeOwned};

/// Envelope format version.
pub const SEALED_VERSION: u8 = 1;

const HEADER_SIZE: usize = 1 + 3 * 4 + SALT_SIZE;

/// A JSON document encrypted with a secret-derived key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedPayload {
    /// Argon2 parameters used to derive the key.
    pub params: KdfParams,
    /// Per-payload salt.
    pub salt: Salt,
    /// Nonce and ciphertext.
    pub data: EncryptedData,
}

impl SealedPayload {
    /// Encodes the envelope to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.data.len());
        out.push(SEALED_VERSION);
        out.extend_from_slice(&self.params.memory_cost.to_le_bytes());
        out.extend_from_slice(&self.params.time_cost.to_le_bytes());
        out.extend_from_slice(&self.params.parallelism.to_le_bytes());
        out.extend_from_slice(self.salt.as_bytes());
        self.data.write_to(&mut out);
        out
    }

    /// Decodes an envelope produced by [`SealedPayload::to_bytes`].
    ///
    /// # Errors
    ///
    /// [`CryptoError::Malformed`] for a short or unknown header, or for KDF
    /// parameters outside [`KdfParams::is_within_limits`].
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CryptoError::Malformed("header too short".to_string()));
        }
        if bytes[0] != SEALED_VERSION {
            return Err(CryptoError::Malformed(format!(
                "unsupported version {}",
                bytes[0]
            )));
        }

        let params = KdfParams {
            memory_cost: read_u32(&bytes[1..5]),
            time_cost: read_u32(&bytes[5..9]),
            parallelism: read_u32(&bytes[9..13]),
        };
        if !params.is_within_limits() {
            return Err(CryptoError::Malformed(format!(
                "key derivation parameters out of range: {params:?}"
            )));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[13..HEADER_SIZE]);

        Ok(Self {
            params,
            salt: Salt::from_bytes(salt),
            data: EncryptedData::read_from(&bytes[HEADER_SIZE..])?,
        })
    }

    /// Encodes to base64 for storage.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decodes from base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Malformed(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Serializes `value` to JSON and seals it under `secret`.
pub fn seal_json<T: Serialize>(
    secret: &str,
    value: &T,
    params: &KdfParams,
) -> CryptoResult<SealedPayload> {
    let plaintext = serde_json::to_vec(value)?;
    let salt = Salt::random();
    let key = key::derive_key(secret, &salt, params)?;
    let data = cipher::encrypt(&key, &plaintext)?;

    Ok(SealedPayload {
        params: *params,
        salt,
        data,
    })
}

/// Opens a payload sealed by [`seal_json`] and deserializes it.
///
/// # Errors
///
/// [`CryptoError::Decryption`] when the secret is wrong or the data was
/// modified, [`CryptoError::Serialization`] when the plaintext is not a `T`.
pub fn open_json<T: DeserializeOwned>(secret: &str, sealed: &SealedPayload) -> CryptoResult<T> {
    let key = key::derive_key(secret, &sealed.salt, &sealed.params)?;
    let plaintext = cipher::decrypt(&key, &sealed.data)?;
    Ok(serde_json::from_slice(&plaintext)?)
}
