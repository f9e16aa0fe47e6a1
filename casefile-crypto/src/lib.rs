//! Sealing layer for Casefile local state.
//!
//! Encrypts small JSON documents (the activation record) under a key derived
//! from the shared licensing secret.
//!
//! # Primitives
//!
//! - Argon2id for key derivation, with a fresh salt per payload
//! - ChaCha20-Poly1305 for authenticated encryption
//!
//! The secret ships inside the application binary, so sealing deters casual
//! editing of the activation record. It does not withstand someone who
//! extracts the secret.

mod cipher;
mod error;
mod key;
mod sealed;

pub use cipher::{decrypt, encrypt, EncryptedData, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, DerivedKey, KdfParams, Salt, KEY_SIZE, MAX_MEMORY_COST, MAX_PARALLELISM,
    MAX_TIME_COST, SALT_SIZE,
};
pub use sealed::{open_json, seal_json, SealedPayload, SEALED_VERSION};
