//! License key derivation and validation.
//!
//! A key is the HMAC-SHA256 of the machine id under the shared secret,
//! hex-encoded in uppercase, truncated to 20 characters (80 bits), and
//! grouped for typing:
//!
//! ```text
//! XXXX-XXXX-XXXX-XXXX-XXXX
//! ```
//!
//! Derivation is a pure function of `(machine_id, secret)`. Support staff can
//! regenerate a lost key from the machine id alone, and there is no way to
//! revoke a single key.

use crate::error::{LicenseError, LicenseResult};
use crate::machine::MachineId;
use crate::secret::LicenseSecret;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

/// Number of hex digits carried by a key.
pub const KEY_HEX_LEN: usize = 20;

/// Digits per dash-separated group.
pub const KEY_GROUP_LEN: usize = 4;

/// Length of the formatted key, separators included.
pub const KEY_FORMATTED_LEN: usize = KEY_HEX_LEN + KEY_HEX_LEN / KEY_GROUP_LEN - 1;

/// A license key in canonical `XXXX-XXXX-XXXX-XXXX-XXXX` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Parses user input into canonical form.
    ///
    /// Case, whitespace and dash placement are forgiven, so `802a5d7a 9515-e6734f7e`
    /// parses to `802A-5D7A-9515-E673-4F7E`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKeyFormat`] unless exactly 20 hex digits remain.
    pub fn parse(input: &str) -> LicenseResult<Self> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if !compact.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LicenseError::InvalidKeyFormat(
                "key may only contain the characters 0-9 and A-F".to_string(),
            ));
        }
        if compact.len() != KEY_HEX_LEN {
            return Err(LicenseError::InvalidKeyFormat(format!(
                "expected {KEY_HEX_LEN} characters, got {}",
                compact.len()
            )));
        }

        Ok(Self(group(&compact)))
    }

    /// Returns the formatted key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this key was issued for `machine_id` under `secret`.
    ///
    /// The comparison runs in constant time over the truncated MAC.
    #[must_use]
    pub fn matches(&self, machine_id: &MachineId, secret: &LicenseSecret) -> bool {
        let compact = self.0.replace('-', "");
        let Ok(tag) = hex::decode(compact) else {
            return false;
        };
        mac_for(machine_id, secret)
            .verify_truncated_left(&tag)
            .is_ok()
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseKey {
    type Err = LicenseError;

    fn from_str(s: &str) -> LicenseResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LicenseKey {
    type Error = LicenseError;

    fn try_from(value: String) -> LicenseResult<Self> {
        Self::parse(&value)
    }
}

impl From<LicenseKey> for String {
    fn from(key: LicenseKey) -> Self {
        key.0
    }
}

/// Derives the license key for `machine_id`.
#[must_use]
pub fn derive_license_key(machine_id: &MachineId, secret: &LicenseSecret) -> LicenseKey {
    let digest = mac_for(machine_id, secret).finalize().into_bytes();
    let hex = hex::encode_upper(&digest[..KEY_HEX_LEN / 2]);
    LicenseKey(group(&hex))
}

/// Parses `candidate` and checks it against the key for `machine_id`.
///
/// # Errors
///
/// [`LicenseError::InvalidKeyFormat`] if the input is not a key at all,
/// [`LicenseError::KeyMismatch`] if it is a key for some other machine.
pub fn validate_license_key(
    candidate: &str,
    machine_id: &MachineId,
    secret: &LicenseSecret,
) -> LicenseResult<LicenseKey> {
    let key = LicenseKey::parse(candidate)?;
    if key.matches(machine_id, secret) {
        Ok(key)
    } else {
        Err(LicenseError::KeyMismatch)
    }
}

fn mac_for(machine_id: &MachineId, secret: &LicenseSecret) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(machine_id.as_str().as_bytes());
    mac
}

fn group(compact: &str) -> String {
    compact
        .as_bytes()
        .chunks(KEY_GROUP_LEN)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("-")
}
