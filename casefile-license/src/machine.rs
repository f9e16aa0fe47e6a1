//! Machine identification for node-locked keys.
//!
//! A license key is only valid on the machine whose id it was derived from.
//! The id is either supplied by the host shell or detected from platform
//! identifiers that survive reboots and app reinstalls.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;

/// An opaque identifier for the machine a key is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MachineId(String);

impl MachineId {
    /// Wraps a caller-supplied machine id.
    ///
    /// The value is used verbatim as HMAC input. Surrounding whitespace is
    /// significant to the key, so only blank ids are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidMachineId`] for an empty or blank id.
    pub fn new(id: impl Into<String>) -> LicenseResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(LicenseError::InvalidMachineId);
        }
        Ok(Self(id))
    }

    /// Detects the id of the current machine.
    ///
    /// SHA-256 over platform identifiers, formatted as four groups of eight
    /// uppercase hex digits.
    #[must_use]
    pub fn detect() -> Self {
        let combined = collect_hardware_ids().join("|");
        let hash = Sha256::digest(combined.as_bytes());
        let hex = hex::encode_upper(&hash[..16]);

        let groups: Vec<&str> = (0..hex.len())
            .step_by(8)
            .map(|i| &hex[i..i + 8])
            .collect();
        Self(groups.join("-"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MachineId {
    type Error = LicenseError;

    fn try_from(value: String) -> LicenseResult<Self> {
        Self::new(value)
    }
}

impl From<MachineId> for String {
    fn from(id: MachineId) -> Self {
        id.0
    }
}

/// Identifiers hashed into [`MachineId::detect`], in a fixed order.
fn collect_hardware_ids() -> Vec<String> {
    // Platform and hostname first; a renamed host yields a new id.
    let mut ids = vec![
        env::consts::OS.to_string(),
        env::consts::ARCH.to_string(),
        get_hostname(),
    ];

    // OS install id, the most stable component when present
    if let Some(machine_id) = get_platform_machine_id() {
        ids.push(machine_id);
    }

    // Separates accounts sharing one install
    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        ids.push(user);
    }

    ids
}

/// Hostname, or `"unknown"` when it is not valid UTF-8.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Platform-specific stable identifier, if one is available.
fn get_platform_machine_id() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        // Hardware UUID from the platform expert
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "linux")]
    {
        // systemd location, then the older dbus one
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "windows")]
    {
        // MachineGuid is written at OS install time
        std::process::Command::new("reg")
            .args([
                "query",
                r"HKLM\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("MachineGuid"))
                    .and_then(|l| l.split_whitespace().last())
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}
