//! Shared test helpers for license tests.

#![allow(dead_code)]

use casefile_crypto::KdfParams;
use casefile_license::{LicenseConfig, LicenseSecret, MachineId};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::Path;

/// Secret used for the pinned key vectors.
pub const TEST_SECRET: &str = "casefile-test-secret";

pub const TEST_MACHINE: &str = "TEST-MACHINE-ID-12345-ABCDE";
pub const OTHER_MACHINE: &str = "DIFFERENT-MACHINE-ID-67890-FGHIJ";

/// `derive_license_key(TEST_MACHINE, TEST_SECRET)`.
pub const TEST_MACHINE_KEY: &str = "802A-5D7A-9515-E673-4F7E";

/// `derive_license_key(OTHER_MACHINE, TEST_SECRET)`.
pub const OTHER_MACHINE_KEY: &str = "D350-522C-AA5F-9B11-2EE0";

pub fn secret() -> LicenseSecret {
    LicenseSecret::new(TEST_SECRET)
}

pub fn machine(id: &str) -> MachineId {
    MachineId::new(id).unwrap()
}

/// Fast KDF params for testing (low memory/iterations for speed).
pub fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

/// Config rooted in `dir` with a 14-day trial and fast sealing.
pub fn test_config(dir: &Path) -> LicenseConfig {
    LicenseConfig {
        trial_days: 14,
        kdf: fast_kdf_params(),
        ..LicenseConfig::default()
    }
    .with_data_dir(dir)
}

/// Fixed reference instant for trial arithmetic.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub fn days(n: i64) -> Duration {
    Duration::days(n)
}

/// Checks `^[A-Z0-9]{4}(-[A-Z0-9]{4}){4}$`.
pub fn is_key_format(key: &str) -> bool {
    let groups: Vec<&str> = key.split('-').collect();
    key.len() == 24
        && groups.len() == 5
        && groups.iter().all(|g| {
            g.len() == 4
                && g.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
}
