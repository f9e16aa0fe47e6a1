//! Runtime licensing configuration.

use casefile_crypto::KdfParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Default trial length in days.
pub const DEFAULT_TRIAL_DAYS: u32 = 14;

/// Default activation state file name.
pub const DEFAULT_STATE_FILE: &str = "activation.dat";

/// Overrides the data directory.
pub const DATA_DIR_ENV: &str = "CASEFILE_DATA_DIR";

/// Overrides the trial length.
pub const TRIAL_DAYS_ENV: &str = "CASEFILE_TRIAL_DAYS";

/// Where and how the application keeps its activation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Length of the trial in days.
    pub trial_days: u32,
    /// Directory holding the activation state.
    /// Defaults to `<platform data dir>/casefile`.
    pub data_dir: PathBuf,
    /// File name of the sealed activation state inside `data_dir`.
    pub state_file_name: String,
    /// Argon2 parameters used when sealing new state.
    pub kdf: KdfParams,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            trial_days: DEFAULT_TRIAL_DAYS,
            data_dir: default_data_dir(),
            state_file_name: DEFAULT_STATE_FILE.to_string(),
            kdf: KdfParams::default(),
        }
    }
}

impl LicenseConfig {
    /// Defaults with `CASEFILE_DATA_DIR` and `CASEFILE_TRIAL_DAYS` applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults with overrides taken from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(TRIAL_DAYS_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(days) => config.trial_days = days,
                Err(_) => warn!("Ignoring invalid {TRIAL_DAYS_ENV}={raw:?}"),
            }
        }

        config
    }

    /// Points the configuration at another data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Full path of the activation state file.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.state_file_name)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("casefile")
}
