//! Persistence of the local activation state.
//!
//! The state is a small JSON document sealed with the shared secret and
//! stored as base64 in a single file. Writes go through a temporary file
//! and a rename so a crash never leaves a half-written state behind.

use crate::config::LicenseConfig;
use crate::error::{LicenseError, LicenseResult};
use crate::key::LicenseKey;
use crate::machine::MachineId;
use crate::secret::LicenseSecret;
use casefile_crypto::{open_json, seal_json, KdfParams, SealedPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Format version of [`ActivationState`].
pub const STATE_VERSION: u32 = 1;

/// What the application remembers between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationState {
    /// Format version.
    pub version: u32,
    /// Machine the state was created on.
    pub machine_id: MachineId,
    /// Start of the trial.
    pub first_run_at: DateTime<Utc>,
    /// Key accepted by a successful activation.
    pub license_key: Option<LicenseKey>,
    /// When the key was accepted.
    pub activated_at: Option<DateTime<Utc>>,
}

impl ActivationState {
    /// Fresh trial state.
    #[must_use]
    pub fn new(machine_id: MachineId, first_run_at: DateTime<Utc>) -> Self {
        Self {
            version: STATE_VERSION,
            machine_id,
            first_run_at,
            license_key: None,
            activated_at: None,
        }
    }

    /// Returns true if a key has been stored.
    #[must_use]
    pub fn has_key(&self) -> bool {
        self.license_key.is_some()
    }
}

/// Sealed file holding the [`ActivationState`].
#[derive(Debug, Clone)]
pub struct ActivationStore {
    path: PathBuf,
    secret: LicenseSecret,
    kdf: KdfParams,
}

impl ActivationStore {
    /// Creates a store at an explicit path.
    pub fn new(path: impl Into<PathBuf>, secret: LicenseSecret, kdf: KdfParams) -> Self {
        Self {
            path: path.into(),
            secret,
            kdf,
        }
    }

    /// Creates the store described by `config`.
    pub fn from_config(config: &LicenseConfig, secret: LicenseSecret) -> Self {
        Self::new(config.state_path(), secret, config.kdf)
    }

    /// Returns the state file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state, or `None` if this install has never run.
    ///
    /// # Errors
    ///
    /// [`LicenseError::CorruptState`] if the file exists but cannot be
    /// opened with the secret, [`LicenseError::Storage`] on I/O failure.
    pub fn load(&self) -> LicenseResult<Option<ActivationState>> {
        let encoded = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LicenseError::Storage(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let sealed = SealedPayload::from_base64(&encoded)
            .map_err(|e| LicenseError::CorruptState(e.to_string()))?;
        let state: ActivationState = open_json(self.secret.expose(), &sealed)
            .map_err(|e| LicenseError::CorruptState(e.to_string()))?;

        if state.version != STATE_VERSION {
            return Err(LicenseError::CorruptState(format!(
                "unsupported state version {}",
                state.version
            )));
        }

        debug!("Loaded activation state from {}", self.path.display());
        Ok(Some(state))
    }

    /// Seals and writes `state`, replacing any previous file.
    pub fn save(&self, state: &ActivationState) -> LicenseResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LicenseError::Storage(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let sealed = seal_json(self.secret.expose(), state, &self.kdf)?;
        let tmp = self.tmp_path();

        fs::write(&tmp, sealed.to_base64())
            .map_err(|e| LicenseError::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            LicenseError::Storage(format!("cannot replace {}: {e}", self.path.display()))
        })?;

        debug!("Saved activation state to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
