//! The runtime access decision behind `license:checkAccess`.
//!
//! ```text
//!   first run ──► Trial(n) ──(day passes)──► Trial(n-1) ──► … ──► Expired
//!                   │  ▲                                            │
//!          activate │  │ deactivate                        activate │
//!                   ▼  │                                            ▼
//!                 Licensed ◄──────────────────────────────────── Licensed
//! ```
//!
//! The decision is recomputed on every call from the persisted state and the
//! clock. Nothing is cached, so the UI may poll as often as it likes.

use crate::clock::{Clock, SystemClock};
use crate::config::LicenseConfig;
use crate::error::LicenseResult;
use crate::key::validate_license_key;
use crate::machine::MachineId;
use crate::secret::LicenseSecret;
use crate::store::{ActivationState, ActivationStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Seconds in one trial day.
pub const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Access level reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Unlicensed, trial days left.
    Trial,
    /// Activated with a valid key.
    License,
    /// Trial used up, no valid key.
    Expired,
}

/// The `{accessType, daysRemaining}` document returned across the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub access_type: AccessType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<u32>,
}

/// Current access state of this install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessState {
    /// In trial.
    Trial {
        /// Whole days left, always at least 1.
        days_remaining: u32,
    },
    /// Activated.
    Licensed,
    /// Trial over.
    Expired,
}

impl AccessState {
    /// Returns true if the application may be used.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Trial { .. } | Self::Licensed)
    }

    /// Returns the boundary representation.
    #[must_use]
    pub fn decision(&self) -> AccessDecision {
        match *self {
            Self::Trial { days_remaining } => AccessDecision {
                access_type: AccessType::Trial,
                days_remaining: Some(days_remaining),
            },
            Self::Licensed => AccessDecision {
                access_type: AccessType::License,
                days_remaining: None,
            },
            Self::Expired => AccessDecision {
                access_type: AccessType::Expired,
                days_remaining: Some(0),
            },
        }
    }
}

impl From<AccessState> for AccessDecision {
    fn from(state: AccessState) -> Self {
        state.decision()
    }
}

/// Trial days left at `now` for a trial that began at `first_run_at`.
///
/// Only whole elapsed days count. A clock earlier than `first_run_at`
/// counts as no time elapsed.
#[must_use]
pub fn trial_days_remaining(first_run_at: DateTime<Utc>, now: DateTime<Utc>, trial_days: u32) -> u32 {
    let elapsed_days = (now - first_run_at).num_seconds().max(0) / SECS_PER_DAY;
    u32::try_from(elapsed_days).map_or(0, |elapsed| trial_days.saturating_sub(elapsed))
}

/// Decides and changes the access state of this install.
pub struct AccessService<C: Clock = SystemClock> {
    config: LicenseConfig,
    secret: LicenseSecret,
    machine_id: MachineId,
    store: ActivationStore,
    clock: C,
}

impl AccessService<SystemClock> {
    /// Creates a service on the system clock.
    pub fn new(config: LicenseConfig, secret: LicenseSecret, machine_id: MachineId) -> Self {
        Self::with_clock(config, secret, machine_id, SystemClock)
    }
}

impl<C: Clock> AccessService<C> {
    /// Creates a service on an explicit clock.
    pub fn with_clock(
        config: LicenseConfig,
        secret: LicenseSecret,
        machine_id: MachineId,
        clock: C,
    ) -> Self {
        let store = ActivationStore::from_config(&config, secret.clone());
        Self {
            config,
            secret,
            machine_id,
            store,
            clock,
        }
    }

    /// Returns the machine this service validates keys against.
    #[must_use]
    pub fn machine_id(&self) -> &MachineId {
        &self.machine_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &ActivationStore {
        &self.store
    }

    /// Computes the current access state.
    ///
    /// On the very first call this starts the trial clock.
    pub fn state(&self) -> LicenseResult<AccessState> {
        let state = self.load_or_init()?;
        Ok(self.evaluate(&state))
    }

    /// The `license:checkAccess` query.
    pub fn check_access(&self) -> LicenseResult<AccessDecision> {
        Ok(self.state()?.decision())
    }

    /// Activates with a user-entered key.
    ///
    /// # Errors
    ///
    /// [`LicenseError::InvalidKeyFormat`](crate::LicenseError::InvalidKeyFormat)
    /// or [`LicenseError::KeyMismatch`](crate::LicenseError::KeyMismatch) when
    /// the key is rejected. The stored state is left untouched in that case.
    pub fn activate(&self, candidate: &str) -> LicenseResult<AccessState> {
        let mut state = self.load_or_init()?;

        let key = match validate_license_key(candidate, &self.machine_id, &self.secret) {
            Ok(key) => key,
            Err(e) => {
                warn!("Rejected license key for machine {}: {e}", self.machine_id);
                return Err(e);
            }
        };

        state.machine_id = self.machine_id.clone();
        state.license_key = Some(key);
        state.activated_at = Some(self.clock.now());
        self.store.save(&state)?;

        info!("License activated for machine {}", self.machine_id);
        Ok(AccessState::Licensed)
    }

    /// Removes a stored key. The trial clock keeps running from the first run.
    pub fn deactivate(&self) -> LicenseResult<AccessState> {
        let mut state = self.load_or_init()?;

        if state.has_key() {
            state.license_key = None;
            state.activated_at = None;
            self.store.save(&state)?;
            info!("License deactivated for machine {}", self.machine_id);
        }

        Ok(self.evaluate(&state))
    }

    fn load_or_init(&self) -> LicenseResult<ActivationState> {
        if let Some(state) = self.store.load()? {
            return Ok(state);
        }

        let state = ActivationState::new(self.machine_id.clone(), self.clock.now());
        self.store.save(&state)?;
        info!(
            "First run on machine {}: {}-day trial started",
            self.machine_id, self.config.trial_days
        );
        Ok(state)
    }

    fn evaluate(&self, state: &ActivationState) -> AccessState {
        if let Some(key) = &state.license_key {
            if key.matches(&self.machine_id, &self.secret) {
                return AccessState::Licensed;
            }
            warn!(
                "Stored license key was issued for {}, not {}; ignoring it",
                state.machine_id, self.machine_id
            );
        }

        let days_remaining =
            trial_days_remaining(state.first_run_at, self.clock.now(), self.config.trial_days);
        debug!("Trial days remaining: {days_remaining}");

        if days_remaining == 0 {
            AccessState::Expired
        } else {
            AccessState::Trial { days_remaining }
        }
    }
}
