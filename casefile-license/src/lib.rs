//! Licensing and trial gating for Casefile.
//!
//! This module handles:
//! - Deterministic, machine-bound license keys (HMAC-SHA256 under a shared secret)
//! - The vendor's issuance audit trail
//! - The runtime trial countdown and activation state
//! - Machine identification
//!
//! # Design Principles
//!
//! - **Offline**: no server. A key is checked by re-deriving it locally
//! - **Regenerable**: the same machine id always yields the same key
//! - **Explicit inputs**: secret, clock, data directory and machine id are
//!   passed in, never read from globals
//!
//! # License Key Format
//!
//! `XXXX-XXXX-XXXX-XXXX-XXXX`: the first 20 uppercase hex digits of
//! `HMAC-SHA256(secret, machine_id)`.

mod access;
mod clock;
mod config;
mod error;
mod key;
mod machine;
mod record;
mod secret;
mod store;

pub use access::{
    trial_days_remaining, AccessDecision, AccessService, AccessState, AccessType, SECS_PER_DAY,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    LicenseConfig, DATA_DIR_ENV, DEFAULT_STATE_FILE, DEFAULT_TRIAL_DAYS, TRIAL_DAYS_ENV,
};
pub use error::{LicenseError, LicenseResult};
pub use key::{
    derive_license_key, validate_license_key, LicenseKey, KEY_FORMATTED_LEN, KEY_GROUP_LEN,
    KEY_HEX_LEN,
};
pub use machine::MachineId;
pub use record::{
    read_issuance, record_file_name, record_issuance, IssueRequest, LicenseRecord,
    DEFAULT_MAX_ACTIVATIONS, RECORD_VERSION,
};
pub use secret::LicenseSecret;
pub use store::{ActivationState, ActivationStore, STATE_VERSION};
