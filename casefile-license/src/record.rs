//! Vendor-side issuance records.
//!
//! Every key the vendor generates is logged as one JSON file in a records
//! directory. The directory is an append-only audit trail: files are never
//! overwritten and the application never reads them.

use crate::error::{LicenseError, LicenseResult};
use crate::key::{derive_license_key, LicenseKey};
use crate::machine::MachineId;
use crate::secret::LicenseSecret;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Format version written into every record.
pub const RECORD_VERSION: &str = "1.0";

/// Default value of `max_activations`.
pub const DEFAULT_MAX_ACTIVATIONS: u32 = 1;

/// Upper bound on same-millisecond filename suffixes.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Customer-facing inputs to an issuance.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Target machine.
    pub machine_id: MachineId,
    /// Customer name (free text).
    pub customer_name: String,
    /// Customer email (free text).
    pub customer_email: Option<String>,
    /// Advisory expiry date; `None` is perpetual.
    pub expiry_date: Option<NaiveDate>,
    /// Advisory activation limit.
    pub max_activations: u32,
}

impl IssueRequest {
    /// Creates a perpetual, single-activation request.
    pub fn new(machine_id: MachineId, customer_name: impl Into<String>) -> Self {
        Self {
            machine_id,
            customer_name: customer_name.into(),
            customer_email: None,
            expiry_date: None,
            max_activations: DEFAULT_MAX_ACTIVATIONS,
        }
    }

    /// Sets the customer email. Blank values are dropped.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.customer_email = email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }

    /// Sets the advisory expiry date.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Option<NaiveDate>) -> Self {
        self.expiry_date = expiry;
        self
    }

    /// Sets the advisory activation limit.
    #[must_use]
    pub fn with_max_activations(mut self, max: u32) -> Self {
        self.max_activations = max;
        self
    }
}

/// One issued license, as written to the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    pub license_key: LicenseKey,
    pub machine_id: MachineId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub max_activations: u32,
    pub issue_date: DateTime<Utc>,
    pub version: String,
    pub generated_at: DateTime<Utc>,
}

impl LicenseRecord {
    /// Derives the key for `request` and builds its record.
    ///
    /// # Errors
    ///
    /// [`LicenseError::InvalidRecord`] for a blank customer name, a zero
    /// activation limit, or an expiry date before `now`.
    pub fn issue(
        request: IssueRequest,
        secret: &LicenseSecret,
        now: DateTime<Utc>,
    ) -> LicenseResult<Self> {
        let customer_name = request.customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(LicenseError::InvalidRecord(
                "customer name must not be empty".to_string(),
            ));
        }
        if request.max_activations == 0 {
            return Err(LicenseError::InvalidRecord(
                "max activations must be at least 1".to_string(),
            ));
        }
        if let Some(expiry) = request.expiry_date {
            if expiry < now.date_naive() {
                return Err(LicenseError::InvalidRecord(format!(
                    "expiry date {expiry} is in the past"
                )));
            }
        }

        let license_key = derive_license_key(&request.machine_id, secret);
        debug!("Derived key for machine {}", request.machine_id);

        Ok(Self {
            license_key,
            machine_id: request.machine_id,
            customer_name,
            customer_email: request.customer_email,
            expiry_date: request.expiry_date,
            max_activations: request.max_activations,
            issue_date: now,
            version: RECORD_VERSION.to_string(),
            generated_at: now,
        })
    }
}

/// Returns the record file name for a generation time.
///
/// `license-2026-10-16T12-30-05-123Z.json` for `2026-10-16T12:30:05.123Z`.
#[must_use]
pub fn record_file_name(generated_at: DateTime<Utc>) -> String {
    let stamp = generated_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("license-{stamp}.json")
}

/// Writes `record` into `dir` and returns the path of the new file.
///
/// The directory is created if needed. Existing files are never replaced:
/// a name collision gets a numeric suffix instead.
///
/// # Errors
///
/// [`LicenseError::Storage`] on any filesystem failure.
pub fn record_issuance(dir: &Path, record: &LicenseRecord) -> LicenseResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        LicenseError::Storage(format!("cannot create records directory {}: {e}", dir.display()))
    })?;

    let json = serde_json::to_string_pretty(record)?;
    let base = record_file_name(record.generated_at);
    let stem = base.trim_end_matches(".json");

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{stem}-{attempt}.json")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(json.as_bytes())
                    .and_then(|()| file.write_all(b"\n"))
                    .and_then(|()| file.sync_all())
                    .map_err(|e| {
                        LicenseError::Storage(format!("cannot write {}: {e}", path.display()))
                    })?;
                info!("Issuance record written: {}", path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(LicenseError::Storage(format!(
                    "cannot create {}: {e}",
                    path.display()
                )));
            }
        }
    }

    Err(LicenseError::Storage(format!(
        "no free record name for {base} in {}",
        dir.display()
    )))
}

/// Reads a record back, for support tooling.
pub fn read_issuance(path: &Path) -> LicenseResult<LicenseRecord> {
    let content = fs::read_to_string(path)
        .map_err(|e| LicenseError::Storage(format!("cannot read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&content)?)
}
