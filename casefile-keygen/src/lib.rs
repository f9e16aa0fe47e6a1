//! Issues license keys for customer machines.
//!
//! The vendor runs this once per sale with the machine id the customer read
//! off their activation screen. It prints the key and logs the sale as a
//! JSON record under the records directory.

use anyhow::{Context, Result};
use casefile_license::{
    record_issuance, IssueRequest, LicenseRecord, LicenseSecret, MachineId,
    DEFAULT_MAX_ACTIVATIONS,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "casefile-keygen", version)]
#[command(about = "Generate a Casefile license key for a customer machine")]
pub struct Args {
    /// Machine ID shown on the customer's activation screen
    pub machine_id: String,

    /// Customer name
    pub customer_name: String,

    /// Customer email
    pub customer_email: Option<String>,

    /// Advisory expiry date (YYYY-MM-DD); perpetual when omitted
    #[arg(long)]
    pub expiry: Option<NaiveDate>,

    /// Advisory activation limit
    #[arg(long, default_value_t = DEFAULT_MAX_ACTIVATIONS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_activations: u32,

    /// Directory receiving issuance records
    #[arg(long, env = "CASEFILE_RECORDS_DIR", default_value = "licenses")]
    pub records_dir: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// A key that was issued and logged.
#[derive(Debug)]
pub struct Issued {
    pub record: LicenseRecord,
    pub path: PathBuf,
}

/// Derives the key for `args` and writes its issuance record.
pub fn run(args: &Args, secret: &LicenseSecret, now: DateTime<Utc>) -> Result<Issued> {
    let machine_id = MachineId::new(args.machine_id.as_str()).context("invalid machine id")?;

    let request = IssueRequest::new(machine_id, args.customer_name.as_str())
        .with_email(args.customer_email.clone())
        .with_expiry(args.expiry)
        .with_max_activations(args.max_activations);

    let record = LicenseRecord::issue(request, secret, now).context("cannot issue license")?;
    let path = record_issuance(&args.records_dir, &record).with_context(|| {
        format!(
            "cannot record issuance in {}",
            args.records_dir.display()
        )
    })?;

    info!(
        "Issued key for {} on machine {}",
        record.customer_name, record.machine_id
    );
    Ok(Issued { record, path })
}

/// Human-readable summary printed after a successful run.
#[must_use]
pub fn summary(issued: &Issued) -> String {
    let record = &issued.record;
    let customer = match &record.customer_email {
        Some(email) => format!("{} <{email}>", record.customer_name),
        None => record.customer_name.clone(),
    };
    let expires = record
        .expiry_date
        .map_or_else(|| "never".to_string(), |d| d.to_string());

    let mut out = String::new();
    out.push_str("========================================\n");
    out.push_str("  Casefile License Key\n");
    out.push_str("========================================\n");
    out.push_str(&format!("  Key:       {}\n", record.license_key));
    out.push_str(&format!("  Machine:   {}\n", record.machine_id));
    out.push_str(&format!("  Customer:  {customer}\n"));
    out.push_str(&format!("  Expires:   {expires}\n"));
    out.push_str(&format!("  Max seats: {}\n", record.max_activations));
    out.push_str(&format!("  Record:    {}\n", issued.path.display()));
    out.push_str("========================================");
    out
}
