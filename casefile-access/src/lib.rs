//! Host side of the `license:checkAccess` boundary.
//!
//! The UI shell spawns this binary (or links the library) and reads one JSON
//! document from stdout per call. Every command answers with the resulting
//! access decision, so the shell never has to interpret errors to know what
//! to render.

use anyhow::{Context, Result};
use casefile_license::{
    AccessDecision, AccessService, Clock, LicenseConfig, LicenseSecret, MachineId,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "casefile-access", version)]
#[command(about = "Casefile trial and license access check")]
pub struct Cli {
    /// Directory holding the activation state (overrides CASEFILE_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Machine ID supplied by the host shell; detected when omitted
    #[arg(long, global = true)]
    pub machine_id: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the current access decision
    Check,
    /// Activate this machine with a license key
    Activate {
        /// Key as entered by the user
        key: String,
    },
    /// Remove the stored license key
    Deactivate,
    /// Print the id a license key must be issued for
    MachineId,
}

/// One JSON answer on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Decision(AccessDecision),
    Machine {
        #[serde(rename = "machineId")]
        machine_id: String,
    },
}

/// Builds the service described by `cli` and the environment.
pub fn build_service(cli: &Cli) -> Result<AccessService> {
    let mut config = LicenseConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    let machine_id = match &cli.machine_id {
        Some(id) => MachineId::new(id.as_str()).context("invalid --machine-id")?,
        None => MachineId::detect(),
    };
    debug!(
        "Using machine {} and state file {}",
        machine_id,
        config.state_path().display()
    );

    Ok(AccessService::new(config, LicenseSecret::embedded(), machine_id))
}

/// Runs one command against `service`.
pub fn execute<C: Clock>(service: &AccessService<C>, command: &Command) -> Result<Response> {
    let decision = match command {
        Command::Check => service.check_access().context("access check failed")?,
        Command::Activate { key } => service.activate(key).context("activation failed")?.decision(),
        Command::Deactivate => service
            .deactivate()
            .context("deactivation failed")?
            .decision(),
        Command::MachineId => {
            return Ok(Response::Machine {
                machine_id: service.machine_id().to_string(),
            });
        }
    };
    Ok(Response::Decision(decision))
}
