//! Casefile access check.
//!
//! Usage:
//!   casefile-access check
//!   casefile-access activate <key>
//!   casefile-access deactivate
//!   casefile-access machine-id
//!
//! Prints one JSON document on stdout. Failures print `{"error": "..."}`
//! and exit with status 1.

use std::process::ExitCode;

use casefile_access::{build_service, execute, Cli};
use clap::Parser;
use clap::error::ErrorKind;
use serde_json::json;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            print!("{}", e.render());
            return ExitCode::FAILURE;
        }
    };
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let result = build_service(&cli).and_then(|service| execute(&service, &cli.command));

    match result {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(body) => {
                println!("{body}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{}", json!({ "error": e.to_string() }));
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            warn!("{e:#}");
            println!("{}", json!({ "error": format!("{e:#}") }));
            ExitCode::FAILURE
        }
    }
}
