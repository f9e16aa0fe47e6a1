//! Casefile license key generator.
//!
//! Usage:
//!   casefile-keygen <machineId> <customerName> [customerEmail]
//!
//! Exits with status 1 and prints usage when arguments are missing.

use std::process::ExitCode;

use casefile_keygen::{run, summary, Args};
use casefile_license::LicenseSecret;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            print!("{}", e.render());
            return ExitCode::FAILURE;
        }
    };

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(&args, &LicenseSecret::embedded(), chrono::Utc::now()) {
        Ok(issued) => {
            println!("{}", summary(&issued));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
