use casefile_access::{execute, Cli, Command, Response};
use casefile_license::{
    derive_license_key, AccessDecision, AccessService, AccessType, FixedClock, LicenseConfig,
    LicenseSecret, MachineId,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use tempfile::TempDir;

const MACHINE: &str = "TEST-MACHINE-ID-12345-ABCDE";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
}

fn service(dir: &TempDir, now: DateTime<Utc>) -> AccessService<FixedClock> {
    let mut config = LicenseConfig::default().with_data_dir(dir.path());
    config.kdf.memory_cost = 1024;
    config.kdf.time_cost = 1;
    AccessService::with_clock(
        config,
        LicenseSecret::new("casefile-test-secret"),
        MachineId::new(MACHINE).unwrap(),
        FixedClock(now),
    )
}

fn decision(response: Response) -> AccessDecision {
    match response {
        Response::Decision(d) => d,
        other => panic!("expected a decision, got {other:?}"),
    }
}

#[test]
fn check_reports_trial() {
    let dir = TempDir::new().unwrap();
    let d = decision(execute(&service(&dir, t0()), &Command::Check).unwrap());
    assert_eq!(d.access_type, AccessType::Trial);
    assert_eq!(d.days_remaining, Some(14));
}

#[test]
fn activate_then_check_reports_license() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, t0());
    let activate = Command::Activate {
        key: "802A-5D7A-9515-E673-4F7E".into(),
    };
    assert_eq!(decision(execute(&svc, &activate).unwrap()).access_type, AccessType::License);
    assert_eq!(decision(execute(&svc, &Command::Check).unwrap()).access_type, AccessType::License);
}

#[test]
fn bad_key_is_error() {
    let dir = TempDir::new().unwrap();
    let activate = Command::Activate {
        key: "0000-0000-0000-0000-0000".into(),
    };
    let err = execute(&service(&dir, t0()), &activate).unwrap_err();
    assert!(format!("{err:#}").contains("does not match"));
}

#[test]
fn deactivate_reports_trial_again() {
    let dir = TempDir::new().unwrap();
    execute(
        &service(&dir, t0()),
        &Command::Activate {
            key: "802a5d7a9515e6734f7e".into(),
        },
    )
    .unwrap();
    let d = decision(execute(&service(&dir, t0() + Duration::days(1)), &Command::Deactivate).unwrap());
    assert_eq!(d.access_type, AccessType::Trial);
    assert_eq!(d.days_remaining, Some(13));
}

#[test]
fn expired_trial_reports_expired() {
    let dir = TempDir::new().unwrap();
    execute(&service(&dir, t0()), &Command::Check).unwrap();
    let d = decision(execute(&service(&dir, t0() + Duration::days(15)), &Command::Check).unwrap());
    assert_eq!(d.access_type, AccessType::Expired);
}

#[test]
fn machine_id_response_serializes() {
    let dir = TempDir::new().unwrap();
    let response = execute(&service(&dir, t0()), &Command::MachineId).unwrap();
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        format!(r#"{{"machineId":"{MACHINE}"}}"#)
    );
}

#[test]
fn decision_response_is_flat() {
    let response = Response::Decision(AccessDecision {
        access_type: AccessType::Trial,
        days_remaining: Some(3),
    });
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"accessType":"trial","daysRemaining":3}"#
    );
}

#[test]
fn cli_parses_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "casefile-access",
        "activate",
        "802A-5D7A-9515-E673-4F7E",
        "--machine-id",
        MACHINE,
        "--data-dir",
        "/tmp/x",
    ])
    .unwrap();
    assert_eq!(cli.machine_id.as_deref(), Some(MACHINE));
    assert_eq!(
        cli.command,
        Command::Activate {
            key: "802A-5D7A-9515-E673-4F7E".into()
        }
    );
}

#[test]
fn pinned_key_matches_library_derivation() {
    let key = derive_license_key(
        &MachineId::new(MACHINE).unwrap(),
        &LicenseSecret::new("casefile-test-secret"),
    );
    assert_eq!(key.as_str(), "802A-5D7A-9515-E673-4F7E");
}
