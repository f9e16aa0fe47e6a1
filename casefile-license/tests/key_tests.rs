mod common;

use common::{
    is_key_format, machine, secret, OTHER_MACHINE, OTHER_MACHINE_KEY, TEST_MACHINE,
    TEST_MACHINE_KEY,
};
use casefile_license::{
    derive_license_key, validate_license_key, LicenseError, LicenseKey, LicenseSecret,
    KEY_FORMATTED_LEN,
};
use pretty_assertions::assert_eq;

// ── Derivation ───────────────────────────────────────────────────

#[test]
fn pinned_key_for_test_machine() {
    let key = derive_license_key(&machine(TEST_MACHINE), &secret());
    assert_eq!(key.as_str(), TEST_MACHINE_KEY);
}

#[test]
fn pinned_key_for_other_machine() {
    let key = derive_license_key(&machine(OTHER_MACHINE), &secret());
    assert_eq!(key.as_str(), OTHER_MACHINE_KEY);
}

#[test]
fn derivation_is_deterministic() {
    let m = machine(TEST_MACHINE);
    assert_eq!(derive_license_key(&m, &secret()), derive_license_key(&m, &secret()));
}

#[test]
fn distinct_machines_get_distinct_keys() {
    let a = derive_license_key(&machine(TEST_MACHINE), &secret());
    let b = derive_license_key(&machine(OTHER_MACHINE), &secret());
    assert_ne!(a, b);
}

#[test]
fn distinct_secrets_get_distinct_keys() {
    let m = machine(TEST_MACHINE);
    let a = derive_license_key(&m, &secret());
    let b = derive_license_key(&m, &LicenseSecret::new("another-secret"));
    assert_ne!(a, b);
}

#[test]
fn derived_key_has_display_format() {
    let key = derive_license_key(&machine("x"), &secret());
    assert_eq!(key.as_str().len(), KEY_FORMATTED_LEN);
    assert!(is_key_format(key.as_str()));
    assert_eq!(key.to_string(), key.as_str());
}

#[test]
fn machine_id_whitespace_is_significant() {
    let a = derive_license_key(&machine(TEST_MACHINE), &secret());
    let b = derive_license_key(&machine(&format!(" {TEST_MACHINE}")), &secret());
    assert_ne!(a, b);
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parse_canonical_key() {
    let key = LicenseKey::parse(TEST_MACHINE_KEY).unwrap();
    assert_eq!(key.as_str(), TEST_MACHINE_KEY);
}

#[test]
fn parse_normalizes_case_spacing_and_dashes() {
    let key = LicenseKey::parse("  802a5d7a 9515-e6734f7e \n").unwrap();
    assert_eq!(key.as_str(), TEST_MACHINE_KEY);
}

#[test]
fn parse_via_from_str() {
    let key: LicenseKey = "802A5D7A9515E6734F7E".parse().unwrap();
    assert_eq!(key.as_str(), TEST_MACHINE_KEY);
}

#[test]
fn parse_rejects_short_key() {
    let result = LicenseKey::parse("802A-5D7A-9515-E673");
    assert!(matches!(result, Err(LicenseError::InvalidKeyFormat(_))));
}

#[test]
fn parse_rejects_long_key() {
    let result = LicenseKey::parse("802A-5D7A-9515-E673-4F7E-0000");
    assert!(matches!(result, Err(LicenseError::InvalidKeyFormat(_))));
}

#[test]
fn parse_rejects_non_hex() {
    let result = LicenseKey::parse("ZZZZ-5D7A-9515-E673-4F7E");
    assert!(matches!(result, Err(LicenseError::InvalidKeyFormat(_))));
}

#[test]
fn parse_rejects_empty() {
    assert!(LicenseKey::parse("").is_err());
    assert!(LicenseKey::parse("----").is_err());
}

#[test]
fn key_serializes_as_string() {
    let key = LicenseKey::parse(TEST_MACHINE_KEY).unwrap();
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, format!("\"{TEST_MACHINE_KEY}\""));
    let back: LicenseKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
}

#[test]
fn key_deserialization_validates() {
    let result: Result<LicenseKey, _> = serde_json::from_str("\"nope\"");
    assert!(result.is_err());
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn matching_key_validates() {
    let key = validate_license_key("802a-5d7a-9515-e673-4f7e", &machine(TEST_MACHINE), &secret())
        .unwrap();
    assert_eq!(key.as_str(), TEST_MACHINE_KEY);
}

#[test]
fn key_for_other_machine_is_mismatch() {
    let result = validate_license_key(OTHER_MACHINE_KEY, &machine(TEST_MACHINE), &secret());
    assert!(matches!(result, Err(LicenseError::KeyMismatch)));
}

#[test]
fn key_under_other_secret_is_mismatch() {
    let result = validate_license_key(
        TEST_MACHINE_KEY,
        &machine(TEST_MACHINE),
        &LicenseSecret::new("another-secret"),
    );
    assert!(matches!(result, Err(LicenseError::KeyMismatch)));
}

#[test]
fn malformed_key_is_format_error() {
    let result = validate_license_key("hello", &machine(TEST_MACHINE), &secret());
    assert!(matches!(result, Err(LicenseError::InvalidKeyFormat(_))));
}

#[test]
fn matches_checks_machine_binding() {
    let key = LicenseKey::parse(TEST_MACHINE_KEY).unwrap();
    assert!(key.matches(&machine(TEST_MACHINE), &secret()));
    assert!(!key.matches(&machine(OTHER_MACHINE), &secret()));
}
