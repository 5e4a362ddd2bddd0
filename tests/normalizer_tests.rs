mod common;

use common::raw;
use saferide::kernel::event::{CanonicalStatus, NormalizedEvent, Source};
use saferide::kernel::normalizer::normalize;

const NOW: i64 = 1_700_000_123;
const CRITICAL_HR: u32 = 120;

fn norm(status: &str, hr: u32) -> NormalizedEvent {
    normalize(&raw("car-1", status, hr), NOW, CRITICAL_HR)
}

#[test]
fn test_server_clock_is_authoritative() {
    let mut event = raw("car-1", "safe", 70);
    event.timestamp = 99; // device thinks it is 1970
    let n = normalize(&event, NOW, CRITICAL_HR);
    assert_eq!(n.timestamp, NOW, "Device timestamp must be discarded");
}

#[test]
fn test_vehicle_axis_labels() {
    let n = norm("safe_vehicle", 70);
    assert_eq!(n.status, CanonicalStatus::Safe);
    assert_eq!(n.source, Some(Source::Iot));

    let n = norm("harsh turn", 70);
    assert_eq!(n.status, CanonicalStatus::HarshTurn);
    assert_eq!(n.source, Some(Source::Iot));

    let n = norm("hard braking", 70);
    assert_eq!(n.status, CanonicalStatus::HardBraking);
    assert_eq!(n.source, Some(Source::Iot));
}

#[test]
fn test_driver_axis_labels() {
    let n = norm("safe", 70);
    assert_eq!(n.status, CanonicalStatus::Safe);
    assert_eq!(n.source, Some(Source::Ai), "Camera 'safe' stays on the driver axis");

    for (label, expected) in [
        ("fatigue", CanonicalStatus::Fatigue),
        ("distracted", CanonicalStatus::Distracted),
        ("drowsy", CanonicalStatus::Drowsy),
    ] {
        let n = norm(label, 70);
        assert_eq!(n.status, expected);
        assert_eq!(n.source, Some(Source::Ai));
    }
}

#[test]
fn test_both_axes_report_safe_distinguished_by_source() {
    let iot = norm("safe_vehicle", 70);
    let ai = norm("safe", 70);
    assert_eq!(iot.status, ai.status);
    assert_ne!(iot.source, ai.source);
}

#[test]
fn test_unknown_label_passes_through_untagged() {
    let n = norm("rash driving", 70);
    assert_eq!(n.status, CanonicalStatus::Unrecognized("rash driving".to_string()));
    assert_eq!(n.status.as_str(), "rash driving");
    assert_eq!(n.source, None);
}

#[test]
fn test_heart_rate_override() {
    let n = norm("safe", 121);
    assert_eq!(n.status, CanonicalStatus::HealthCritical);
    assert_eq!(n.source, Some(Source::Biometric));

    // Overrides vehicle labels too
    let n = norm("harsh turn", 150);
    assert_eq!(n.status, CanonicalStatus::HealthCritical);
    assert_eq!(n.source, Some(Source::Biometric));

    // Strictly greater than
    let n = norm("safe", 120);
    assert_eq!(n.status, CanonicalStatus::Safe);
    assert_eq!(n.source, Some(Source::Ai));
}

#[test]
fn test_heart_rate_threshold_is_configurable() {
    let n = normalize(&raw("car-1", "safe", 101), NOW, 100);
    assert_eq!(n.status, CanonicalStatus::HealthCritical);
}

#[test]
fn test_normalized_snapshot_json_shape() {
    let n = norm("harsh turn", 80);
    let json: serde_json::Value = serde_json::from_str(&n.to_json()).unwrap();
    assert_eq!(json["status"], "harsh_turn");
    assert_eq!(json["source"], "iot");
    assert_eq!(json["timestamp"], NOW);
    assert!(json.get("tx_hash").is_none(), "No proof before the ledger answers");

    let back: NormalizedEvent = serde_json::from_str(&n.to_json()).unwrap();
    assert_eq!(back, n);
}

#[test]
fn test_reserved_labels_keep_their_identity() {
    for (label, expected) in [
        ("health_critical", CanonicalStatus::HealthCritical),
        ("safe_streak_attestation", CanonicalStatus::SafeStreakAttestation),
        ("periodic_safe_attestation", CanonicalStatus::PeriodicSafeAttestation),
    ] {
        let n = norm(label, 70);
        assert_eq!(n.status, expected, "{} must not become Unrecognized", label);
        assert_eq!(n.source, None);

        let back: NormalizedEvent = serde_json::from_str(&n.to_json()).unwrap();
        assert_eq!(back, n, "{} must survive the snapshot round-trip", label);
    }
}
