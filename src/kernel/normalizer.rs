use super::event::{CanonicalStatus, NormalizedEvent, Source, TelemetryEvent};

/// Pure and total: (raw event, server clock) -> normalized event.
///
/// Rules, in order:
/// 1. The device timestamp is discarded; `now` is authoritative.
/// 2. `safe_vehicle` is the IoT board's all-clear and maps to `safe` on the vehicle axis.
/// 3. Vehicle-dynamics labels keep their meaning on the vehicle axis.
/// 4. `safe` is the camera's all-clear and stays on the driver axis.
/// 5. Driver-state labels stay on the driver axis.
/// 6. Heart rate above the critical threshold overrides everything.
///
/// Labels naming a server-derived status (`health_critical`, the attestation
/// tags) map to that status with no source. Anything else passes through
/// verbatim as `Unrecognized`, also with no source, so an unrecognized label
/// never collides with the fixed taxonomy.
pub fn normalize(raw: &TelemetryEvent, now: i64, critical_heart_rate: u32) -> NormalizedEvent {
    let (mut status, mut source) = match raw.status.as_str() {
        "safe_vehicle" => (CanonicalStatus::Safe, Some(Source::Iot)),
        "harsh turn" | "harsh_turn" => (CanonicalStatus::HarshTurn, Some(Source::Iot)),
        "hard braking" | "hard_braking" => (CanonicalStatus::HardBraking, Some(Source::Iot)),
        "safe" => (CanonicalStatus::Safe, Some(Source::Ai)),
        "fatigue" => (CanonicalStatus::Fatigue, Some(Source::Ai)),
        "distracted" => (CanonicalStatus::Distracted, Some(Source::Ai)),
        "drowsy" => (CanonicalStatus::Drowsy, Some(Source::Ai)),
        other => (CanonicalStatus::from_label(other), None),
    };

    if raw.heart_rate > critical_heart_rate {
        status = CanonicalStatus::HealthCritical;
        source = Some(Source::Biometric);
    }

    NormalizedEvent {
        vehicle_id: raw.vehicle_id.clone(),
        status,
        source,
        timestamp: now,
        heart_rate: raw.heart_rate,
        lat: raw.lat,
        long: raw.long,
        confidence: raw.confidence,
        tx_hash: None,
    }
}
