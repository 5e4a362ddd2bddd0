use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Raw event as published by a vehicle (IoT board or CV inference box).
/// Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// May be left empty when the topic carries it.
    #[serde(default)]
    pub vehicle_id: String,
    pub status: String,
    /// 0 = unknown
    #[serde(default)]
    pub heart_rate: u32,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub long: f64,
    #[serde(default)]
    pub confidence: f64,
    /// Device clock. Never trusted for ordering.
    #[serde(default)]
    pub timestamp: i64,
    /// Upstream hint; the normalizer always replaces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// The closed status taxonomy the engine reasons over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalStatus {
    Safe,
    Fatigue,
    Distracted,
    Drowsy,
    HarshTurn,
    HardBraking,
    HealthCritical,
    /// Tag for streak rewards in the alert log. A device sending it is treated
    /// as an incident that never alerts.
    SafeStreakAttestation,
    /// Tag for periodic attestations in the alert log. Same device handling
    /// as `SafeStreakAttestation`.
    PeriodicSafeAttestation,
    /// Label outside the taxonomy, carried through verbatim. Never holds a
    /// label `from_label` knows; build it through `from_label`.
    Unrecognized(String),
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CanonicalStatus::Safe => "safe",
            CanonicalStatus::Fatigue => "fatigue",
            CanonicalStatus::Distracted => "distracted",
            CanonicalStatus::Drowsy => "drowsy",
            CanonicalStatus::HarshTurn => "harsh_turn",
            CanonicalStatus::HardBraking => "hard_braking",
            CanonicalStatus::HealthCritical => "health_critical",
            CanonicalStatus::SafeStreakAttestation => "safe_streak_attestation",
            CanonicalStatus::PeriodicSafeAttestation => "periodic_safe_attestation",
            CanonicalStatus::Unrecognized(label) => label,
        }
    }

    /// Inverse of `as_str`; anything unknown becomes `Unrecognized`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "safe" => CanonicalStatus::Safe,
            "fatigue" => CanonicalStatus::Fatigue,
            "distracted" => CanonicalStatus::Distracted,
            "drowsy" => CanonicalStatus::Drowsy,
            "harsh_turn" => CanonicalStatus::HarshTurn,
            "hard_braking" => CanonicalStatus::HardBraking,
            "health_critical" => CanonicalStatus::HealthCritical,
            "safe_streak_attestation" => CanonicalStatus::SafeStreakAttestation,
            "periodic_safe_attestation" => CanonicalStatus::PeriodicSafeAttestation,
            other => CanonicalStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, CanonicalStatus::Safe)
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CanonicalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CanonicalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(CanonicalStatus::from_label(&label))
    }
}

/// Which status axis (if any) an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Vehicle dynamics (IMU on the IoT board).
    Iot,
    /// Driver monitoring (camera inference).
    Ai,
    /// Heart-rate override.
    Biometric,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Iot => "iot",
            Source::Ai => "ai",
            Source::Biometric => "biometric",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the normalizer; the unit the engine, dispatcher and logs work on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub vehicle_id: String,
    pub status: CanonicalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// Server clock at ingestion, seconds since epoch. Authoritative.
    pub timestamp: i64,
    pub heart_rate: u32,
    pub lat: f64,
    pub long: f64,
    pub confidence: f64,
    /// Ledger proof, set once an alert or attestation lands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl NormalizedEvent {
    pub fn to_json(&self) -> String {
        // Strings and numbers only. Non-finite floats are written as null.
        serde_json::to_string(self).unwrap_or_default()
    }
}
