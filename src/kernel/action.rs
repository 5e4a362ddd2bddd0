use super::event::NormalizedEvent;

/// Side-effect request produced by the engine. The dispatcher is the only
/// thing that executes these.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Refresh the latest snapshot and append to the bounded history log.
    RecordHistory(NormalizedEvent),
    /// Incident attestation on the ledger.
    Alert(NormalizedEvent),
    AwardPoints { vehicle_id: String, amount: i64 },
    /// Reward attestation. `total` is the balance after `awarded` lands.
    StreakAttestation {
        event: NormalizedEvent,
        awarded: i64,
        total: i64,
    },
    /// Sustained-safe attestation from the periodic timer.
    PeriodicAttestation(NormalizedEvent),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::RecordHistory(_) => ActionKind::RecordHistory,
            Action::Alert(_) => ActionKind::Alert,
            Action::AwardPoints { .. } => ActionKind::AwardPoints,
            Action::StreakAttestation { .. } => ActionKind::StreakAttestation,
            Action::PeriodicAttestation(_) => ActionKind::PeriodicAttestation,
        }
    }
}

/// Payload-free discriminant, handy for assertions and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RecordHistory,
    Alert,
    AwardPoints,
    StreakAttestation,
    PeriodicAttestation,
}
