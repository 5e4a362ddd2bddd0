use serde::{Deserialize, Serialize};

use crate::kernel::event::Source;

// Allowed: counts, enums, amounts.
// Forbidden: vehicle ids, locations, heart rates.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProcessorEvent {
    EventIngested { source: Option<Source> },

    DecodeFailed,

    /// The vehicle's mailbox was full; the event was dropped unprocessed.
    MailboxFull,

    AlertEmitted { class: AlertClass },

    AlertSuppressed,

    AttestationEmitted { kind: LedgerKind },

    PointsAwarded { amount: i64 },

    Ledger { kind: LedgerKind, outcome: LedgerOutcome },

    /// A store call failed and the engine or dispatcher fell back to a default.
    StoreDegraded,
}

/// How a non-safe event is treated by the alert rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertClass {
    /// harsh_turn / hard_braking. Never rate limited.
    VehicleDynamics,
    /// Heart-rate override. Never rate limited.
    HealthCritical,
    /// Driver-state and unrecognized labels. Rate limited.
    Driver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerKind {
    Alert,
    StreakAttestation,
    PeriodicAttestation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOutcome {
    Landed,
    Failed,
    /// Pool saturated or shutting down; never submitted.
    Dropped,
}
