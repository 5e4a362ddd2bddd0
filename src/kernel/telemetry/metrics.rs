use std::collections::VecDeque;
use serde::Serialize;
use super::event::{AlertClass, LedgerKind, LedgerOutcome, ProcessorEvent};
use crate::kernel::event::Source;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub ingest_stats: IngestStats,
    pub alert_stats: AlertStats,
    pub reward_stats: RewardStats,
    pub ledger_stats: LedgerStats,
    pub store_degradations: u64,
    /// Processor events the counts above were computed from.
    pub window: usize,
    /// Older events evicted from the recorder and not counted.
    pub evicted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestStats {
    pub events: u64,
    pub decode_failures: u64,
    /// Decoded but dropped on a full vehicle mailbox.
    pub dropped: u64,
    pub iot: u64,
    pub ai: u64,
    pub biometric: u64,
    pub untagged: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertStats {
    pub vehicle_dynamics: u64,
    pub health_critical: u64,
    pub driver: u64,
    pub suppressed: u64,
    /// suppressed / (driver + suppressed)
    pub driver_suppression_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RewardStats {
    pub streak_attestations: u64,
    pub periodic_attestations: u64,
    pub points_awarded: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerStats {
    pub landed: u64,
    pub failed: u64,
    pub dropped: u64,
    pub alerts_landed: u64,
    pub attestations_landed: u64,
}

pub fn compute_snapshot(events: &VecDeque<ProcessorEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            ProcessorEvent::EventIngested { source } => {
                snap.ingest_stats.events += 1;
                match source {
                    Some(Source::Iot) => snap.ingest_stats.iot += 1,
                    Some(Source::Ai) => snap.ingest_stats.ai += 1,
                    Some(Source::Biometric) => snap.ingest_stats.biometric += 1,
                    None => snap.ingest_stats.untagged += 1,
                }
            }
            ProcessorEvent::DecodeFailed => snap.ingest_stats.decode_failures += 1,
            ProcessorEvent::MailboxFull => snap.ingest_stats.dropped += 1,
            ProcessorEvent::AlertEmitted { class } => match class {
                AlertClass::VehicleDynamics => snap.alert_stats.vehicle_dynamics += 1,
                AlertClass::HealthCritical => snap.alert_stats.health_critical += 1,
                AlertClass::Driver => snap.alert_stats.driver += 1,
            },
            ProcessorEvent::AlertSuppressed => snap.alert_stats.suppressed += 1,
            ProcessorEvent::AttestationEmitted { kind } => match kind {
                LedgerKind::StreakAttestation => snap.reward_stats.streak_attestations += 1,
                LedgerKind::PeriodicAttestation => snap.reward_stats.periodic_attestations += 1,
                LedgerKind::Alert => {} // counted via AlertEmitted
            },
            ProcessorEvent::PointsAwarded { amount } => snap.reward_stats.points_awarded += amount,
            ProcessorEvent::Ledger { kind, outcome } => match outcome {
                LedgerOutcome::Landed => {
                    snap.ledger_stats.landed += 1;
                    if *kind == LedgerKind::Alert {
                        snap.ledger_stats.alerts_landed += 1;
                    } else {
                        snap.ledger_stats.attestations_landed += 1;
                    }
                }
                LedgerOutcome::Failed => snap.ledger_stats.failed += 1,
                LedgerOutcome::Dropped => snap.ledger_stats.dropped += 1,
            },
            ProcessorEvent::StoreDegraded => snap.store_degradations += 1,
        }
    }

    snap.window = events.len();

    let driver_total = snap.alert_stats.driver + snap.alert_stats.suppressed;
    if driver_total > 0 {
        snap.alert_stats.driver_suppression_ratio = snap.alert_stats.suppressed as f64 / driver_total as f64;
    }

    snap
}
