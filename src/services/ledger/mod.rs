//! Attestation/alert ledger boundary.
//!
//! Building, signing and landing the actual transaction is the relay's job;
//! this side only produces a human-readable record and waits for a proof id.

pub mod client;
pub mod dry_run;
pub mod pool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::kernel::event::{CanonicalStatus, NormalizedEvent};
use crate::kernel::telemetry::LedgerKind;

pub use client::HttpLedgerClient;
pub use dry_run::DryRunLedger;
pub use pool::LedgerPool;

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Land one record. Returns the proof identifier (transaction signature).
    async fn submit(&self, record: &LedgerRecord) -> Result<String, LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub vehicle_id: String,
    pub status: CanonicalStatus,
    pub memo: String,
    pub kind: LedgerKind,
}

impl LedgerRecord {
    pub fn alert(event: &NormalizedEvent) -> Self {
        let memo = if event.status == CanonicalStatus::HealthCritical {
            format!(
                "SAFERIDE MEDICAL ALERT [HR: {} BPM]: {} | ID: {} | TIME: {}",
                event.heart_rate, event.status, event.vehicle_id, event.timestamp
            )
        } else {
            let source = event.source.map(|s| s.as_str()).unwrap_or("");
            format!(
                "SAFERIDE ALERT [{}]: {} | ID: {} | TIME: {} | CONF: {:.2}",
                source, event.status, event.vehicle_id, event.timestamp, event.confidence
            )
        };
        Self {
            vehicle_id: event.vehicle_id.clone(),
            status: event.status.clone(),
            memo,
            kind: LedgerKind::Alert,
        }
    }

    pub fn streak(event: &NormalizedEvent, awarded: i64, total: i64) -> Self {
        Self {
            vehicle_id: event.vehicle_id.clone(),
            status: CanonicalStatus::SafeStreakAttestation,
            memo: format!(
                "SAFERIDE ATTESTATION: {} earned {} points. Total: {}.",
                event.vehicle_id, awarded, total
            ),
            kind: LedgerKind::StreakAttestation,
        }
    }

    pub fn periodic(event: &NormalizedEvent) -> Self {
        Self {
            vehicle_id: event.vehicle_id.clone(),
            status: CanonicalStatus::PeriodicSafeAttestation,
            memo: format!(
                "SAFERIDE PERIODIC ATTESTATION: {} status: {}",
                event.vehicle_id, event.status
            ),
            kind: LedgerKind::PeriodicAttestation,
        }
    }
}
