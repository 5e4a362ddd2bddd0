use std::sync::Arc;
use tracing::{debug, warn};

use super::action::Action;
use super::event::{CanonicalStatus, NormalizedEvent};
use super::state::VehicleKeys;
use super::telemetry::{ProcessorEvent, Telemetry};
use crate::config::ProcessorConfig;
use crate::services::ledger::{LedgerPool, LedgerRecord};
use crate::store::{push_bounded, StateStore};

/// Executes engine actions against the store and the ledger pool.
///
/// Store writes happen inline. Ledger work is handed to the pool and never
/// awaited here, so a slow ledger cannot hold up the next event.
#[derive(Clone)]
pub struct ActionDispatcher {
    store: Arc<dyn StateStore>,
    ledger: LedgerPool,
    config: Arc<ProcessorConfig>,
    telemetry: Telemetry,
}

impl ActionDispatcher {
    pub fn new(
        store: Arc<dyn StateStore>,
        ledger: LedgerPool,
        config: Arc<ProcessorConfig>,
        telemetry: Telemetry,
    ) -> Self {
        Self { store, ledger, config, telemetry }
    }

    pub fn ledger(&self) -> &LedgerPool {
        &self.ledger
    }

    pub async fn execute(&self, actions: Vec<Action>) {
        for action in actions {
            self.execute_one(action).await;
        }
    }

    async fn execute_one(&self, action: Action) {
        match action {
            Action::RecordHistory(event) => self.record_history(&event).await,
            Action::AwardPoints { vehicle_id, amount } => {
                let keys = VehicleKeys::new(&vehicle_id);
                match self.store.incr_by(&keys.points, amount).await {
                    Ok(balance) => {
                        debug!(vehicle = %vehicle_id, amount, balance, "Points awarded");
                        self.telemetry.record(ProcessorEvent::PointsAwarded { amount });
                    }
                    Err(e) => {
                        warn!(vehicle = %vehicle_id, error = %e, "Failed to award points");
                        self.telemetry.record(ProcessorEvent::StoreDegraded);
                    }
                }
            }
            Action::Alert(event) => {
                let record = LedgerRecord::alert(&event);
                self.hand_off(record, event);
            }
            Action::StreakAttestation { mut event, awarded, total } => {
                let record = LedgerRecord::streak(&event, awarded, total);
                event.status = CanonicalStatus::SafeStreakAttestation;
                self.hand_off(record, event);
            }
            Action::PeriodicAttestation(mut event) => {
                let record = LedgerRecord::periodic(&event);
                event.status = CanonicalStatus::PeriodicSafeAttestation;
                self.hand_off(record, event);
            }
        }
    }

    async fn record_history(&self, event: &NormalizedEvent) {
        let keys = VehicleKeys::new(&event.vehicle_id);
        let snapshot = event.to_json();

        // 1. Hot state
        if let Err(e) = self
            .store
            .set(&keys.latest, snapshot.clone(), Some(self.config.latest_snapshot_ttl()))
            .await
        {
            warn!(vehicle = %event.vehicle_id, error = %e, "Failed to save latest snapshot");
            self.telemetry.record(ProcessorEvent::StoreDegraded);
        }

        // 2. Sliding history window
        if let Err(e) = push_bounded(&*self.store, &keys.history, snapshot, self.config.history_capacity).await {
            warn!(vehicle = %event.vehicle_id, error = %e, "Failed to append history");
            self.telemetry.record(ProcessorEvent::StoreDegraded);
        }
    }

    /// Fire-and-forget: on success the proof is merged into `logged` and it
    /// lands in the bounded alert log.
    fn hand_off(&self, record: LedgerRecord, mut logged: NormalizedEvent) {
        let store = self.store.clone();
        let telemetry = self.telemetry.clone();
        let key = VehicleKeys::new(&logged.vehicle_id).alerts;
        let capacity = self.config.alert_capacity;

        self.ledger.submit(record, move |proof| async move {
            logged.tx_hash = Some(proof);
            if let Err(e) = push_bounded(&*store, &key, logged.to_json(), capacity).await {
                warn!(vehicle = %logged.vehicle_id, error = %e, "Failed to append alert log");
                telemetry.record(ProcessorEvent::StoreDegraded);
            }
        });
    }
}
