use std::sync::Arc;
use tracing::{debug, info, warn};

use super::action::Action;
use super::event::{CanonicalStatus, NormalizedEvent, Source};
use super::state::VehicleKeys;
use super::telemetry::{AlertClass, LedgerKind, ProcessorEvent, Telemetry};
use crate::config::ProcessorConfig;
use crate::store::{get_i64, StateStore};

/// Derived-state engine: one normalized event in, an ordered list of
/// actions out.
///
/// Holds no per-vehicle state of its own. Every field lives in the store and
/// is touched through atomic primitives (INCR, SET). The one read-then-write
/// sequence (the periodic timer) is safe only because the router feeds each
/// vehicle's events to a single worker in order.
///
/// Never fails: a store error degrades that one field to its zero/unknown
/// default and processing continues.
#[derive(Debug, Clone)]
pub struct DerivedStateEngine {
    config: Arc<ProcessorConfig>,
    telemetry: Telemetry,
}

impl DerivedStateEngine {
    pub fn new(config: Arc<ProcessorConfig>, telemetry: Telemetry) -> Self {
        Self { config, telemetry }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub async fn process<S>(&self, event: &NormalizedEvent, store: &S) -> Vec<Action>
    where
        S: StateStore + ?Sized,
    {
        let keys = VehicleKeys::new(&event.vehicle_id);
        let mut actions = Vec::new();

        debug!(
            vehicle = %event.vehicle_id,
            status = %event.status,
            source = ?event.source,
            ts = event.timestamp,
            "Processing event"
        );

        // a. Axis update
        self.update_axis(event, &keys, store).await;

        if event.status.is_safe() {
            // b. Streak & reward
            self.advance_streak(event, &keys, store, &mut actions).await;
            // c. Periodic timer
            self.check_periodic(event, &keys, store, &mut actions).await;
        } else {
            // d. Incident bookkeeping
            self.record_incident(event, &keys, store).await;
            // e. Alert rate limiting
            self.gate_alert(event, &keys, store, &mut actions).await;
        }

        // f. History, unconditionally
        actions.push(Action::RecordHistory(event.clone()));
        actions
    }

    async fn update_axis<S>(&self, event: &NormalizedEvent, keys: &VehicleKeys, store: &S)
    where
        S: StateStore + ?Sized,
    {
        let key = match event.source {
            Some(Source::Iot) => &keys.vehicle_status,
            Some(Source::Ai) => &keys.driver_status,
            Some(Source::Biometric) | None => return,
        };
        self.write(store, key, event.status.as_str().to_string()).await;
    }

    async fn advance_streak<S>(
        &self,
        event: &NormalizedEvent,
        keys: &VehicleKeys,
        store: &S,
        actions: &mut Vec<Action>,
    ) where
        S: StateStore + ?Sized,
    {
        let streak = match store.incr(&keys.safe_streak).await {
            Ok(v) => v,
            Err(e) => {
                warn!(vehicle = %event.vehicle_id, error = %e, "Failed to increment safe streak");
                self.telemetry.record(ProcessorEvent::StoreDegraded);
                return;
            }
        };

        // Reset happens right after the crossing, so the counter only gets
        // past the threshold if an earlier reset write failed. Treat that the
        // same as reaching it.
        if streak < self.config.safe_streak_threshold {
            return;
        }

        let awarded = self.config.points_per_streak;
        let total = self.read_i64(store, &keys.points).await + awarded;

        actions.push(Action::AwardPoints {
            vehicle_id: event.vehicle_id.clone(),
            amount: awarded,
        });
        actions.push(Action::StreakAttestation {
            event: event.clone(),
            awarded,
            total,
        });
        self.telemetry.record(ProcessorEvent::AttestationEmitted {
            kind: LedgerKind::StreakAttestation,
        });
        info!(vehicle = %event.vehicle_id, awarded, total, "Safe streak reached, points awarded");

        self.write(store, &keys.safe_streak, "0".to_string()).await;
    }

    async fn check_periodic<S>(
        &self,
        event: &NormalizedEvent,
        keys: &VehicleKeys,
        store: &S,
        actions: &mut Vec<Action>,
    ) where
        S: StateStore + ?Sized,
    {
        let now = event.timestamp;
        let interval = self.config.periodic_attestation_interval_secs;

        let last_periodic = self.read_i64(store, &keys.last_periodic_attestation).await;
        let last_incident = self.read_i64(store, &keys.last_incident).await;

        // Two independent cool-downs: since the last attestation, and since
        // the last incident of any kind.
        let periodic_due = now - last_periodic >= interval;
        let incident_clear = last_incident == 0 || now - last_incident >= interval;

        if periodic_due && incident_clear {
            actions.push(Action::PeriodicAttestation(event.clone()));
            self.telemetry.record(ProcessorEvent::AttestationEmitted {
                kind: LedgerKind::PeriodicAttestation,
            });
            self.write(store, &keys.last_periodic_attestation, now.to_string()).await;
            info!(vehicle = %event.vehicle_id, "Periodic safe attestation triggered");
        }
    }

    async fn record_incident<S>(&self, event: &NormalizedEvent, keys: &VehicleKeys, store: &S)
    where
        S: StateStore + ?Sized,
    {
        self.write(store, &keys.safe_streak, "0".to_string()).await;
        self.write(store, &keys.last_incident, event.timestamp.to_string()).await;
        // Restart the periodic eligibility window.
        self.write(store, &keys.last_periodic_attestation, "0".to_string()).await;
    }

    async fn gate_alert<S>(
        &self,
        event: &NormalizedEvent,
        keys: &VehicleKeys,
        store: &S,
        actions: &mut Vec<Action>,
    ) where
        S: StateStore + ?Sized,
    {
        let Some(class) = classify(&event.status) else {
            return;
        };
        let now = event.timestamp;

        if class == AlertClass::Driver {
            let last_alert = self.read_i64(store, &keys.last_alert).await;
            if now - last_alert <= self.config.driver_alert_window_secs {
                debug!(vehicle = %event.vehicle_id, status = %event.status, "Rate limit: skipping duplicate alert");
                self.telemetry.record(ProcessorEvent::AlertSuppressed);
                return;
            }
        }

        warn!(vehicle = %event.vehicle_id, status = %event.status, ?class, "Incident detected");
        actions.push(Action::Alert(event.clone()));
        self.telemetry.record(ProcessorEvent::AlertEmitted { class });
        self.write(store, &keys.last_alert, now.to_string()).await;
    }

    async fn read_i64<S>(&self, store: &S, key: &str) -> i64
    where
        S: StateStore + ?Sized,
    {
        match get_i64(store, key).await {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "State read failed, treating as 0");
                self.telemetry.record(ProcessorEvent::StoreDegraded);
                0
            }
        }
    }

    async fn write<S>(&self, store: &S, key: &str, value: String)
    where
        S: StateStore + ?Sized,
    {
        if let Err(e) = store.set(key, value, None).await {
            warn!(key, error = %e, "State write failed");
            self.telemetry.record(ProcessorEvent::StoreDegraded);
        }
    }
}

/// Rate-limiter class of a status. `None` for statuses that never alert.
pub fn classify(status: &CanonicalStatus) -> Option<AlertClass> {
    match status {
        CanonicalStatus::Safe
        | CanonicalStatus::SafeStreakAttestation
        | CanonicalStatus::PeriodicSafeAttestation => None,
        CanonicalStatus::HealthCritical => Some(AlertClass::HealthCritical),
        CanonicalStatus::HarshTurn | CanonicalStatus::HardBraking => Some(AlertClass::VehicleDynamics),
        CanonicalStatus::Fatigue
        | CanonicalStatus::Distracted
        | CanonicalStatus::Drowsy
        | CanonicalStatus::Unrecognized(_) => Some(AlertClass::Driver),
    }
}
