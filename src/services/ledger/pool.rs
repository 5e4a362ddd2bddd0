use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use super::{LedgerClient, LedgerRecord};
use crate::error::LedgerError;
use crate::kernel::telemetry::{LedgerOutcome, ProcessorEvent, Telemetry};

/// Bounded, tracked home for fire-and-forget ledger submissions.
///
/// `submit` never waits: it either starts a task (holding one of
/// `max_in_flight` permits) or drops the record. Every call is capped by
/// `timeout`; expiry is reported as a ledger failure. Outstanding tasks are
/// counted by a `TaskTracker` so shutdown can give them a grace period.
#[derive(Clone)]
pub struct LedgerPool {
    client: Arc<dyn LedgerClient>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    timeout: Duration,
    telemetry: Telemetry,
}

impl LedgerPool {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        max_in_flight: usize,
        timeout: Duration,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            tracker: TaskTracker::new(),
            timeout,
            telemetry,
        }
    }

    /// Hand `record` to the ledger in the background. `on_landed` runs with
    /// the proof id once the ledger accepts it; failures are logged and
    /// dropped. Returns `false` if the record was dropped without an attempt.
    pub fn submit<F, Fut>(&self, record: LedgerRecord, on_landed: F) -> bool
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let kind = record.kind;

        if self.tracker.is_closed() {
            warn!(vehicle = %record.vehicle_id, ?kind, "Ledger pool shutting down, dropping record");
            self.telemetry.record(ProcessorEvent::Ledger { kind, outcome: LedgerOutcome::Dropped });
            return false;
        }

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                warn!(vehicle = %record.vehicle_id, ?kind, "Ledger pool saturated, dropping record");
                self.telemetry.record(ProcessorEvent::Ledger { kind, outcome: LedgerOutcome::Dropped });
                return false;
            }
        };

        let client = self.client.clone();
        let telemetry = self.telemetry.clone();
        let timeout = self.timeout;

        self.tracker.spawn(async move {
            let _permit = permit;
            info!(vehicle = %record.vehicle_id, status = %record.status, "Submitting ledger record");

            let result = match tokio::time::timeout(timeout, client.submit(&record)).await {
                Ok(r) => r,
                Err(_) => Err(LedgerError::Timeout(timeout.as_secs())),
            };

            match result {
                Ok(proof) => {
                    info!(vehicle = %record.vehicle_id, status = %record.status, %proof, "Ledger record landed");
                    telemetry.record(ProcessorEvent::Ledger { kind, outcome: LedgerOutcome::Landed });
                    on_landed(proof).await;
                }
                Err(e) => {
                    warn!(vehicle = %record.vehicle_id, status = %record.status, error = %e, "Ledger submission failed");
                    telemetry.record(ProcessorEvent::Ledger { kind, outcome: LedgerOutcome::Failed });
                }
            }
        });
        true
    }

    /// Submissions currently running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting submissions and wait up to `grace` for running ones.
    /// Returns `true` if everything finished; the rest is abandoned.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(grace, self.tracker.wait()).await.is_ok();
        if !drained {
            warn!(abandoned = self.tracker.len(), "Ledger grace period expired, abandoning submissions");
        }
        drained
    }
}
