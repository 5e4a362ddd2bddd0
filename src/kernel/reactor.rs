use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatcher::ActionDispatcher;
use super::engine::DerivedStateEngine;
use super::normalizer::normalize;
use super::router::{Pipeline, Routed, VehicleRouter};
use super::telemetry::{ProcessorEvent, Telemetry, TelemetrySnapshot};
use super::time::Clock;
use crate::config::ProcessorConfig;
use crate::services::ledger::{LedgerClient, LedgerPool};
use crate::store::StateStore;
use crate::transport::{self, Envelope};

/// Ingestion loop: transport → decode → normalize → per-vehicle worker.
///
/// The loop itself never touches the store or the ledger. It stamps the
/// server time at the moment an envelope is taken off the channel and routes
/// the normalized event; everything after that runs on vehicle workers and
/// the ledger pool.
pub struct Reactor {
    receiver: mpsc::Receiver<Envelope>,
    router: VehicleRouter,
    ledger: LedgerPool,
    clock: Arc<dyn Clock>,
    config: Arc<ProcessorConfig>,
    telemetry: Telemetry,
    shutdown: CancellationToken,
}

impl Reactor {
    pub fn new(
        receiver: mpsc::Receiver<Envelope>,
        store: Arc<dyn StateStore>,
        ledger_client: Arc<dyn LedgerClient>,
        config: ProcessorConfig,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        let config = Arc::new(config);
        let telemetry = Telemetry::new();

        let ledger = LedgerPool::new(
            ledger_client,
            config.ledger_max_in_flight,
            config.ledger_timeout(),
            telemetry.clone(),
        );
        let engine = DerivedStateEngine::new(config.clone(), telemetry.clone());
        let dispatcher = ActionDispatcher::new(store.clone(), ledger.clone(), config.clone(), telemetry.clone());
        let pipeline = Arc::new(Pipeline::new(engine, dispatcher, store));
        let router = VehicleRouter::new(pipeline, config.vehicle_mailbox_capacity, config.vehicle_idle());

        Self {
            receiver,
            router,
            ledger,
            clock,
            config,
            telemetry,
            shutdown,
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        self.telemetry.clone()
    }

    pub fn ledger(&self) -> &LedgerPool {
        &self.ledger
    }

    /// One envelope through decode + normalize + route. Never waits: malformed
    /// payloads and events for a backed-up vehicle are logged and dropped here.
    pub fn ingest(&mut self, envelope: Envelope) {
        let raw = match transport::decode(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(topic = %envelope.topic, error = %e, "Dropping malformed telemetry payload");
                self.telemetry.record(ProcessorEvent::DecodeFailed);
                return;
            }
        };

        let now = self.clock.now_secs();
        let event = normalize(&raw, now, self.config.health_critical_heart_rate);
        debug!(vehicle = %event.vehicle_id, raw_status = %raw.status, status = %event.status, ts = now, "Event normalized");

        self.telemetry.record(ProcessorEvent::EventIngested { source: event.source });
        if self.router.route(event) == Routed::Dropped {
            self.telemetry.record(ProcessorEvent::MailboxFull);
        }
    }

    /// Drive the loop until shutdown is requested or the transport closes,
    /// then drain vehicle workers and give the ledger its grace period.
    pub async fn run(mut self) -> TelemetrySnapshot {
        info!("Reactor started");
        let mut reap = tokio::time::interval(self.config.vehicle_idle());
        reap.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let next = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, no longer accepting events");
                    break;
                }
                _ = reap.tick() => {
                    self.router.reap();
                    continue;
                }
                next = self.receiver.recv() => next,
            };

            match next {
                Some(envelope) => self.ingest(envelope),
                None => {
                    info!("Transport closed");
                    break;
                }
            }
        }

        self.receiver.close();
        let workers_drained = self.router.shutdown(self.config.shutdown_grace()).await;
        let ledger_drained = self.ledger.shutdown(self.config.shutdown_grace()).await;

        let snapshot = self.telemetry.snapshot();
        info!(
            events = snapshot.ingest_stats.events,
            decode_failures = snapshot.ingest_stats.decode_failures,
            dropped = snapshot.ingest_stats.dropped,
            alerts = snapshot.alert_stats.vehicle_dynamics + snapshot.alert_stats.health_critical + snapshot.alert_stats.driver,
            suppressed = snapshot.alert_stats.suppressed,
            ledger_landed = snapshot.ledger_stats.landed,
            ledger_failed = snapshot.ledger_stats.failed,
            ledger_dropped = snapshot.ledger_stats.dropped,
            workers_drained,
            ledger_drained,
            window = snapshot.window,
            evicted = snapshot.evicted,
            "Reactor stopped (counts cover the retained telemetry window)"
        );
        snapshot
    }
}
