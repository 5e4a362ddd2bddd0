use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::dispatcher::ActionDispatcher;
use super::engine::DerivedStateEngine;
use super::event::NormalizedEvent;
use crate::store::StateStore;

/// Engine + dispatcher for one event.
pub struct Pipeline {
    engine: DerivedStateEngine,
    dispatcher: ActionDispatcher,
    store: Arc<dyn StateStore>,
}

impl Pipeline {
    pub fn new(engine: DerivedStateEngine, dispatcher: ActionDispatcher, store: Arc<dyn StateStore>) -> Self {
        Self { engine, dispatcher, store }
    }

    pub async fn handle(&self, event: NormalizedEvent) {
        let actions = self.engine.process(&event, &*self.store).await;
        debug!(vehicle = %event.vehicle_id, actions = actions.len(), "Dispatching actions");
        self.dispatcher.execute(actions).await;
    }
}

/// Result of handing one event to its vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Queued,
    /// Mailbox full or worker unreachable; the event was not processed.
    Dropped,
}

struct Mailbox {
    tx: mpsc::Sender<NormalizedEvent>,
    worker: JoinHandle<()>,
}

/// One logical actor per vehicle.
///
/// Each vehicle id gets a worker task with its own bounded mailbox; events
/// for that vehicle are processed one at a time in arrival order, while
/// different vehicles run concurrently. All state mutations for a vehicle
/// therefore go through a single task, which is what makes the engine's
/// read-then-write on the periodic timer safe.
///
/// Routing never waits. A vehicle whose worker is stuck fills its own mailbox
/// and loses its own events; every other vehicle keeps flowing.
///
/// Workers exit after `idle` without events. A replacement worker first waits
/// for its predecessor to finish, so a vehicle never has two workers running
/// at once.
pub struct VehicleRouter {
    pipeline: Arc<Pipeline>,
    mailboxes: HashMap<String, Mailbox>,
    workers: TaskTracker,
    capacity: usize,
    idle: Duration,
}

impl VehicleRouter {
    pub fn new(pipeline: Arc<Pipeline>, capacity: usize, idle: Duration) -> Self {
        Self {
            pipeline,
            mailboxes: HashMap::new(),
            workers: TaskTracker::new(),
            capacity,
            idle,
        }
    }

    /// Vehicles with a mailbox entry (live or not yet reaped).
    pub fn active_vehicles(&self) -> usize {
        self.mailboxes.len()
    }

    /// Worker tasks still running.
    pub fn running_workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue `event` on its vehicle's mailbox without waiting.
    pub fn route(&mut self, event: NormalizedEvent) -> Routed {
        let vehicle_id = event.vehicle_id.clone();

        let event = match self.mailboxes.get(&vehicle_id) {
            Some(mailbox) => match mailbox.tx.try_send(event) {
                Ok(()) => return Routed::Queued,
                Err(TrySendError::Full(_)) => {
                    warn!(vehicle = %vehicle_id, capacity = self.capacity, "Vehicle mailbox full, dropping event");
                    return Routed::Dropped;
                }
                // Worker went idle or died; start a successor below.
                Err(TrySendError::Closed(event)) => event,
            },
            None => event,
        };

        let previous = self.mailboxes.remove(&vehicle_id).map(|m| m.worker);
        let tx = self.spawn_worker(&vehicle_id, previous);
        match tx.try_send(event) {
            Ok(()) => Routed::Queued,
            Err(_) => {
                warn!(vehicle = %vehicle_id, "Fresh vehicle worker rejected event, dropping");
                Routed::Dropped
            }
        }
    }

    fn spawn_worker(&mut self, vehicle_id: &str, previous: Option<JoinHandle<()>>) -> mpsc::Sender<NormalizedEvent> {
        let (tx, mut rx) = mpsc::channel::<NormalizedEvent>(self.capacity);
        let pipeline = self.pipeline.clone();
        let idle = self.idle;
        let id = vehicle_id.to_string();

        let worker = self.workers.spawn(async move {
            if let Some(previous) = previous {
                // Err only means the predecessor panicked; it is done either way.
                let _ = previous.await;
            }
            debug!(vehicle = %id, "Vehicle worker started");

            loop {
                match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(event)) => pipeline.handle(event).await,
                    Ok(None) => break,
                    Err(_) => {
                        // Refuse new sends, then finish what already got in.
                        rx.close();
                        while let Some(event) = rx.recv().await {
                            pipeline.handle(event).await;
                        }
                        debug!(vehicle = %id, "Vehicle worker idle, exiting");
                        break;
                    }
                }
            }
        });

        self.mailboxes.insert(vehicle_id.to_string(), Mailbox { tx: tx.clone(), worker });
        tx
    }

    /// Forget vehicles whose worker has exited. Returns how many were removed.
    pub fn reap(&mut self) -> usize {
        let before = self.mailboxes.len();
        self.mailboxes.retain(|_, m| !m.worker.is_finished());
        let reaped = before - self.mailboxes.len();
        if reaped > 0 {
            debug!(reaped, remaining = self.mailboxes.len(), "Reaped idle vehicle workers");
        }
        reaped
    }

    /// Close every mailbox and wait up to `grace` for workers to drain them.
    /// Returns `true` if all workers finished; stragglers are abandoned.
    pub async fn shutdown(&mut self, grace: Duration) -> bool {
        let vehicles = self.mailboxes.len();
        self.mailboxes.clear();
        self.workers.close();

        let drained = tokio::time::timeout(grace, self.workers.wait()).await.is_ok();
        if drained {
            info!(vehicles, "Vehicle workers drained");
        } else {
            warn!(vehicles, abandoned = self.workers.len(), "Vehicle grace period expired, abandoning workers");
        }
        drained
    }
}
