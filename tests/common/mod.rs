#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use saferide::config::ProcessorConfig;
use saferide::error::{LedgerError, StoreError};
use saferide::kernel::action::{Action, ActionKind};
use saferide::kernel::dispatcher::ActionDispatcher;
use saferide::kernel::engine::DerivedStateEngine;
use saferide::kernel::event::{NormalizedEvent, TelemetryEvent};
use saferide::kernel::normalizer::normalize;
use saferide::kernel::telemetry::Telemetry;
use saferide::kernel::time::{Clock, ManualClock};
use saferide::services::ledger::{LedgerClient, LedgerPool, LedgerRecord};
use saferide::store::{InMemoryStore, StateStore};

pub const T0: i64 = 1_700_000_000;

pub fn raw(vehicle: &str, status: &str, heart_rate: u32) -> TelemetryEvent {
    TelemetryEvent {
        vehicle_id: vehicle.to_string(),
        status: status.to_string(),
        heart_rate,
        lat: 12.97,
        long: 77.59,
        confidence: 0.91,
        timestamp: 42, // bogus device clock
        source: None,
    }
}

pub fn kinds(actions: &[Action]) -> Vec<ActionKind> {
    actions.iter().map(Action::kind).collect()
}

pub fn count(actions: &[Action], kind: ActionKind) -> usize {
    actions.iter().filter(|a| a.kind() == kind).count()
}

/// Ledger double: lands everything and remembers what it saw.
#[derive(Default)]
pub struct RecordingLedger {
    records: Mutex<Vec<LedgerRecord>>,
    counter: AtomicUsize,
}

impl RecordingLedger {
    pub fn records(&self) -> Vec<LedgerRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for RecordingLedger {
    async fn submit(&self, record: &LedgerRecord) -> Result<String, LedgerError> {
        self.records.lock().unwrap().push(record.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("sig-{}", n))
    }
}

/// Ledger double that is always down.
pub struct FailingLedger;

#[async_trait]
impl LedgerClient for FailingLedger {
    async fn submit(&self, _record: &LedgerRecord) -> Result<String, LedgerError> {
        Err(LedgerError::Unavailable("relay offline".to_string()))
    }
}

/// Ledger double that takes `delay` per call.
pub struct SlowLedger {
    pub delay: Duration,
}

#[async_trait]
impl LedgerClient for SlowLedger {
    async fn submit(&self, _record: &LedgerRecord) -> Result<String, LedgerError> {
        tokio::time::sleep(self.delay).await;
        Ok("sig-slow".to_string())
    }
}

/// Store double that fails every call on keys starting with `prefix`.
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub prefix: String,
}

impl FlakyStore {
    pub fn new(prefix: &str) -> Self {
        Self {
            inner: InMemoryStore::new(),
            prefix: prefix.to_string(),
        }
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if key.starts_with(&self.prefix) {
            Err(StoreError::Unavailable(format!("injected failure on {}", key)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn incr_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        self.check(key)?;
        self.inner.incr_by(key, n).await
    }

    async fn rpush(&self, key: &str, value: String) -> Result<usize, StoreError> {
        self.check(key)?;
        self.inner.rpush(key, value).await
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StoreError> {
        self.check(key)?;
        self.inner.ltrim(key, start, stop).await
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
        self.check(key)?;
        self.inner.lrange(key, start, stop).await
    }
}

/// Store double whose every call on a key containing `needle` never returns.
pub struct HangingStore {
    pub inner: InMemoryStore,
    pub needle: String,
}

impl HangingStore {
    pub fn new(needle: &str) -> Self {
        Self {
            inner: InMemoryStore::new(),
            needle: needle.to_string(),
        }
    }

    async fn gate(&self, key: &str) {
        if key.contains(&self.needle) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl StateStore for HangingStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.gate(key).await;
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.gate(key).await;
        self.inner.get(key).await
    }

    async fn incr_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        self.gate(key).await;
        self.inner.incr_by(key, n).await
    }

    async fn rpush(&self, key: &str, value: String) -> Result<usize, StoreError> {
        self.gate(key).await;
        self.inner.rpush(key, value).await
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StoreError> {
        self.gate(key).await;
        self.inner.ltrim(key, start, stop).await
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
        self.gate(key).await;
        self.inner.lrange(key, start, stop).await
    }
}

/// Wait until the pool has no submission running.
pub async fn settle(pool: &LedgerPool) {
    while pool.in_flight() > 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Engine + dispatcher wired to an in-memory store, a manual clock and a
/// recording ledger. Mirrors what one vehicle worker does per event.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub ledger: Arc<RecordingLedger>,
    pub engine: DerivedStateEngine,
    pub dispatcher: ActionDispatcher,
    pub telemetry: Telemetry,
    pub clock: ManualClock,
    pub config: Arc<ProcessorConfig>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ProcessorConfig::default())
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        let config = Arc::new(config);
        let telemetry = Telemetry::new();
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(RecordingLedger::default());
        let pool = LedgerPool::new(
            ledger.clone(),
            config.ledger_max_in_flight,
            config.ledger_timeout(),
            telemetry.clone(),
        );
        let engine = DerivedStateEngine::new(config.clone(), telemetry.clone());
        let dispatcher = ActionDispatcher::new(store.clone(), pool, config.clone(), telemetry.clone());
        Self {
            store,
            ledger,
            engine,
            dispatcher,
            telemetry,
            clock: ManualClock::new(T0),
            config,
        }
    }

    pub fn normalize(&self, vehicle: &str, status: &str, heart_rate: u32) -> NormalizedEvent {
        normalize(
            &raw(vehicle, status, heart_rate),
            self.clock.now_secs(),
            self.config.health_critical_heart_rate,
        )
    }

    /// Engine only; actions are returned but not executed.
    pub async fn decide(&self, vehicle: &str, status: &str, heart_rate: u32) -> Vec<Action> {
        let event = self.normalize(vehicle, status, heart_rate);
        self.engine.process(&event, &*self.store).await
    }

    /// Engine + dispatcher.
    pub async fn feed(&self, vehicle: &str, status: &str, heart_rate: u32) -> Vec<Action> {
        let actions = self.decide(vehicle, status, heart_rate).await;
        self.dispatcher.execute(actions.clone()).await;
        actions
    }

    /// Wait for background ledger submissions to finish.
    pub async fn settle(&self) {
        settle(self.dispatcher.ledger()).await;
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.store.get(key).await.unwrap()
    }
}
