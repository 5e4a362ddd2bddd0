use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use super::event::ProcessorEvent;
use super::metrics::{TelemetrySnapshot, compute_snapshot};

const MAX_EVENTS: usize = 10_000;

#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<ProcessorEvent>,
    evicted: u64,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
            evicted: 0,
        }
    }

    pub fn record(&mut self, event: ProcessorEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
            self.evicted += 1;
        }
        self.buffer.push_back(event);
    }

    /// Counts over the retained window only; `evicted` says how much is missing.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snap = compute_snapshot(&self.buffer);
        snap.evicted = self.evicted;
        snap
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.evicted = 0;
    }
}

/// Cloneable handle shared by the reactor, vehicle workers and ledger tasks.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    inner: Arc<Mutex<TelemetryRecorder>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: ProcessorEvent) {
        // A poisoned recorder only means a panic mid-push; keep counting.
        let mut recorder = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        recorder.record(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let recorder = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        recorder.snapshot()
    }

    pub fn clear(&self) {
        let mut recorder = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        recorder.clear();
    }
}
