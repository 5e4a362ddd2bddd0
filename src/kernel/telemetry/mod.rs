//! Processor self-observation.
//!
//! # SAFETY INVARIANT
//! Telemetry is a write-only side channel. It must never be read inside
//! decision logic (engine, dispatcher, limiter).
//!
//! # PRIVACY INVARIANT
//! Events carry counts and enums only, never vehicle ids, locations or
//! heart rates.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{AlertClass, LedgerKind, LedgerOutcome, ProcessorEvent};
pub use metrics::TelemetrySnapshot;
pub use recorder::Telemetry;
