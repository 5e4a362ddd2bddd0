//! Inbound side of the pub/sub transport.
//!
//! The broker client itself lives outside this crate. What arrives here is an
//! `Envelope` per message; the shipped source reads them from any async line
//! reader (stdin in the binary), one message per line, optionally prefixed by
//! its topic: `vehicles/car-1/telemetry {"vehicle_id":"car-1",...}`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::DecodeError;
use crate::kernel::event::TelemetryEvent;

/// Subscription pattern; `+` is the vehicle id.
pub const TOPIC_PATTERN: &str = "vehicles/+/telemetry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Empty when the source has no topic.
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Envelope on the canonical topic of `vehicle_id`.
    pub fn for_vehicle(vehicle_id: &str, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(format!("vehicles/{}/telemetry", vehicle_id), payload)
    }
}

/// Vehicle id from a topic matching `TOPIC_PATTERN`.
pub fn topic_vehicle(topic: &str) -> Option<&str> {
    let mut parts = topic.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("vehicles"), Some(id), Some("telemetry"), None) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Decode one envelope. A payload without a vehicle id borrows it from the
/// topic; with neither, the event is rejected.
pub fn decode(envelope: &Envelope) -> Result<TelemetryEvent, DecodeError> {
    let mut event: TelemetryEvent = serde_json::from_slice(&envelope.payload)?;

    if event.vehicle_id.trim().is_empty() {
        match topic_vehicle(&envelope.topic) {
            Some(id) => event.vehicle_id = id.to_string(),
            None => return Err(DecodeError::MissingVehicle),
        }
    } else if let Some(id) = topic_vehicle(&envelope.topic) {
        if id != event.vehicle_id {
            warn!(topic = %envelope.topic, payload_vehicle = %event.vehicle_id, "Topic and payload disagree on vehicle, using payload");
        }
    }

    Ok(event)
}

/// Split one input line into an envelope.
pub fn parse_line(line: &str) -> Option<Envelope> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('{') {
        return Some(Envelope::new("", line));
    }
    match line.split_once(char::is_whitespace) {
        Some((topic, payload)) => Some(Envelope::new(topic, payload.trim_start())),
        // Neither JSON nor topic-prefixed; let decode reject it.
        None => Some(Envelope::new("", line)),
    }
}

/// Feed envelopes read line by line from `reader` into `tx` until EOF,
/// shutdown, or the receiver goes away.
pub async fn pump_lines<R>(reader: R, tx: mpsc::Sender<Envelope>, shutdown: CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded: u64 = 0;

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = lines.next_line() => next,
        };

        match next {
            Ok(Some(line)) => {
                let Some(envelope) = parse_line(&line) else { continue };
                debug!(topic = %envelope.topic, bytes = envelope.payload.len(), "Envelope received");
                if tx.send(envelope).await.is_err() {
                    break;
                }
                forwarded += 1;
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Transport read failed");
                break;
            }
        }
    }

    info!(forwarded, "Transport source closed");
}
