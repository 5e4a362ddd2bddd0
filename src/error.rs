use thiserror::Error;

/// Malformed input at the transport boundary. The event is dropped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not a valid telemetry event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("telemetry event has an empty vehicle_id")]
    MissingVehicle,
}

/// Failures reported by a `StateStore`. Callers in the engine and dispatcher
/// degrade to the documented default instead of propagating these.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key '{0}' holds the wrong kind of value")]
    WrongType(String),

    #[error("value at '{0}' is not an integer")]
    NotAnInteger(String),

    #[error("store backend unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort ledger submission failed. Logged and dropped, never retried.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("ledger rejected record: {0}")]
    Rejected(String),

    #[error("ledger call timed out after {0}s")]
    Timeout(u64),
}

/// Fatal at startup only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Error)]
pub enum RedeemError {
    #[error("redemption amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("no points available")]
    NoBalance,

    #[error("insufficient balance: have {available}, requested {requested}")]
    Insufficient { available: i64, requested: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
