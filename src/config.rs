use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "SAFERIDE_";

/// Every tunable of the processor. Passed into the engine, dispatcher and
/// reactor at construction; nothing reads globals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Consecutive safe events needed for one reward.
    pub safe_streak_threshold: i64,
    pub points_per_streak: i64,
    pub periodic_attestation_interval_secs: i64,
    /// Minimum gap between two driver-axis alerts.
    pub driver_alert_window_secs: i64,
    /// Heart rate strictly above this forces `health_critical`.
    pub health_critical_heart_rate: u32,
    pub history_capacity: usize,
    pub alert_capacity: usize,
    pub latest_snapshot_ttl_secs: u64,
    pub ledger_timeout_secs: u64,
    /// Upper bound on concurrently outstanding ledger submissions.
    pub ledger_max_in_flight: usize,
    /// Events queued per vehicle before new ones are dropped.
    pub vehicle_mailbox_capacity: usize,
    /// A vehicle worker with nothing to do for this long exits.
    pub vehicle_idle_secs: u64,
    pub shutdown_grace_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            safe_streak_threshold: 15,
            points_per_streak: 10,
            periodic_attestation_interval_secs: 30,
            driver_alert_window_secs: 10,
            health_critical_heart_rate: 120,
            history_capacity: 50,
            alert_capacity: 20,
            latest_snapshot_ttl_secs: 3600,
            ledger_timeout_secs: 10,
            ledger_max_in_flight: 64,
            vehicle_mailbox_capacity: 64,
            vehicle_idle_secs: 300,
            shutdown_grace_secs: 5,
        }
    }
}

impl ProcessorConfig {
    /// Defaults overridden by `SAFERIDE_<FIELD>` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        override_with(&lookup, "SAFE_STREAK_THRESHOLD", &mut cfg.safe_streak_threshold)?;
        override_with(&lookup, "POINTS_PER_STREAK", &mut cfg.points_per_streak)?;
        override_with(
            &lookup,
            "PERIODIC_ATTESTATION_INTERVAL_SECS",
            &mut cfg.periodic_attestation_interval_secs,
        )?;
        override_with(&lookup, "DRIVER_ALERT_WINDOW_SECS", &mut cfg.driver_alert_window_secs)?;
        override_with(&lookup, "HEALTH_CRITICAL_HEART_RATE", &mut cfg.health_critical_heart_rate)?;
        override_with(&lookup, "HISTORY_CAPACITY", &mut cfg.history_capacity)?;
        override_with(&lookup, "ALERT_CAPACITY", &mut cfg.alert_capacity)?;
        override_with(&lookup, "LATEST_SNAPSHOT_TTL_SECS", &mut cfg.latest_snapshot_ttl_secs)?;
        override_with(&lookup, "LEDGER_TIMEOUT_SECS", &mut cfg.ledger_timeout_secs)?;
        override_with(&lookup, "LEDGER_MAX_IN_FLIGHT", &mut cfg.ledger_max_in_flight)?;
        override_with(&lookup, "VEHICLE_MAILBOX_CAPACITY", &mut cfg.vehicle_mailbox_capacity)?;
        override_with(&lookup, "VEHICLE_IDLE_SECS", &mut cfg.vehicle_idle_secs)?;
        override_with(&lookup, "SHUTDOWN_GRACE_SECS", &mut cfg.shutdown_grace_secs)?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.safe_streak_threshold <= 0 {
            return Err(ConfigError::Zero("safe_streak_threshold"));
        }
        if self.points_per_streak <= 0 {
            return Err(ConfigError::Zero("points_per_streak"));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Zero("history_capacity"));
        }
        if self.alert_capacity == 0 {
            return Err(ConfigError::Zero("alert_capacity"));
        }
        if self.ledger_max_in_flight == 0 {
            return Err(ConfigError::Zero("ledger_max_in_flight"));
        }
        if self.vehicle_mailbox_capacity == 0 {
            return Err(ConfigError::Zero("vehicle_mailbox_capacity"));
        }
        if self.vehicle_idle_secs == 0 {
            return Err(ConfigError::Zero("vehicle_idle_secs"));
        }
        // Negative windows would make every comparison trivially true.
        if self.periodic_attestation_interval_secs < 0 {
            return Err(ConfigError::Invalid {
                key: "periodic_attestation_interval_secs".into(),
                value: self.periodic_attestation_interval_secs.to_string(),
            });
        }
        if self.driver_alert_window_secs < 0 {
            return Err(ConfigError::Invalid {
                key: "driver_alert_window_secs".into(),
                value: self.driver_alert_window_secs.to_string(),
            });
        }
        Ok(())
    }

    pub fn latest_snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.latest_snapshot_ttl_secs)
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout_secs)
    }

    pub fn vehicle_idle(&self) -> Duration {
        Duration::from_secs(self.vehicle_idle_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn override_with<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let key = format!("{}{}", ENV_PREFIX, name);
    if let Some(raw) = lookup(&key) {
        *slot = raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.clone(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}
