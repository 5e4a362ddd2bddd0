use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{get_i64, StateStore};

/// Key layout of one vehicle's derived state in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleKeys {
    /// Latest snapshot (JSON), expires after the configured TTL.
    pub latest: String,
    pub driver_status: String,
    pub vehicle_status: String,
    pub points: String,
    pub safe_streak: String,
    pub last_incident: String,
    pub last_periodic_attestation: String,
    pub last_alert: String,
    pub history: String,
    pub alerts: String,
}

impl VehicleKeys {
    pub fn new(vehicle_id: &str) -> Self {
        Self {
            latest: vehicle_id.to_string(),
            driver_status: format!("driver_status:{}", vehicle_id),
            vehicle_status: format!("vehicle_status:{}", vehicle_id),
            points: format!("points:{}", vehicle_id),
            safe_streak: format!("safe_streak:{}", vehicle_id),
            last_incident: format!("last_incident_timestamp:{}", vehicle_id),
            last_periodic_attestation: format!("last_periodic_attestation_timestamp:{}", vehicle_id),
            last_alert: format!("last_alert_timestamp:{}", vehicle_id),
            history: format!("history:{}", vehicle_id),
            alerts: format!("alerts:{}", vehicle_id),
        }
    }
}

/// Everything the engine knows about one vehicle, read back in one go.
/// The engine itself never holds this between events; each field is read and
/// written individually through the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDerivedState {
    /// Latest `ai`-sourced label.
    pub driver_status: Option<String>,
    /// Latest `iot`-sourced label.
    pub vehicle_status: Option<String>,
    pub safe_streak: i64,
    pub points: i64,
    /// 0 = never
    pub last_incident_timestamp: i64,
    /// 0 = never, or reset by an incident
    pub last_periodic_attestation_timestamp: i64,
    /// 0 = never
    pub last_alert_timestamp: i64,
}

impl VehicleDerivedState {
    /// Read every field. Failed reads degrade to the field's default.
    pub async fn load<S>(store: &S, vehicle_id: &str) -> Self
    where
        S: StateStore + ?Sized,
    {
        let keys = VehicleKeys::new(vehicle_id);
        Self {
            driver_status: read_label(store, &keys.driver_status).await,
            vehicle_status: read_label(store, &keys.vehicle_status).await,
            safe_streak: read_or_zero(store, &keys.safe_streak).await,
            points: read_or_zero(store, &keys.points).await,
            last_incident_timestamp: read_or_zero(store, &keys.last_incident).await,
            last_periodic_attestation_timestamp: read_or_zero(store, &keys.last_periodic_attestation).await,
            last_alert_timestamp: read_or_zero(store, &keys.last_alert).await,
        }
    }
}

/// Integer read that never fails: store errors are logged and read as 0.
pub(crate) async fn read_or_zero<S>(store: &S, key: &str) -> i64
where
    S: StateStore + ?Sized,
{
    match get_i64(store, key).await {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "State read failed, treating as 0");
            0
        }
    }
}

async fn read_label<S>(store: &S, key: &str) -> Option<String>
where
    S: StateStore + ?Sized,
{
    match store.get(key).await {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "State read failed, treating as unknown");
            None
        }
    }
}
