//! Read-side views over the store plus point redemption. This is what the
//! HTTP surface serves; it never feeds back into the engine.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{RedeemError, StoreError};
use crate::kernel::event::NormalizedEvent;
use crate::kernel::state::VehicleKeys;
use crate::store::{get_i64, StateStore};

pub const UNKNOWN_STATUS: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleStatus {
    /// Latest snapshot; `None` once its TTL lapses.
    pub latest: Option<NormalizedEvent>,
    pub driver_status: String,
    pub vehicle_status: String,
}

/// Latest snapshot merged with both status axes.
pub async fn vehicle_status<S>(store: &S, vehicle_id: &str) -> Result<VehicleStatus, StoreError>
where
    S: StateStore + ?Sized,
{
    let keys = VehicleKeys::new(vehicle_id);

    let latest = store.get(&keys.latest).await?.and_then(|raw| parse_snapshot(&keys.latest, &raw));
    let driver_status = store
        .get(&keys.driver_status)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
    let vehicle_status = store
        .get(&keys.vehicle_status)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

    Ok(VehicleStatus { latest, driver_status, vehicle_status })
}

/// Oldest first.
pub async fn history<S>(store: &S, vehicle_id: &str) -> Result<Vec<NormalizedEvent>, StoreError>
where
    S: StateStore + ?Sized,
{
    read_log(store, &VehicleKeys::new(vehicle_id).history).await
}

/// Alerts and attestations that landed on the ledger, oldest first.
pub async fn alerts<S>(store: &S, vehicle_id: &str) -> Result<Vec<NormalizedEvent>, StoreError>
where
    S: StateStore + ?Sized,
{
    read_log(store, &VehicleKeys::new(vehicle_id).alerts).await
}

pub async fn points<S>(store: &S, vehicle_id: &str) -> Result<i64, StoreError>
where
    S: StateStore + ?Sized,
{
    get_i64(store, &VehicleKeys::new(vehicle_id).points).await
}

/// Spend `amount` points. Returns the new balance.
///
/// The balance check and the DECRBY are separate calls, so two concurrent
/// redemptions can both pass the check. If the decrement lands below zero it
/// is undone and reported as insufficient.
pub async fn redeem_points<S>(store: &S, vehicle_id: &str, amount: i64) -> Result<i64, RedeemError>
where
    S: StateStore + ?Sized,
{
    if amount <= 0 {
        return Err(RedeemError::InvalidAmount(amount));
    }
    let keys = VehicleKeys::new(vehicle_id);

    let available = match store.get(&keys.points).await? {
        None => return Err(RedeemError::NoBalance),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| StoreError::NotAnInteger(keys.points.clone()))?,
    };
    if available < amount {
        return Err(RedeemError::Insufficient { available, requested: amount });
    }

    let balance = store.decr_by(&keys.points, amount).await?;
    if balance < 0 {
        let restored = store.incr_by(&keys.points, amount).await?;
        return Err(RedeemError::Insufficient { available: restored, requested: amount });
    }

    info!(vehicle = vehicle_id, amount, balance, "Points redeemed");
    Ok(balance)
}

async fn read_log<S>(store: &S, key: &str) -> Result<Vec<NormalizedEvent>, StoreError>
where
    S: StateStore + ?Sized,
{
    let raw = store.lrange(key, 0, -1).await?;
    Ok(raw.iter().filter_map(|entry| parse_snapshot(key, entry)).collect())
}

fn parse_snapshot(key: &str, raw: &str) -> Option<NormalizedEvent> {
    match serde_json::from_str(raw) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(key, error = %e, "Skipping unreadable snapshot");
            None
        }
    }
}
