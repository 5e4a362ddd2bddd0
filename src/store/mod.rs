//! Keyed state shared by every event task.
//!
//! The processor only needs the handful of Redis-shaped primitives below.
//! Mutations of a single key are atomic; nothing spans keys.

pub mod memory;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StoreError;

pub use memory::InMemoryStore;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// SET key value [EX ttl]. Overwrites any previous value and expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// GET key. Missing and expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// INCR key. A missing key counts from 0.
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.incr_by(key, 1).await
    }

    /// INCRBY key n
    async fn incr_by(&self, key: &str, n: i64) -> Result<i64, StoreError>;

    /// DECRBY key n
    async fn decr_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        self.incr_by(key, -n).await
    }

    /// RPUSH key value. Returns the new length.
    async fn rpush(&self, key: &str, value: String) -> Result<usize, StoreError>;

    /// LTRIM key start stop, Redis index semantics (negative counts from the tail).
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StoreError>;

    /// LRANGE key start stop, Redis index semantics.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StoreError>;
}

/// RPUSH then LTRIM to the newest `capacity` entries.
pub async fn push_bounded<S>(store: &S, key: &str, value: String, capacity: usize) -> Result<(), StoreError>
where
    S: StateStore + ?Sized,
{
    store.rpush(key, value).await?;
    store.ltrim(key, -(capacity as isize), -1).await
}

/// GET parsed as an integer timestamp/counter. Absent reads as 0.
pub async fn get_i64<S>(store: &S, key: &str) -> Result<i64, StoreError>
where
    S: StateStore + ?Sized,
{
    match store.get(key).await? {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| StoreError::NotAnInteger(key.to_string())),
    }
}
