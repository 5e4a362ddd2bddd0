use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::StateStore;
use crate::error::StoreError;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local store with Redis semantics. Every operation takes the lock
/// once, which makes each one atomic with respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys. Expired keys are purged first.
    pub async fn len(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, e| !e.is_expired(now));
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Resolve Redis-style (possibly negative) bounds into a half-open range.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize + 1))
}

fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Instant::now();
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value),
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            None => Ok(None),
            Some(Entry { value: Value::Str(s), .. }) => Ok(Some(s.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn incr_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Str(n.to_string()),
                        expires_at: None,
                    },
                );
                Ok(n)
            }
            Some(entry) => {
                let Value::Str(raw) = &mut entry.value else {
                    return Err(StoreError::WrongType(key.to_string()));
                };
                let current: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| StoreError::NotAnInteger(key.to_string()))?;
                let next = current
                    .checked_add(n)
                    .ok_or_else(|| StoreError::NotAnInteger(key.to_string()))?;
                *raw = next.to_string();
                Ok(next)
            }
        }
    }

    async fn rpush(&self, key: &str, value: String) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::List(VecDeque::from([value])),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
            Some(Entry { value: Value::List(list), .. }) => {
                list.push_back(value);
                Ok(list.len())
            }
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let list = match live(&mut entries, key) {
            None => return Ok(()),
            Some(Entry { value: Value::List(list), .. }) => list,
            Some(_) => return Err(StoreError::WrongType(key.to_string())),
        };
        match resolve_range(list.len(), start, stop) {
            Some((from, to)) => {
                list.truncate(to);
                list.drain(..from);
            }
            None => {
                // Redis deletes a list trimmed to nothing.
                entries.remove(key);
            }
        }
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
        let mut entries = self.entries.lock().await;
        match live(&mut entries, key) {
            None => Ok(Vec::new()),
            Some(Entry { value: Value::List(list), .. }) => Ok(match resolve_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }
}
