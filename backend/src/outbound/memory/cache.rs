//! In-memory cache adapter.
//!
//! Implements the full cache port with TTL expiry, trailing-wildcard pattern
//! deletion, and set membership. Suitable for tests and single-process
//! deployments; a Redis adapter satisfies the same port in production.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::Mutex;

use crate::domain::ports::{CacheError, CacheStore, CacheTtl};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    sets: HashMap<String, HashSet<String>>,
}

/// Clock-driven in-memory cache.
pub struct MemoryCacheStore {
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl MemoryCacheStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }

    fn live<'a>(entry: &'a Entry, now: DateTime<Utc>) -> Option<&'a str> {
        match entry.expires_at {
            Some(expires) if expires <= now => None,
            _ => Some(entry.value.as_str()),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.utc();
        let mut state = self.state.lock().await;
        let Some(entry) = state.entries.get(key) else {
            return Ok(None);
        };
        match Self::live(entry, now) {
            Some(value) => Ok(Some(value.to_owned())),
            None => {
                state.entries.remove(key);
                Ok(None)
            }
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: CacheTtl) -> Result<(), CacheError> {
        let expires_at = match ttl {
            Some(ttl) if !ttl.is_zero() => {
                let delta = chrono::TimeDelta::from_std(ttl)
                    .map_err(|error| CacheError::command(error.to_string()))?;
                Some(self.clock.utc() + delta)
            }
            _ => None,
        };
        let mut state = self.state.lock().await;
        state.entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.lock().await;
        state.entries.remove(key);
        Ok(())
    }

    async fn scan_delete(&self, pattern: &str) -> Result<usize, CacheError> {
        let Some(prefix) = pattern.strip_suffix('*') else {
            return Err(CacheError::command(format!(
                "unsupported scan pattern (expected trailing '*'): {pattern}"
            )));
        };

        let mut state = self.state.lock().await;
        let before = state.entries.len() + state.sets.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        state.sets.retain(|key, _| !key.starts_with(prefix));
        Ok(before - state.entries.len() - state.sets.len())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), CacheError> {
        let mut state = self.state.lock().await;
        state
            .sets
            .entry(key.to_owned())
            .or_default()
            .insert(member.to_owned());
        Ok(())
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CacheError> {
        let state = self.state.lock().await;
        Ok(state
            .sets
            .get(key)
            .is_some_and(|members| members.contains(member)))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let state = self.state.lock().await;
        Ok(state
            .sets
            .get(key)
            .map(|members| {
                let mut members: Vec<String> = members.iter().cloned().collect();
                members.sort();
                members
            })
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
