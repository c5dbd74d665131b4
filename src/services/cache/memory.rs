use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Debug, Clone)]
enum Stored {
    Text(String),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Stored,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process cache with TTL expiry.
///
/// Used when no `CACHE_URL` is configured and in tests. Mirrors the Valkey
/// reply semantics closely enough for the auth-context cache (wrong-type
/// access is an error, missing keys are empty).
///
/// Expired keys are dropped when touched, and writes sweep the whole map at
/// most once per sweep interval.
#[derive(Debug)]
pub struct MemoryCacheClient {
    entries: DashMap<String, Entry>,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl Default for MemoryCacheClient {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl MemoryCacheClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            sweep_interval,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Removes every expired entry; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn evict_if_expired(&self, key: &str, now: Instant) {
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
    }

    fn maybe_sweep(&self) {
        // a concurrent writer already sweeping is good enough
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if last.elapsed() < self.sweep_interval {
            return;
        }
        *last = Instant::now();
        drop(last);

        let purged = self.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "memory cache sweep");
        }
    }
}

fn wrong_type(key: &str) -> CacheError {
    CacheError::InvalidValue(format!("wrong type for key {}", key))
}

#[async_trait]
impl CacheClient for MemoryCacheClient {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.evict_if_expired(key, Instant::now());

        match self.entries.get(key).map(|e| e.value.clone()) {
            None => Ok(None),
            Some(Stored::Text(s)) => Ok(Some(s)),
            Some(Stored::Set(_)) => Err(wrong_type(key)),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.maybe_sweep();
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Stored::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> CacheResult<u64> {
        self.maybe_sweep();
        self.evict_if_expired(key, Instant::now());

        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: Stored::Set(HashSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Stored::Set(members) => Ok(u64::from(members.insert(member.to_string()))),
            Stored::Text(_) => Err(wrong_type(key)),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let now = Instant::now();
        self.evict_if_expired(key, now);

        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_members(&self, key: &str) -> CacheResult<Vec<String>> {
        self.evict_if_expired(key, Instant::now());

        match self.entries.get(key).map(|e| e.value.clone()) {
            None => Ok(Vec::new()),
            Some(Stored::Set(members)) => Ok(members.into_iter().collect()),
            Some(Stored::Text(_)) => Err(wrong_type(key)),
        }
    }

    async fn del_many(&self, keys: &[String]) -> CacheResult<u64> {
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| entry.is_live(now))
            .count();
        Ok(removed as u64)
    }
}
