// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! TTL cache store
//!
//! Entries are JSON blobs stamped with the time they were fetched. Freshness
//! is decided by the caller through [`CacheEntry::is_stale`]; the `ttl` passed
//! to [`CacheStore::put`] is only the store-side retention after which the
//! entry disappears entirely.

mod cleanup;
mod memory;
mod sqlite;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use cleanup::start_cache_purge_task;
pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

/// Timestamped JSON blob held by a [`CacheStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl CacheEntry {
    /// Serializes `value` into an entry fetched at `fetched_at`
    pub fn new<T: Serialize>(fetched_at: DateTime<Utc>, value: &T) -> Result<Self> {
        Ok(Self {
            fetched_at,
            data: serde_json::to_value(value)?,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// An entry is stale once `now - fetched_at >= ttl`
    #[must_use]
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.fetched_at) >= ttl
    }
}

/// Key to timestamped-blob storage
///
/// A single `put` is atomic. Nothing stronger is promised: two writers racing
/// on the same key simply overwrite each other.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Overwrites `key` unconditionally; the entry is dropped after `ttl`
    async fn put(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<()>;

    async fn put_many(&self, entries: Vec<(String, CacheEntry)>, ttl: Duration) -> Result<()> {
        for (key, entry) in entries {
            self.put(&key, entry, ttl).await?;
        }
        Ok(())
    }

    /// Removes entries past their retention, returning how many were dropped
    async fn purge_expired(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry_at(secs: i64) -> CacheEntry {
        CacheEntry {
            fetched_at: Utc.timestamp_opt(secs, 0).unwrap(),
            data: serde_json::json!({"devices": []}),
        }
    }

    #[test]
    fn test_fresh_strictly_before_ttl() {
        let entry = entry_at(1_000);
        let now = Utc.timestamp_opt(1_000 + 59, 0).unwrap();
        assert!(!entry.is_stale(Duration::from_secs(60), now));
    }

    #[test]
    fn test_stale_exactly_at_ttl() {
        let entry = entry_at(1_000);
        let now = Utc.timestamp_opt(1_000 + 60, 0).unwrap();
        assert!(entry.is_stale(Duration::from_secs(60), now));
    }

    #[test]
    fn test_stale_after_ttl() {
        let entry = entry_at(1_000);
        let now = Utc.timestamp_opt(5_000, 0).unwrap();
        assert!(entry.is_stale(Duration::from_secs(60), now));
    }

    #[test]
    fn test_decode_round_trips_payload() {
        let names = vec!["iPhone 16".to_string(), "iPad Air".to_string()];
        let entry = CacheEntry::new(Utc::now(), &names).unwrap();
        let decoded: Vec<String> = entry.decode().unwrap();
        assert_eq!(decoded, names);
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let entry = entry_at(0);
        assert!(entry.decode::<Vec<String>>().is_err());
    }
}
