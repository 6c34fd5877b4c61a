// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! In-process cache store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use super::{CacheEntry, CacheStore};
use crate::clock::Clock;
use crate::error::Result;

struct StoredEntry {
    entry: CacheEntry,
    expires_at: DateTime<Utc>,
}

/// Cache store kept in memory, lost on restart
#[derive(Clone)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, StoredEntry>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.entry.clone()))
    }

    async fn put(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<()> {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.write().await;
        tracing::trace!("Cached entry for key: {}", key);
        entries.insert(key.to_string(), StoredEntry { entry, expires_at });
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before_count = entries.len();
        entries.retain(|_, stored| stored.expires_at > now);
        Ok(before_count - entries.len())
    }
}
