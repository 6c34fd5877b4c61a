// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Cache store persisted in the `cache_entries` table

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CacheEntry, CacheStore};
use crate::clock::Clock;
use crate::db::Database;
use crate::error::Result;

const UPSERT_ENTRY: &str = "INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at";

#[derive(Clone)]
pub struct SqliteCacheStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SqliteCacheStore {
    #[must_use]
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn expires_at(&self, ttl: Duration) -> i64 {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.clock.now().timestamp().saturating_add(ttl)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(self.clock.now().timestamp())
                .fetch_optional(self.db.pool())
                .await?;

        match row {
            Some((value,)) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<()> {
        let value = serde_json::to_string(&entry)?;
        sqlx::query(UPSERT_ENTRY)
            .bind(key)
            .bind(value)
            .bind(self.expires_at(ttl))
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn put_many(&self, entries: Vec<(String, CacheEntry)>, ttl: Duration) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let expires_at = self.expires_at(ttl);
        let mut tx = self.db.pool().begin().await?;
        for (key, entry) in &entries {
            let value = serde_json::to_string(entry)?;
            sqlx::query(UPSERT_ENTRY)
                .bind(key)
                .bind(value)
                .bind(expires_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!("Stored {} cache entries in one batch", entries.len());
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(self.clock.now().timestamp())
            .execute(self.db.pool())
            .await?;
        Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    async fn store() -> (Arc<ManualClock>, SqliteCacheStore) {
        let clock = Arc::new(ManualClock::new());
        let db = Database::open_in_memory().await.unwrap();
        (clock.clone(), SqliteCacheStore::new(db, clock))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (clock, store) = store().await;
        let entry = CacheEntry::new(clock.now(), &serde_json::json!({"version": "18.1"})).unwrap();
        store
            .put("firmware:iPhone17,1", entry.clone(), Duration::from_secs(60))
            .await
            .unwrap();

        let loaded = store.get("firmware:iPhone17,1").await.unwrap();
        assert_eq!(loaded, Some(entry));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_, store) = store().await;
        assert!(store.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_key() {
        let (clock, store) = store().await;
        let old = CacheEntry::new(clock.now(), &"old").unwrap();
        store.put("k", old, Duration::from_secs(60)).await.unwrap();

        clock.advance(Duration::from_secs(5));
        let new = CacheEntry::new(clock.now(), &"new").unwrap();
        store.put("k", new.clone(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(new));
    }

    #[tokio::test]
    async fn test_expired_entry_is_hidden_and_purged() {
        let (clock, store) = store().await;
        let entry = CacheEntry::new(clock.now(), &"x").unwrap();
        store.put("k", entry, Duration::from_secs(30)).await.unwrap();

        clock.advance(Duration::from_secs(30));
        assert!(store.get("k").await.unwrap().is_none());
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_many_writes_all_entries() {
        let (clock, store) = store().await;
        let entries = vec![
            (
                "firmware:a".to_string(),
                CacheEntry::new(clock.now(), &"a").unwrap(),
            ),
            (
                "firmware:b".to_string(),
                CacheEntry::new(clock.now(), &"b").unwrap(),
            ),
        ];
        store
            .put_many(entries, Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.get("firmware:a").await.unwrap().is_some());
        assert!(store.get("firmware:b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_many_empty_is_noop() {
        let (_, store) = store().await;
        store
            .put_many(Vec::new(), Duration::from_secs(60))
            .await
            .unwrap();
    }
}
