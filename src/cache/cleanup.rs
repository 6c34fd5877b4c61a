// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Expired cache entry purge task

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::CacheStore;

/// Starts a background task that drops cache entries past their retention
pub fn start_cache_purge_task(
    store: Arc<dyn CacheStore>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut purge_ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = purge_ticker.tick() => {
                    match store.purge_expired().await {
                        Ok(0) => {}
                        Ok(removed) => tracing::debug!("Purged {} expired cache entries", removed),
                        Err(e) => tracing::warn!("Cache purge failed: {}", e),
                    }
                },
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Stopping cache purge task");
                        break;
                    }
                }
            }
        }
    })
}
