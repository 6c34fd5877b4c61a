// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Per-device firmware cache

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStore};
use crate::clock::Clock;
use crate::error::Result;
use crate::metrics::{MetricsRegistry, UpstreamLabels};
use crate::upstream::{FirmwareSnapshot, FirmwareSource};

/// Cache key holding the snapshot of one device
#[must_use]
pub fn firmware_cache_key(device_identifier: &str) -> String {
    format!("firmware:{device_identifier}")
}

/// Outcome of [`FirmwareCache::resolve_firmware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFirmware {
    pub snapshot: FirmwareSnapshot,
    /// The snapshot was fetched from upstream and has not been stored yet
    pub refreshed: bool,
}

/// Time-bounded cache of firmware snapshots, one entry per device
pub struct FirmwareCache {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn FirmwareSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    retention: Duration,
    metrics: MetricsRegistry,
}

impl FirmwareCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        source: Arc<dyn FirmwareSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        retention: Duration,
        metrics: MetricsRegistry,
    ) -> Self {
        Self {
            store,
            source,
            clock,
            ttl,
            retention,
            metrics,
        }
    }

    /// Returns a fresh snapshot for the device without writing the cache
    ///
    /// A cached snapshot younger than the TTL is returned as is. Otherwise the
    /// upstream listing is fetched and handed back with `refreshed` set; the
    /// caller decides when to persist it (see [`Self::store_all`]). If the
    /// fetch fails, a retained stale snapshot is served instead.
    pub async fn resolve_firmware(&self, device_identifier: &str) -> Result<ResolvedFirmware> {
        let key = firmware_cache_key(device_identifier);
        let now = self.clock.now();

        let cached = match self.store.get(&key).await {
            Ok(entry) => entry.and_then(|entry| match entry.decode::<FirmwareSnapshot>() {
                Ok(snapshot) => Some((entry, snapshot)),
                Err(e) => {
                    tracing::warn!("Discarding undecodable firmware cache for {}: {}", key, e);
                    None
                }
            }),
            Err(e) => {
                tracing::warn!("Failed to read firmware cache for {}: {}", key, e);
                None
            }
        };

        if let Some((entry, snapshot)) = &cached {
            if !entry.is_stale(self.ttl, now) {
                tracing::trace!("Firmware cache hit for {}", device_identifier);
                return Ok(ResolvedFirmware {
                    snapshot: snapshot.clone(),
                    refreshed: false,
                });
            }
        }

        match self.source.fetch_firmware(device_identifier).await {
            Ok(firmwares) => {
                tracing::debug!(
                    "Fetched {} firmware(s) for {}",
                    firmwares.len(),
                    device_identifier
                );
                Ok(ResolvedFirmware {
                    snapshot: FirmwareSnapshot {
                        device_identifier: device_identifier.to_string(),
                        fetched_at: now,
                        firmwares,
                    },
                    refreshed: true,
                })
            }
            Err(e) => {
                self.metrics
                    .record_upstream_error(&UpstreamLabels::firmware());
                match cached {
                    Some((_, snapshot)) => {
                        tracing::warn!(
                            "Serving stale firmware snapshot for {}: {}",
                            device_identifier,
                            e
                        );
                        Ok(ResolvedFirmware {
                            snapshot,
                            refreshed: false,
                        })
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Resolves a snapshot and stores it right away when it was refreshed
    pub async fn resolve_and_store(&self, device_identifier: &str) -> Result<FirmwareSnapshot> {
        let resolved = self.resolve_firmware(device_identifier).await?;
        if resolved.refreshed {
            if let Err(e) = self.store(&resolved.snapshot).await {
                tracing::warn!(
                    "Failed to store firmware snapshot for {}: {}",
                    device_identifier,
                    e
                );
            }
        }
        Ok(resolved.snapshot)
    }

    pub async fn store(&self, snapshot: &FirmwareSnapshot) -> Result<()> {
        let entry = CacheEntry::new(snapshot.fetched_at, snapshot)?;
        self.store
            .put(
                &firmware_cache_key(&snapshot.device_identifier),
                entry,
                self.retention,
            )
            .await
    }

    /// Persists several refreshed snapshots in one cache write
    pub async fn store_all(&self, snapshots: &[FirmwareSnapshot]) -> Result<()> {
        if snapshots.is_empty() {
            return Ok(());
        }
        let entries = snapshots
            .iter()
            .map(|snapshot| {
                Ok((
                    firmware_cache_key(&snapshot.device_identifier),
                    CacheEntry::new(snapshot.fetched_at, snapshot)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        self.store.put_many(entries, self.retention).await
    }
}
