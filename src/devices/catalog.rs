// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Device catalog cache

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStore};
use crate::clock::Clock;
use crate::error::Result;
use crate::metrics::{MetricsRegistry, UpstreamLabels};
use crate::upstream::{CatalogSource, DeviceCatalogEntry};

/// Cache key of the catalog blob
pub const CATALOG_CACHE_KEY: &str = "device_list";

/// Store-side expiry of the catalog blob
pub const CATALOG_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Identifier prefixes that all belong to the Mac family
const MAC_FAMILIES: [&str; 5] = ["Macmini", "iMac", "VirtualMac", "MacBookAir", "MacBookPro"];

/// Resolved device catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    devices: Vec<DeviceCatalogEntry>,
}

/// Device as listed by `GET /devices`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyMember {
    pub name: String,
    pub id: String,
}

impl Catalog {
    #[must_use]
    pub fn new(devices: Vec<DeviceCatalogEntry>) -> Self {
        Self { devices }
    }

    #[must_use]
    pub fn devices(&self) -> &[DeviceCatalogEntry] {
        &self.devices
    }

    /// Friendly name of a device, or the identifier itself when unknown
    #[must_use]
    pub fn name_for<'a>(&'a self, identifier: &'a str) -> &'a str {
        self.devices
            .iter()
            .find(|d| d.identifier == identifier)
            .map_or(identifier, |d| d.name.as_str())
    }

    /// Groups devices by product family, keeping catalog order within a family
    #[must_use]
    pub fn grouped_by_family(&self) -> BTreeMap<String, Vec<FamilyMember>> {
        let mut grouped: BTreeMap<String, Vec<FamilyMember>> = BTreeMap::new();
        for device in &self.devices {
            grouped
                .entry(device_family(&device.identifier))
                .or_default()
                .push(FamilyMember {
                    name: device.name.clone(),
                    id: device.identifier.clone(),
                });
        }
        grouped
    }
}

/// Product family of an identifier such as `iPhone17,1` or `Watch7,5`
#[must_use]
pub fn device_family(identifier: &str) -> String {
    let model = identifier.split(',').next().unwrap_or(identifier);
    let base: String = model.chars().filter(|c| !c.is_ascii_digit()).collect();

    if MAC_FAMILIES.contains(&base.as_str()) {
        return "Mac".to_string();
    }

    base.replace("Watch", "Apple Watch")
        .replace("AudioAccessory", "HomePod")
        .replace("RealityDevice", "Vision Pro")
}

/// Time-bounded cache of the upstream device catalog
pub struct DeviceCatalog {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn CatalogSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    metrics: MetricsRegistry,
}

impl DeviceCatalog {
    pub fn new(
        store: Arc<dyn CacheStore>,
        source: Arc<dyn CatalogSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        metrics: MetricsRegistry,
    ) -> Self {
        Self {
            store,
            source,
            clock,
            ttl,
            metrics,
        }
    }

    /// Returns the cached catalog, refetching it when missing or stale
    ///
    /// When the upstream fetch fails a stale copy is served if one is still
    /// retained; otherwise the `UpstreamUnavailable` error propagates. Every
    /// failed fetch is counted, including those hidden by a stale copy.
    pub async fn resolve_catalog(&self) -> Result<Catalog> {
        let now = self.clock.now();

        let cached = match self.store.get(CATALOG_CACHE_KEY).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read device catalog cache: {}", e);
                None
            }
        };

        if let Some(entry) = &cached {
            if !entry.is_stale(self.ttl, now) {
                match entry.decode::<Vec<DeviceCatalogEntry>>() {
                    Ok(devices) => return Ok(Catalog::new(devices)),
                    Err(e) => tracing::warn!("Discarding undecodable catalog cache: {}", e),
                }
            }
        }

        match self.source.fetch_catalog().await {
            Ok(devices) => {
                tracing::debug!("Fetched device catalog with {} devices", devices.len());
                let entry = CacheEntry::new(now, &devices)?;
                if let Err(e) = self
                    .store
                    .put(CATALOG_CACHE_KEY, entry, CATALOG_RETENTION)
                    .await
                {
                    tracing::warn!("Failed to store device catalog: {}", e);
                }
                Ok(Catalog::new(devices))
            }
            Err(e) => {
                self.metrics
                    .record_upstream_error(&UpstreamLabels::catalog());
                let stale = cached.and_then(|entry| entry.decode::<Vec<DeviceCatalogEntry>>().ok());
                match stale {
                    Some(devices) => {
                        tracing::warn!("Serving stale device catalog: {}", e);
                        Ok(Catalog::new(devices))
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Like [`Self::resolve_catalog`], but degrades to an empty catalog so
    /// names fall back to raw identifiers
    pub async fn resolve_or_empty(&self) -> Catalog {
        self.resolve_catalog().await.unwrap_or_else(|e| {
            tracing::warn!("Device catalog unavailable, using identifiers as names: {}", e);
            Catalog::default()
        })
    }
}
