// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Upstream device catalog and firmware sources
//!
//! The traits here are the seams the caches fetch through. [`IpswClient`]
//! implements both against the public ipsw.me v4 API.

mod ipsw;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use ipsw::IpswClient;
pub use types::{DeviceCatalogEntry, FirmwareDescriptor, FirmwareSnapshot};

/// Source of the full device identifier → name catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fails with `UpstreamUnavailable`
    async fn fetch_catalog(&self) -> Result<Vec<DeviceCatalogEntry>>;
}

/// Source of per-device firmware listings
#[async_trait]
pub trait FirmwareSource: Send + Sync {
    /// Returns the upstream firmware list, newest first. An empty list means
    /// the device has no known firmware. Fails with `UpstreamUnavailable`.
    async fn fetch_firmware(&self, device_identifier: &str) -> Result<Vec<FirmwareDescriptor>>;
}
