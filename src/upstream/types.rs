// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Type definitions for upstream device and firmware data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One device of the upstream catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCatalogEntry {
    pub identifier: String,
    pub name: String,
}

/// A single firmware release for a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareDescriptor {
    pub version: String,
    pub build_id: String,
    pub release_date: String,
    pub file_size: u64,
}

/// Cached firmware listing of one device
///
/// `firmwares` keeps the upstream order; the first element is the latest
/// release and is never re-sorted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareSnapshot {
    pub device_identifier: String,
    pub fetched_at: DateTime<Utc>,
    pub firmwares: Vec<FirmwareDescriptor>,
}

impl FirmwareSnapshot {
    /// Version of the first listed firmware, `None` when nothing is known
    #[must_use]
    pub fn latest_version(&self) -> Option<&str> {
        self.firmwares.first().map(|f| f.version.as_str())
    }
}
