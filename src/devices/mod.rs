// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Device catalog and firmware caches
//!
//! Both wrap a [`crate::cache::CacheStore`] and an upstream source, and are
//! shared by the HTTP handlers and the scheduled dispatch pass.

mod catalog;
mod firmware;

pub use catalog::{
    CATALOG_CACHE_KEY, CATALOG_RETENTION, Catalog, DeviceCatalog, FamilyMember, device_family,
};
pub use firmware::{FirmwareCache, ResolvedFirmware, firmware_cache_key};
