// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for convenient use.
//! Users of the library can import everything they need with:
//!
//! ```rust
//! use firmware_notifier::prelude::*;
//! ```

// Core types
pub use crate::config::{CaptchaConfig, Config, MailRelayConfig};
pub use crate::error::{AppError, Result};

// Storage
pub use crate::cache::{CacheEntry, CacheStore, MemoryCacheStore, SqliteCacheStore};
pub use crate::clock::{Clock, SystemClock};
pub use crate::db::Database;

// Domain
pub use crate::devices::{Catalog, DeviceCatalog, FirmwareCache};
pub use crate::dispatch::{DispatchReport, Dispatcher};
pub use crate::notify::{Notification, NotificationKind, Notifier, UnsubscribeLinks};
pub use crate::subscriptions::{
    SqliteSubscriptionStore, Subscription, SubscriptionService, SubscriptionStats,
    SubscriptionStore,
};
pub use crate::upstream::{
    CatalogSource, DeviceCatalogEntry, FirmwareDescriptor, FirmwareSnapshot, FirmwareSource,
};

// Metrics
pub use crate::metrics::MetricsRegistry;
