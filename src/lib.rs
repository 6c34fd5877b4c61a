// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # Firmware Notifier
//!
//! Emails subscribers when a new firmware version is published for a device
//! they follow.
//!
//! The library keeps time-bounded caches of the upstream device catalog and
//! per-device firmware listings, stores `(email, device)` subscriptions and
//! runs a periodic dispatch pass that notifies every subscriber at most once
//! per new version.
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `cache`: TTL cache store and its implementations
//! - `config`: configuration management
//! - `devices`: device catalog and firmware caches
//! - `dispatch`: change detection and the dispatch loop
//! - `error`: error types
//! - `metrics`: Prometheus registry
//! - `notify`: notifications, templates and the mail relay client
//! - `subscriptions`: subscription store and subscribe/unsubscribe flows
//! - `upstream`: catalog and firmware sources
//! - `prelude`: commonly used types and traits

mod api;
pub mod cache;
pub mod captcha;
pub mod clock;
mod config;
pub mod db;
pub mod devices;
pub mod dispatch;
mod error;
mod metrics;
pub mod notify;
pub mod prelude;
pub mod subscriptions;
pub mod upstream;

// Re-export commonly used types
/// Application configuration
pub use config::{CaptchaConfig, Config, MailRelayConfig};

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Dispatch pass and its background loop
pub use dispatch::{DispatchReport, Dispatcher, start_dispatch_loop};

/// Metrics registry and labels
pub use metrics::{MetricsRegistry, NotificationLabels, PassLabels, UpstreamLabels};
