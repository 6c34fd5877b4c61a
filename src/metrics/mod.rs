// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry for the firmware notifier
//!
//! Contains label types and the Prometheus metrics registry.

mod labels;
mod registry;

/// Labels for notifications, upstream sources and dispatch passes
pub use labels::{NotificationLabels, PassLabels, UpstreamLabels};

/// Prometheus metrics registry
pub use registry::MetricsRegistry;
