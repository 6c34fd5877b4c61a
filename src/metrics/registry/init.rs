// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Registry initialization and metric registration

use crate::metrics::labels::{NotificationLabels, PassLabels, UpstreamLabels};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::MetricsRegistry;

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let dispatch_passes = Family::<PassLabels, Counter>::default();
        registry.register(
            "firmware_notifier_dispatch_passes",
            "Completed dispatch passes by outcome",
            dispatch_passes.clone(),
        );
        let dispatch_pass_duration_milliseconds = Gauge::default();
        registry.register(
            "firmware_notifier_dispatch_pass_duration_milliseconds",
            "Duration of the last dispatch pass in milliseconds",
            dispatch_pass_duration_milliseconds.clone(),
        );
        let dispatch_last_success_timestamp_seconds = Gauge::default();
        registry.register(
            "firmware_notifier_dispatch_last_success_timestamp_seconds",
            "Unix timestamp of the last successful dispatch pass",
            dispatch_last_success_timestamp_seconds.clone(),
        );
        let firmware_refreshes = Counter::default();
        registry.register(
            "firmware_notifier_firmware_refreshes",
            "Firmware snapshots fetched from upstream during dispatch passes",
            firmware_refreshes.clone(),
        );

        let notifications_sent = Family::<NotificationLabels, Counter>::default();
        registry.register(
            "firmware_notifier_notifications_sent",
            "Notifications handed to the notifier",
            notifications_sent.clone(),
        );
        let notifications_failed = Family::<NotificationLabels, Counter>::default();
        registry.register(
            "firmware_notifier_notifications_failed",
            "Notifications the notifier refused or could not render",
            notifications_failed.clone(),
        );

        let upstream_errors = Family::<UpstreamLabels, Counter>::default();
        registry.register(
            "firmware_notifier_upstream_errors",
            "Failed requests to the upstream catalog or firmware source",
            upstream_errors.clone(),
        );

        let tracked_devices = Gauge::default();
        registry.register(
            "firmware_notifier_tracked_devices",
            "Devices with at least one active subscription",
            tracked_devices.clone(),
        );
        let active_subscriptions = Gauge::default();
        registry.register(
            "firmware_notifier_active_subscriptions",
            "Number of active subscriptions",
            active_subscriptions.clone(),
        );

        Self {
            registry: Arc::new(Mutex::new(registry)),
            dispatch_passes,
            dispatch_pass_duration_milliseconds,
            dispatch_last_success_timestamp_seconds,
            firmware_refreshes,
            notifications_sent,
            notifications_failed,
            upstream_errors,
            tracked_devices,
            active_subscriptions,
        }
    }
}
