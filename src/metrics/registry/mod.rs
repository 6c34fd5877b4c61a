// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry and recording helpers

mod init;

use crate::metrics::labels::{NotificationLabels, PassLabels, UpstreamLabels};
use crate::notify::NotificationKind;
use crate::subscriptions::SubscriptionStats;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Mutex<Registry>>,
    // dispatch pass
    dispatch_passes: Family<PassLabels, Counter>,
    dispatch_pass_duration_milliseconds: Gauge,
    dispatch_last_success_timestamp_seconds: Gauge,
    firmware_refreshes: Counter,
    // notifications
    notifications_sent: Family<NotificationLabels, Counter>,
    notifications_failed: Family<NotificationLabels, Counter>,
    // upstream
    upstream_errors: Family<UpstreamLabels, Counter>,
    // subscriptions
    tracked_devices: Gauge,
    active_subscriptions: Gauge,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn as_gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl MetricsRegistry {
    pub async fn encode_metrics(&self) -> Result<String, std::fmt::Error> {
        let registry = self.registry.lock().await;
        let mut buffer = String::new();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }

    pub fn record_pass_success(&self, duration_secs: f64, finished_at_secs: i64) {
        self.dispatch_passes
            .get_or_create(&PassLabels {
                outcome: "success".to_string(),
            })
            .inc();
        self.record_pass_duration(duration_secs);
        self.dispatch_last_success_timestamp_seconds
            .set(finished_at_secs);
    }

    pub fn record_pass_error(&self, duration_secs: f64) {
        self.dispatch_passes
            .get_or_create(&PassLabels {
                outcome: "error".to_string(),
            })
            .inc();
        self.record_pass_duration(duration_secs);
    }

    fn record_pass_duration(&self, duration_secs: f64) {
        #[allow(clippy::cast_possible_truncation)]
        let millis = (duration_secs * 1000.0).round() as i64;
        self.dispatch_pass_duration_milliseconds.set(millis);
    }

    pub fn record_firmware_refreshes(&self, count: usize) {
        self.firmware_refreshes.inc_by(count as u64);
    }

    pub fn record_notification_sent(&self, kind: NotificationKind) {
        self.notifications_sent
            .get_or_create(&NotificationLabels::from(kind))
            .inc();
    }

    pub fn record_notification_failed(&self, kind: NotificationKind) {
        self.notifications_failed
            .get_or_create(&NotificationLabels::from(kind))
            .inc();
    }

    pub fn record_upstream_error(&self, labels: &UpstreamLabels) {
        self.upstream_errors.get_or_create(labels).inc();
    }

    pub fn update_subscription_stats(&self, stats: &SubscriptionStats) {
        self.tracked_devices.set(as_gauge(stats.devices));
        self.active_subscriptions.set(as_gauge(stats.active));
    }

    #[must_use]
    pub fn notifications_sent_count(&self, kind: NotificationKind) -> u64 {
        self.notifications_sent
            .get_or_create(&NotificationLabels::from(kind))
            .get()
    }

    #[must_use]
    pub fn notifications_failed_count(&self, kind: NotificationKind) -> u64 {
        self.notifications_failed
            .get_or_create(&NotificationLabels::from(kind))
            .get()
    }

    #[must_use]
    pub fn upstream_error_count(&self, labels: &UpstreamLabels) -> u64 {
        self.upstream_errors.get_or_create(labels).get()
    }
}
