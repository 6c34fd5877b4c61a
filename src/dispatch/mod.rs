// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Change detection and notification dispatch
//!
//! A dispatch pass walks every device with active subscribers, resolves its
//! latest firmware version and notifies each subscriber whose last notified
//! version differs. Failures are isolated per device and per subscriber; a
//! subscriber whose notification failed keeps its old version and is picked
//! up again by the next pass.

mod scheduler;

use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};

use crate::clock::Clock;
use crate::devices::{Catalog, DeviceCatalog, FirmwareCache};
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::notify::{Notification, Notifier, UnsubscribeLinks};
use crate::subscriptions::{Subscription, SubscriptionStore};
use crate::upstream::FirmwareSnapshot;

pub use scheduler::start_dispatch_loop;

/// Counters describing one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub devices_checked: usize,
    /// Devices without any known firmware
    pub devices_skipped: usize,
    pub devices_failed: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub snapshots_refreshed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceStatus {
    Processed,
    Skipped,
    Failed,
}

struct DeviceOutcome {
    status: DeviceStatus,
    refreshed: Option<FirmwareSnapshot>,
    sent: usize,
    failed: usize,
}

impl DeviceOutcome {
    fn new(status: DeviceStatus, refreshed: Option<FirmwareSnapshot>) -> Self {
        Self {
            status,
            refreshed,
            sent: 0,
            failed: 0,
        }
    }
}

pub struct Dispatcher {
    store: Arc<dyn SubscriptionStore>,
    catalog: Arc<DeviceCatalog>,
    firmware: Arc<FirmwareCache>,
    notifier: Arc<dyn Notifier>,
    links: UnsubscribeLinks,
    clock: Arc<dyn Clock>,
    metrics: MetricsRegistry,
    concurrency: usize,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        catalog: Arc<DeviceCatalog>,
        firmware: Arc<FirmwareCache>,
        notifier: Arc<dyn Notifier>,
        links: UnsubscribeLinks,
        clock: Arc<dyn Clock>,
        metrics: MetricsRegistry,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            catalog,
            firmware,
            notifier,
            links,
            clock,
            metrics,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs one dispatch pass and records its outcome in the metrics
    ///
    /// Only a failure to list the subscribed devices aborts the pass.
    pub async fn run_pass(&self) -> Result<DispatchReport> {
        let start = Instant::now();
        let result = self.pass().await;
        let duration = start.elapsed().as_secs_f64();

        match &result {
            Ok(report) => {
                self.metrics
                    .record_pass_success(duration, self.clock.now().timestamp());
                tracing::info!(
                    devices = report.devices_checked,
                    skipped = report.devices_skipped,
                    failed = report.devices_failed,
                    sent = report.notifications_sent,
                    send_failures = report.notifications_failed,
                    refreshed = report.snapshots_refreshed,
                    "Dispatch pass finished in {:.3}s",
                    duration
                );
            }
            Err(e) => {
                self.metrics.record_pass_error(duration);
                tracing::warn!("Dispatch pass failed after {:.3}s: {}", duration, e);
            }
        }

        result
    }

    async fn pass(&self) -> Result<DispatchReport> {
        let catalog = match self.catalog.resolve_catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(
                    "Device catalog unavailable, using identifiers as names: {}",
                    e
                );
                Catalog::default()
            }
        };
        let catalog = &catalog;

        let device_ids = self.store.active_device_ids().await?;
        tracing::debug!("Checking {} subscribed device(s)", device_ids.len());

        let mut report = DispatchReport {
            devices_checked: device_ids.len(),
            ..DispatchReport::default()
        };

        let outcomes: Vec<DeviceOutcome> = stream::iter(device_ids)
            .map(|device_identifier| async move {
                self.process_device(&device_identifier, catalog).await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut refreshed = Vec::new();
        for outcome in outcomes {
            match outcome.status {
                DeviceStatus::Processed => {}
                DeviceStatus::Skipped => report.devices_skipped += 1,
                DeviceStatus::Failed => report.devices_failed += 1,
            }
            report.notifications_sent += outcome.sent;
            report.notifications_failed += outcome.failed;
            refreshed.extend(outcome.refreshed);
        }

        report.snapshots_refreshed = refreshed.len();
        if let Err(e) = self.firmware.store_all(&refreshed).await {
            tracing::warn!(
                "Failed to store {} refreshed firmware snapshot(s): {}",
                refreshed.len(),
                e
            );
        }
        self.metrics.record_firmware_refreshes(refreshed.len());

        match self.store.stats().await {
            Ok(stats) => self.metrics.update_subscription_stats(&stats),
            Err(e) => tracing::warn!("Failed to read subscription stats: {}", e),
        }

        Ok(report)
    }

    async fn process_device(&self, device_identifier: &str, catalog: &Catalog) -> DeviceOutcome {
        let resolved = match self.firmware.resolve_firmware(device_identifier).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", device_identifier, e);
                return DeviceOutcome::new(DeviceStatus::Failed, None);
            }
        };

        let snapshot = resolved.snapshot;
        let Some(latest) = snapshot.latest_version().map(str::to_string) else {
            tracing::debug!("No firmware known for {}, skipping", device_identifier);
            return DeviceOutcome::new(
                DeviceStatus::Skipped,
                resolved.refreshed.then_some(snapshot),
            );
        };
        let refreshed = resolved.refreshed.then_some(snapshot);

        let subscriptions = match self.store.active_for_device(device_identifier).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::warn!(
                    "Failed to load subscribers of {}: {}",
                    device_identifier,
                    e
                );
                return DeviceOutcome::new(DeviceStatus::Failed, refreshed);
            }
        };

        let device_name = catalog.name_for(device_identifier);
        let mut outcome = DeviceOutcome::new(DeviceStatus::Processed, refreshed);
        for subscription in subscriptions
            .iter()
            .filter(|s| s.last_notified_version.as_deref() != Some(latest.as_str()))
        {
            if self.notify(subscription, device_name, &latest).await {
                outcome.sent += 1;
            } else {
                outcome.failed += 1;
            }
        }

        if outcome.sent > 0 || outcome.failed > 0 {
            tracing::debug!(
                "{} {}: {} notified, {} failed",
                device_identifier,
                latest,
                outcome.sent,
                outcome.failed
            );
        }
        outcome
    }

    /// Sends `latest` to one subscriber and records it; `false` on failure
    async fn notify(&self, subscription: &Subscription, device_name: &str, latest: &str) -> bool {
        let Some(token) = subscription.unsubscribe_token.as_deref() else {
            tracing::warn!(
                "Active subscription {} / {} has no unsubscribe token",
                subscription.email,
                subscription.device_identifier
            );
            return false;
        };

        let notification = Notification::version(
            &subscription.email,
            device_name,
            latest,
            &self.links.url_for(token),
        );
        if let Err(e) = self.notifier.send(&notification).await {
            self.metrics.record_notification_failed(notification.kind);
            tracing::warn!(
                "Failed to notify {} about {} {}: {}",
                subscription.email,
                subscription.device_identifier,
                latest,
                e
            );
            return false;
        }
        self.metrics.record_notification_sent(notification.kind);

        if let Err(e) = self
            .store
            .mark_notified(&subscription.email, &subscription.device_identifier, latest)
            .await
        {
            tracing::warn!(
                "Notified {} about {} but failed to record it: {}",
                subscription.email,
                latest,
                e
            );
        }
        true
    }
}
