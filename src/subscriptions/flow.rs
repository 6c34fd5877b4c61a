// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Subscribe and unsubscribe flows

use std::sync::Arc;

use super::store::{Subscription, SubscriptionStore};
use super::token::generate_unsubscribe_token;
use crate::clock::Clock;
use crate::devices::{DeviceCatalog, FirmwareCache};
use crate::error::{AppError, Result};
use crate::metrics::MetricsRegistry;
use crate::notify::{Notification, Notifier, UnsubscribeLinks};

/// Result of a successful subscribe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribed {
    pub email: String,
    pub device_identifier: String,
    pub device_name: String,
    /// Current version at subscribe time
    pub version: String,
    /// Only handed to the subscriber through the notification
    pub token: String,
    /// The first notification was accepted by the notifier
    pub notified: bool,
}

/// What an unsubscribe token would cancel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribePreview {
    pub email: String,
    pub device_identifier: String,
    pub device_name: String,
}

/// Result of a consumed unsubscribe token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsubscribed {
    /// The row as left by the deactivation
    pub subscription: Subscription,
    pub device_name: String,
}

pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    catalog: Arc<DeviceCatalog>,
    firmware: Arc<FirmwareCache>,
    notifier: Arc<dyn Notifier>,
    links: UnsubscribeLinks,
    clock: Arc<dyn Clock>,
    metrics: MetricsRegistry,
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("Missing {field}")));
    }
    Ok(value.to_string())
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        catalog: Arc<DeviceCatalog>,
        firmware: Arc<FirmwareCache>,
        notifier: Arc<dyn Notifier>,
        links: UnsubscribeLinks,
        clock: Arc<dyn Clock>,
        metrics: MetricsRegistry,
    ) -> Self {
        Self {
            store,
            catalog,
            firmware,
            notifier,
            links,
            clock,
            metrics,
        }
    }

    /// Subscribes `email` to `device_identifier`
    ///
    /// Creates the row, or reactivates an existing one with a fresh token,
    /// with the current version already recorded as notified, then sends
    /// that version right away. A dispatch pass running meanwhile therefore
    /// has nothing to send. If the send fails the version is cleared again
    /// so the next pass retries it.
    pub async fn subscribe(&self, email: &str, device_identifier: &str) -> Result<Subscribed> {
        let email = required(email, "email")?;
        let device_identifier = required(device_identifier, "device")?;

        let snapshot = self.firmware.resolve_and_store(&device_identifier).await?;
        let Some(version) = snapshot.latest_version().map(str::to_string) else {
            return Err(AppError::UnsupportedDevice(device_identifier));
        };

        let catalog = self.catalog.resolve_or_empty().await;
        let device_name = catalog.name_for(&device_identifier).to_string();

        let token = generate_unsubscribe_token();
        self.store
            .upsert(
                &email,
                &device_identifier,
                &token,
                self.clock.now(),
                Some(version.as_str()),
            )
            .await?;
        tracing::info!("Subscribed {} to {}", email, device_identifier);

        let notification =
            Notification::version(&email, &device_name, &version, &self.links.url_for(&token));
        let notified = match self.notifier.send(&notification).await {
            Ok(()) => {
                self.metrics.record_notification_sent(notification.kind);
                true
            }
            Err(e) => {
                self.metrics.record_notification_failed(notification.kind);
                tracing::warn!(
                    "Failed to send first notification to {} for {}: {}",
                    email,
                    device_identifier,
                    e
                );
                if let Err(e) = self.store.clear_notified(&token, &version).await {
                    tracing::warn!(
                        "Failed to clear notified version for {} on {}: {}",
                        email,
                        device_identifier,
                        e
                    );
                }
                false
            }
        };

        Ok(Subscribed {
            email,
            device_identifier,
            device_name,
            version,
            token,
            notified,
        })
    }

    /// Looks up the subscription behind `token` without changing it
    pub async fn unsubscribe_preview(&self, token: &str) -> Result<UnsubscribePreview> {
        let token = required(token, "token")?;
        let subscription = self
            .store
            .find_active_by_token(&token)
            .await?
            .ok_or(AppError::InvalidOrConsumedToken)?;

        let catalog = self.catalog.resolve_or_empty().await;
        Ok(UnsubscribePreview {
            device_name: catalog
                .name_for(&subscription.device_identifier)
                .to_string(),
            email: subscription.email,
            device_identifier: subscription.device_identifier,
        })
    }

    /// Consumes `token`, deactivating its subscription
    ///
    /// The confirmation notification is best effort; a failed send does not
    /// undo the deactivation.
    pub async fn unsubscribe(&self, token: &str) -> Result<Unsubscribed> {
        let token = required(token, "token")?;
        let subscription = self
            .store
            .deactivate_by_token(&token)
            .await?
            .ok_or(AppError::InvalidOrConsumedToken)?;
        tracing::info!(
            "Unsubscribed {} from {}",
            subscription.email,
            subscription.device_identifier
        );

        let catalog = self.catalog.resolve_or_empty().await;
        let device_name = catalog
            .name_for(&subscription.device_identifier)
            .to_string();
        let notification = Notification::unsubscribed(&subscription.email, &device_name);
        match self.notifier.send(&notification).await {
            Ok(()) => self.metrics.record_notification_sent(notification.kind),
            Err(e) => {
                self.metrics.record_notification_failed(notification.kind);
                tracing::warn!(
                    "Failed to send unsubscribe confirmation to {}: {}",
                    subscription.email,
                    e
                );
            }
        }

        Ok(Unsubscribed {
            subscription,
            device_name,
        })
    }
}
