// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Subscription record and storage contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// Subscription of one email address to one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub email: String,
    pub device_identifier: String,
    pub subscribed_at: DateTime<Utc>,
    pub active: bool,
    /// Cleared once the subscription is deactivated
    #[serde(skip_serializing)]
    pub unsubscribe_token: Option<String>,
    pub last_notified_version: Option<String>,
}

/// Aggregate counts over the subscription table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionStats {
    pub total: u64,
    pub active: u64,
    /// Distinct devices with at least one active subscription
    pub devices: u64,
}

/// Persistent subscriptions keyed by `(email, device_identifier)`
///
/// Every method is a single store operation and atomic on its own.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts a new active row, or reactivates an existing one with `token`
    ///
    /// `notified_version` is written in the same statement, so a dispatch
    /// pass never sees the row without it. `None` keeps the stored version.
    async fn upsert(
        &self,
        email: &str,
        device_identifier: &str,
        token: &str,
        subscribed_at: DateTime<Utc>,
        notified_version: Option<&str>,
    ) -> Result<()>;

    async fn get(&self, email: &str, device_identifier: &str) -> Result<Option<Subscription>>;

    /// Distinct device identifiers with at least one active subscription
    async fn active_device_ids(&self) -> Result<Vec<String>>;

    async fn active_for_device(&self, device_identifier: &str) -> Result<Vec<Subscription>>;

    /// Read-only lookup of the active row owning `token`
    async fn find_active_by_token(&self, token: &str) -> Result<Option<Subscription>>;

    /// Deactivates the active row owning `token` and clears the token
    ///
    /// Returns the deactivated row, or `None` when no active row matched.
    /// Two concurrent calls with the same token never both succeed.
    async fn deactivate_by_token(&self, token: &str) -> Result<Option<Subscription>>;

    /// Records `version` as notified; only active rows are updated
    async fn mark_notified(
        &self,
        email: &str,
        device_identifier: &str,
        version: &str,
    ) -> Result<bool>;

    /// Clears `version` from the active row owning `token`
    ///
    /// Nothing changes once the row moved on to another token or version.
    async fn clear_notified(&self, token: &str, version: &str) -> Result<bool>;

    async fn stats(&self) -> Result<SubscriptionStats>;
}
