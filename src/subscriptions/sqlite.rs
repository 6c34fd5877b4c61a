// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! SQLite-backed subscription store

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{Subscription, SubscriptionStats, SubscriptionStore};
use crate::db::Database;
use crate::error::Result;

const COLUMNS: &str =
    "email, device_id, subscribed_at, active, unsubscribe_token, last_notified_version";

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    email: String,
    device_id: String,
    subscribed_at: i64,
    active: bool,
    unsubscribe_token: Option<String>,
    last_notified_version: Option<String>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            email: row.email,
            device_identifier: row.device_id,
            subscribed_at: DateTime::from_timestamp(row.subscribed_at, 0).unwrap_or_default(),
            active: row.active,
            unsubscribe_token: row.unsubscribe_token,
            last_notified_version: row.last_notified_version,
        }
    }
}

#[derive(Clone)]
pub struct SqliteSubscriptionStore {
    db: Database,
}

impl SqliteSubscriptionStore {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionStore for SqliteSubscriptionStore {
    async fn upsert(
        &self,
        email: &str,
        device_identifier: &str,
        token: &str,
        subscribed_at: DateTime<Utc>,
        notified_version: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO subscriptions \
             (email, device_id, subscribed_at, active, unsubscribe_token, last_notified_version) \
             VALUES (?, ?, ?, 1, ?, ?) \
             ON CONFLICT(email, device_id) DO UPDATE SET \
             active = 1, unsubscribe_token = excluded.unsubscribe_token, \
             last_notified_version = \
             COALESCE(excluded.last_notified_version, subscriptions.last_notified_version)",
        )
        .bind(email)
        .bind(device_identifier)
        .bind(subscribed_at.timestamp())
        .bind(token)
        .bind(notified_version)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn get(&self, email: &str, device_identifier: &str) -> Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE email = ? AND device_id = ?"
        ))
        .bind(email)
        .bind(device_identifier)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Subscription::from))
    }

    async fn active_device_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT device_id FROM subscriptions WHERE active = 1 ORDER BY device_id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn active_for_device(&self, device_identifier: &str) -> Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE device_id = ? AND active = 1 ORDER BY email"
        ))
        .bind(device_identifier)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    async fn find_active_by_token(&self, token: &str) -> Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE unsubscribe_token = ? AND active = 1"
        ))
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Subscription::from))
    }

    async fn deactivate_by_token(&self, token: &str) -> Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "UPDATE subscriptions SET active = 0, unsubscribe_token = NULL \
             WHERE unsubscribe_token = ? AND active = 1 RETURNING {COLUMNS}"
        ))
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Subscription::from))
    }

    async fn mark_notified(
        &self,
        email: &str,
        device_identifier: &str,
        version: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE subscriptions SET last_notified_version = ? \
             WHERE email = ? AND device_id = ? AND active = 1",
        )
        .bind(version)
        .bind(email)
        .bind(device_identifier)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_notified(&self, token: &str, version: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE subscriptions SET last_notified_version = NULL \
             WHERE unsubscribe_token = ? AND last_notified_version = ? AND active = 1",
        )
        .bind(token)
        .bind(version)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<SubscriptionStats> {
        let (total, active, devices): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
             COALESCE(SUM(active), 0), \
             COUNT(DISTINCT CASE WHEN active = 1 THEN device_id END) \
             FROM subscriptions",
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(SubscriptionStats {
            total: u64::try_from(total).unwrap_or_default(),
            active: u64::try_from(active).unwrap_or_default(),
            devices: u64::try_from(devices).unwrap_or_default(),
        })
    }
}
